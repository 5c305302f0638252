//! Subscription domain: entitlements, user records and payment notifications.

mod entitlement;
mod ipn;
mod signature;
mod user_record;

pub use entitlement::Entitlement;
pub use ipn::{PaymentNotification, SUCCESS_STATUS_THRESHOLD};
pub use signature::IpnVerifier;
pub use user_record::{NewUserRecord, UserRecord};
