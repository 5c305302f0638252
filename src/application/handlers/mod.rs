//! Application command handlers.

mod activate_subscription;
mod grant_subscription;

pub use activate_subscription::{
    ActivateSubscriptionCommand, ActivateSubscriptionHandler, ActivationError, ActivationOutcome,
};
pub use grant_subscription::{GrantOutcome, GrantSubscriptionCommand, GrantSubscriptionHandler};
