//! Payment notification HTTP boundary.

mod dto;
mod handlers;
mod routes;

pub use dto::{AckResponse, ErrorResponse};
pub use handlers::{IpnRejection, PaymentAppState};
pub use routes::payment_routes;
