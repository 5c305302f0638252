//! Axum router for the payment notification endpoint.
//!
//! No user authentication applies here; requests are authenticated by the
//! HMAC signature over the raw body.

use axum::{routing::post, Router};

use super::handlers::{handle_payment_notification, PaymentAppState};

/// Create the payment webhook router.
///
/// # Routes
/// - `POST /payment_handler` - instant payment notifications
pub fn payment_routes() -> Router<PaymentAppState> {
    Router::new().route("/payment_handler", post(handle_payment_notification))
}
