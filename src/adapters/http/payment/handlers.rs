//! HTTP handler for inbound payment notifications.
//!
//! The transport contract is deliberately narrow: a missing signature header
//! is a 400, a signature mismatch is a 403, and everything that passes
//! verification is acknowledged with 200 no matter what activation decided.
//! Internal lookup failures (unknown buyer, failed invite) must not leak to
//! the payment provider as protocol errors. The one exception is a store
//! failure before the entitlement write, answered with 500 so the provider
//! redelivers.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use std::sync::Arc;

use crate::application::handlers::{
    ActivateSubscriptionCommand, ActivateSubscriptionHandler, ActivationOutcome,
};
use crate::domain::subscription::{IpnVerifier, PaymentNotification};

use super::dto::{AckResponse, ErrorResponse};

/// Header carrying the hex-encoded HMAC-SHA512 of the raw body.
const SIGNATURE_HEADER: &str = "HMAC";

/// Shared state for the payment routes.
#[derive(Clone)]
pub struct PaymentAppState {
    pub verifier: Arc<IpnVerifier>,
    pub activation: Arc<ActivateSubscriptionHandler>,
}

/// Rejections the notification endpoint can answer with.
#[derive(Debug)]
pub enum IpnRejection {
    /// No `HMAC` header present.
    MissingSignature,
    /// Signature did not match the raw body.
    InvalidSignature,
    /// Activation could not reach the user store.
    ActivationUnavailable,
}

impl IpnRejection {
    pub fn status_code(&self) -> StatusCode {
        match self {
            IpnRejection::MissingSignature => StatusCode::BAD_REQUEST,
            IpnRejection::InvalidSignature => StatusCode::FORBIDDEN,
            IpnRejection::ActivationUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> &'static str {
        match self {
            IpnRejection::MissingSignature => "Missing HMAC header",
            IpnRejection::InvalidSignature => "Invalid HMAC signature",
            IpnRejection::ActivationUnavailable => "Temporarily unable to process notification",
        }
    }
}

impl IntoResponse for IpnRejection {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorResponse::new(self.detail()))).into_response()
    }
}

/// POST /payment_handler - payment provider notification endpoint.
pub async fn handle_payment_notification(
    State(state): State<PaymentAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AckResponse>, IpnRejection> {
    let presented = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(IpnRejection::MissingSignature)?;

    if !state.verifier.verify(&body, presented) {
        tracing::warn!("payment notification with invalid signature rejected");
        return Err(IpnRejection::InvalidSignature);
    }

    let notification = match PaymentNotification::from_form(&body) {
        Ok(n) => n,
        Err(err) => {
            // Authenticated but unreadable; acknowledge so the provider does
            // not retry a body that will never parse.
            tracing::warn!(error = %err, "unparsable payment notification body");
            return Ok(Json(AckResponse::ok()));
        }
    };

    let outcome = state
        .activation
        .handle(ActivateSubscriptionCommand {
            buyer_email: notification.email.unwrap_or_default(),
            status: notification.status,
        })
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "activation failed before entitlement write");
            IpnRejection::ActivationUnavailable
        })?;

    match &outcome {
        ActivationOutcome::Activated { expires_at, .. } => {
            tracing::info!(expires_at = %expires_at, "activation complete");
        }
        ActivationOutcome::PartialInvite { expires_at } => {
            tracing::warn!(expires_at = %expires_at, "activated without invite delivery");
        }
        ActivationOutcome::UnknownBuyer => {
            tracing::warn!("notification for unknown buyer acknowledged");
        }
        ActivationOutcome::Ignored => {}
    }

    Ok(Json(AckResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_status_codes_match_the_contract() {
        assert_eq!(
            IpnRejection::MissingSignature.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            IpnRejection::InvalidSignature.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            IpnRejection::ActivationUnavailable.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
