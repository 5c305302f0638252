//! Wire DTOs for the payment notification endpoint.

use serde::Serialize;

/// Acknowledgement body returned for every accepted notification.
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub status: &'static str,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}

/// Error body for rejected notifications.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
