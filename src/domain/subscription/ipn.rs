//! Instant payment notification (IPN) payload.
//!
//! The provider posts a form-encoded body carrying at least `status` (an
//! integer as a string) and `email`. Fields the provider adds beyond those are
//! ignored.

use serde::Deserialize;

/// Provider status codes at or above this value indicate a completed payment.
pub const SUCCESS_STATUS_THRESHOLD: i32 = 100;

/// Raw form fields as sent by the provider.
#[derive(Debug, Deserialize)]
struct RawIpnForm {
    status: Option<String>,
    email: Option<String>,
}

/// A parsed payment notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotification {
    /// Provider status code; absent or unparsable values read as 0.
    pub status: i32,
    pub email: Option<String>,
}

impl PaymentNotification {
    /// Parses a form-encoded notification body.
    ///
    /// Only a body that is not valid form encoding at all is rejected;
    /// missing or garbled `status` degrades to 0, which downstream treats as
    /// a non-terminal notification.
    pub fn from_form(raw_body: &[u8]) -> Result<Self, serde_urlencoded::de::Error> {
        let raw: RawIpnForm = serde_urlencoded::from_bytes(raw_body)?;
        Ok(Self {
            status: raw
                .status
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            email: raw.email,
        })
    }

    /// True for provider-defined success codes.
    pub fn is_success(&self) -> bool {
        self.status >= SUCCESS_STATUS_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_and_email() {
        let n = PaymentNotification::from_form(b"status=100&email=a%40x.com").unwrap();
        assert_eq!(n.status, 100);
        assert_eq!(n.email.as_deref(), Some("a@x.com"));
        assert!(n.is_success());
    }

    #[test]
    fn missing_status_reads_as_zero() {
        let n = PaymentNotification::from_form(b"email=a%40x.com").unwrap();
        assert_eq!(n.status, 0);
        assert!(!n.is_success());
    }

    #[test]
    fn garbled_status_reads_as_zero() {
        let n = PaymentNotification::from_form(b"status=pending&email=a%40x.com").unwrap();
        assert_eq!(n.status, 0);
    }

    #[test]
    fn status_below_threshold_is_not_success() {
        let n = PaymentNotification::from_form(b"status=42").unwrap();
        assert!(!n.is_success());
    }

    #[test]
    fn extra_provider_fields_are_ignored() {
        let n =
            PaymentNotification::from_form(b"status=101&email=a%40x.com&txn_id=abc&amount=20")
                .unwrap();
        assert_eq!(n.status, 101);
    }

    #[test]
    fn negative_status_is_not_success() {
        // The provider uses negative codes for cancelled/refunded
        let n = PaymentNotification::from_form(b"status=-1&email=a%40x.com").unwrap();
        assert_eq!(n.status, -1);
        assert!(!n.is_success());
    }
}
