//! Billing configuration.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

fn default_subscription_days() -> i64 {
    7
}

/// Payment provider and subscription configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Pre-shared secret used to verify IPN signatures.
    pub ipn_secret: SecretString,

    /// Length of one paid subscription period.
    #[serde(default = "default_subscription_days")]
    pub subscription_days: i64,
}

impl BillingConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ipn_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("BILLING_IPN_SECRET"));
        }
        if self.subscription_days <= 0 {
            return Err(ValidationError::invalid(
                "billing.subscription_days",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
