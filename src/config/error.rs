//! Configuration error types.

use thiserror::Error;

/// Errors raised while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Errors raised by semantic validation of loaded configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required configuration value missing: {0}")]
    MissingRequired(&'static str),

    #[error("invalid value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl ValidationError {
    pub fn invalid(field: &'static str, reason: &'static str) -> Self {
        ValidationError::Invalid { field, reason }
    }
}
