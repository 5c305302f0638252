//! Reconciler configuration.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::reconciler::ReconcilerSettings;

fn default_interval_secs() -> u64 {
    3
}

fn default_max_concurrency() -> usize {
    16
}

/// Reconciliation loop tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconcilerConfig {
    /// Pause between passes.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Upper bound on concurrent per-user evaluations, sized to what the
    /// directory's rate limits tolerate.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl ReconcilerConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_secs == 0 {
            return Err(ValidationError::invalid(
                "reconciler.interval_secs",
                "must be at least 1",
            ));
        }
        if self.max_concurrency == 0 {
            return Err(ValidationError::invalid(
                "reconciler.max_concurrency",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Converts into the application-layer settings struct.
    pub fn settings(&self) -> ReconcilerSettings {
        ReconcilerSettings {
            interval: Duration::from_secs(self.interval_secs),
            max_concurrency: self.max_concurrency,
        }
    }
}
