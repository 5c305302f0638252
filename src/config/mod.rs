//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `GROUPGATE`
//! prefix and nested sections use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use groupgate::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod billing;
mod database;
mod error;
mod reconciler;
mod server;
mod telegram;

pub use billing::BillingConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use reconciler::ReconcilerConfig;
pub use server::ServerConfig;
pub use telegram::TelegramConfig;

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// HTTP server (host, port).
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL connection.
    pub database: DatabaseConfig,

    /// Telegram bot and controlled group.
    pub telegram: TelegramConfig,

    /// Payment secret and subscription period.
    pub billing: BillingConfig,

    /// Reconciliation loop tuning.
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Loads `.env` if present (development), then reads variables such as
    /// `GROUPGATE__TELEGRAM__BOT_TOKEN` or `GROUPGATE__SERVER__PORT`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into their typed sections.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("GROUPGATE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.telegram.validate()?;
        self.billing.validate()?;
        self.reconciler.validate()?;
        Ok(())
    }
}
