//! Telegram configuration.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

fn default_request_timeout_secs() -> u64 {
    10
}

/// Telegram Bot API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather.
    pub bot_token: SecretString,

    /// Chat id of the controlled group (negative for supergroups).
    pub group_chat_id: i64,

    /// Deadline for each Bot API call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl TelegramConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let token = self.bot_token.expose_secret();
        if token.is_empty() {
            return Err(ValidationError::MissingRequired("TELEGRAM_BOT_TOKEN"));
        }
        // BotFather tokens are "<bot id>:<secret>"
        if !token.contains(':') {
            return Err(ValidationError::invalid(
                "telegram.bot_token",
                "does not look like a bot token",
            ));
        }
        if self.group_chat_id == 0 {
            return Err(ValidationError::MissingRequired("TELEGRAM_GROUP_CHAT_ID"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::invalid(
                "telegram.request_timeout_secs",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
