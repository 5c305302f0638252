//! Telegram Bot API adapter for the group directory and invite delivery.

mod api_types;
mod directory;

pub use directory::{TelegramConfig, TelegramGroupDirectory};
