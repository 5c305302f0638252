//! Wire types for the Telegram Bot API.

use serde::{Deserialize, Serialize};

use crate::ports::MemberStatus;

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub error_code: Option<i32>,
    pub description: Option<String>,
}

/// Minimal user object: only the identity is consumed here.
#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    pub id: i64,
}

/// Result of `getChatMember` / element of `getChatAdministrators`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMember {
    pub user: TgUser,
    pub status: MemberStatus,
}

/// Result of `createChatInviteLink`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatInviteLink {
    pub invite_link: String,
}

/// A single url button.
#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub url: String,
}

/// Inline keyboard attached to invite messages.
#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    /// One full-width url button.
    pub fn single_url_button(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            inline_keyboard: vec![vec![InlineKeyboardButton {
                text: text.into(),
                url: url.into(),
            }]],
        }
    }
}
