//! Telegram Bot API adapter.
//!
//! Implements `GroupDirectory` and `InviteNotifier` against the Bot API for
//! one configured group. Every request carries the client-level timeout so a
//! stalled call fails the affected operation instead of wedging a pass.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::domain::foundation::{ChatId, UserId};
use crate::ports::{
    DirectoryError, GroupDirectory, InviteLink, InviteNotifier, MemberStatus, NotifyError,
};

use super::api_types::{ApiResponse, ChatInviteLink, ChatMember, InlineKeyboardMarkup};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram adapter configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token from BotFather.
    bot_token: SecretString,
    /// The controlled group's chat id.
    group_chat_id: ChatId,
    /// Base URL for the Bot API (overridable for tests).
    api_base_url: String,
    /// Per-request deadline.
    request_timeout: Duration,
}

impl TelegramConfig {
    pub fn new(bot_token: SecretString, group_chat_id: ChatId, request_timeout: Duration) -> Self {
        Self {
            bot_token,
            group_chat_id,
            api_base_url: DEFAULT_API_BASE.to_string(),
            request_timeout,
        }
    }

    /// Points the adapter at a different API host (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Group directory and invite delivery over the Telegram Bot API.
pub struct TelegramGroupDirectory {
    config: TelegramConfig,
    http_client: reqwest::Client,
}

impl TelegramGroupDirectory {
    pub fn new(config: TelegramConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base_url,
            self.config.bot_token.expose_secret(),
            method
        )
    }

    /// Calls one Bot API method and unwraps the response envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &serde_json::Value,
    ) -> Result<T, DirectoryError> {
        let response = self
            .http_client
            .post(self.method_url(method))
            .json(params)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    DirectoryError::Timeout
                } else {
                    DirectoryError::Transport(err.to_string())
                }
            })?;

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|err| DirectoryError::InvalidResponse(err.to_string()))?;

        if !envelope.ok {
            return Err(DirectoryError::Api {
                code: envelope.error_code.unwrap_or(0),
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }

        envelope
            .result
            .ok_or_else(|| DirectoryError::InvalidResponse("ok response without result".to_string()))
    }
}

#[async_trait]
impl GroupDirectory for TelegramGroupDirectory {
    async fn list_admins(&self) -> Result<Vec<UserId>, DirectoryError> {
        let admins: Vec<ChatMember> = self
            .call(
                "getChatAdministrators",
                &json!({ "chat_id": self.config.group_chat_id }),
            )
            .await?;
        Ok(admins.into_iter().map(|m| UserId::new(m.user.id)).collect())
    }

    async fn member_status(&self, user_id: UserId) -> Result<MemberStatus, DirectoryError> {
        let member: ChatMember = self
            .call(
                "getChatMember",
                &json!({ "chat_id": self.config.group_chat_id, "user_id": user_id }),
            )
            .await?;
        Ok(member.status)
    }

    async fn create_single_use_invite(
        &self,
        user_id: UserId,
    ) -> Result<InviteLink, DirectoryError> {
        // member_limit 1 makes the link single-redemption; naming it after
        // the user ties the redemption to the paying identity in the group's
        // audit view.
        let link: ChatInviteLink = self
            .call(
                "createChatInviteLink",
                &json!({
                    "chat_id": self.config.group_chat_id,
                    "name": user_id.to_string(),
                    "member_limit": 1,
                }),
            )
            .await?;
        Ok(InviteLink(link.invite_link))
    }

    async fn revoke(&self, user_id: UserId) -> Result<(), DirectoryError> {
        // Kick semantics: ban then immediately unban, so the user is out of
        // the group but free to rejoin through a fresh invite. A failure
        // between the calls leaves the user banned until the unban is
        // retried by a later payment's invite flow.
        let params = json!({ "chat_id": self.config.group_chat_id, "user_id": user_id });
        let _: bool = self.call("banChatMember", &params).await?;
        let _: bool = self.call("unbanChatMember", &params).await?;
        Ok(())
    }
}

#[async_trait]
impl InviteNotifier for TelegramGroupDirectory {
    async fn send_invite(
        &self,
        chat_id: ChatId,
        invite: &InviteLink,
        subscription_days: i64,
    ) -> Result<(), NotifyError> {
        let markup = InlineKeyboardMarkup::single_url_button("Join the group", invite.as_str());
        let text = format!(
            "Your subscription is active for {subscription_days} days. Use the button below to join."
        );
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                &json!({
                    "chat_id": chat_id,
                    "text": text,
                    "reply_markup": markup,
                    "protect_content": true,
                }),
            )
            .await
            .map_err(|err| match err {
                DirectoryError::Timeout => NotifyError::Timeout,
                other => NotifyError::Delivery(other.to_string()),
            })?;
        Ok(())
    }
}
