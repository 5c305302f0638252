//! Invite delivery port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::ChatId;
use crate::ports::InviteLink;

/// Errors surfaced by notifier implementations.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("notifier call timed out")]
    Timeout,
}

/// Delivers an invite to a freshly entitled user.
///
/// Delivery is best-effort: the entitlement is already persisted when this
/// runs, and a failure here must never roll it back. The caller reports the
/// partial outcome instead.
#[async_trait]
pub trait InviteNotifier: Send + Sync {
    /// Sends the invite link to the user, mentioning the subscription length.
    async fn send_invite(
        &self,
        chat_id: ChatId,
        invite: &InviteLink,
        subscription_days: i64,
    ) -> Result<(), NotifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_notifier_is_object_safe() {
        fn _accepts_dyn(_n: &dyn InviteNotifier) {}
    }
}
