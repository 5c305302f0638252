//! Group directory port.
//!
//! The controlled group's live membership and admin roster. The directory is
//! rate limited; callers fan out against it with bounded concurrency and must
//! treat every call as fallible and subject to a deadline.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::foundation::UserId;

/// Errors surfaced by directory implementations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The directory API answered with an error of its own.
    #[error("directory API error {code}: {description}")]
    Api { code: i32, description: String },

    /// The call could not reach the directory.
    #[error("transport error: {0}")]
    Transport(String),

    /// The call did not complete within its deadline.
    #[error("directory call timed out")]
    Timeout,

    /// The directory answered with something this crate cannot interpret.
    #[error("unexpected directory response: {0}")]
    InvalidResponse(String),
}

/// A user's live status inside the controlled group.
///
/// Mirrors the Telegram chat-member statuses. Only `Member` counts as being
/// in the group for revocation purposes: creators and administrators are
/// exempt, and everything else already means "not present".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
}

impl MemberStatus {
    /// True only for plain members subject to subscription enforcement.
    pub fn is_in_group(&self) -> bool {
        matches!(self, MemberStatus::Member)
    }
}

/// A single-use invite returned by the directory.
///
/// Scoped to one identity and one redemption; the directory enforces the
/// single use, this crate only requests it. Never persisted beyond the
/// activation that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteLink(pub String);

impl InviteLink {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Live membership and admin API of the controlled group.
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Fetches the current administrator identities.
    ///
    /// Admin status changes out-of-band at any time, so callers take a fresh
    /// snapshot per reconciliation pass and never cache across passes.
    async fn list_admins(&self) -> Result<Vec<UserId>, DirectoryError>;

    /// Queries the user's live membership status.
    async fn member_status(&self, user_id: UserId) -> Result<MemberStatus, DirectoryError>;

    /// Requests an invite link redeemable exactly once, labeled with the
    /// requesting user's identity.
    async fn create_single_use_invite(&self, user_id: UserId)
        -> Result<InviteLink, DirectoryError>;

    /// Removes the user from the group without a lasting block (a kick):
    /// block then immediately unblock, leaving rejoin-by-invite open.
    ///
    /// Revoking a user who is already out of the group must be harmless.
    async fn revoke(&self, user_id: UserId) -> Result<(), DirectoryError>;
}
