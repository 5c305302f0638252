//! User record as held by the user store.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ChatId, Timestamp, UserId};

use super::Entitlement;

/// A known user of the system.
///
/// Records are created on a user's first interaction (outside this core) and
/// never deleted here; the entitlement field is the only part this crate
/// mutates, plus the advisory `in_group` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Delivery address for messages.
    pub chat_id: ChatId,
    /// Stable external identity.
    pub user_id: UserId,
    pub full_name: String,
    pub username: String,
    /// Unique, optional; payment notifications resolve buyers by email.
    pub email: Option<String>,
    pub banned: bool,
    /// Advisory cache of group membership. Never gates a revocation
    /// decision; the live directory is always consulted for that.
    pub in_group: bool,
    pub lang: String,
    /// At most one active entitlement per user; `None` means no access by
    /// subscription.
    pub entitlement: Option<Entitlement>,
}

impl UserRecord {
    /// True when the user holds an entitlement whose expiry is in the future.
    pub fn has_active_entitlement(&self, now: Timestamp) -> bool {
        self.entitlement.map_or(false, |e| e.is_active(now))
    }
}

/// Fields supplied when creating a new user record.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub full_name: String,
    pub username: String,
    pub lang: String,
}
