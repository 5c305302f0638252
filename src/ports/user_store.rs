//! User record store port.
//!
//! The durable store of user records is an external collaborator; this port
//! is the contract the rest of the crate programs against. Lookups return
//! `None` for absent users rather than erroring, because "unknown user" is a
//! normal outcome for payment notifications.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::UserId;
use crate::domain::subscription::{Entitlement, NewUserRecord, UserRecord};

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying database rejected or failed the operation.
    #[error("database error: {0}")]
    Database(String),

    /// The call did not complete within its deadline.
    #[error("store call timed out")]
    Timeout,

    /// A stored record could not be mapped into the domain model.
    #[error("malformed record for user {user_id}: {reason}")]
    MalformedRecord { user_id: i64, reason: String },
}

/// Keyed storage for user records.
///
/// Entitlement and `in_group` writes must be idempotent: re-applying the same
/// value is a harmless no-op, which is what lets overlapping reconciliation
/// passes coexist without coordination.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Looks up a user by their stable identity.
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Looks up a user by their unique email, as carried in payment
    /// notifications.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Replaces the user's entitlement; `None` clears it.
    async fn set_entitlement(
        &self,
        user_id: UserId,
        entitlement: Option<Entitlement>,
    ) -> Result<(), StoreError>;

    /// Updates the advisory group-membership flag.
    async fn set_in_group(&self, user_id: UserId, in_group: bool) -> Result<(), StoreError>;

    /// Returns every known user record.
    async fn list_all(&self) -> Result<Vec<UserRecord>, StoreError>;

    /// Creates a record for a user seen for the first time.
    async fn create(&self, fields: NewUserRecord) -> Result<UserRecord, StoreError>;
}
