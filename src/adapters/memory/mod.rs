//! In-memory adapter implementations for testing.
//!
//! Deterministic doubles for the store, directory and notifier ports. They
//! record every call for assertions and let tests script failures per
//! operation or per user. Locks use `.expect()` on poisoning, which is
//! acceptable for test code; these adapters are not for production use.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{ChatId, UserId};
use crate::domain::subscription::{Entitlement, NewUserRecord, UserRecord};
use crate::ports::{
    DirectoryError, GroupDirectory, InviteLink, InviteNotifier, MemberStatus, NotifyError,
    StoreError, UserStore,
};

/// In-memory user record store.
pub struct InMemoryUserStore {
    records: RwLock<HashMap<UserId, UserRecord>>,
    fail_listing: RwLock<bool>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            fail_listing: RwLock::new(false),
        }
    }

    /// Assigns an email to an existing record (records are created without
    /// one, as in the real store).
    pub fn set_email(&self, user_id: UserId, email: &str) {
        let mut records = self.records.write().expect("records lock poisoned");
        if let Some(rec) = records.get_mut(&user_id) {
            rec.email = Some(email.to_string());
        }
    }

    /// Makes `list_all` fail until cleared.
    pub fn fail_listing(&self) {
        *self.fail_listing.write().expect("flag lock poisoned") = true;
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .expect("records lock poisoned")
            .get(&user_id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .expect("records lock poisoned")
            .values()
            .find(|r| r.email.as_deref() == Some(email))
            .cloned())
    }

    async fn set_entitlement(
        &self,
        user_id: UserId,
        entitlement: Option<Entitlement>,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().expect("records lock poisoned");
        match records.get_mut(&user_id) {
            Some(rec) => {
                rec.entitlement = entitlement;
                Ok(())
            }
            None => Err(StoreError::Database(format!("no such user: {user_id}"))),
        }
    }

    async fn set_in_group(&self, user_id: UserId, in_group: bool) -> Result<(), StoreError> {
        let mut records = self.records.write().expect("records lock poisoned");
        match records.get_mut(&user_id) {
            Some(rec) => {
                rec.in_group = in_group;
                Ok(())
            }
            None => Err(StoreError::Database(format!("no such user: {user_id}"))),
        }
    }

    async fn list_all(&self) -> Result<Vec<UserRecord>, StoreError> {
        if *self.fail_listing.read().expect("flag lock poisoned") {
            return Err(StoreError::Database("listing unavailable".to_string()));
        }
        Ok(self
            .records
            .read()
            .expect("records lock poisoned")
            .values()
            .cloned()
            .collect())
    }

    async fn create(&self, fields: NewUserRecord) -> Result<UserRecord, StoreError> {
        let record = UserRecord {
            chat_id: fields.chat_id,
            user_id: fields.user_id,
            full_name: fields.full_name,
            username: fields.username,
            email: None,
            banned: false,
            in_group: false,
            lang: fields.lang,
            entitlement: None,
        };
        self.records
            .write()
            .expect("records lock poisoned")
            .insert(record.user_id, record.clone());
        Ok(record)
    }
}

/// In-memory group directory that records invites and revokes.
///
/// A revoked user's status flips to `Kicked`, the way the real directory
/// reports them after a kick; unknown users read as `Left`.
pub struct RecordingDirectory {
    admins: RwLock<Vec<UserId>>,
    statuses: RwLock<HashMap<UserId, MemberStatus>>,
    revoked: RwLock<Vec<UserId>>,
    invited: RwLock<Vec<UserId>>,
    fail_invites: RwLock<bool>,
    fail_admin_list: RwLock<bool>,
    failing_status: RwLock<Vec<UserId>>,
}

impl RecordingDirectory {
    pub fn new() -> Self {
        Self {
            admins: RwLock::new(Vec::new()),
            statuses: RwLock::new(HashMap::new()),
            revoked: RwLock::new(Vec::new()),
            invited: RwLock::new(Vec::new()),
            fail_invites: RwLock::new(false),
            fail_admin_list: RwLock::new(false),
            failing_status: RwLock::new(Vec::new()),
        }
    }

    pub fn add_admin(&self, user_id: UserId) {
        self.admins.write().expect("admins lock poisoned").push(user_id);
    }

    pub fn set_status(&self, user_id: UserId, status: MemberStatus) {
        self.statuses
            .write()
            .expect("statuses lock poisoned")
            .insert(user_id, status);
    }

    /// Every revoke call, in order of arrival.
    pub fn revokes(&self) -> Vec<UserId> {
        self.revoked.read().expect("revoked lock poisoned").clone()
    }

    /// Every invite request, in order of arrival.
    pub fn invites_for(&self) -> Vec<UserId> {
        self.invited.read().expect("invited lock poisoned").clone()
    }

    pub fn fail_invites(&self) {
        *self.fail_invites.write().expect("flag lock poisoned") = true;
    }

    pub fn fail_admin_list(&self) {
        *self.fail_admin_list.write().expect("flag lock poisoned") = true;
    }

    pub fn fail_status_for(&self, user_id: UserId) {
        self.failing_status
            .write()
            .expect("flag lock poisoned")
            .push(user_id);
    }
}

impl Default for RecordingDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GroupDirectory for RecordingDirectory {
    async fn list_admins(&self) -> Result<Vec<UserId>, DirectoryError> {
        if *self.fail_admin_list.read().expect("flag lock poisoned") {
            return Err(DirectoryError::Transport("admin list unavailable".to_string()));
        }
        Ok(self.admins.read().expect("admins lock poisoned").clone())
    }

    async fn member_status(&self, user_id: UserId) -> Result<MemberStatus, DirectoryError> {
        if self
            .failing_status
            .read()
            .expect("flag lock poisoned")
            .contains(&user_id)
        {
            return Err(DirectoryError::Timeout);
        }
        Ok(self
            .statuses
            .read()
            .expect("statuses lock poisoned")
            .get(&user_id)
            .copied()
            .unwrap_or(MemberStatus::Left))
    }

    async fn create_single_use_invite(
        &self,
        user_id: UserId,
    ) -> Result<InviteLink, DirectoryError> {
        if *self.fail_invites.read().expect("flag lock poisoned") {
            return Err(DirectoryError::Api {
                code: 400,
                description: "invite creation scripted to fail".to_string(),
            });
        }
        self.invited
            .write()
            .expect("invited lock poisoned")
            .push(user_id);
        Ok(InviteLink(format!("https://t.me/+invite-{user_id}")))
    }

    async fn revoke(&self, user_id: UserId) -> Result<(), DirectoryError> {
        self.revoked
            .write()
            .expect("revoked lock poisoned")
            .push(user_id);
        self.statuses
            .write()
            .expect("statuses lock poisoned")
            .insert(user_id, MemberStatus::Kicked);
        Ok(())
    }
}

/// In-memory notifier that records deliveries.
pub struct RecordingNotifier {
    delivered: RwLock<Vec<(ChatId, String, i64)>>,
    fail_deliveries: RwLock<bool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            delivered: RwLock::new(Vec::new()),
            fail_deliveries: RwLock::new(false),
        }
    }

    pub fn deliveries(&self) -> Vec<(ChatId, String, i64)> {
        self.delivered.read().expect("delivered lock poisoned").clone()
    }

    pub fn fail_deliveries(&self) {
        *self.fail_deliveries.write().expect("flag lock poisoned") = true;
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InviteNotifier for RecordingNotifier {
    async fn send_invite(
        &self,
        chat_id: ChatId,
        invite: &InviteLink,
        subscription_days: i64,
    ) -> Result<(), NotifyError> {
        if *self.fail_deliveries.read().expect("flag lock poisoned") {
            return Err(NotifyError::Delivery("delivery scripted to fail".to_string()));
        }
        self.delivered
            .write()
            .expect("delivered lock poisoned")
            .push((chat_id, invite.as_str().to_string(), subscription_days));
        Ok(())
    }
}
