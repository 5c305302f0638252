//! Membership reconciliation loop.
//!
//! Runs forever on a fixed interval. Each pass takes a fresh snapshot of the
//! group's admins, reads every known user record, and corrects drift between
//! entitlement state and actual group membership: expired entitlements are
//! cleared and non-admin members without an active entitlement are kicked.
//!
//! Polling beats an event subscription here because membership and admin
//! status change out-of-band (manual admin action, users leaving on their
//! own); re-reading full state every pass makes every decision idempotent and
//! lets activation writes land at any point relative to the fan-out.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::UserRecord;
use crate::ports::{GroupDirectory, UserStore};

/// Point-in-time snapshot of group administrator identities.
///
/// Fetched fresh each pass and never cached across passes.
#[derive(Debug, Clone, Default)]
pub struct AdminSet(HashSet<UserId>);

impl AdminSet {
    pub fn new(admins: impl IntoIterator<Item = UserId>) -> Self {
        Self(admins.into_iter().collect())
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.0.contains(&user_id)
    }
}

/// Tuning for the reconciliation loop.
#[derive(Debug, Clone)]
pub struct ReconcilerSettings {
    /// Pause between passes.
    pub interval: Duration,
    /// Upper bound on concurrent per-user evaluations. The directory is rate
    /// limited, so unbounded fan-out would trade throughput for throttling
    /// errors.
    pub max_concurrency: usize,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_concurrency: 16,
        }
    }
}

/// What a pass decided for one user. Returned for observability and tests;
/// the side effects have already happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDecision {
    /// Active entitlement, nothing to do.
    EntitlementActive,
    /// No active entitlement, but the user is an admin or already out of the
    /// group (stale entitlement, if any, was cleared).
    LeftAlone,
    /// No active entitlement and the user was a plain member: kicked.
    Revoked,
    /// This user's evaluation failed; it will be retried naturally next pass.
    Skipped,
}

/// The reconciliation engine.
pub struct MembershipReconciler {
    store: Arc<dyn UserStore>,
    directory: Arc<dyn GroupDirectory>,
    settings: ReconcilerSettings,
}

impl MembershipReconciler {
    pub fn new(
        store: Arc<dyn UserStore>,
        directory: Arc<dyn GroupDirectory>,
        settings: ReconcilerSettings,
    ) -> Self {
        Self {
            store,
            directory,
            settings,
        }
    }

    /// Runs passes forever for the lifetime of the process.
    pub async fn run(&self) {
        tracing::info!(
            interval_secs = self.settings.interval.as_secs(),
            max_concurrency = self.settings.max_concurrency,
            "membership reconciler started"
        );
        loop {
            self.run_pass().await;
            tokio::time::sleep(self.settings.interval).await;
        }
    }

    /// Executes one full reconciliation pass.
    ///
    /// A failed snapshot fetch skips the pass; per-user failures are isolated
    /// and logged. A pass has no global success or failure, it always
    /// completes.
    pub async fn run_pass(&self) {
        let admins = match self.directory.list_admins().await {
            Ok(admins) => AdminSet::new(admins),
            Err(err) => {
                tracing::warn!(error = %err, "admin snapshot failed, skipping pass");
                return;
            }
        };

        let users = match self.store.list_all().await {
            Ok(users) => users,
            Err(err) => {
                tracing::warn!(error = %err, "user listing failed, skipping pass");
                return;
            }
        };

        let now = Timestamp::now();
        stream::iter(users)
            .for_each_concurrent(self.settings.max_concurrency, |user| {
                let admins = &admins;
                async move {
                    let user_id = user.user_id;
                    let decision = self.evaluate_user(user, admins, now).await;
                    if decision == UserDecision::Revoked {
                        tracing::info!(user_id = %user_id, "membership revoked");
                    }
                }
            })
            .await;
    }

    /// Evaluates a single user, isolating every failure to that user.
    async fn evaluate_user(
        &self,
        user: UserRecord,
        admins: &AdminSet,
        now: Timestamp,
    ) -> UserDecision {
        if user.has_active_entitlement(now) {
            return UserDecision::EntitlementActive;
        }

        // Clear the stale entitlement, admins included. Best effort: on
        // failure the record still reads as expired and the next pass
        // retries.
        if user.entitlement.is_some() {
            if let Err(err) = self.store.set_entitlement(user.user_id, None).await {
                tracing::warn!(user_id = %user.user_id, error = %err, "failed to clear expired entitlement");
            }
        }

        if admins.contains(user.user_id) {
            return UserDecision::LeftAlone;
        }

        // Always the live status; the cached in_group flag is advisory and
        // never gates a revocation.
        let status = match self.directory.member_status(user.user_id).await {
            Ok(status) => status,
            Err(err) => {
                tracing::warn!(user_id = %user.user_id, error = %err, "membership status check failed");
                return UserDecision::Skipped;
            }
        };

        if !status.is_in_group() {
            return UserDecision::LeftAlone;
        }

        if let Err(err) = self.directory.revoke(user.user_id).await {
            tracing::warn!(user_id = %user.user_id, error = %err, "revoke failed");
            return UserDecision::Skipped;
        }

        if let Err(err) = self.store.set_in_group(user.user_id, false).await {
            // Advisory flag only; losing the write costs nothing.
            tracing::debug!(user_id = %user.user_id, error = %err, "in_group flag update failed");
        }

        UserDecision::Revoked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryUserStore, RecordingDirectory};
    use crate::domain::foundation::ChatId;
    use crate::domain::subscription::{Entitlement, NewUserRecord};
    use crate::ports::MemberStatus;

    async fn seed_user(store: &InMemoryUserStore, id: i64, entitlement: Option<Entitlement>) {
        store
            .create(NewUserRecord {
                chat_id: ChatId::new(id),
                user_id: UserId::new(id),
                full_name: format!("User {id}"),
                username: format!("user{id}"),
                lang: "en".to_string(),
            })
            .await
            .unwrap();
        if let Some(ent) = entitlement {
            store
                .set_entitlement(UserId::new(id), Some(ent))
                .await
                .unwrap();
        }
    }

    fn reconciler(
        store: Arc<InMemoryUserStore>,
        directory: Arc<RecordingDirectory>,
    ) -> MembershipReconciler {
        MembershipReconciler::new(store, directory, ReconcilerSettings::default())
    }

    #[tokio::test]
    async fn expired_member_is_revoked_exactly_once_per_pass() {
        let now = Timestamp::now();
        let store = Arc::new(InMemoryUserStore::new());
        let directory = Arc::new(RecordingDirectory::new());

        seed_user(&store, 1, Some(Entitlement::new(now.add_hours(-1)))).await;
        directory.set_status(UserId::new(1), MemberStatus::Member);

        reconciler(store.clone(), directory.clone()).run_pass().await;

        assert_eq!(directory.revokes(), vec![UserId::new(1)]);
        let rec = store.find_by_id(UserId::new(1)).await.unwrap().unwrap();
        assert!(rec.entitlement.is_none(), "expired entitlement must be cleared");
        assert!(!rec.in_group);
    }

    #[tokio::test]
    async fn active_member_is_untouched() {
        let now = Timestamp::now();
        let store = Arc::new(InMemoryUserStore::new());
        let directory = Arc::new(RecordingDirectory::new());

        seed_user(&store, 2, Some(Entitlement::new(now.add_hours(1)))).await;
        directory.set_status(UserId::new(2), MemberStatus::Member);

        reconciler(store.clone(), directory.clone()).run_pass().await;

        assert!(directory.revokes().is_empty());
        let rec = store.find_by_id(UserId::new(2)).await.unwrap().unwrap();
        assert!(rec.entitlement.is_some());
    }

    #[tokio::test]
    async fn expired_admin_is_cleared_but_never_revoked() {
        let now = Timestamp::now();
        let store = Arc::new(InMemoryUserStore::new());
        let directory = Arc::new(RecordingDirectory::new());

        seed_user(&store, 3, Some(Entitlement::new(now.add_hours(-1)))).await;
        directory.set_status(UserId::new(3), MemberStatus::Member);
        directory.add_admin(UserId::new(3));

        reconciler(store.clone(), directory.clone()).run_pass().await;

        assert!(directory.revokes().is_empty());
        let rec = store.find_by_id(UserId::new(3)).await.unwrap().unwrap();
        assert!(rec.entitlement.is_none());
    }

    #[tokio::test]
    async fn user_without_entitlement_and_in_group_is_revoked() {
        let store = Arc::new(InMemoryUserStore::new());
        let directory = Arc::new(RecordingDirectory::new());

        seed_user(&store, 4, None).await;
        directory.set_status(UserId::new(4), MemberStatus::Member);

        reconciler(store, directory.clone()).run_pass().await;

        assert_eq!(directory.revokes(), vec![UserId::new(4)]);
    }

    #[tokio::test]
    async fn user_already_out_of_group_is_left_alone() {
        let store = Arc::new(InMemoryUserStore::new());
        let directory = Arc::new(RecordingDirectory::new());

        seed_user(&store, 5, None).await;
        directory.set_status(UserId::new(5), MemberStatus::Left);

        reconciler(store, directory.clone()).run_pass().await;

        assert!(directory.revokes().is_empty());
    }

    #[tokio::test]
    async fn second_pass_issues_no_further_revoke() {
        let now = Timestamp::now();
        let store = Arc::new(InMemoryUserStore::new());
        let directory = Arc::new(RecordingDirectory::new());

        seed_user(&store, 6, Some(Entitlement::new(now.add_hours(-1)))).await;
        directory.set_status(UserId::new(6), MemberStatus::Member);

        let r = reconciler(store, directory.clone());
        r.run_pass().await;
        // RecordingDirectory flips a revoked user's status to Kicked, the way
        // the real directory would report them afterwards.
        r.run_pass().await;

        assert_eq!(directory.revokes().len(), 1);
    }

    #[tokio::test]
    async fn one_users_failure_does_not_suppress_anothers_revoke() {
        let store = Arc::new(InMemoryUserStore::new());
        let directory = Arc::new(RecordingDirectory::new());

        seed_user(&store, 7, None).await;
        seed_user(&store, 8, None).await;
        directory.fail_status_for(UserId::new(7));
        directory.set_status(UserId::new(8), MemberStatus::Member);

        reconciler(store, directory.clone()).run_pass().await;

        assert_eq!(directory.revokes(), vec![UserId::new(8)]);
    }

    #[tokio::test]
    async fn admin_snapshot_failure_skips_whole_pass() {
        let store = Arc::new(InMemoryUserStore::new());
        let directory = Arc::new(RecordingDirectory::new());

        seed_user(&store, 9, None).await;
        directory.set_status(UserId::new(9), MemberStatus::Member);
        directory.fail_admin_list();

        reconciler(store, directory.clone()).run_pass().await;

        assert!(directory.revokes().is_empty());
    }

    #[tokio::test]
    async fn user_listing_failure_skips_whole_pass() {
        let store = Arc::new(InMemoryUserStore::new());
        let directory = Arc::new(RecordingDirectory::new());

        seed_user(&store, 11, None).await;
        directory.set_status(UserId::new(11), MemberStatus::Member);
        store.fail_listing();

        reconciler(store, directory.clone()).run_pass().await;

        assert!(directory.revokes().is_empty());
    }

    #[tokio::test]
    async fn mixed_population_scenario() {
        // A: no entitlement, member, not admin -> revoked.
        // B: active entitlement, member       -> untouched.
        // C: expired entitlement, admin       -> cleared, not revoked.
        let now = Timestamp::now();
        let store = Arc::new(InMemoryUserStore::new());
        let directory = Arc::new(RecordingDirectory::new());

        seed_user(&store, 100, None).await;
        seed_user(&store, 200, Some(Entitlement::new(now.add_hours(1)))).await;
        seed_user(&store, 300, Some(Entitlement::new(now.add_hours(-1)))).await;
        for id in [100, 200, 300] {
            directory.set_status(UserId::new(id), MemberStatus::Member);
        }
        directory.add_admin(UserId::new(300));

        reconciler(store.clone(), directory.clone()).run_pass().await;

        assert_eq!(directory.revokes(), vec![UserId::new(100)]);
        let b = store.find_by_id(UserId::new(200)).await.unwrap().unwrap();
        assert!(b.entitlement.is_some());
        let c = store.find_by_id(UserId::new(300)).await.unwrap().unwrap();
        assert!(c.entitlement.is_none());
    }
}
