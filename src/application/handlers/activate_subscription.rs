//! ActivateSubscriptionHandler - activates an entitlement from a verified
//! payment notification.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{Entitlement, SUCCESS_STATUS_THRESHOLD};
use crate::ports::{GroupDirectory, InviteLink, InviteNotifier, StoreError, UserStore};

/// Command to activate a subscription for a paying buyer.
#[derive(Debug, Clone)]
pub struct ActivateSubscriptionCommand {
    /// Buyer email as reported by the payment provider.
    pub buyer_email: String,
    /// Provider status code; values at or above 100 indicate success.
    pub status: i32,
}

/// Result of processing a payment notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// Entitlement persisted and invite delivered.
    Activated {
        expires_at: Timestamp,
        invite: InviteLink,
    },
    /// Entitlement persisted, but invite creation or delivery failed.
    ///
    /// The write is never rolled back for a failed invite: the user has
    /// paid, and the reconciler treats them as entitled either way.
    PartialInvite { expires_at: Timestamp },
    /// The notification references an email no user record carries.
    /// Reported and acknowledged, not retried.
    UnknownBuyer,
    /// Non-terminal provider status; nothing to do.
    Ignored,
}

/// Errors that abort activation before any entitlement is persisted.
#[derive(Debug, Error)]
pub enum ActivationError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Handler for verified payment notifications.
///
/// Activation replaces the expiration outright: `now + period` regardless of
/// any prior expiry. There is no transaction-id dedup, so a replayed success
/// notification resets the expiration forward again; renewals arrive through
/// the same path.
pub struct ActivateSubscriptionHandler {
    store: Arc<dyn UserStore>,
    directory: Arc<dyn GroupDirectory>,
    notifier: Arc<dyn InviteNotifier>,
    subscription_days: i64,
}

impl ActivateSubscriptionHandler {
    pub fn new(
        store: Arc<dyn UserStore>,
        directory: Arc<dyn GroupDirectory>,
        notifier: Arc<dyn InviteNotifier>,
        subscription_days: i64,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            subscription_days,
        }
    }

    pub async fn handle(
        &self,
        cmd: ActivateSubscriptionCommand,
    ) -> Result<ActivationOutcome, ActivationError> {
        if cmd.status < SUCCESS_STATUS_THRESHOLD {
            tracing::debug!(status = cmd.status, "non-terminal payment status, ignoring");
            return Ok(ActivationOutcome::Ignored);
        }

        let user = match self.store.find_by_email(&cmd.buyer_email).await? {
            Some(user) => user,
            None => {
                tracing::warn!(email = %cmd.buyer_email, "payment for unknown buyer");
                return Ok(ActivationOutcome::UnknownBuyer);
            }
        };

        let now = Timestamp::now();
        let entitlement = Entitlement::starting_now(now, self.subscription_days);
        self.store
            .set_entitlement(user.user_id, Some(entitlement))
            .await?;

        tracing::info!(
            user_id = %user.user_id,
            expires_at = %entitlement.expires_at,
            "subscription activated"
        );

        // Entitlement is authoritative from here on; invite issuance and
        // delivery are best-effort.
        let invite = match self.directory.create_single_use_invite(user.user_id).await {
            Ok(invite) => invite,
            Err(err) => {
                tracing::warn!(user_id = %user.user_id, error = %err, "invite creation failed");
                return Ok(ActivationOutcome::PartialInvite {
                    expires_at: entitlement.expires_at,
                });
            }
        };

        if let Err(err) = self
            .notifier
            .send_invite(user.chat_id, &invite, self.subscription_days)
            .await
        {
            tracing::warn!(user_id = %user.user_id, error = %err, "invite delivery failed");
            return Ok(ActivationOutcome::PartialInvite {
                expires_at: entitlement.expires_at,
            });
        }

        Ok(ActivationOutcome::Activated {
            expires_at: entitlement.expires_at,
            invite,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryUserStore, RecordingDirectory, RecordingNotifier};
    use crate::domain::foundation::{ChatId, UserId};
    use crate::domain::subscription::NewUserRecord;

    const DAYS: i64 = 7;

    async fn seeded_store() -> Arc<InMemoryUserStore> {
        let store = Arc::new(InMemoryUserStore::new());
        store
            .create(NewUserRecord {
                chat_id: ChatId::new(10),
                user_id: UserId::new(10),
                full_name: "Ada".to_string(),
                username: "ada".to_string(),
                lang: "en".to_string(),
            })
            .await
            .unwrap();
        store.set_email(UserId::new(10), "a@x.com");
        store
    }

    fn handler(
        store: Arc<InMemoryUserStore>,
        directory: Arc<RecordingDirectory>,
        notifier: Arc<RecordingNotifier>,
    ) -> ActivateSubscriptionHandler {
        ActivateSubscriptionHandler::new(store, directory, notifier, DAYS)
    }

    #[tokio::test]
    async fn success_status_activates_and_invites() {
        let store = seeded_store().await;
        let directory = Arc::new(RecordingDirectory::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let h = handler(store.clone(), directory.clone(), notifier.clone());

        let before = Timestamp::now();
        let outcome = h
            .handle(ActivateSubscriptionCommand {
                buyer_email: "a@x.com".to_string(),
                status: 101,
            })
            .await
            .unwrap();
        let after = Timestamp::now();

        match outcome {
            ActivationOutcome::Activated { expires_at, .. } => {
                assert!(!expires_at.is_before(&before.add_days(DAYS)));
                assert!(!expires_at.is_after(&after.add_days(DAYS)));
            }
            other => panic!("expected Activated, got {:?}", other),
        }
        assert_eq!(directory.invites_for(), vec![UserId::new(10)]);
        assert_eq!(notifier.deliveries().len(), 1);

        let stored = store.find_by_id(UserId::new(10)).await.unwrap().unwrap();
        assert!(stored.entitlement.is_some());
    }

    #[tokio::test]
    async fn below_threshold_is_a_no_op() {
        let store = seeded_store().await;
        let directory = Arc::new(RecordingDirectory::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let h = handler(store.clone(), directory.clone(), notifier);

        let outcome = h
            .handle(ActivateSubscriptionCommand {
                buyer_email: "a@x.com".to_string(),
                status: 42,
            })
            .await
            .unwrap();

        assert_eq!(outcome, ActivationOutcome::Ignored);
        assert!(directory.invites_for().is_empty());
        let stored = store.find_by_id(UserId::new(10)).await.unwrap().unwrap();
        assert!(stored.entitlement.is_none());
    }

    #[tokio::test]
    async fn unknown_buyer_mutates_nothing() {
        let store = seeded_store().await;
        let directory = Arc::new(RecordingDirectory::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let h = handler(store, directory.clone(), notifier);

        let outcome = h
            .handle(ActivateSubscriptionCommand {
                buyer_email: "nobody@x.com".to_string(),
                status: 100,
            })
            .await
            .unwrap();

        assert_eq!(outcome, ActivationOutcome::UnknownBuyer);
        assert!(directory.invites_for().is_empty());
    }

    #[tokio::test]
    async fn replay_replaces_rather_than_extends() {
        let store = seeded_store().await;
        let directory = Arc::new(RecordingDirectory::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let h = handler(store.clone(), directory, notifier);

        let cmd = ActivateSubscriptionCommand {
            buyer_email: "a@x.com".to_string(),
            status: 100,
        };
        h.handle(cmd.clone()).await.unwrap();
        let outcome = h.handle(cmd).await.unwrap();

        // Second activation yields now + period again, never now + 2*period.
        let ceiling = Timestamp::now().add_days(DAYS);
        match outcome {
            ActivationOutcome::Activated { expires_at, .. } => {
                assert!(!expires_at.is_after(&ceiling));
            }
            other => panic!("expected Activated, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn invite_failure_keeps_entitlement() {
        let store = seeded_store().await;
        let directory = Arc::new(RecordingDirectory::new());
        directory.fail_invites();
        let notifier = Arc::new(RecordingNotifier::new());
        let h = handler(store.clone(), directory, notifier.clone());

        let outcome = h
            .handle(ActivateSubscriptionCommand {
                buyer_email: "a@x.com".to_string(),
                status: 100,
            })
            .await
            .unwrap();

        assert!(matches!(outcome, ActivationOutcome::PartialInvite { .. }));
        assert!(notifier.deliveries().is_empty());
        let stored = store.find_by_id(UserId::new(10)).await.unwrap().unwrap();
        assert!(stored.entitlement.is_some(), "entitlement must survive invite failure");
    }

    #[tokio::test]
    async fn delivery_failure_keeps_entitlement() {
        let store = seeded_store().await;
        let directory = Arc::new(RecordingDirectory::new());
        let notifier = Arc::new(RecordingNotifier::new());
        notifier.fail_deliveries();
        let h = handler(store.clone(), directory, notifier);

        let outcome = h
            .handle(ActivateSubscriptionCommand {
                buyer_email: "a@x.com".to_string(),
                status: 100,
            })
            .await
            .unwrap();

        assert!(matches!(outcome, ActivationOutcome::PartialInvite { .. }));
        let stored = store.find_by_id(UserId::new(10)).await.unwrap().unwrap();
        assert!(stored.entitlement.is_some());
    }
}
