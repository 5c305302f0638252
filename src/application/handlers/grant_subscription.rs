//! GrantSubscriptionHandler - manual entitlement grant by an operator.
//!
//! The operator-facing conversation that collects the target id and duration
//! lives outside this crate; this is the underlying operation it lands on.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::Entitlement;
use crate::ports::{StoreError, UserStore};

/// Command to grant a subscription of `hours` to an existing user.
#[derive(Debug, Clone)]
pub struct GrantSubscriptionCommand {
    pub user_id: UserId,
    pub hours: i64,
}

/// Result of a manual grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantOutcome {
    Granted { expires_at: Timestamp },
    /// No record exists for the target id; nothing was written.
    UnknownUser,
}

pub struct GrantSubscriptionHandler {
    store: Arc<dyn UserStore>,
}

impl GrantSubscriptionHandler {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        cmd: GrantSubscriptionCommand,
    ) -> Result<GrantOutcome, StoreError> {
        if self.store.find_by_id(cmd.user_id).await?.is_none() {
            return Ok(GrantOutcome::UnknownUser);
        }

        let expires_at = Timestamp::now().add_hours(cmd.hours);
        self.store
            .set_entitlement(cmd.user_id, Some(Entitlement::new(expires_at)))
            .await?;

        tracing::info!(user_id = %cmd.user_id, hours = cmd.hours, "subscription granted manually");
        Ok(GrantOutcome::Granted { expires_at })
    }
}
