//! Entitlement value object.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// A user's time-bounded right to remain in the controlled group.
///
/// An entitlement past its expiration is logically inactive even while it is
/// still present in storage; the reconciler clears the stale record on its
/// next pass, so storage and logical truth diverge by at most one
/// reconciliation interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    /// Absolute instant at which access decays.
    pub expires_at: Timestamp,
}

impl Entitlement {
    pub fn new(expires_at: Timestamp) -> Self {
        Self { expires_at }
    }

    /// Computes a fresh entitlement running `days` from `now`.
    ///
    /// Activation replaces rather than extends: a renewal during an active
    /// period yields `now + days`, not `old_expiry + days`.
    pub fn starting_now(now: Timestamp, days: i64) -> Self {
        Self {
            expires_at: now.add_days(days),
        }
    }

    /// True while the expiration instant is still in the future.
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.expires_at.is_after(&now)
    }
}
