//! Exclusive, time-bounded assignment arbitration.
//!
//! The arbiter is the system's only ordering primitive: a single
//! create-if-absent write per ride, linearized under the lock table's
//! write lock. Whichever driver performs the creation wins; everyone
//! else loses, no matter how many acceptance calls race. The lock — not
//! the ride record — is the source of truth for who won.
//!
//! Locks carry a bounded lifetime. An expired lock is treated as absent,
//! which caps how long a ride stays soft-reserved for a driver that
//! never finished accepting.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;

use crate::domain::{DriverId, RideId};

/// Result of a [`AssignmentArbiter::try_assign`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOutcome {
    /// This call created the lock; the caller owns the assignment and
    /// must move the ride record to `Assigned`.
    Won,
    /// Another driver holds a live lock; the caller must not touch the
    /// ride record.
    Lost,
}

#[derive(Debug, Clone)]
struct AssignmentLock {
    driver_id: DriverId,
    expires_at: DateTime<Utc>,
}

/// Per-ride exclusive lock table with TTL semantics.
#[derive(Debug, Default)]
pub struct AssignmentArbiter {
    locks: RwLock<HashMap<RideId, AssignmentLock>>,
}

impl AssignmentArbiter {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to commit `driver_id` to `ride_id`.
    ///
    /// Create-if-absent: returns [`AssignmentOutcome::Won`] iff this
    /// call created the lock (including replacing one that had already
    /// expired). A live lock — held by anyone, the same driver included
    /// — yields [`AssignmentOutcome::Lost`].
    pub async fn try_assign(
        &self,
        ride_id: RideId,
        driver_id: &DriverId,
        ttl: TimeDelta,
        now: DateTime<Utc>,
    ) -> AssignmentOutcome {
        let mut locks = self.locks.write().await;
        if let Some(existing) = locks.get(&ride_id)
            && existing.expires_at > now
        {
            return AssignmentOutcome::Lost;
        }
        locks.insert(
            ride_id,
            AssignmentLock {
                driver_id: driver_id.clone(),
                expires_at: now + ttl,
            },
        );
        AssignmentOutcome::Won
    }

    /// Returns the current live lock holder for the ride, if any.
    pub async fn holder(&self, ride_id: RideId, now: DateTime<Utc>) -> Option<DriverId> {
        let locks = self.locks.read().await;
        locks
            .get(&ride_id)
            .filter(|lock| lock.expires_at > now)
            .map(|lock| lock.driver_id.clone())
    }

    /// Drops expired locks. Optional housekeeping; `try_assign` already
    /// treats expired entries as absent.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut locks = self.locks.write().await;
        let before = locks.len();
        locks.retain(|_, lock| lock.expires_at > now);
        before - locks.len()
    }
}
