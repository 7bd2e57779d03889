//! Durable ride record storage keyed by ride identifier.
//!
//! All operations are single-key read/write; there are no cross-key
//! transactions. Updates run a caller-supplied mutator under the store's
//! write lock, so concurrent mutators on the same record are serialized
//! here, while the read-copy semantics of [`RideStore::get`] remain
//! last-write-wins for callers that read first and write later.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use crate::domain::{RideId, RideRecord};
use crate::error::DispatchError;

/// Central store for all ride records plus the completed/paid
/// membership sets kept for audit queries.
///
/// Records are created by intake, mutated by assignment, completion,
/// and payment updates, and never deleted.
#[derive(Debug, Default)]
pub struct RideStore {
    records: RwLock<HashMap<RideId, RideRecord>>,
    completed: RwLock<HashSet<RideId>>,
    paid: RwLock<HashSet<RideId>>,
}

impl RideStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a freshly booked record.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidRequest`] if a record with the
    /// same ride ID already exists (should never happen with UUID v4).
    pub async fn create(&self, record: RideRecord) -> Result<RideId, DispatchError> {
        let ride_id = record.ride_id;
        let mut map = self.records.write().await;
        if map.contains_key(&ride_id) {
            return Err(DispatchError::InvalidRequest(format!(
                "ride {ride_id} already exists"
            )));
        }
        map.insert(ride_id, record);
        Ok(ride_id)
    }

    /// Returns a copy of the record for the given ride.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::RideNotFound`] if no record exists.
    pub async fn get(&self, ride_id: RideId) -> Result<RideRecord, DispatchError> {
        let map = self.records.read().await;
        map.get(&ride_id)
            .cloned()
            .ok_or(DispatchError::RideNotFound(ride_id))
    }

    /// Applies a fallible mutator to the record under the write lock and
    /// returns the updated copy.
    ///
    /// The mutator sees the current record state, so lifecycle guards
    /// (status checks, driver authorization) evaluated inside it cannot
    /// race with other updates to the same record.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::RideNotFound`] if no record exists, or
    /// whatever error the mutator itself produces — in which case the
    /// record is left unchanged.
    pub async fn update<F>(&self, ride_id: RideId, mutator: F) -> Result<RideRecord, DispatchError>
    where
        F: FnOnce(&mut RideRecord) -> Result<(), DispatchError>,
    {
        let mut map = self.records.write().await;
        let record = map
            .get_mut(&ride_id)
            .ok_or(DispatchError::RideNotFound(ride_id))?;
        let mut staged = record.clone();
        mutator(&mut staged)?;
        *record = staged.clone();
        Ok(staged)
    }

    /// Adds a ride to the completed-rides membership set.
    pub async fn mark_completed(&self, ride_id: RideId) {
        self.completed.write().await.insert(ride_id);
    }

    /// Adds a ride to the paid-rides membership set.
    pub async fn mark_paid(&self, ride_id: RideId) {
        self.paid.write().await.insert(ride_id);
    }

    /// Returns `true` if the ride is in the completed set.
    pub async fn is_completed(&self, ride_id: RideId) -> bool {
        self.completed.read().await.contains(&ride_id)
    }

    /// Returns `true` if the ride is in the paid set.
    pub async fn is_paid(&self, ride_id: RideId) -> bool {
        self.paid.read().await.contains(&ride_id)
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` if the store contains no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}
