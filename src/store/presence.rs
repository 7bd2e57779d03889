//! Live driver presence index with geospatial lookup and freshness.
//!
//! Each entry holds both the driver's last position and the timestamp of
//! its last update, written together under one lock. Keeping position
//! and freshness in a single entry closes the original deployment's
//! window where a crash between the geo write and the freshness write
//! left a driver geolocatable but never reaped (or the reverse).
//!
//! Absence from this index means "not dispatchable", not "unknown
//! driver" — entries appear on the first location update and vanish when
//! the reaper or an explicit disconnect removes them.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::{DriverId, GeoPoint};

/// A driver's last known position and freshness timestamp.
#[derive(Debug, Clone, Copy)]
struct PresenceEntry {
    position: GeoPoint,
    last_updated: DateTime<Utc>,
}

/// A nearest-k result: a dispatchable driver with its distance from the
/// search center.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyDriver {
    /// Driver identifier.
    pub driver_id: DriverId,
    /// Great-circle distance from the search center in kilometres.
    pub distance_km: f64,
}

/// Geospatial index of live driver positions.
#[derive(Debug, Default)]
pub struct PresenceIndex {
    drivers: RwLock<HashMap<DriverId, PresenceEntry>>,
}

impl PresenceIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes (or overwrites) a driver's position and freshness as one
    /// atomic entry.
    pub async fn upsert(&self, driver_id: DriverId, position: GeoPoint, now: DateTime<Utc>) {
        let mut map = self.drivers.write().await;
        map.insert(
            driver_id,
            PresenceEntry {
                position,
                last_updated: now,
            },
        );
    }

    /// Returns up to `k` drivers within `radius_km` of `center`,
    /// ascending by distance. Results contain no duplicate identifiers
    /// because each driver holds exactly one entry.
    pub async fn nearest_k(&self, center: GeoPoint, radius_km: f64, k: usize) -> Vec<NearbyDriver> {
        let map = self.drivers.read().await;
        let mut candidates: Vec<NearbyDriver> = map
            .iter()
            .filter_map(|(driver_id, entry)| {
                let distance_km = center.distance_km(&entry.position);
                (distance_km <= radius_km).then(|| NearbyDriver {
                    driver_id: driver_id.clone(),
                    distance_km,
                })
            })
            .collect();
        candidates.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(Ordering::Equal)
        });
        candidates.truncate(k);
        candidates
    }

    /// Returns the driver's last known position, if present.
    pub async fn position_of(&self, driver_id: &DriverId) -> Option<GeoPoint> {
        let map = self.drivers.read().await;
        map.get(driver_id).map(|entry| entry.position)
    }

    /// Returns drivers whose last update is strictly older than `cutoff`.
    pub async fn stale_before(&self, cutoff: DateTime<Utc>) -> Vec<DriverId> {
        let map = self.drivers.read().await;
        map.iter()
            .filter(|(_, entry)| entry.last_updated < cutoff)
            .map(|(driver_id, _)| driver_id.clone())
            .collect()
    }

    /// Removes the given drivers from the index, returning how many
    /// entries were actually removed. A no-op for absent identifiers.
    pub async fn remove_many(&self, driver_ids: &[DriverId]) -> usize {
        let mut map = self.drivers.write().await;
        driver_ids
            .iter()
            .filter(|id| map.remove(*id).is_some())
            .count()
    }

    /// Returns the number of live entries.
    pub async fn len(&self) -> usize {
        self.drivers.read().await.len()
    }

    /// Returns `true` if the index has no live entries.
    pub async fn is_empty(&self) -> bool {
        self.drivers.read().await.is_empty()
    }
}
