//! Presence reaper: periodic eviction of silent drivers.
//!
//! A driver that stops sending location updates stays dispatchable for
//! up to the staleness horizon plus one sweep interval; a driver that
//! reappears before the next sweep is never evicted. Each sweep is
//! idempotent against an already-clean index.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::domain::{DispatchEvent, DriverId, EventBus};
use crate::store::PresenceIndex;

/// Runs one reap cycle at the given instant, returning the evicted
/// driver identifiers.
pub async fn sweep(
    presence: &PresenceIndex,
    event_bus: &EventBus,
    stale_horizon: TimeDelta,
    now: DateTime<Utc>,
) -> Vec<DriverId> {
    let stale = presence.stale_before(now - stale_horizon).await;
    if stale.is_empty() {
        return stale;
    }

    let removed = presence.remove_many(&stale).await;
    tracing::info!(removed, "reaped stale drivers");

    let _ = event_bus.publish(DispatchEvent::DriversReaped {
        driver_ids: stale.clone(),
        timestamp: now,
    });
    stale
}

/// Runs the reaper on a fixed interval until the process exits.
pub async fn run_reaper(
    presence: Arc<PresenceIndex>,
    event_bus: EventBus,
    interval_secs: u64,
    stale_horizon_secs: u64,
) {
    let stale_horizon = TimeDelta::seconds(i64::try_from(stale_horizon_secs).unwrap_or(120));
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    // The first tick fires immediately; skip it so a fresh start does
    // not race the very first location updates.
    ticker.tick().await;

    tracing::info!(interval_secs, stale_horizon_secs, "presence reaper started");
    loop {
        ticker.tick().await;
        let _ = sweep(&presence, &event_bus, stale_horizon, Utc::now()).await;
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::GeoPoint;

    fn driver(name: &str) -> DriverId {
        DriverId::from_identity(name)
    }

    fn horizon() -> TimeDelta {
        TimeDelta::minutes(2)
    }

    #[tokio::test]
    async fn sweep_evicts_only_stale_drivers() {
        let presence = PresenceIndex::new();
        let bus = EventBus::new(64);
        let now = Utc::now();

        presence
            .upsert(driver("fresh"), GeoPoint::new(12.98, 77.60), now)
            .await;
        presence
            .upsert(
                driver("silent"),
                GeoPoint::new(12.99, 77.61),
                now - TimeDelta::minutes(3),
            )
            .await;

        let evicted = sweep(&presence, &bus, horizon(), now).await;
        assert_eq!(evicted, vec![driver("silent")]);
        assert_eq!(presence.len().await, 1);
        assert!(presence.position_of(&driver("fresh")).await.is_some());
    }

    #[tokio::test]
    async fn stale_driver_dispatchable_before_sweep_absent_after() {
        let presence = PresenceIndex::new();
        let bus = EventBus::new(64);
        let now = Utc::now();
        let center = GeoPoint::new(12.97, 77.59);

        presence
            .upsert(
                driver("silent"),
                GeoPoint::new(12.98, 77.60),
                now - TimeDelta::minutes(3),
            )
            .await;

        // Still dispatchable until the reaper runs.
        assert_eq!(presence.nearest_k(center, 50.0, 5).await.len(), 1);

        let _ = sweep(&presence, &bus, horizon(), now).await;
        assert!(presence.nearest_k(center, 50.0, 5).await.is_empty());
    }

    #[tokio::test]
    async fn sweep_is_idempotent() {
        let presence = PresenceIndex::new();
        let bus = EventBus::new(64);
        let now = Utc::now();

        presence
            .upsert(
                driver("silent"),
                GeoPoint::new(12.98, 77.60),
                now - TimeDelta::minutes(3),
            )
            .await;

        let first = sweep(&presence, &bus, horizon(), now).await;
        assert_eq!(first.len(), 1);
        let second = sweep(&presence, &bus, horizon(), now).await;
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn reappearing_driver_survives_the_sweep() {
        let presence = PresenceIndex::new();
        let bus = EventBus::new(64);
        let now = Utc::now();

        presence
            .upsert(
                driver("d1"),
                GeoPoint::new(12.98, 77.60),
                now - TimeDelta::minutes(3),
            )
            .await;
        // Driver comes back just before the sweep.
        presence
            .upsert(driver("d1"), GeoPoint::new(12.99, 77.61), now)
            .await;

        let evicted = sweep(&presence, &bus, horizon(), now).await;
        assert!(evicted.is_empty());
        assert_eq!(presence.len().await, 1);
    }

    #[tokio::test]
    async fn sweep_emits_reaped_event() {
        let presence = PresenceIndex::new();
        let bus = EventBus::new(64);
        let mut rx = bus.subscribe();
        let now = Utc::now();

        presence
            .upsert(
                driver("silent"),
                GeoPoint::new(12.98, 77.60),
                now - TimeDelta::minutes(3),
            )
            .await;

        let _ = sweep(&presence, &bus, horizon(), now).await;

        let event = rx.recv().await;
        let Ok(DispatchEvent::DriversReaped { driver_ids, .. }) = event else {
            panic!("expected reaped event");
        };
        assert_eq!(driver_ids, vec![driver("silent")]);
    }
}
