//! Persistence layer: PostgreSQL event log and ride snapshots.
//!
//! Durable storage for the dispatch event stream plus periodic ride
//! record snapshots. The writer subscribes to the event bus, so
//! persistence never sits on the request path: a database outage slows
//! nothing down and loses at most the events the ring buffer drops.

pub mod models;
pub mod postgres;

use tokio::sync::broadcast;

use crate::domain::DispatchEvent;
use crate::store::RideStore;
use postgres::PostgresPersistence;

/// Runs the event-log writer until the event bus closes.
///
/// Every event is appended to the `events` table; events that change a
/// ride record additionally snapshot the record's current state.
pub async fn run_event_writer(
    persistence: PostgresPersistence,
    mut events: broadcast::Receiver<DispatchEvent>,
    rides: std::sync::Arc<RideStore>,
) {
    tracing::info!("persistence event writer started");
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(lagged = n, "event writer lagged, events lost");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        let payload = match serde_json::to_value(&event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode event for persistence");
                continue;
            }
        };

        if let Err(e) = persistence
            .save_event(event.ride_id(), event.event_type_str(), &payload)
            .await
        {
            tracing::error!(error = %e, "failed to persist event");
        }

        // Mutating events also snapshot the record they touched.
        let snapshot_worthy = matches!(
            event,
            DispatchEvent::RideAssigned { .. }
                | DispatchEvent::RideCompleted { .. }
                | DispatchEvent::PaymentRecorded { .. }
        );
        if snapshot_worthy && let Some(ride_id) = event.ride_id() {
            match rides.get(ride_id).await {
                Ok(record) => {
                    if let Err(e) = persistence.save_ride_snapshot(&record).await {
                        tracing::error!(error = %e, %ride_id, "failed to snapshot ride");
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, %ride_id, "record missing for snapshot");
                }
            }
        }
    }
    tracing::info!("persistence event writer stopped: event bus closed");
}
