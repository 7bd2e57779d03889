//! Dispatch matcher: the ride-request queue consumer.
//!
//! Consumes one delivery at a time, geosearches the presence index
//! around the pickup point, and publishes one match offer per candidate
//! driver. A delivery is acknowledged implicitly by not handing it back:
//! poison input (malformed coordinates) is dropped because retrying
//! cannot fix it, while an empty candidate set goes back to the queue
//! under the bounded redelivery policy.

use std::sync::Arc;

use crate::domain::{DispatchEvent, EventBus, MatchOffer};
use crate::queue::{Delivery, RedeliveryOutcome, RideRequestConsumer, RideRequestQueue};
use crate::store::PresenceIndex;

/// How the matcher disposed of one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Offers were published for this many candidates and the message
    /// was acknowledged.
    Offered(usize),
    /// No drivers nearby; the message went back for redelivery.
    Requeued,
    /// No drivers nearby and the attempt budget is spent.
    DeadLettered,
    /// Malformed coordinates; the message was acknowledged and dropped.
    Poison,
}

/// Processes a single delivery against the presence index.
///
/// Split out of the consumer loop so the per-message policy is
/// observable in tests without running the loop.
pub async fn process_delivery(
    delivery: Delivery,
    queue: &RideRequestQueue,
    presence: &PresenceIndex,
    event_bus: &EventBus,
    radius_km: f64,
    max_candidates: usize,
) -> MatchOutcome {
    let message = &delivery.message;

    // Poison path: coordinates that can never geosearch successfully.
    if message.src.validate().is_err() || message.dest.validate().is_err() {
        tracing::warn!(
            ride_id = %message.ride_id,
            src_lat = message.src.lat,
            src_lng = message.src.lng,
            "dropping ride request with invalid coordinates"
        );
        return MatchOutcome::Poison;
    }

    let candidates = presence
        .nearest_k(message.src, radius_km, max_candidates)
        .await;

    if candidates.is_empty() {
        tracing::info!(
            ride_id = %message.ride_id,
            attempt = delivery.attempt,
            "no drivers nearby, handing request back"
        );
        return match queue.redeliver(delivery).await {
            RedeliveryOutcome::Requeued => MatchOutcome::Requeued,
            RedeliveryOutcome::DeadLettered => MatchOutcome::DeadLettered,
        };
    }

    let count = candidates.len();
    for candidate in candidates {
        tracing::info!(
            ride_id = %message.ride_id,
            driver_id = %candidate.driver_id,
            distance_km = candidate.distance_km,
            "publishing match offer"
        );
        let _ = event_bus.publish(DispatchEvent::OfferPublished(MatchOffer {
            ride_id: message.ride_id,
            driver_id: candidate.driver_id,
            passenger_id: message.passenger_id.clone(),
            src: message.src,
            dest: message.dest,
            distance: MatchOffer::format_distance(candidate.distance_km),
            start_time: message.start_time,
        }));
    }

    MatchOutcome::Offered(count)
}

/// Runs the matcher loop until the queue closes.
pub async fn run_matcher(
    mut consumer: RideRequestConsumer,
    queue: RideRequestQueue,
    presence: Arc<PresenceIndex>,
    event_bus: EventBus,
    radius_km: f64,
    max_candidates: usize,
) {
    tracing::info!(radius_km, max_candidates, "dispatch matcher started");
    while let Some(delivery) = consumer.recv().await {
        let _ = process_delivery(
            delivery,
            &queue,
            &presence,
            &event_bus,
            radius_km,
            max_candidates,
        )
        .await;
    }
    tracing::info!("dispatch matcher stopped: queue closed");
}
