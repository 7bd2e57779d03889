//! Offer fanout: routes published match offers to driver connections.
//!
//! Subscribes to the event bus and forwards each offer to the targeted
//! driver's live connection. Delivery is strictly best-effort: a driver
//! without a registered connection simply misses the offer — nothing is
//! retried or queued for later.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;

use super::messages::DriverMessage;
use super::registry::ConnectionRegistry;
use crate::domain::{DispatchEvent, MatchOffer};

/// What happened to a single offer delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// The push was handed to the driver's connection.
    Delivered,
    /// No live connection is registered for the driver; offer dropped.
    DriverOffline,
    /// The connection's write loop was gone or saturated; offer dropped.
    ConnectionGone,
}

/// Attempts to deliver one offer to its target driver.
pub async fn deliver_offer(offer: &MatchOffer, registry: &ConnectionRegistry) -> DeliveryStatus {
    let latency = (Utc::now().timestamp_millis() - offer.start_time).max(0);

    let Some(handle) = registry.lookup(&offer.driver_id).await else {
        tracing::info!(
            ride_id = %offer.ride_id,
            driver_id = %offer.driver_id,
            "driver not connected, dropping offer"
        );
        return DeliveryStatus::DriverOffline;
    };

    let push = DriverMessage::NewRideRequest {
        ride_id: offer.ride_id,
        src: offer.src,
        dest: offer.dest,
        distance: offer.distance.clone(),
        latency,
    };

    if handle.push(push).await.is_err() {
        tracing::warn!(
            ride_id = %offer.ride_id,
            driver_id = %offer.driver_id,
            "driver connection gone, dropping offer"
        );
        return DeliveryStatus::ConnectionGone;
    }

    tracing::info!(
        ride_id = %offer.ride_id,
        driver_id = %offer.driver_id,
        latency_ms = latency,
        "offer delivered"
    );
    DeliveryStatus::Delivered
}

/// Runs the fanout loop until the event bus closes.
pub async fn run_offer_router(
    mut events: broadcast::Receiver<DispatchEvent>,
    registry: Arc<ConnectionRegistry>,
) {
    tracing::info!("offer router started");
    loop {
        match events.recv().await {
            Ok(DispatchEvent::OfferPublished(offer)) => {
                let _ = deliver_offer(&offer, &registry).await;
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(lagged = n, "offer router lagged behind event bus");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    tracing::info!("offer router stopped: event bus closed");
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    use super::super::registry::{ConnectionId, DriverHandle};
    use crate::domain::{DriverId, EventBus, GeoPoint, RideId};

    fn make_offer(driver: &DriverId) -> MatchOffer {
        MatchOffer {
            ride_id: RideId::new(),
            driver_id: driver.clone(),
            passenger_id: "0xpassenger".to_string(),
            src: GeoPoint::new(12.97, 77.59),
            dest: GeoPoint::new(12.93, 77.62),
            distance: "2.40".to_string(),
            start_time: Utc::now().timestamp_millis(),
        }
    }

    #[tokio::test]
    async fn identified_driver_receives_offer() {
        let registry = ConnectionRegistry::new();
        // The client sends the bare identity; the offer carries the
        // normalized form. Both must land on the same key.
        let driver = DriverId::from_identity("d1");
        let (tx, mut rx) = mpsc::channel(8);
        registry
            .register(driver.clone(), DriverHandle::new(ConnectionId::next(), tx))
            .await;

        let offer = make_offer(&DriverId::from_identity("driver:d1"));
        let status = deliver_offer(&offer, &registry).await;
        assert_eq!(status, DeliveryStatus::Delivered);

        let push = rx.recv().await;
        let Some(DriverMessage::NewRideRequest {
            ride_id,
            distance,
            latency,
            ..
        }) = push
        else {
            panic!("expected ride request push");
        };
        assert_eq!(ride_id, offer.ride_id);
        assert_eq!(distance, "2.40");
        assert!(latency >= 0);
    }

    #[tokio::test]
    async fn offer_reaches_only_the_target_driver() {
        let registry = ConnectionRegistry::new();
        let d1 = DriverId::from_identity("d1");
        let d2 = DriverId::from_identity("d2");

        let (tx1, mut rx1) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);
        registry
            .register(d1.clone(), DriverHandle::new(ConnectionId::next(), tx1))
            .await;
        registry
            .register(d2.clone(), DriverHandle::new(ConnectionId::next(), tx2))
            .await;

        let status = deliver_offer(&make_offer(&d1), &registry).await;
        assert_eq!(status, DeliveryStatus::Delivered);

        assert!(rx1.recv().await.is_some());
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn disconnected_driver_misses_offer_silently() {
        let registry = ConnectionRegistry::new();
        let offer = make_offer(&DriverId::from_identity("ghost"));
        let status = deliver_offer(&offer, &registry).await;
        assert_eq!(status, DeliveryStatus::DriverOffline);
    }

    #[tokio::test]
    async fn dropped_write_loop_reports_connection_gone() {
        let registry = ConnectionRegistry::new();
        let driver = DriverId::from_identity("d1");
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        registry
            .register(driver.clone(), DriverHandle::new(ConnectionId::next(), tx))
            .await;

        let status = deliver_offer(&make_offer(&driver), &registry).await;
        assert_eq!(status, DeliveryStatus::ConnectionGone);
    }

    #[tokio::test]
    async fn router_loop_forwards_bus_offers() {
        let registry = Arc::new(ConnectionRegistry::new());
        let bus = EventBus::new(64);
        let events = bus.subscribe();

        let driver = DriverId::from_identity("d1");
        let (tx, mut rx) = mpsc::channel(8);
        registry
            .register(driver.clone(), DriverHandle::new(ConnectionId::next(), tx))
            .await;

        let router = tokio::spawn(run_offer_router(events, Arc::clone(&registry)));

        bus.publish(DispatchEvent::OfferPublished(make_offer(&driver)));

        let push = rx.recv().await;
        assert!(matches!(
            push,
            Some(DriverMessage::NewRideRequest { .. })
        ));

        router.abort();
    }
}
