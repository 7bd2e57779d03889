//! Dispatch service: orchestrates booking, arbitration, and lifecycle
//! updates, emitting events for every state mutation.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};

use crate::domain::{
    DispatchEvent, DriverId, EventBus, GeoPoint, RideId, RideRecord, RideStatus,
};
use crate::error::DispatchError;
use crate::queue::{RideRequestMessage, RideRequestQueue};
use crate::store::{AssignmentArbiter, AssignmentOutcome, PresenceIndex, RideStore};

/// Orchestration layer for all ride operations.
///
/// Stateless coordinator: owns references to the ride store, presence
/// index, and arbiter for state, the queue for dispatch, and the event
/// bus for emission. Every mutation method follows the pattern: arbitrate
/// or validate → update the record → emit an event → return the result.
#[derive(Debug, Clone)]
pub struct DispatchService {
    rides: Arc<RideStore>,
    presence: Arc<PresenceIndex>,
    arbiter: Arc<AssignmentArbiter>,
    queue: RideRequestQueue,
    event_bus: EventBus,
    assignment_ttl: TimeDelta,
}

impl DispatchService {
    /// Creates a new `DispatchService`.
    #[must_use]
    pub fn new(
        rides: Arc<RideStore>,
        presence: Arc<PresenceIndex>,
        arbiter: Arc<AssignmentArbiter>,
        queue: RideRequestQueue,
        event_bus: EventBus,
        assignment_ttl_secs: u64,
    ) -> Self {
        Self {
            rides,
            presence,
            arbiter,
            queue,
            event_bus,
            assignment_ttl: TimeDelta::seconds(i64::try_from(assignment_ttl_secs).unwrap_or(60)),
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the ride store.
    #[must_use]
    pub fn rides(&self) -> &Arc<RideStore> {
        &self.rides
    }

    /// Returns a reference to the presence index.
    #[must_use]
    pub fn presence(&self) -> &Arc<PresenceIndex> {
        &self.presence
    }

    /// Books a ride: creates the `Pending` record and enqueues the
    /// request message for the matcher.
    ///
    /// Coordinates are forwarded as received; the matcher is the
    /// enforcement point for malformed geodata, since the queue accepts
    /// at-least-once input from any producer.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::QueueUnavailable`] if the request cannot
    /// be enqueued.
    pub async fn book_ride(
        &self,
        passenger_id: String,
        src: GeoPoint,
        dest: GeoPoint,
        vehicle_type: String,
        price: f64,
    ) -> Result<RideId, DispatchError> {
        let ride_id = RideId::new();
        let now = Utc::now();

        let record = RideRecord::new_pending(
            ride_id,
            passenger_id.clone(),
            src,
            dest,
            price,
            vehicle_type.clone(),
            now,
        );
        self.rides.create(record).await?;

        self.queue
            .publish(RideRequestMessage {
                src,
                dest,
                vehicle_type,
                price,
                passenger_id: passenger_id.clone(),
                ride_id,
                start_time: now.timestamp_millis(),
            })
            .await?;

        let _ = self.event_bus.publish(DispatchEvent::RideBooked {
            ride_id,
            passenger_id,
            timestamp: now,
        });

        tracing::info!(%ride_id, "ride booked");
        Ok(ride_id)
    }

    /// Returns the ride record plus the assigned driver's live position
    /// when one is known.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::RideNotFound`] for unknown rides.
    pub async fn ride_status(
        &self,
        ride_id: RideId,
    ) -> Result<(RideRecord, Option<GeoPoint>), DispatchError> {
        let record = self.rides.get(ride_id).await?;
        let driver_position = match &record.driver_id {
            Some(driver_id) => self.presence.position_of(driver_id).await,
            None => None,
        };
        Ok((record, driver_position))
    }

    /// Driver acceptance: race through the arbiter, and only on a win
    /// move the record to `Assigned`.
    ///
    /// The record is never touched on the losing path, and a win against
    /// a ride that already completed is surfaced as a conflict rather
    /// than a status regression.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::RideNotFound`] for unknown rides.
    /// - [`DispatchError::AssignmentConflict`] when another driver holds
    ///   the lock.
    /// - [`DispatchError::InvalidTransition`] when the ride already
    ///   completed.
    pub async fn accept_ride(
        &self,
        ride_id: RideId,
        driver_identity: &str,
    ) -> Result<RideRecord, DispatchError> {
        let driver_id = DriverId::from_identity(driver_identity);
        let now = Utc::now();

        // Reject unknown rides before taking the lock.
        let _ = self.rides.get(ride_id).await?;

        let outcome = self
            .arbiter
            .try_assign(ride_id, &driver_id, self.assignment_ttl, now)
            .await;
        if outcome == AssignmentOutcome::Lost {
            tracing::info!(%ride_id, %driver_id, "assignment race lost");
            return Err(DispatchError::AssignmentConflict(ride_id));
        }

        let updated = self
            .rides
            .update(ride_id, |record| {
                if record.status == RideStatus::Completed {
                    return Err(DispatchError::InvalidTransition {
                        ride_id,
                        current: record.status,
                        attempted: "assign",
                    });
                }
                record.assign(driver_id.clone());
                Ok(())
            })
            .await?;

        let _ = self.event_bus.publish(DispatchEvent::RideAssigned {
            ride_id,
            driver_id: driver_id.clone(),
            timestamp: now,
        });

        tracing::info!(%ride_id, %driver_id, "ride assigned");
        Ok(updated)
    }

    /// Ride completion by the assigned driver.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::RideNotFound`] for unknown rides.
    /// - [`DispatchError::UnauthorizedDriver`] when the caller is not
    ///   the ride's assigned driver; the record is left unchanged.
    /// - [`DispatchError::InvalidTransition`] when the ride is not
    ///   currently `Assigned`.
    pub async fn complete_ride(
        &self,
        ride_id: RideId,
        driver_identity: &str,
    ) -> Result<RideRecord, DispatchError> {
        let driver_id = DriverId::from_identity(driver_identity);
        let now = Utc::now();

        let updated = self
            .rides
            .update(ride_id, |record| {
                if !record.is_assigned_to(&driver_id) {
                    return Err(DispatchError::UnauthorizedDriver(ride_id));
                }
                if record.status != RideStatus::Assigned {
                    return Err(DispatchError::InvalidTransition {
                        ride_id,
                        current: record.status,
                        attempted: "complete",
                    });
                }
                record.complete(now);
                Ok(())
            })
            .await?;

        self.rides.mark_completed(ride_id).await;

        let _ = self.event_bus.publish(DispatchEvent::RideCompleted {
            ride_id,
            driver_id: driver_id.clone(),
            timestamp: now,
        });

        tracing::info!(%ride_id, %driver_id, "ride completed");
        Ok(updated)
    }

    /// Records the payment outcome reported for a ride.
    ///
    /// Settlement correctness is out of scope; the fields are stored as
    /// reported and a `"PAID"` status additionally marks the ride in the
    /// paid set.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::RideNotFound`] for unknown rides.
    pub async fn record_payment(
        &self,
        ride_id: RideId,
        payment_status: String,
        tx_hash: String,
        chain_id: u64,
    ) -> Result<RideRecord, DispatchError> {
        let now = Utc::now();
        let status_for_event = payment_status.clone();

        let updated = self
            .rides
            .update(ride_id, |record| {
                record.record_payment(payment_status, tx_hash, chain_id, now);
                Ok(())
            })
            .await?;

        if updated.payment_status.as_deref() == Some("PAID") {
            self.rides.mark_paid(ride_id).await;
        }

        let _ = self.event_bus.publish(DispatchEvent::PaymentRecorded {
            ride_id,
            payment_status: status_for_event,
            timestamp: now,
        });

        tracing::info!(%ride_id, "payment recorded");
        Ok(updated)
    }

    /// Driver location update: one atomic presence write covering both
    /// position and freshness.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidCoordinates`] for out-of-range
    /// input.
    pub async fn update_location(
        &self,
        driver_identity: &str,
        position: GeoPoint,
    ) -> Result<(), DispatchError> {
        position.validate()?;
        let driver_id = DriverId::from_identity(driver_identity);
        self.presence.upsert(driver_id, position, Utc::now()).await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::queue::RideRequestConsumer;

    fn make_service() -> (DispatchService, RideRequestConsumer) {
        let (queue, consumer) = RideRequestQueue::new(16, 3, Duration::ZERO);
        let service = DispatchService::new(
            Arc::new(RideStore::new()),
            Arc::new(PresenceIndex::new()),
            Arc::new(AssignmentArbiter::new()),
            queue,
            EventBus::new(64),
            60,
        );
        (service, consumer)
    }

    async fn book(service: &DispatchService) -> RideId {
        let result = service
            .book_ride(
                "0xpassenger".to_string(),
                GeoPoint::new(12.97, 77.59),
                GeoPoint::new(12.93, 77.62),
                "sedan".to_string(),
                180.0,
            )
            .await;
        let Ok(ride_id) = result else {
            panic!("booking failed");
        };
        ride_id
    }

    #[tokio::test]
    async fn book_creates_pending_record_and_enqueues() {
        let (service, mut consumer) = make_service();
        let ride_id = book(&service).await;

        let (record, position) = match service.ride_status(ride_id).await {
            Ok(pair) => pair,
            Err(e) => panic!("status failed: {e}"),
        };
        assert_eq!(record.status, RideStatus::Pending);
        assert!(position.is_none());

        let Some(delivery) = consumer.recv().await else {
            panic!("expected queued request");
        };
        assert_eq!(delivery.message.ride_id, ride_id);
        assert_eq!(delivery.message.passenger_id, "0xpassenger");
    }

    #[tokio::test]
    async fn concurrent_accepts_have_one_winner() {
        let (service, _consumer) = make_service();
        let ride_id = book(&service).await;

        let s1 = service.clone();
        let s2 = service.clone();
        let (r1, r2) = tokio::join!(
            s1.accept_ride(ride_id, "d1"),
            s2.accept_ride(ride_id, "d2"),
        );

        let winners = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);

        let loser = if r1.is_err() { r1 } else { r2 };
        assert!(matches!(
            loser,
            Err(DispatchError::AssignmentConflict(_))
        ));

        let (record, _) = match service.ride_status(ride_id).await {
            Ok(pair) => pair,
            Err(e) => panic!("status failed: {e}"),
        };
        assert_eq!(record.status, RideStatus::Assigned);
        assert!(record.driver_id.is_some());
    }

    #[tokio::test]
    async fn losing_accept_does_not_touch_record() {
        let (service, _consumer) = make_service();
        let ride_id = book(&service).await;

        let won = service.accept_ride(ride_id, "d1").await;
        assert!(won.is_ok());

        let lost = service.accept_ride(ride_id, "d2").await;
        assert!(lost.is_err());

        let (record, _) = match service.ride_status(ride_id).await {
            Ok(pair) => pair,
            Err(e) => panic!("status failed: {e}"),
        };
        assert!(record.is_assigned_to(&DriverId::from_identity("d1")));
    }

    #[tokio::test]
    async fn accept_unknown_ride_is_not_found() {
        let (service, _consumer) = make_service();
        let result = service.accept_ride(RideId::new(), "d1").await;
        assert!(matches!(result, Err(DispatchError::RideNotFound(_))));
    }

    #[tokio::test]
    async fn complete_by_wrong_driver_is_unauthorized_and_unchanged() {
        let (service, _consumer) = make_service();
        let ride_id = book(&service).await;
        let _ = service.accept_ride(ride_id, "d1").await;

        let result = service.complete_ride(ride_id, "d2").await;
        assert!(matches!(
            result,
            Err(DispatchError::UnauthorizedDriver(_))
        ));

        let (record, _) = match service.ride_status(ride_id).await {
            Ok(pair) => pair,
            Err(e) => panic!("status failed: {e}"),
        };
        assert_eq!(record.status, RideStatus::Assigned);
        assert!(record.completed_at.is_none());
    }

    #[tokio::test]
    async fn complete_by_assigned_driver_succeeds() {
        let (service, _consumer) = make_service();
        let ride_id = book(&service).await;
        let _ = service.accept_ride(ride_id, "d1").await;

        let result = service.complete_ride(ride_id, "d1").await;
        let Ok(record) = result else {
            panic!("completion failed");
        };
        assert_eq!(record.status, RideStatus::Completed);
        assert!(record.completed_at.is_some());
        assert!(service.rides().is_completed(ride_id).await);
    }

    #[tokio::test]
    async fn complete_pending_ride_is_rejected() {
        let (service, _consumer) = make_service();
        let ride_id = book(&service).await;

        // No driver assigned yet, so any caller fails authorization.
        let result = service.complete_ride(ride_id, "d1").await;
        assert!(result.is_err());

        let (record, _) = match service.ride_status(ride_id).await {
            Ok(pair) => pair,
            Err(e) => panic!("status failed: {e}"),
        };
        assert_eq!(record.status, RideStatus::Pending);
    }

    #[tokio::test]
    async fn status_never_regresses_after_completion() {
        let (service, _consumer) = make_service();
        let ride_id = book(&service).await;
        let _ = service.accept_ride(ride_id, "d1").await;
        let _ = service.complete_ride(ride_id, "d1").await;

        // Lock has expired semantics aside, a completed ride must not be
        // re-assignable.
        tokio::time::sleep(Duration::from_millis(5)).await;
        let result = service.accept_ride(ride_id, "d2").await;
        assert!(result.is_err());

        let (record, _) = match service.ride_status(ride_id).await {
            Ok(pair) => pair,
            Err(e) => panic!("status failed: {e}"),
        };
        assert_eq!(record.status, RideStatus::Completed);
        assert!(record.is_assigned_to(&DriverId::from_identity("d1")));
    }

    #[tokio::test]
    async fn payment_update_marks_paid_set() {
        let (service, _consumer) = make_service();
        let ride_id = book(&service).await;

        let result = service
            .record_payment(ride_id, "PAID".to_string(), "0xhash".to_string(), 137)
            .await;
        let Ok(record) = result else {
            panic!("payment failed");
        };
        assert_eq!(record.payment_status.as_deref(), Some("PAID"));
        assert_eq!(record.payment_chain_id, Some(137));
        assert!(service.rides().is_paid(ride_id).await);
    }

    #[tokio::test]
    async fn non_paid_status_does_not_mark_paid_set() {
        let (service, _consumer) = make_service();
        let ride_id = book(&service).await;

        let _ = service
            .record_payment(ride_id, "FAILED".to_string(), "0xhash".to_string(), 137)
            .await;
        assert!(!service.rides().is_paid(ride_id).await);
    }

    #[tokio::test]
    async fn location_update_feeds_presence_and_status() {
        let (service, _consumer) = make_service();
        let ride_id = book(&service).await;
        let _ = service.accept_ride(ride_id, "d1").await;

        let pos = GeoPoint::new(12.98, 77.60);
        let result = service.update_location("d1", pos).await;
        assert!(result.is_ok());

        let (_, driver_position) = match service.ride_status(ride_id).await {
            Ok(pair) => pair,
            Err(e) => panic!("status failed: {e}"),
        };
        assert_eq!(driver_position, Some(pos));
    }

    #[tokio::test]
    async fn location_update_rejects_bad_coordinates() {
        let (service, _consumer) = make_service();
        let result = service
            .update_location("d1", GeoPoint::new(120.0, 77.59))
            .await;
        assert!(matches!(
            result,
            Err(DispatchError::InvalidCoordinates { .. })
        ));
        assert!(service.presence().is_empty().await);
    }
}
