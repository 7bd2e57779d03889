//! Ride-request queue with bounded redelivery and a dead-letter store.
//!
//! In-process stand-in for the deployment's message broker: intake
//! publishes [`RideRequestMessage`]s, the dispatch matcher consumes
//! them. Delivery is at-least-once — a message the matcher cannot place
//! is redelivered, but never forever: after `max_deliveries` attempts it
//! moves to the dead-letter store, because "no drivers nearby" can be a
//! persistent condition rather than a transient one.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};

use crate::domain::{GeoPoint, RideId};
use crate::error::DispatchError;

/// The message enqueued by intake for every booking.
///
/// Field names round-trip through serialization unchanged; `start_time`
/// is the booking time in epoch milliseconds and seeds the dispatch
/// latency measurement downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideRequestMessage {
    /// Pickup coordinates.
    pub src: GeoPoint,
    /// Drop-off coordinates.
    pub dest: GeoPoint,
    /// Requested vehicle class.
    pub vehicle_type: String,
    /// Quoted price.
    pub price: f64,
    /// Passenger identity.
    pub passenger_id: String,
    /// Ride identifier created at booking time.
    pub ride_id: RideId,
    /// Booking time in epoch milliseconds.
    pub start_time: i64,
}

/// One delivery of a message to the consumer, with its attempt counter.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// The enqueued ride request.
    pub message: RideRequestMessage,
    /// 1-based delivery attempt number.
    pub attempt: u32,
}

/// What happened to a message handed back for redelivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeliveryOutcome {
    /// The message was scheduled for another delivery attempt.
    Requeued,
    /// The attempt budget is exhausted; the message moved to the
    /// dead-letter store.
    DeadLettered,
}

/// Producer half of the ride-request queue.
///
/// Cheap to clone; all clones feed the single consumer.
#[derive(Debug, Clone)]
pub struct RideRequestQueue {
    tx: mpsc::Sender<Delivery>,
    dead_letters: Arc<RwLock<Vec<Delivery>>>,
    max_deliveries: u32,
    redelivery_delay: Duration,
}

/// Consumer half of the ride-request queue, owned by the matcher loop.
#[derive(Debug)]
pub struct RideRequestConsumer {
    rx: mpsc::Receiver<Delivery>,
}

impl RideRequestQueue {
    /// Creates a bounded queue and its consumer.
    ///
    /// `max_deliveries` caps total attempts per message (first delivery
    /// included); `redelivery_delay` spaces retries apart.
    #[must_use]
    pub fn new(
        capacity: usize,
        max_deliveries: u32,
        redelivery_delay: Duration,
    ) -> (Self, RideRequestConsumer) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                tx,
                dead_letters: Arc::new(RwLock::new(Vec::new())),
                max_deliveries: max_deliveries.max(1),
                redelivery_delay,
            },
            RideRequestConsumer { rx },
        )
    }

    /// Enqueues a fresh message (attempt 1).
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::QueueUnavailable`] if the consumer side
    /// has been dropped.
    pub async fn publish(&self, message: RideRequestMessage) -> Result<(), DispatchError> {
        self.tx
            .send(Delivery {
                message,
                attempt: 1,
            })
            .await
            .map_err(|e| DispatchError::QueueUnavailable(e.to_string()))
    }

    /// Hands a delivery back for another attempt.
    ///
    /// If the attempt budget is spent the delivery moves to the
    /// dead-letter store instead; otherwise redelivery is scheduled
    /// after the configured delay without blocking the caller.
    pub async fn redeliver(&self, delivery: Delivery) -> RedeliveryOutcome {
        if delivery.attempt >= self.max_deliveries {
            tracing::warn!(
                ride_id = %delivery.message.ride_id,
                attempts = delivery.attempt,
                "redelivery budget exhausted, dead-lettering ride request"
            );
            self.dead_letters.write().await.push(delivery);
            return RedeliveryOutcome::DeadLettered;
        }

        let tx = self.tx.clone();
        let delay = self.redelivery_delay;
        let next = Delivery {
            message: delivery.message,
            attempt: delivery.attempt + 1,
        };
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(next).await.is_err() {
                tracing::warn!("queue consumer gone, dropping redelivery");
            }
        });
        RedeliveryOutcome::Requeued
    }

    /// Returns copies of all dead-lettered deliveries.
    pub async fn dead_letters(&self) -> Vec<Delivery> {
        self.dead_letters.read().await.clone()
    }

    /// Returns the number of dead-lettered deliveries.
    pub async fn dead_letter_count(&self) -> usize {
        self.dead_letters.read().await.len()
    }
}

impl RideRequestConsumer {
    /// Waits for the next delivery. Returns `None` once every producer
    /// handle has been dropped.
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }
}
