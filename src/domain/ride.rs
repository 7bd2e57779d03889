//! Ride record lifecycle types.
//!
//! A [`RideRecord`] is created once at booking time and mutated in place
//! by assignment, completion, and payment updates. Records are never
//! deleted; the full field history is overwritten in place and retained
//! for status polling and audit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{DriverId, GeoPoint, RideId};

/// Lifecycle state of a ride.
///
/// The derived ordering is load-bearing: `Pending < Assigned < Completed`
/// and a record's status must never decrease along that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideStatus {
    /// Booked, waiting for a driver to win the assignment race.
    Pending,
    /// Exactly one driver has been committed to the ride.
    Assigned,
    /// The assigned driver has completed the ride.
    Completed,
}

/// Durable record of a single ride, keyed by [`RideId`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideRecord {
    /// Ride identifier, generated at booking time.
    pub ride_id: RideId,
    /// Current lifecycle status (monotonic non-decreasing).
    pub status: RideStatus,
    /// Passenger identity (wallet public address in the reference client).
    pub passenger_id: String,
    /// Pickup coordinates.
    pub src: GeoPoint,
    /// Drop-off coordinates.
    pub dest: GeoPoint,
    /// Quoted price for the ride.
    pub price: f64,
    /// Requested vehicle class (free-form, e.g. `"sedan"`).
    pub vehicle_type: String,
    /// Winning driver; present iff `status >= Assigned`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<DriverId>,
    /// Booking timestamp, also the dispatch-latency reference point.
    pub requested_at: DateTime<Utc>,
    /// Completion timestamp; present iff `status == Completed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Payment state as reported by the payment caller (e.g. `"PAID"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,
    /// On-chain transaction hash for the payment, when recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_tx_hash: Option<String>,
    /// Chain identifier the payment settled on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_chain_id: Option<u64>,
    /// When the payment update was recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_at: Option<DateTime<Utc>>,
}

impl RideRecord {
    /// Creates a fresh `Pending` record at booking time.
    #[must_use]
    pub fn new_pending(
        ride_id: RideId,
        passenger_id: String,
        src: GeoPoint,
        dest: GeoPoint,
        price: f64,
        vehicle_type: String,
        requested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            ride_id,
            status: RideStatus::Pending,
            passenger_id,
            src,
            dest,
            price,
            vehicle_type,
            driver_id: None,
            requested_at,
            completed_at: None,
            payment_status: None,
            payment_tx_hash: None,
            payment_chain_id: None,
            payment_at: None,
        }
    }

    /// Commits the winning driver and moves the record to `Assigned`.
    ///
    /// Only the arbiter's winning path may call this; callers must have
    /// verified `status < Completed` first.
    pub fn assign(&mut self, driver_id: DriverId) {
        self.status = RideStatus::Assigned;
        self.driver_id = Some(driver_id);
    }

    /// Moves the record to `Completed` and stamps the completion time.
    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.status = RideStatus::Completed;
        self.completed_at = Some(now);
    }

    /// Overwrites the payment fields with the reported payment outcome.
    pub fn record_payment(
        &mut self,
        payment_status: String,
        tx_hash: String,
        chain_id: u64,
        now: DateTime<Utc>,
    ) {
        self.payment_status = Some(payment_status);
        self.payment_tx_hash = Some(tx_hash);
        self.payment_chain_id = Some(chain_id);
        self.payment_at = Some(now);
    }

    /// Returns `true` if `driver_id` matches the assigned driver.
    #[must_use]
    pub fn is_assigned_to(&self, driver_id: &DriverId) -> bool {
        self.driver_id.as_ref() == Some(driver_id)
    }
}
