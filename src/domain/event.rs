//! Domain events reflecting dispatch state changes.
//!
//! Every state change emits a [`DispatchEvent`] through the
//! [`super::EventBus`]. The offer fanout router consumes
//! [`DispatchEvent::OfferPublished`] to push offers to driver
//! connections; the optional persistence writer appends every event to
//! the PostgreSQL event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DriverId, GeoPoint, RideId};

/// A match offer for one candidate driver.
///
/// Transient: produced once per candidate per dispatch attempt by the
/// matcher, consumed best-effort by the fanout router, never persisted
/// as ride state. `distance` is stored as a `String` with two decimal
/// places so the value survives serialization byte-for-byte on its way
/// to the driver client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOffer {
    /// Ride being offered.
    pub ride_id: RideId,
    /// Candidate driver the offer targets.
    pub driver_id: DriverId,
    /// Passenger who booked the ride.
    pub passenger_id: String,
    /// Pickup coordinates.
    pub src: GeoPoint,
    /// Drop-off coordinates.
    pub dest: GeoPoint,
    /// Driver-to-pickup distance in km, formatted to two decimals.
    pub distance: String,
    /// Booking time in epoch milliseconds, for latency measurement.
    pub start_time: i64,
}

impl MatchOffer {
    /// Formats a raw kilometre distance into the wire representation.
    #[must_use]
    pub fn format_distance(km: f64) -> String {
        format!("{km:.2}")
    }
}

/// Domain event emitted after every dispatch state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum DispatchEvent {
    /// Emitted when intake accepts a booking and enqueues the request.
    RideBooked {
        /// Ride identifier.
        ride_id: RideId,
        /// Passenger who booked.
        passenger_id: String,
        /// Booking timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted once per candidate driver per dispatch attempt.
    OfferPublished(MatchOffer),

    /// Emitted when a driver wins the assignment race.
    RideAssigned {
        /// Ride identifier.
        ride_id: RideId,
        /// Winning driver.
        driver_id: DriverId,
        /// Assignment timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when the assigned driver completes the ride.
    RideCompleted {
        /// Ride identifier.
        ride_id: RideId,
        /// Driver who completed the ride.
        driver_id: DriverId,
        /// Completion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a payment update is recorded against a ride.
    PaymentRecorded {
        /// Ride identifier.
        ride_id: RideId,
        /// Reported payment state (e.g. `"PAID"`).
        payment_status: String,
        /// Payment record timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when the reaper evicts stale drivers from the presence index.
    DriversReaped {
        /// Evicted driver identifiers.
        driver_ids: Vec<DriverId>,
        /// Sweep timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl DispatchEvent {
    /// Returns the ride ID associated with this event, if any.
    #[must_use]
    pub fn ride_id(&self) -> Option<RideId> {
        match self {
            Self::RideBooked { ride_id, .. }
            | Self::RideAssigned { ride_id, .. }
            | Self::RideCompleted { ride_id, .. }
            | Self::PaymentRecorded { ride_id, .. } => Some(*ride_id),
            Self::OfferPublished(offer) => Some(offer.ride_id),
            Self::DriversReaped { .. } => None,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::RideBooked { .. } => "ride_booked",
            Self::OfferPublished(_) => "offer_published",
            Self::RideAssigned { .. } => "ride_assigned",
            Self::RideCompleted { .. } => "ride_completed",
            Self::PaymentRecorded { .. } => "payment_recorded",
            Self::DriversReaped { .. } => "drivers_reaped",
        }
    }
}
