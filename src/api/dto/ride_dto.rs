//! Ride booking, status, acceptance, completion, and payment DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{DriverId, GeoPoint, RideId, RideRecord, RideStatus};

/// Request body for `POST /rides`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BookRideRequest {
    /// Passenger identity (wallet public address in the reference client).
    pub passenger_id: String,
    /// Pickup coordinates.
    pub src: GeoPoint,
    /// Drop-off coordinates.
    pub dest: GeoPoint,
    /// Requested vehicle class.
    pub vehicle_type: String,
    /// Quoted price.
    pub price: f64,
}

/// Response body for `POST /rides`.
#[derive(Debug, Serialize, ToSchema)]
pub struct BookRideResponse {
    /// Identifier of the freshly booked ride; poll it for status.
    pub ride_id: RideId,
    /// Human-readable confirmation message.
    pub msg: String,
}

/// Response body for `GET /rides/{ride_id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RideStatusResponse {
    /// Ride identifier.
    pub ride_id: RideId,
    /// Current lifecycle status.
    pub status: RideStatus,
    /// Passenger identity.
    pub passenger_id: String,
    /// Pickup coordinates.
    pub src: GeoPoint,
    /// Drop-off coordinates.
    pub dest: GeoPoint,
    /// Quoted price.
    pub price: f64,
    /// Requested vehicle class.
    pub vehicle_type: String,
    /// Winning driver, once assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<DriverId>,
    /// Driver's live position, when assigned and still present in the
    /// presence index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_position: Option<GeoPoint>,
    /// Completion timestamp, once completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Last recorded payment state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,
}

impl RideStatusResponse {
    /// Builds the response from a record plus the optional live driver
    /// position.
    #[must_use]
    pub fn from_record(record: RideRecord, driver_position: Option<GeoPoint>) -> Self {
        Self {
            ride_id: record.ride_id,
            status: record.status,
            passenger_id: record.passenger_id,
            src: record.src,
            dest: record.dest,
            price: record.price,
            vehicle_type: record.vehicle_type,
            driver_id: record.driver_id,
            driver_position,
            completed_at: record.completed_at,
            payment_status: record.payment_status,
        }
    }
}

/// Request body for `POST /rides/{ride_id}/accept`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AcceptRideRequest {
    /// Raw driver identity of the accepting driver.
    pub driver_id: String,
}

/// Response body for `POST /rides/{ride_id}/accept`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AcceptRideResponse {
    /// Outcome marker, `"success"` on a won race.
    pub status: String,
    /// Human-readable message.
    pub msg: String,
    /// Ride identifier.
    pub ride_id: RideId,
    /// Normalized identity of the winning driver.
    pub driver_id: DriverId,
    /// Record status after the acceptance.
    pub ride_status: RideStatus,
}

/// Request body for `POST /rides/{ride_id}/complete`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CompleteRideRequest {
    /// Raw driver identity of the completing driver.
    pub driver_id: String,
}

/// Response body for `POST /rides/{ride_id}/complete`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CompleteRideResponse {
    /// Outcome marker, `"success"` on completion.
    pub status: String,
    /// Human-readable message.
    pub msg: String,
    /// Ride identifier.
    pub ride_id: RideId,
    /// Driver who completed the ride.
    pub driver_id: DriverId,
    /// Completion timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Request body for `POST /rides/{ride_id}/payment`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentUpdateRequest {
    /// Reported payment state (e.g. `"PAID"`).
    pub payment_status: String,
    /// On-chain transaction hash.
    pub tx_hash: String,
    /// Chain the payment settled on.
    pub chain_id: u64,
}

/// Response body for `POST /rides/{ride_id}/payment`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentUpdateResponse {
    /// Outcome marker, `"success"` when recorded.
    pub status: String,
    /// Human-readable message.
    pub msg: String,
    /// Ride identifier.
    pub ride_id: RideId,
    /// Payment state as stored.
    pub payment_status: String,
    /// Transaction hash as stored.
    pub tx_hash: String,
    /// Chain identifier as stored.
    pub chain_id: u64,
}
