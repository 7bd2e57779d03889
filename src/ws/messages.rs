//! WebSocket message types exchanged with driver clients.

use serde::{Deserialize, Serialize};

use crate::domain::{GeoPoint, RideId};

/// Messages crossing a driver's WebSocket connection, discriminated by
/// the `type` field.
///
/// `IDENTIFY` is the only client-to-server message; `NEW_RIDE_REQUEST`
/// is the only server push. Both shapes round-trip through
/// serialization unchanged — they are the wire contract with the driver
/// app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DriverMessage {
    /// Client → Server: announce the driver identity for this connection.
    #[serde(rename = "IDENTIFY", rename_all = "camelCase")]
    Identify {
        /// Raw driver identity; normalized server-side.
        driver_id: String,
    },

    /// Server → Client: a match offer for this driver.
    #[serde(rename = "NEW_RIDE_REQUEST", rename_all = "camelCase")]
    NewRideRequest {
        /// Ride being offered.
        ride_id: RideId,
        /// Pickup coordinates.
        src: GeoPoint,
        /// Drop-off coordinates.
        dest: GeoPoint,
        /// Driver-to-pickup distance in km, two decimals.
        distance: String,
        /// Milliseconds from booking to this push (diagnostic only).
        latency: i64,
    },
}
