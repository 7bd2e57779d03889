//! Driver-facing DTOs: location updates.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `PUT /drivers/{driver_id}/location`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LocationUpdateRequest {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

/// Response body for `PUT /drivers/{driver_id}/location`.
#[derive(Debug, Serialize, ToSchema)]
pub struct LocationUpdateResponse {
    /// Human-readable confirmation message.
    pub msg: String,
}
