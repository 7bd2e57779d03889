//! Driver-facing handlers: location updates.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::put;
use axum::{Json, Router};

use crate::api::dto::{LocationUpdateRequest, LocationUpdateResponse};
use crate::app_state::AppState;
use crate::domain::GeoPoint;
use crate::error::{DispatchError, ErrorResponse};

/// `PUT /drivers/{driver_id}/location` — Refresh a driver's presence.
///
/// Writes position and freshness as one atomic presence entry; a driver
/// that keeps calling this stays dispatchable, one that stops is
/// eventually reaped.
///
/// # Errors
///
/// Returns [`DispatchError::InvalidCoordinates`] for out-of-range input.
#[utoipa::path(
    put,
    path = "/api/v1/drivers/{driver_id}/location",
    tag = "Drivers",
    summary = "Update driver location",
    description = "Upserts the driver's position into the presence index and refreshes its staleness timestamp.",
    params(
        ("driver_id" = String, Path, description = "Driver identity"),
    ),
    request_body = LocationUpdateRequest,
    responses(
        (status = 200, description = "Location updated", body = LocationUpdateResponse),
        (status = 400, description = "Invalid coordinates", body = ErrorResponse),
    )
)]
pub async fn update_location(
    State(state): State<AppState>,
    Path(driver_id): Path<String>,
    Json(req): Json<LocationUpdateRequest>,
) -> Result<impl IntoResponse, DispatchError> {
    state
        .dispatch
        .update_location(&driver_id, GeoPoint::new(req.lat, req.lng))
        .await?;

    Ok(Json(LocationUpdateResponse {
        msg: "Successfully updated driver location".to_string(),
    }))
}

/// Driver routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/drivers/{driver_id}/location", put(update_location))
}
