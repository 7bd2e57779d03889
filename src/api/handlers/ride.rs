//! Ride lifecycle handlers: book, status, accept, complete, payment.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    AcceptRideRequest, AcceptRideResponse, BookRideRequest, BookRideResponse,
    CompleteRideRequest, CompleteRideResponse, PaymentUpdateRequest, PaymentUpdateResponse,
    RideStatusResponse,
};
use crate::app_state::AppState;
use crate::domain::RideId;
use crate::error::{DispatchError, ErrorResponse};

/// `POST /rides` — Book a ride and enqueue it for dispatch.
///
/// # Errors
///
/// Returns [`DispatchError::QueueUnavailable`] if the request cannot be
/// enqueued.
#[utoipa::path(
    post,
    path = "/api/v1/rides",
    tag = "Rides",
    summary = "Book a ride",
    description = "Creates a PENDING ride record and enqueues the request for the dispatch matcher. The returned ride ID can be polled for status.",
    request_body = BookRideRequest,
    responses(
        (status = 201, description = "Ride booked successfully", body = BookRideResponse),
        (status = 500, description = "Dispatch queue unavailable", body = ErrorResponse),
    )
)]
pub async fn book_ride(
    State(state): State<AppState>,
    Json(req): Json<BookRideRequest>,
) -> Result<impl IntoResponse, DispatchError> {
    let ride_id = state
        .dispatch
        .book_ride(req.passenger_id, req.src, req.dest, req.vehicle_type, req.price)
        .await?;

    let response = BookRideResponse {
        ride_id,
        msg: "Successfully made ride request".to_string(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /rides/{ride_id}` — Poll ride status.
///
/// # Errors
///
/// Returns [`DispatchError::RideNotFound`] for unknown rides.
#[utoipa::path(
    get,
    path = "/api/v1/rides/{ride_id}",
    tag = "Rides",
    summary = "Get ride status",
    description = "Returns the ride record, including the assigned driver's live position when available.",
    params(
        ("ride_id" = uuid::Uuid, Path, description = "Ride UUID"),
    ),
    responses(
        (status = 200, description = "Ride status", body = RideStatusResponse),
        (status = 404, description = "Ride not found", body = ErrorResponse),
    )
)]
pub async fn ride_status(
    State(state): State<AppState>,
    Path(ride_id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, DispatchError> {
    let (record, driver_position) = state
        .dispatch
        .ride_status(RideId::from_uuid(ride_id))
        .await?;
    Ok(Json(RideStatusResponse::from_record(record, driver_position)))
}

/// `POST /rides/{ride_id}/accept` — Driver acceptance (arbitrated).
///
/// # Errors
///
/// Returns [`DispatchError::AssignmentConflict`] on a lost race,
/// [`DispatchError::RideNotFound`] for unknown rides.
#[utoipa::path(
    post,
    path = "/api/v1/rides/{ride_id}/accept",
    tag = "Rides",
    summary = "Accept a ride",
    description = "Races through the assignment arbiter. Exactly one driver wins; everyone else receives a conflict and the record is untouched.",
    params(
        ("ride_id" = uuid::Uuid, Path, description = "Ride UUID"),
    ),
    request_body = AcceptRideRequest,
    responses(
        (status = 200, description = "Ride assigned to this driver", body = AcceptRideResponse),
        (status = 404, description = "Ride not found", body = ErrorResponse),
        (status = 409, description = "Ride already accepted by another driver", body = ErrorResponse),
    )
)]
pub async fn accept_ride(
    State(state): State<AppState>,
    Path(ride_id): Path<uuid::Uuid>,
    Json(req): Json<AcceptRideRequest>,
) -> Result<impl IntoResponse, DispatchError> {
    let ride_id = RideId::from_uuid(ride_id);
    let record = state.dispatch.accept_ride(ride_id, &req.driver_id).await?;

    let driver_id = record
        .driver_id
        .clone()
        .ok_or_else(|| DispatchError::Internal("assigned record missing driver".to_string()))?;

    let response = AcceptRideResponse {
        status: "success".to_string(),
        msg: "Successfully accepted ride".to_string(),
        ride_id,
        driver_id,
        ride_status: record.status,
    };
    Ok(Json(response))
}

/// `POST /rides/{ride_id}/complete` — Completion by the assigned driver.
///
/// # Errors
///
/// Returns [`DispatchError::UnauthorizedDriver`] when the caller is not
/// the assigned driver, [`DispatchError::RideNotFound`] for unknown
/// rides.
#[utoipa::path(
    post,
    path = "/api/v1/rides/{ride_id}/complete",
    tag = "Rides",
    summary = "Complete a ride",
    description = "Moves an ASSIGNED ride to COMPLETED. Only the assigned driver may complete; any other caller is rejected without mutation.",
    params(
        ("ride_id" = uuid::Uuid, Path, description = "Ride UUID"),
    ),
    request_body = CompleteRideRequest,
    responses(
        (status = 200, description = "Ride completed", body = CompleteRideResponse),
        (status = 403, description = "Caller is not the assigned driver", body = ErrorResponse),
        (status = 404, description = "Ride not found", body = ErrorResponse),
        (status = 409, description = "Ride is not in progress", body = ErrorResponse),
    )
)]
pub async fn complete_ride(
    State(state): State<AppState>,
    Path(ride_id): Path<uuid::Uuid>,
    Json(req): Json<CompleteRideRequest>,
) -> Result<impl IntoResponse, DispatchError> {
    let ride_id = RideId::from_uuid(ride_id);
    let record = state
        .dispatch
        .complete_ride(ride_id, &req.driver_id)
        .await?;

    let driver_id = record
        .driver_id
        .clone()
        .ok_or_else(|| DispatchError::Internal("completed record missing driver".to_string()))?;

    let response = CompleteRideResponse {
        status: "success".to_string(),
        msg: "Ride completed successfully".to_string(),
        ride_id,
        driver_id,
        completed_at: record.completed_at,
    };
    Ok(Json(response))
}

/// `POST /rides/{ride_id}/payment` — Record a payment outcome.
///
/// # Errors
///
/// Returns [`DispatchError::RideNotFound`] for unknown rides.
#[utoipa::path(
    post,
    path = "/api/v1/rides/{ride_id}/payment",
    tag = "Rides",
    summary = "Update ride payment",
    description = "Stores the reported payment status, transaction hash, and chain ID on the ride record. A PAID status also adds the ride to the paid set.",
    params(
        ("ride_id" = uuid::Uuid, Path, description = "Ride UUID"),
    ),
    request_body = PaymentUpdateRequest,
    responses(
        (status = 200, description = "Payment recorded", body = PaymentUpdateResponse),
        (status = 404, description = "Ride not found", body = ErrorResponse),
    )
)]
pub async fn update_payment(
    State(state): State<AppState>,
    Path(ride_id): Path<uuid::Uuid>,
    Json(req): Json<PaymentUpdateRequest>,
) -> Result<impl IntoResponse, DispatchError> {
    let ride_id = RideId::from_uuid(ride_id);
    let record = state
        .dispatch
        .record_payment(ride_id, req.payment_status, req.tx_hash, req.chain_id)
        .await?;

    let response = PaymentUpdateResponse {
        status: "success".to_string(),
        msg: "Payment status updated successfully".to_string(),
        ride_id,
        payment_status: record.payment_status.unwrap_or_default(),
        tx_hash: record.payment_tx_hash.unwrap_or_default(),
        chain_id: record.payment_chain_id.unwrap_or_default(),
    };
    Ok(Json(response))
}

/// Ride routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rides", post(book_ride))
        .route("/rides/{ride_id}", get(ride_status))
        .route("/rides/{ride_id}/accept", post(accept_ride))
        .route("/rides/{ride_id}/complete", post(complete_ride))
        .route("/rides/{ride_id}/payment", post(update_payment))
}
