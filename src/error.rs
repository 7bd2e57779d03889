//! Gateway error types with HTTP status code mapping.
//!
//! [`DispatchError`] is the central error type for the gateway. Each
//! variant maps to a specific HTTP status code and structured JSON error
//! response, covering the dispatch taxonomy: not-found, conflict,
//! authorization, poison input, and transient infrastructure failure.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::RideId;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2002,
///     "message": "ride already accepted by another driver",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`DispatchError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status                       |
/// |-----------|---------------------|-----------------------------------|
/// | 1000–1999 | Validation          | 400 Bad Request                   |
/// | 2000–2999 | State/Authorization | 404 / 409 Conflict / 403 Forbidden |
/// | 3000–3999 | Server              | 500 Internal Server Error         |
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Ride with the given ID was not found.
    #[error("ride not found: {0}")]
    RideNotFound(RideId),

    /// Another driver already holds the assignment lock for the ride.
    #[error("ride {0} already accepted by another driver")]
    AssignmentConflict(RideId),

    /// The ride is not in a state that permits the requested transition.
    #[error("ride {ride_id} cannot move from {current:?} via {attempted}")]
    InvalidTransition {
        /// Ride whose transition was rejected.
        ride_id: RideId,
        /// Current status of the record.
        current: crate::domain::RideStatus,
        /// Name of the attempted transition.
        attempted: &'static str,
    },

    /// Acting driver does not match the ride's assigned driver.
    #[error("driver is not authorized to act on ride {0}")]
    UnauthorizedDriver(RideId),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Latitude/longitude pair is out of range or non-finite.
    #[error("invalid coordinates: lat={lat}, lng={lng}")]
    InvalidCoordinates {
        /// Offending latitude.
        lat: f64,
        /// Offending longitude.
        lng: f64,
    },

    /// Ride-request queue is closed or full beyond recovery.
    #[error("ride request queue unavailable: {0}")]
    QueueUnavailable(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidCoordinates { .. } => 1002,
            Self::RideNotFound(_) => 2001,
            Self::AssignmentConflict(_) => 2002,
            Self::InvalidTransition { .. } => 2003,
            Self::UnauthorizedDriver(_) => 2004,
            Self::PersistenceError(_) => 3001,
            Self::QueueUnavailable(_) => 3002,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidCoordinates { .. } => StatusCode::BAD_REQUEST,
            Self::RideNotFound(_) => StatusCode::NOT_FOUND,
            Self::AssignmentConflict(_) | Self::InvalidTransition { .. } => StatusCode::CONFLICT,
            Self::UnauthorizedDriver(_) => StatusCode::FORBIDDEN,
            Self::PersistenceError(_) | Self::QueueUnavailable(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
