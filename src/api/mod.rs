//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All endpoints are mounted under `/api/v1`. The OpenAPI document is
//! derived from the handler annotations; with the `swagger-ui` feature
//! enabled an interactive explorer is served at `/docs`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document covering every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "dispatch-gateway",
        description = "REST API and WebSocket gateway for real-time ride dispatch"
    ),
    paths(
        handlers::ride::book_ride,
        handlers::ride::ride_status,
        handlers::ride::accept_ride,
        handlers::ride::complete_ride,
        handlers::ride::update_payment,
        handlers::driver::update_location,
        handlers::system::health_handler,
    ),
    tags(
        (name = "Rides", description = "Ride lifecycle operations"),
        (name = "Drivers", description = "Driver presence operations"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
