//! dispatch-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints and
//! spawns the dispatch matcher, presence reaper, offer router, and the
//! optional persistence writer.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use dispatch_gateway::api;
use dispatch_gateway::app_state::AppState;
use dispatch_gateway::config::DispatchConfig;
use dispatch_gateway::domain::EventBus;
use dispatch_gateway::persistence::postgres::PostgresPersistence;
use dispatch_gateway::persistence::run_event_writer;
use dispatch_gateway::queue::RideRequestQueue;
use dispatch_gateway::service::{DispatchService, run_matcher, run_reaper};
use dispatch_gateway::store::{AssignmentArbiter, PresenceIndex, RideStore};
use dispatch_gateway::ws::ConnectionRegistry;
use dispatch_gateway::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = DispatchConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting dispatch-gateway");

    // Build stores and channels
    let rides = Arc::new(RideStore::new());
    let presence = Arc::new(PresenceIndex::new());
    let arbiter = Arc::new(AssignmentArbiter::new());
    let event_bus = EventBus::new(config.event_bus_capacity);
    let connections = Arc::new(ConnectionRegistry::new());
    let (queue, consumer) = RideRequestQueue::new(
        config.queue_capacity,
        config.queue_max_deliveries,
        Duration::from_millis(config.queue_redelivery_delay_ms),
    );

    // Build service layer
    let dispatch = Arc::new(DispatchService::new(
        Arc::clone(&rides),
        Arc::clone(&presence),
        arbiter,
        queue.clone(),
        event_bus.clone(),
        config.assignment_ttl_secs,
    ));

    // Spawn the dispatch matcher
    tokio::spawn(run_matcher(
        consumer,
        queue,
        Arc::clone(&presence),
        event_bus.clone(),
        config.search_radius_km,
        config.max_candidates,
    ));

    // Spawn the presence reaper
    tokio::spawn(run_reaper(
        Arc::clone(&presence),
        event_bus.clone(),
        config.reaper_interval_secs,
        config.presence_stale_secs,
    ));

    // Spawn the offer fanout router
    tokio::spawn(dispatch_gateway::ws::router::run_offer_router(
        event_bus.subscribe(),
        Arc::clone(&connections),
    ));

    // Optional persistence writer
    if config.persistence_enabled {
        let persistence = PostgresPersistence::connect(&config).await?;
        tokio::spawn(run_event_writer(
            persistence,
            event_bus.subscribe(),
            Arc::clone(&rides),
        ));
        tracing::info!("persistence enabled");
    }

    // Build application state
    let app_state = AppState {
        dispatch,
        event_bus,
        connections,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .await
        .context("server terminated")?;

    Ok(())
}
