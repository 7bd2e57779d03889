//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::DispatchService;
use crate::ws::ConnectionRegistry;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Dispatch service for all ride and driver business logic.
    pub dispatch: Arc<DispatchService>,
    /// Event bus carrying offers and lifecycle events.
    pub event_bus: EventBus,
    /// Registry of live driver WebSocket connections.
    pub connections: Arc<ConnectionRegistry>,
}
