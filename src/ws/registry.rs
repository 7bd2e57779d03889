//! Concurrent driver-to-connection registry.
//!
//! Maps each identified driver to its live connection handle. Exactly
//! one handle is retained per driver: a new registration under the same
//! identifier replaces the previous handle, which simply becomes
//! unreachable through the map. Teardown removes by connection identity,
//! not by driver key — a driver may have re-registered a newer
//! connection, and closing the old socket must not delete the new
//! registration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{RwLock, mpsc};

use super::messages::DriverMessage;
use crate::domain::DriverId;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocates the next connection identifier.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Sending half of a driver's connection: the outbound message channel
/// plus the connection identity used for teardown matching.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    /// Identity of the connection this handle belongs to.
    pub connection_id: ConnectionId,
    tx: mpsc::Sender<DriverMessage>,
}

impl DriverHandle {
    /// Creates a handle for the given connection and outbound channel.
    #[must_use]
    pub fn new(connection_id: ConnectionId, tx: mpsc::Sender<DriverMessage>) -> Self {
        Self { connection_id, tx }
    }

    /// Pushes a message toward the connection's write loop.
    ///
    /// # Errors
    ///
    /// Returns the message back if the connection's write loop is gone.
    pub async fn push(
        &self,
        message: DriverMessage,
    ) -> Result<(), mpsc::error::SendError<DriverMessage>> {
        self.tx.send(message).await
    }
}

/// Registry of live, identified driver connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: RwLock<HashMap<DriverId, DriverHandle>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the handle for a driver.
    pub async fn register(&self, driver_id: DriverId, handle: DriverHandle) {
        let mut entries = self.entries.write().await;
        if let Some(previous) = entries.insert(driver_id.clone(), handle) {
            tracing::debug!(
                %driver_id,
                old_connection = ?previous.connection_id,
                "replaced existing driver connection"
            );
        } else {
            tracing::info!(%driver_id, "driver registered");
        }
    }

    /// Returns the current handle for a driver, if one is registered.
    pub async fn lookup(&self, driver_id: &DriverId) -> Option<DriverHandle> {
        let entries = self.entries.read().await;
        entries.get(driver_id).cloned()
    }

    /// Removes every registration owned by the closing connection.
    ///
    /// Matches on [`ConnectionId`], so a stale close cannot delete a
    /// newer registration under the same driver key. A connection that
    /// identified under more than one driver key releases all of them.
    /// Returns the drivers whose entries were removed.
    pub async fn unregister(&self, connection_id: ConnectionId) -> Vec<DriverId> {
        let mut entries = self.entries.write().await;
        let owners: Vec<DriverId> = entries
            .iter()
            .filter(|(_, handle)| handle.connection_id == connection_id)
            .map(|(driver_id, _)| driver_id.clone())
            .collect();
        for owner in &owners {
            entries.remove(owner);
            tracing::info!(driver_id = %owner, "driver disconnected");
        }
        owners
    }

    /// Returns the number of registered drivers.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if no driver is registered.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
