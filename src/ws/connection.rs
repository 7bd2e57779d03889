//! WebSocket connection state machine for a single driver socket.
//!
//! Reads client messages (registering the driver on `IDENTIFY`) and
//! writes pushes arriving on the connection's outbound channel. Until
//! the driver identifies, the connection exists but is unaddressable.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::messages::DriverMessage;
use super::registry::{ConnectionId, ConnectionRegistry, DriverHandle};
use crate::domain::DriverId;

/// Outbound push buffer per connection. A slow socket drops offers once
/// the buffer fills rather than stalling the fanout router.
const OUTBOUND_BUFFER: usize = 64;

/// Runs the read/write loop for a single driver WebSocket connection.
///
/// - Reads `IDENTIFY` from the client and registers the connection.
/// - Forwards pushes from the registry handle to the socket.
/// - On close, unregisters the connection by its own identity.
pub async fn run_connection(socket: WebSocket, registry: Arc<ConnectionRegistry>) {
    let connection_id = ConnectionId::next();
    let (out_tx, mut out_rx) = mpsc::channel::<DriverMessage>(OUTBOUND_BUFFER);
    let (mut ws_tx, mut ws_rx) = socket.split();

    tracing::debug!(?connection_id, "driver connection opened");

    loop {
        tokio::select! {
            // Incoming message from the driver client.
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_text_message(&text, connection_id, &out_tx, &registry).await;
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
            // Push from the offer router via the registry handle.
            push = out_rx.recv() => {
                match push {
                    Some(message) => {
                        let json = match serde_json::to_string(&message) {
                            Ok(json) => json,
                            Err(e) => {
                                tracing::error!(error = %e, "failed to encode driver push");
                                continue;
                            }
                        };
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    registry.unregister(connection_id).await;
    tracing::debug!(?connection_id, "driver connection closed");
}

/// Handles one text frame from the client.
async fn handle_text_message(
    text: &str,
    connection_id: ConnectionId,
    out_tx: &mpsc::Sender<DriverMessage>,
    registry: &ConnectionRegistry,
) {
    match serde_json::from_str::<DriverMessage>(text) {
        Ok(DriverMessage::Identify { driver_id }) => {
            let driver_id = DriverId::from_identity(&driver_id);
            registry
                .register(
                    driver_id,
                    DriverHandle::new(connection_id, out_tx.clone()),
                )
                .await;
        }
        Ok(other) => {
            tracing::debug!(?other, "ignoring unexpected client message");
        }
        Err(e) => {
            tracing::warn!(error = %e, "invalid websocket message");
        }
    }
}
