//! Database models for events and ride snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored event row from the `events` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Auto-increment row ID.
    pub id: i64,
    /// Ride the event relates to, when the event is ride-scoped.
    pub ride_id: Option<Uuid>,
    /// Event type discriminator (e.g. `"ride_assigned"`).
    pub event_type: String,
    /// JSONB payload with event-specific data.
    pub payload: serde_json::Value,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A ride snapshot row from the `ride_snapshots` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideSnapshot {
    /// Auto-increment row ID.
    pub id: i64,
    /// Ride that was snapshotted.
    pub ride_id: Uuid,
    /// Lifecycle status string at snapshot time.
    pub status: String,
    /// Full ride record as JSONB.
    pub record_json: serde_json::Value,
    /// Snapshot timestamp.
    pub snapshot_at: DateTime<Utc>,
}
