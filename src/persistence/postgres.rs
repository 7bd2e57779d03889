//! PostgreSQL implementation of the persistence layer.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::models::{RideSnapshot, StoredEvent};
use crate::config::DispatchConfig;
use crate::domain::{RideId, RideRecord};
use crate::error::DispatchError;

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to PostgreSQL using the configured pool settings.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError::PersistenceError`] if the pool cannot
    /// be established.
    pub async fn connect(config: &DispatchConfig) -> Result<Self, DispatchError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.database_connect_timeout_secs,
            ))
            .connect(&config.database_url)
            .await
            .map_err(|e| DispatchError::PersistenceError(e.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Appends an event to the event log.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError::PersistenceError`] on database failure.
    pub async fn save_event(
        &self,
        ride_id: Option<RideId>,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<i64, DispatchError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO events (ride_id, event_type, payload) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(ride_id.map(|id| *id.as_uuid()))
        .bind(event_type)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DispatchError::PersistenceError(e.to_string()))?;

        Ok(row)
    }

    /// Saves a ride record snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError::PersistenceError`] on database failure
    /// or if the record cannot be encoded.
    pub async fn save_ride_snapshot(&self, record: &RideRecord) -> Result<i64, DispatchError> {
        let record_json = serde_json::to_value(record)
            .map_err(|e| DispatchError::PersistenceError(e.to_string()))?;
        let status = serde_json::to_value(record.status)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_default();

        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO ride_snapshots (ride_id, status, record_json) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(*record.ride_id.as_uuid())
        .bind(status)
        .bind(record_json)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DispatchError::PersistenceError(e.to_string()))?;

        Ok(row)
    }

    /// Loads the latest snapshot for each ride using `DISTINCT ON`.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError::PersistenceError`] on database failure.
    pub async fn load_latest_snapshots(&self) -> Result<Vec<RideSnapshot>, DispatchError> {
        let rows = sqlx::query_as::<_, (i64, Uuid, String, serde_json::Value, DateTime<Utc>)>(
            "SELECT DISTINCT ON (ride_id) id, ride_id, status, record_json, snapshot_at \
             FROM ride_snapshots ORDER BY ride_id, snapshot_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DispatchError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, ride_id, status, record_json, snapshot_at)| RideSnapshot {
                id,
                ride_id,
                status,
                record_json,
                snapshot_at,
            })
            .collect())
    }

    /// Loads events after the given timestamp, optionally filtered by
    /// ride ID.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError::PersistenceError`] on database failure.
    pub async fn load_events_after(
        &self,
        after: DateTime<Utc>,
        ride_id: Option<RideId>,
    ) -> Result<Vec<StoredEvent>, DispatchError> {
        let rows = if let Some(rid) = ride_id {
            sqlx::query_as::<_, (i64, Option<Uuid>, String, serde_json::Value, DateTime<Utc>)>(
                "SELECT id, ride_id, event_type, payload, created_at FROM events \
                 WHERE created_at > $1 AND ride_id = $2 ORDER BY id",
            )
            .bind(after)
            .bind(*rid.as_uuid())
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, (i64, Option<Uuid>, String, serde_json::Value, DateTime<Utc>)>(
                "SELECT id, ride_id, event_type, payload, created_at FROM events \
                 WHERE created_at > $1 ORDER BY id",
            )
            .bind(after)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| DispatchError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, ride_id, event_type, payload, created_at)| StoredEvent {
                id,
                ride_id,
                event_type,
                payload,
                created_at,
            })
            .collect())
    }
}
