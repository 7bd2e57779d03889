//! Type-safe driver identifier.
//!
//! Driver identities arrive from two directions: the REST intake layer
//! (path parameters on location-update and acceptance calls) and the
//! WebSocket `IDENTIFY` message. Both are normalized into the same
//! `driver:<id>` keyspace so that presence entries, match offers, and
//! connection registrations all agree on the key.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Namespace prefix applied to every normalized driver identifier.
const DRIVER_PREFIX: &str = "driver:";

/// Unique identifier for a driver.
///
/// Wraps the externally supplied identity string (typically a wallet
/// address) prefixed with `driver:`. Used as the key in the presence
/// index, the connection registry, and the `driverId` field of match
/// offers — all three must use the identical normalized form for an
/// offer to reach its driver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct DriverId(String);

impl DriverId {
    /// Normalizes a raw identity string into a `DriverId`.
    ///
    /// Trims surrounding whitespace and applies the `driver:` prefix
    /// unless it is already present, so REST path parameters and
    /// WebSocket identify payloads converge on the same key.
    #[must_use]
    pub fn from_identity(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with(DRIVER_PREFIX) {
            Self(trimmed.to_string())
        } else {
            Self(format!("{DRIVER_PREFIX}{trimmed}"))
        }
    }

    /// Returns the normalized identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
