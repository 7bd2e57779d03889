//! Geographic coordinates and great-circle distance.
//!
//! [`GeoPoint`] is the coordinate type carried by ride requests, match
//! offers, and driver presence entries. Validation lives here because an
//! out-of-range coordinate is the dispatch pipeline's only poison-input
//! case: it can never succeed on retry and must be rejected at the
//! boundary where it appears.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::DispatchError;

/// Mean Earth radius in kilometres, used by the haversine distance.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    /// Latitude in decimal degrees, valid range `[-90, 90]`.
    pub lat: f64,
    /// Longitude in decimal degrees, valid range `[-180, 180]`.
    pub lng: f64,
}

impl GeoPoint {
    /// Creates a point without validating it. Call [`Self::validate`]
    /// before handing the point to the presence index or matcher.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Checks the coordinate against the valid latitude/longitude ranges.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidCoordinates`] when either
    /// component is non-finite or out of range.
    pub fn validate(&self) -> Result<(), DispatchError> {
        let lat_ok = self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat);
        let lng_ok = self.lng.is_finite() && (-180.0..=180.0).contains(&self.lng);
        if lat_ok && lng_ok {
            Ok(())
        } else {
            Err(DispatchError::InvalidCoordinates {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }

    /// Great-circle distance to `other` in kilometres (haversine).
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();
        EARTH_RADIUS_KM * c
    }
}
