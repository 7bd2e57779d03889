//! Domain layer: core types, identifiers, and the event system.
//!
//! This module contains the server-side domain model including ride and
//! driver identity, geographic coordinates, the ride record lifecycle,
//! match-offer events, and the broadcast bus that carries them between
//! the intake, matching, and fanout concerns.

pub mod driver_id;
pub mod event;
pub mod event_bus;
pub mod geo;
pub mod ride;
pub mod ride_id;

pub use driver_id::DriverId;
pub use event::{DispatchEvent, MatchOffer};
pub use event_bus::EventBus;
pub use geo::GeoPoint;
pub use ride::{RideRecord, RideStatus};
pub use ride_id::RideId;
