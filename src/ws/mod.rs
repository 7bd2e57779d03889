//! WebSocket layer: driver connections, registry, and offer fanout.
//!
//! The WebSocket endpoint at `/ws` is the driver-facing side of the
//! gateway. A connection becomes addressable once the driver sends an
//! `IDENTIFY` message; the offer router then pushes `NEW_RIDE_REQUEST`
//! messages to whichever connection currently holds the driver's
//! registration.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod registry;
pub mod router;

pub use messages::DriverMessage;
pub use registry::{ConnectionId, ConnectionRegistry, DriverHandle};
