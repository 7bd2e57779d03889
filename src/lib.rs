//! # dispatch-gateway
//!
//! REST API and WebSocket gateway for real-time ride dispatch.
//!
//! This crate coordinates ride requests from passengers to nearby
//! available drivers: booking creates a ride record and enqueues a
//! request, the dispatch matcher geosearches live driver presence and
//! publishes match offers, the offer router pushes each offer to the
//! targeted driver's WebSocket connection, and the assignment arbiter
//! commits exactly one driver per ride no matter how many race to
//! accept.
//!
//! ## Architecture
//!
//! ```text
//! Passengers (HTTP)            Drivers (HTTP + WebSocket)
//!     │                            │
//!     ├── REST Handlers (api/)     ├── WS Handler (ws/)
//!     │                            │
//!     ├── DispatchService (service/)
//!     ├── RideRequestQueue (queue/) ──▶ Matcher (service/matcher)
//!     │                                     │
//!     ├── RideStore / PresenceIndex /       ▼
//!     │   AssignmentArbiter (store/)    EventBus (domain/)
//!     │                                     │
//!     ├── Presence Reaper (service/reaper)  ├──▶ Offer Router (ws/router)
//!     │                                     └──▶ PostgreSQL event log
//!     └────────────────────────────────────────  (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod queue;
pub mod service;
pub mod store;
pub mod ws;
