//! Service layer: dispatch orchestration and long-running loops.
//!
//! [`DispatchService`] backs the REST handlers; the matcher and reaper
//! run as spawned tasks alongside the HTTP server.

pub mod dispatch;
pub mod matcher;
pub mod reaper;

pub use dispatch::DispatchService;
pub use matcher::{MatchOutcome, run_matcher};
pub use reaper::run_reaper;
