//! Shared dispatch state: ride records, driver presence, assignment locks.
//!
//! These stores are the in-process rendition of the deployment's external
//! key-value/geo store. Each store is independently lockable; the only
//! cross-driver ordering primitive in the system is the assignment
//! arbiter's create-if-absent write.

pub mod assignment;
pub mod presence;
pub mod ride_store;

pub use assignment::{AssignmentArbiter, AssignmentOutcome};
pub use presence::{NearbyDriver, PresenceIndex};
pub use ride_store::RideStore;
