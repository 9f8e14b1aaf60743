//! # airtime-core
//!
//! Allocation engine for the contention-free part of a beacon interval.
//!
//! Stations ask for exclusive time slices; the engine admits, degrades or
//! rejects each request against a shrinking time budget, keeps the
//! reservations packed in chronological order, and once per interval turns
//! them into a gapless schedule with filler (contention access) windows.
//!
//! ## Crate structure
//!
//! - [`allocation`]: Reservation records and the ordered list holding them
//! - [`budget`]: Cursor / remaining-time tracker derived from the list
//! - [`request`]: Request types and the granted-duration rule
//! - [`reservations`]: List + budget with atomic structural changes
//! - [`policy`]: Admission policies behind [`policy::AdmissionPolicy`]
//! - [`filler`]: Filler window insertion and schedule verification
//! - [`schedule`]: Finalized schedule handed to the broadcaster
//! - [`config`]: TOML-backed scheduler configuration
//! - [`error`]: Contract-violation errors

pub mod allocation;
pub mod budget;
pub mod config;
pub mod error;
pub mod filler;
pub mod policy;
pub mod request;
pub mod reservations;
pub mod schedule;

pub use allocation::{AllocationKind, AllocationList, AllocationRecord};
pub use config::{PolicyKind, SchedulerConfig};
pub use error::{ConfigError, SchedulerError};
pub use policy::{build_policy, AdmissionPolicy};
pub use request::{AllocationInfo, StatusCode, Tspec};
pub use schedule::Schedule;
