//! Deterministic simulation harness for the airtime allocation engine.
//!
//! Stands in for the MAC layer around an
//! [`AdmissionPolicy`](airtime_core::policy::AdmissionPolicy): a virtual
//! clock and event queue deliver timed requests, the interval driver
//! finalizes a schedule at every beacon, and beacon sinks record or
//! serialize the result. Request streams come from TOML scenario files or
//! from a seeded random generator.

pub mod clock;
pub mod driver;
pub mod event;
pub mod generator;
pub mod scenario;
pub mod sink;
