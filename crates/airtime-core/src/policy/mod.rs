//! Admission policies.
//!
//! A policy decides whether a reservation request fits the interval and, if
//! so, how much time it gets. Every policy works on the same
//! [`ReservationTable`](crate::reservations::ReservationTable) data model, so
//! they are interchangeable behind [`AdmissionPolicy`].
//!
//! - [`basic::BasicPolicy`]: midpoint/minimum duration heuristic with an
//!   isochronous degradation path
//! - [`contention_only::ContentionOnlyPolicy`]: reserves nothing; the whole
//!   interval is left to contention access

pub mod basic;
pub mod contention_only;

use crate::allocation::AllocationList;
use crate::budget::TimeBudget;
use crate::config::{PolicyKind, SchedulerConfig};
use crate::error::{ConfigError, SchedulerError};
use crate::request::{AllocationInfo, StatusCode, Tspec};
use crate::schedule::Schedule;

pub use basic::BasicPolicy;
pub use contention_only::ContentionOnlyPolicy;

/// Interface the MAC layer drives.
///
/// `Ok(StatusCode::Failure)` is an ordinary rejection and leaves the
/// reservations exactly as they were. `Err` signals a contract violation.
pub trait AdmissionPolicy: Send {
    fn name(&self) -> &'static str;

    fn config(&self) -> &SchedulerConfig;

    /// Reservations of the current interval, in chronological order.
    fn allocations(&self) -> &AllocationList;

    fn budget(&self) -> TimeBudget;

    /// Admit a new reservation for `source_id`.
    fn add_new_allocation(
        &mut self,
        source_id: u8,
        tspec: &Tspec,
        info: &AllocationInfo,
    ) -> Result<StatusCode, SchedulerError>;

    /// Change the duration of an existing reservation.
    fn modify_existing_allocation(
        &mut self,
        source_id: u8,
        tspec: &Tspec,
        info: &AllocationInfo,
    ) -> Result<StatusCode, SchedulerError>;

    /// Release a reservation, pulling later ones back over the freed time.
    fn remove_allocation(
        &mut self,
        source_id: u8,
        info: &AllocationInfo,
    ) -> Result<StatusCode, SchedulerError>;

    /// Produce the broadcast schedule for the current interval.
    fn finalize_interval(&self) -> Result<Schedule, SchedulerError>;

    /// Roll over to the next interval, keeping only persistent reservations.
    /// Returns the number of reservations released.
    fn begin_interval(&mut self) -> Result<usize, SchedulerError>;
}

/// Construct the policy selected in `config`, validating it first.
pub fn build_policy(
    config: SchedulerConfig,
) -> Result<Box<dyn AdmissionPolicy>, ConfigError> {
    Ok(match config.policy {
        PolicyKind::Basic => Box::new(BasicPolicy::new(config)?),
        PolicyKind::ContentionOnly => Box::new(ContentionOnlyPolicy::new(config)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_policy_follows_config() {
        let basic = build_policy(SchedulerConfig::default()).unwrap();
        assert_eq!(basic.name(), "basic");

        let contention = build_policy(SchedulerConfig {
            policy: PolicyKind::ContentionOnly,
            ..SchedulerConfig::default()
        })
        .unwrap();
        assert_eq!(contention.name(), "contention-only");
        assert!(contention.allocations().is_empty());
    }

    #[test]
    fn build_policy_validates_hand_built_config() {
        let oversized_reserve = SchedulerConfig {
            interval_length: 1000,
            min_filler_budget: 5000,
            ..SchedulerConfig::default()
        };
        assert!(matches!(
            build_policy(oversized_reserve),
            Err(ConfigError::FillerBudgetTooLarge { .. })
        ));

        let bad_distance = SchedulerConfig {
            inter_allocation_distance: 5,
            ..SchedulerConfig::default()
        };
        assert_eq!(
            build_policy(bad_distance).err(),
            Some(ConfigError::InterAllocationDistance(5))
        );
    }
}
