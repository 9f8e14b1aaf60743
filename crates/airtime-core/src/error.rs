//! Error types for the allocation engine.
//!
//! Every variant here is a contract violation: either the caller asked for
//! something the engine does not support, or the budget arithmetic produced
//! a schedule that cannot be broadcast. Ordinary admission rejections are not
//! errors and are reported as [`crate::request::StatusCode::Failure`].

use thiserror::Error;

use crate::allocation::AllocationKind;

// ── Scheduler errors ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("periodic allocations are not supported (allocation period {period})")]
    PeriodicAllocation { period: u16 },

    #[error("allocation kind {0:?} cannot be requested")]
    UnsupportedKind(AllocationKind),

    #[error("no allocation {id} from source {source_id} to destination {destination_id}")]
    UnknownAllocation {
        id: u8,
        source_id: u8,
        destination_id: u8,
    },

    #[error("allocation {id} from source {source_id} to destination {destination_id} already exists")]
    DuplicateAllocation {
        id: u8,
        source_id: u8,
        destination_id: u8,
    },

    #[error("allocation {id} from source {source_id} is a filler window and cannot be modified")]
    ImmutableAllocation { id: u8, source_id: u8 },

    #[error("no allocation at index {index}, list holds {len}")]
    NoSuchIndex { index: usize, len: usize },

    #[error("slice at {start}us overlaps the previous slice ending at {previous_end}us")]
    Overlap { start: u32, previous_end: u32 },

    #[error("slice [{start}us, +{duration}us) exceeds the {interval_length}us interval")]
    OutOfBounds {
        start: u32,
        duration: u32,
        interval_length: u32,
    },

    #[error("schedule covers {covered}us of a {interval_length}us interval")]
    IncompleteCoverage { covered: u64, interval_length: u32 },

    #[error("schedule carries {filler}us of filler time, at least {required}us required")]
    FillerShortfall { filler: u64, required: u32 },
}

// ── Configuration errors ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid config TOML: {0}")]
    Parse(String),

    #[error("unsupported config version {0}")]
    UnsupportedVersion(u32),

    #[error("interval length must be nonzero")]
    EmptyInterval,

    #[error("guard time {guard_time}us does not fit in a {interval_length}us interval")]
    GuardTooLong { guard_time: u32, interval_length: u32 },

    #[error(
        "minimum filler budget {min_filler_budget}us plus guard time does not fit in a {interval_length}us interval"
    )]
    FillerBudgetTooLarge {
        min_filler_budget: u32,
        interval_length: u32,
    },

    #[error("inter-allocation distance {0}us outside [10, 65535]")]
    InterAllocationDistance(u32),

    #[error("unknown scheduling policy '{0}'")]
    UnknownPolicy(String),
}
