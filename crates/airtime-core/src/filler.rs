//! # Filler window insertion
//!
//! Runs once per interval after the last admission decision. Takes the
//! reserved slices and produces the broadcast schedule:
//!
//! 1. Between each pair of adjacent reservations, if an inter-allocation
//!    distance is configured and its footprint (distance + guard) still fits
//!    in the remaining budget, a filler window of that distance is inserted
//!    and every later reservation moves forward by the footprint. Every
//!    window costs one extra guard time, so a window is skipped when taking
//!    it would leave the interval short of its minimum filler time.
//! 2. Whatever budget is left after the last reservation becomes trailing
//!    filler, so the final `start + duration + guard` lands on the interval
//!    length.
//!
//! The result is then verified: filler time must reach the configured
//! minimum and the records must tile the interval exactly. A failed check
//! means the budget arithmetic upstream is wrong, so it is returned as an
//! error rather than a rejection.

use tracing::{debug, trace};

use crate::allocation::{AllocationList, AllocationRecord};
use crate::budget::TimeBudget;
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::schedule::Schedule;

/// Longest duration a single filler record may carry (16-bit block field).
pub const MAX_FILLER_BLOCK: u32 = 65535;

/// Split a filler footprint into records of at most [`MAX_FILLER_BLOCK`].
///
/// Each produced record is followed by one guard time, and the footprints
/// of all records add up to exactly `footprint`. Returns nothing when the
/// footprint cannot hold a nonzero window.
pub fn filler_blocks(start: u32, footprint: u32, guard_time: u32) -> Vec<AllocationRecord> {
    if footprint <= guard_time {
        return Vec::new();
    }
    let per_block = u64::from(MAX_FILLER_BLOCK) + u64::from(guard_time);
    let count = u64::from(footprint).div_ceil(per_block);
    let total = u64::from(footprint) - count * u64::from(guard_time);
    let base = total / count;
    let extra = total % count;

    let mut blocks = Vec::with_capacity(count as usize);
    let mut at = start;
    for i in 0..count {
        let duration = (base + u64::from(i < extra)) as u32;
        blocks.push(AllocationRecord::filler(at, duration));
        at = at.saturating_add(duration).saturating_add(guard_time);
    }
    blocks
}

/// Total filler duration [`filler_blocks`] carves out of `footprint`.
pub fn filler_yield(footprint: u32, guard_time: u32) -> u64 {
    if footprint <= guard_time {
        return 0;
    }
    let per_block = u64::from(MAX_FILLER_BLOCK) + u64::from(guard_time);
    let count = u64::from(footprint).div_ceil(per_block);
    u64::from(footprint) - count * u64::from(guard_time)
}

/// Smallest trailing footprint that is guaranteed to carve out at least
/// `min_filler_budget` of filler (and never less than 1us), whatever block
/// split [`filler_blocks`] picks for it or for any larger footprint.
pub fn filler_reserve(min_filler_budget: u32, guard_time: u32) -> u64 {
    let wanted = u64::from(min_filler_budget.max(1));
    let guard = u64::from(guard_time);
    let blocks = (wanted + guard).div_ceil(u64::from(MAX_FILLER_BLOCK));
    wanted + blocks * guard
}

/// Interleaves filler windows into a finalized reservation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillerWindowInserter {
    interval_length: u32,
    guard_time: u32,
    min_filler_budget: u32,
    inter_allocation_distance: u32,
}

impl FillerWindowInserter {
    pub fn new(config: &SchedulerConfig) -> Self {
        FillerWindowInserter {
            interval_length: config.interval_length,
            guard_time: config.guard_time,
            min_filler_budget: config.min_filler_budget,
            inter_allocation_distance: config.inter_allocation_distance,
        }
    }

    /// Build and verify the broadcast schedule for `reserved`.
    ///
    /// `budget` must be the tracker state derived from `reserved`; the list
    /// itself is not modified.
    pub fn finalize(
        &self,
        reserved: &AllocationList,
        budget: TimeBudget,
    ) -> Result<Schedule, SchedulerError> {
        let guard = self.guard_time;
        let distance = self.inter_allocation_distance;
        let gap_footprint = distance.saturating_add(guard);

        let mut remaining = budget.remaining();
        let mut offset = 0u32;
        let mut gap_filler = 0u64;
        let mut records = Vec::with_capacity(reserved.len() * 2 + 1);

        let count = reserved.len();
        for (idx, slice) in reserved.iter().enumerate() {
            let mut placed = *slice;
            placed.start = placed.start.saturating_add(offset);
            records.push(placed);

            let has_next = idx + 1 < count;
            if has_next && distance > 0 && self.gap_fits(remaining, gap_filler) {
                let start = placed.end().saturating_add(guard);
                records.extend(filler_blocks(start, gap_footprint, guard));
                offset = offset.saturating_add(gap_footprint);
                remaining -= gap_footprint;
                gap_filler += u64::from(distance);
            }
        }

        let trailing_start = records
            .last()
            .map(|r| r.end().saturating_add(guard))
            .unwrap_or(0);
        if remaining > 0 {
            records.extend(filler_blocks(trailing_start, remaining, guard));
        }

        let schedule = Schedule::new(self.interval_length, guard, records);
        for r in &schedule {
            trace!(
                id = r.id,
                kind = ?r.kind,
                source = r.source_id,
                destination = r.destination_id,
                start = r.start,
                duration = r.duration,
                "scheduled slice"
            );
        }
        self.verify(&schedule)?;

        debug!(
            records = schedule.len(),
            reserved = schedule.reserved().count(),
            filler_us = schedule.filler_time(),
            "interval finalized"
        );
        Ok(schedule)
    }

    /// Whether one more inter-allocation window can be taken out of
    /// `remaining` while the trailing filler still closes the interval and
    /// the filler total stays at or above the minimum.
    fn gap_fits(&self, remaining: u32, gap_filler: u64) -> bool {
        let footprint = self.inter_allocation_distance.saturating_add(self.guard_time);
        let Some(after) = remaining.checked_sub(footprint) else {
            return false;
        };
        if after != 0 && after <= self.guard_time {
            return false;
        }
        let projected = gap_filler
            + u64::from(self.inter_allocation_distance)
            + filler_yield(after, self.guard_time);
        projected >= u64::from(self.min_filler_budget)
    }

    fn verify(&self, schedule: &Schedule) -> Result<(), SchedulerError> {
        let filler = schedule.filler_time();
        if filler < u64::from(self.min_filler_budget) {
            return Err(SchedulerError::FillerShortfall {
                filler,
                required: self.min_filler_budget,
            });
        }

        let covered = schedule.covered_time();
        if !schedule.is_contiguous() || covered != u64::from(self.interval_length) {
            return Err(SchedulerError::IncompleteCoverage {
                covered,
                interval_length: self.interval_length,
            });
        }
        Ok(())
    }
}
