//! Remaining-time bookkeeping for one interval.

use serde::Serialize;

use crate::allocation::AllocationList;

/// Where the next slice may start and how much of the interval is still free.
///
/// Always derived from the list with [`TimeBudget::recompute`] after a
/// structural change rather than adjusted in place, so guard-time accounting
/// cannot drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeBudget {
    cursor: u32,
    remaining: u32,
}

impl TimeBudget {
    /// Budget of an interval with nothing reserved.
    pub fn empty(interval_length: u32) -> Self {
        TimeBudget {
            cursor: 0,
            remaining: interval_length,
        }
    }

    pub fn recompute(list: &AllocationList, interval_length: u32, guard_time: u32) -> Self {
        match list.last() {
            None => Self::empty(interval_length),
            Some(last) => {
                let cursor = last.end().saturating_add(guard_time);
                TimeBudget {
                    cursor,
                    remaining: interval_length.saturating_sub(cursor),
                }
            }
        }
    }

    /// Start offset for the next appended slice.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Unallocated time, guard gaps already deducted.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Time that may still be reserved while keeping `reserve` free for
    /// filler windows. `None` when the reserve itself is already breached.
    pub fn headroom(&self, reserve: u64) -> Option<u32> {
        u64::from(self.remaining)
            .checked_sub(reserve)
            .map(|room| room as u32)
    }
}
