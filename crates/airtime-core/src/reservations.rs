//! Reservation table shared by every admission policy.
//!
//! Owns the request list for the current interval together with the budget
//! derived from it. All structural changes go through [`ReservationTable`]
//! so that the budget is recomputed after each one and a failed change
//! leaves both untouched.

use tracing::debug;

use crate::allocation::{AllocationList, AllocationRecord, Lookup};
use crate::budget::TimeBudget;
use crate::config::SchedulerConfig;
use crate::error::{ConfigError, SchedulerError};
use crate::filler::FillerWindowInserter;
use crate::request::AllocationInfo;
use crate::schedule::Schedule;

#[derive(Debug, Clone)]
pub struct ReservationTable {
    config: SchedulerConfig,
    list: AllocationList,
    budget: TimeBudget,
}

impl ReservationTable {
    pub fn new(config: SchedulerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let list = AllocationList::new(config.interval_length);
        let budget = TimeBudget::empty(config.interval_length);
        Ok(ReservationTable {
            config,
            list,
            budget,
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn list(&self) -> &AllocationList {
        &self.list
    }

    pub fn budget(&self) -> TimeBudget {
        self.budget
    }

    /// Longest slice a new reservation may get: the slice's own guard time
    /// and the filler reserve must still fit behind it.
    pub fn headroom(&self) -> Option<u32> {
        let reserve = self.config.filler_reserve() + u64::from(self.config.guard_time);
        self.budget.headroom(reserve)
    }

    /// How far an existing reservation may grow without eating into the
    /// filler reserve.
    pub fn growth_headroom(&self) -> Option<u32> {
        self.budget.headroom(self.config.filler_reserve())
    }

    pub fn lookup(&self, source_id: u8, info: &AllocationInfo) -> Lookup {
        self.list.lookup(info.id, source_id, info.destination_id)
    }

    /// Index of a modifiable record, or the error describing why there is none.
    pub fn locate(&self, source_id: u8, info: &AllocationInfo) -> Result<usize, SchedulerError> {
        match self.lookup(source_id, info) {
            Lookup::Found(idx) => Ok(idx),
            Lookup::Unmodifiable(_) => Err(SchedulerError::ImmutableAllocation {
                id: info.id,
                source_id,
            }),
            Lookup::Missing => Err(SchedulerError::UnknownAllocation {
                id: info.id,
                source_id,
                destination_id: info.destination_id,
            }),
        }
    }

    /// Reserve `duration` at the cursor.
    pub fn append(
        &mut self,
        source_id: u8,
        info: &AllocationInfo,
        duration: u32,
    ) -> Result<(), SchedulerError> {
        let record = AllocationRecord {
            id: info.id,
            kind: info.kind,
            persistent: info.persistent,
            source_id,
            destination_id: info.destination_id,
            start: self.budget.cursor(),
            duration,
        };
        self.apply(|list| list.append(record))
    }

    /// Give the record at `index` a new duration and slide everything after
    /// it by the difference.
    pub fn resize(&mut self, index: usize, duration: u32) -> Result<(), SchedulerError> {
        let Some(current) = self.list.get(index).map(|r| r.duration) else {
            return Err(SchedulerError::NoSuchIndex {
                index,
                len: self.list.len(),
            });
        };
        let delta = i64::from(duration) - i64::from(current);
        self.apply(|list| {
            list.set_duration(index, duration)?;
            list.shift_from(index + 1, delta)
        })
    }

    /// Drop the record at `index` and pull later records back over its
    /// footprint.
    pub fn remove(&mut self, index: usize) -> Result<Option<AllocationRecord>, SchedulerError> {
        let guard = self.config.guard_time;
        let mut removed = None;
        self.apply(|list| {
            removed = remove_and_close(list, index, guard)?;
            Ok(())
        })?;
        Ok(removed)
    }

    /// Keep only persistent records, closing the gaps left behind.
    /// Returns how many records were dropped.
    pub fn retain_persistent(&mut self) -> Result<usize, SchedulerError> {
        let guard = self.config.guard_time;
        let mut dropped = 0;
        self.apply(|list| {
            for idx in (0..list.len()).rev() {
                if list.get(idx).is_some_and(|r| !r.persistent) {
                    remove_and_close(list, idx, guard)?;
                    dropped += 1;
                }
            }
            Ok(())
        })?;
        if dropped > 0 {
            debug!(dropped, kept = self.list.len(), "non-persistent allocations released");
        }
        Ok(dropped)
    }

    pub fn finalize(&self) -> Result<Schedule, SchedulerError> {
        FillerWindowInserter::new(&self.config).finalize(&self.list, self.budget)
    }

    /// Run `change` against a copy of the list and commit only on success.
    fn apply<F>(&mut self, change: F) -> Result<(), SchedulerError>
    where
        F: FnOnce(&mut AllocationList) -> Result<(), SchedulerError>,
    {
        let mut next = self.list.clone();
        change(&mut next)?;
        self.list = next;
        self.budget = TimeBudget::recompute(
            &self.list,
            self.config.interval_length,
            self.config.guard_time,
        );
        Ok(())
    }
}

fn remove_and_close(
    list: &mut AllocationList,
    index: usize,
    guard_time: u32,
) -> Result<Option<AllocationRecord>, SchedulerError> {
    let Some(record) = list.remove(index) else {
        return Ok(None);
    };
    let footprint = i64::from(record.duration) + i64::from(guard_time);
    list.shift_from(index, -footprint)?;
    Ok(Some(record))
}
