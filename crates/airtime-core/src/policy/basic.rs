//! # Basic admission policy
//!
//! Reservations are packed back to back from the start of the interval,
//! each followed by one guard time. A request is granted:
//!
//! - isochronous: `floor((min + max) / 2)`, degraded to `min` when the
//!   midpoint does not fit
//! - asynchronous: `min`, no degradation
//!
//! "Fits" always means that, after the change, the unreserved time left
//! behind the last slice still yields `min_filler_budget` of trailing
//! filler once its guard time is paid. A new slice therefore has to fit
//! together with its own guard time, while growing an existing one only
//! has to fit the difference. Shrinking is always accepted.

use tracing::debug;

use crate::allocation::{AllocationKind, AllocationList, Lookup};
use crate::budget::TimeBudget;
use crate::config::SchedulerConfig;
use crate::error::{ConfigError, SchedulerError};
use crate::policy::AdmissionPolicy;
use crate::request::{granted_duration, AllocationInfo, StatusCode, Tspec};
use crate::reservations::ReservationTable;
use crate::schedule::Schedule;

#[derive(Debug, Clone)]
pub struct BasicPolicy {
    table: ReservationTable,
}

impl BasicPolicy {
    pub fn new(config: SchedulerConfig) -> Result<Self, ConfigError> {
        Ok(BasicPolicy {
            table: ReservationTable::new(config)?,
        })
    }

    fn fits_new(&self, duration: u32) -> bool {
        self.table.headroom().is_some_and(|room| duration <= room)
    }

    fn fits_growth(&self, delta: u32) -> bool {
        self.table.growth_headroom().is_some_and(|room| delta <= room)
    }
}

impl AdmissionPolicy for BasicPolicy {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn config(&self) -> &SchedulerConfig {
        self.table.config()
    }

    fn allocations(&self) -> &AllocationList {
        self.table.list()
    }

    fn budget(&self) -> TimeBudget {
        self.table.budget()
    }

    fn add_new_allocation(
        &mut self,
        source_id: u8,
        tspec: &Tspec,
        info: &AllocationInfo,
    ) -> Result<StatusCode, SchedulerError> {
        let granted = granted_duration(tspec, info.kind)?;
        if self.table.lookup(source_id, info) != Lookup::Missing {
            return Err(SchedulerError::DuplicateAllocation {
                id: info.id,
                source_id,
                destination_id: info.destination_id,
            });
        }

        let duration = if self.fits_new(granted) {
            granted
        } else if info.kind == AllocationKind::Isochronous && self.fits_new(tspec.min_duration) {
            debug!(
                source = source_id,
                id = info.id,
                requested_us = granted,
                granted_us = tspec.min_duration,
                "degraded to minimum allocation"
            );
            tspec.min_duration
        } else {
            debug!(
                source = source_id,
                id = info.id,
                requested_us = granted,
                remaining_us = self.table.budget().remaining(),
                "allocation rejected"
            );
            return Ok(StatusCode::Failure);
        };

        self.table.append(source_id, info, duration)?;
        debug!(
            source = source_id,
            id = info.id,
            destination = info.destination_id,
            start_us = self.table.list().last().map(|r| r.start).unwrap_or_default(),
            granted_us = duration,
            remaining_us = self.table.budget().remaining(),
            "allocation accepted"
        );
        Ok(StatusCode::Success)
    }

    fn modify_existing_allocation(
        &mut self,
        source_id: u8,
        tspec: &Tspec,
        info: &AllocationInfo,
    ) -> Result<StatusCode, SchedulerError> {
        let new_duration = granted_duration(tspec, info.kind)?;
        let index = self.table.locate(source_id, info)?;
        let current = self
            .table
            .list()
            .get(index)
            .map(|r| r.duration)
            .unwrap_or_default();
        debug!(
            source = source_id,
            id = info.id,
            current_us = current,
            requested_us = new_duration,
            "modification requested"
        );

        if new_duration <= current {
            self.table.resize(index, new_duration)?;
            return Ok(StatusCode::Success);
        }

        let target = if self.fits_growth(new_duration - current) {
            new_duration
        } else if info.kind == AllocationKind::Isochronous
            && tspec.min_duration > current
            && self.fits_growth(tspec.min_duration - current)
        {
            tspec.min_duration
        } else {
            debug!(
                source = source_id,
                id = info.id,
                remaining_us = self.table.budget().remaining(),
                "modification rejected, keeping current duration"
            );
            return Ok(StatusCode::Failure);
        };

        self.table.resize(index, target)?;
        debug!(
            source = source_id,
            id = info.id,
            granted_us = target,
            remaining_us = self.table.budget().remaining(),
            "allocation grown"
        );
        Ok(StatusCode::Success)
    }

    fn remove_allocation(
        &mut self,
        source_id: u8,
        info: &AllocationInfo,
    ) -> Result<StatusCode, SchedulerError> {
        let index = self.table.locate(source_id, info)?;
        if let Some(removed) = self.table.remove(index)? {
            debug!(
                source = source_id,
                id = removed.id,
                freed_us = removed.duration,
                remaining_us = self.table.budget().remaining(),
                "allocation removed"
            );
        }
        Ok(StatusCode::Success)
    }

    fn finalize_interval(&self) -> Result<Schedule, SchedulerError> {
        self.table.finalize()
    }

    fn begin_interval(&mut self) -> Result<usize, SchedulerError> {
        self.table.retain_persistent()
    }
}
