//! Policy that never reserves time: every request is turned down and the
//! whole interval is broadcast as contention access.

use tracing::debug;

use crate::allocation::AllocationList;
use crate::budget::TimeBudget;
use crate::config::SchedulerConfig;
use crate::error::{ConfigError, SchedulerError};
use crate::policy::AdmissionPolicy;
use crate::request::{granted_duration, AllocationInfo, StatusCode, Tspec};
use crate::reservations::ReservationTable;
use crate::schedule::Schedule;

#[derive(Debug, Clone)]
pub struct ContentionOnlyPolicy {
    table: ReservationTable,
}

impl ContentionOnlyPolicy {
    pub fn new(config: SchedulerConfig) -> Result<Self, ConfigError> {
        Ok(ContentionOnlyPolicy {
            table: ReservationTable::new(config)?,
        })
    }
}

impl AdmissionPolicy for ContentionOnlyPolicy {
    fn name(&self) -> &'static str {
        "contention-only"
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
        granted_duration(tspec, info.kind)?;
        debug!(source = source_id, id = info.id, "allocation rejected");
        Ok(StatusCode::Failure)
    }

    fn modify_existing_allocation(
        &mut self,
        source_id: u8,
        tspec: &Tspec,
        info: &AllocationInfo,
    ) -> Result<StatusCode, SchedulerError> {
        granted_duration(tspec, info.kind)?;
        debug!(source = source_id, id = info.id, "modification rejected");
        Ok(StatusCode::Failure)
    }

    fn remove_allocation(
        &mut self,
        source_id: u8,
        info: &AllocationInfo,
    ) -> Result<StatusCode, SchedulerError> {
        // Nothing is ever admitted, so any id is unknown.
        self.table.locate(source_id, info)?;
        Ok(StatusCode::Success)
    }

    fn finalize_interval(&self) -> Result<Schedule, SchedulerError> {
        self.table.finalize()
    }

    fn begin_interval(&mut self) -> Result<usize, SchedulerError> {
        Ok(0)
    }
}
