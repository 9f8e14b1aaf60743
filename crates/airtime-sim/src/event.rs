use airtime_core::policy::AdmissionPolicy;
use airtime_core::request::{AllocationInfo, StatusCode, Tspec};
use airtime_core::SchedulerError;
use serde::{Deserialize, Serialize};

/// What a request asks the scheduler to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestAction {
    Add,
    Modify,
    Remove,
}

/// One admission request as delivered by the MAC layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequestEvent {
    pub action: RequestAction,
    pub source_id: u8,
    pub tspec: Tspec,
    pub info: AllocationInfo,
}

impl RequestEvent {
    /// Hand the request to `policy`.
    pub fn dispatch(&self, policy: &mut dyn AdmissionPolicy) -> Result<StatusCode, SchedulerError> {
        match self.action {
            RequestAction::Add => policy.add_new_allocation(self.source_id, &self.tspec, &self.info),
            RequestAction::Modify => {
                policy.modify_existing_allocation(self.source_id, &self.tspec, &self.info)
            }
            RequestAction::Remove => policy.remove_allocation(self.source_id, &self.info),
        }
    }
}
