//! Admission request types.
//!
//! A request arrives as a traffic specification ([`Tspec`]) plus the
//! allocation description ([`AllocationInfo`]). Neither is stored; the
//! scheduler turns an accepted request into an
//! [`AllocationRecord`](crate::allocation::AllocationRecord).

use serde::{Deserialize, Serialize};

use crate::allocation::AllocationKind;
use crate::error::SchedulerError;

/// Requested time per interval, in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tspec {
    pub min_duration: u32,
    /// Ignored for asynchronous requests.
    pub max_duration: u32,
    /// Repeat period inside one interval. Only 0 (single slice) is supported.
    pub period: u16,
}

impl Tspec {
    pub fn new(min_duration: u32, max_duration: u32) -> Self {
        Tspec {
            min_duration,
            max_duration,
            period: 0,
        }
    }

    /// Minimum-only specification for asynchronous traffic.
    pub fn minimum(min_duration: u32) -> Self {
        Self::new(min_duration, 0)
    }
}

/// Identity and kind of the allocation a request refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationInfo {
    /// Caller-assigned; unique per (source, destination) pair.
    pub id: u8,
    pub kind: AllocationKind,
    pub destination_id: u8,
    pub persistent: bool,
}

/// Result of an admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusCode {
    Success,
    Failure,
}

impl StatusCode {
    pub fn is_success(self) -> bool {
        matches!(self, StatusCode::Success)
    }
}

/// Duration the basic policy grants a request before any degradation.
///
/// Isochronous requests get the floor of the min/max midpoint, asynchronous
/// requests get their minimum. Periodic requests and filler kinds are
/// rejected as contract violations before anything is computed.
pub fn granted_duration(tspec: &Tspec, kind: AllocationKind) -> Result<u32, SchedulerError> {
    if tspec.period != 0 {
        return Err(SchedulerError::PeriodicAllocation {
            period: tspec.period,
        });
    }
    match kind {
        AllocationKind::Isochronous => {
            let sum = u64::from(tspec.min_duration) + u64::from(tspec.max_duration);
            Ok((sum / 2) as u32)
        }
        AllocationKind::Asynchronous => Ok(tspec.min_duration),
        AllocationKind::Filler => Err(SchedulerError::UnsupportedKind(kind)),
    }
}
