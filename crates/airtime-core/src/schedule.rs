//! Finalized, broadcastable schedule of one interval.

use serde::Serialize;

use crate::allocation::AllocationRecord;

/// Reserved slices interleaved with filler windows, covering the whole
/// interval. Produced once per interval by
/// [`FillerWindowInserter`](crate::filler::FillerWindowInserter) and handed
/// to the beacon broadcaster as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    interval_length: u32,
    guard_time: u32,
    records: Vec<AllocationRecord>,
}

impl Schedule {
    pub(crate) fn new(interval_length: u32, guard_time: u32, records: Vec<AllocationRecord>) -> Self {
        Schedule {
            interval_length,
            guard_time,
            records,
        }
    }

    pub fn interval_length(&self) -> u32 {
        self.interval_length
    }

    pub fn guard_time(&self) -> u32 {
        self.guard_time
    }

    pub fn records(&self) -> &[AllocationRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AllocationRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reserved (non-filler) slices in chronological order.
    pub fn reserved(&self) -> impl Iterator<Item = &AllocationRecord> + '_ {
        self.records.iter().filter(|r| !r.kind.is_filler())
    }

    pub fn fillers(&self) -> impl Iterator<Item = &AllocationRecord> + '_ {
        self.records.iter().filter(|r| r.kind.is_filler())
    }

    /// Sum of filler window durations.
    pub fn filler_time(&self) -> u64 {
        self.fillers().map(|r| u64::from(r.duration)).sum()
    }

    /// Sum of `duration + guard_time` over every record.
    pub fn covered_time(&self) -> u64 {
        self.records
            .iter()
            .map(|r| u64::from(r.duration) + u64::from(self.guard_time))
            .sum()
    }

    /// True when records are back to back (each separated by exactly one
    /// guard time) starting at offset 0.
    pub fn is_contiguous(&self) -> bool {
        let mut expected = 0u64;
        for r in &self.records {
            if u64::from(r.start) != expected {
                return false;
            }
            expected = u64::from(r.end()) + u64::from(self.guard_time);
        }
        true
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a AllocationRecord;
    type IntoIter = std::slice::Iter<'a, AllocationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
