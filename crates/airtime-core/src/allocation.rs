//! # Allocation records
//!
//! An [`AllocationRecord`] is one reserved slice of the contention-free
//! interval. [`AllocationList`] keeps those slices in a contiguous vector
//! ordered by start offset and enforces the layout invariants on every
//! structural change:
//!
//! - `start + duration` never exceeds the interval length
//! - a slice never starts before the previous slice ends
//! - shifting a suffix never reorders records
//!
//! Offsets and durations are microseconds from the start of the interval.

use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// Endpoint id used for both ends of a filler window.
pub const BROADCAST_ENDPOINT: u8 = 255;

/// Allocation id carried by every filler window.
pub const FILLER_ALLOCATION_ID: u8 = 0;

/// How the time in a slice is negotiated and used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllocationKind {
    /// Range-negotiated reservation; granted the midpoint of min/max.
    Isochronous,
    /// Minimum-only reservation.
    Asynchronous,
    /// Contention/broadcast access window carved out by the scheduler.
    Filler,
}

impl AllocationKind {
    pub fn is_filler(self) -> bool {
        matches!(self, AllocationKind::Filler)
    }
}

/// One reserved time slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub id: u8,
    pub kind: AllocationKind,
    /// Survives interval rollover when set.
    pub persistent: bool,
    pub source_id: u8,
    pub destination_id: u8,
    /// Offset from the interval start, in microseconds.
    pub start: u32,
    /// Slice length in microseconds.
    pub duration: u32,
}

impl AllocationRecord {
    /// Filler window owned by the broadcast endpoint.
    pub fn filler(start: u32, duration: u32) -> Self {
        AllocationRecord {
            id: FILLER_ALLOCATION_ID,
            kind: AllocationKind::Filler,
            persistent: true,
            source_id: BROADCAST_ENDPOINT,
            destination_id: BROADCAST_ENDPOINT,
            start,
            duration,
        }
    }

    /// First microsecond after the slice.
    pub fn end(&self) -> u32 {
        self.start + self.duration
    }

    pub fn matches(&self, id: u8, source_id: u8, destination_id: u8) -> bool {
        self.id == id && self.source_id == source_id && self.destination_id == destination_id
    }
}

/// Outcome of looking a record up by its (id, source, destination) key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Record exists at this index and may be changed.
    Found(usize),
    /// Record exists at this index but is a filler window.
    Unmodifiable(usize),
    Missing,
}

/// Chronologically ordered, non-overlapping slices of one interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationList {
    records: Vec<AllocationRecord>,
    interval_length: u32,
}

impl AllocationList {
    pub fn new(interval_length: u32) -> Self {
        AllocationList {
            records: Vec::new(),
            interval_length,
        }
    }

    pub fn interval_length(&self) -> u32 {
        self.interval_length
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&AllocationRecord> {
        self.records.last()
    }

    pub fn get(&self, index: usize) -> Option<&AllocationRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AllocationRecord> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[AllocationRecord] {
        &self.records
    }

    /// Append a record after the current last slice.
    ///
    /// Fails without touching the list if the record would start before the
    /// previous slice ends or run past the interval.
    pub fn append(&mut self, record: AllocationRecord) -> Result<(), SchedulerError> {
        self.check_bounds(record.start, record.duration)?;
        if let Some(prev) = self.records.last() {
            if record.start < prev.end() {
                return Err(SchedulerError::Overlap {
                    start: record.start,
                    previous_end: prev.end(),
                });
            }
        }
        self.records.push(record);
        Ok(())
    }

    pub fn lookup(&self, id: u8, source_id: u8, destination_id: u8) -> Lookup {
        match self
            .records
            .iter()
            .position(|r| r.matches(id, source_id, destination_id))
        {
            Some(idx) if self.records[idx].kind.is_filler() => Lookup::Unmodifiable(idx),
            Some(idx) => Lookup::Found(idx),
            None => Lookup::Missing,
        }
    }

    /// Replace the duration of the record at `index`. Later records are not
    /// moved; pair this with [`AllocationList::shift_from`].
    pub fn set_duration(&mut self, index: usize, duration: u32) -> Result<(), SchedulerError> {
        let Some(record) = self.records.get(index) else {
            return Err(SchedulerError::NoSuchIndex {
                index,
                len: self.records.len(),
            });
        };
        self.check_bounds(record.start, duration)?;
        self.records[index].duration = duration;
        Ok(())
    }

    /// Move every record from `from` onward by `delta` microseconds
    /// (negative = earlier) in a single pass.
    ///
    /// The whole suffix is validated before any start is rewritten, so a
    /// failed shift leaves the list untouched.
    pub fn shift_from(&mut self, from: usize, delta: i64) -> Result<(), SchedulerError> {
        if delta == 0 || from >= self.records.len() {
            return Ok(());
        }

        let first = self.records[from];
        let new_first_start = i64::from(first.start) + delta;
        let floor = match from.checked_sub(1) {
            Some(prev) => i64::from(self.records[prev].end()),
            None => 0,
        };
        if new_first_start < floor {
            return Err(SchedulerError::Overlap {
                start: new_first_start.max(0) as u32,
                previous_end: floor as u32,
            });
        }

        let last = self.records[self.records.len() - 1];
        let new_last_end = i64::from(last.end()) + delta;
        if new_last_end > i64::from(self.interval_length) {
            return Err(SchedulerError::OutOfBounds {
                start: (i64::from(last.start) + delta) as u32,
                duration: last.duration,
                interval_length: self.interval_length,
            });
        }

        for record in &mut self.records[from..] {
            record.start = (i64::from(record.start) + delta) as u32;
        }
        Ok(())
    }

    /// Remove the record at `index`, leaving later records where they are.
    pub fn remove(&mut self, index: usize) -> Option<AllocationRecord> {
        if index < self.records.len() {
            Some(self.records.remove(index))
        } else {
            None
        }
    }

    fn check_bounds(&self, start: u32, duration: u32) -> Result<(), SchedulerError> {
        match start.checked_add(duration) {
            Some(end) if end <= self.interval_length => Ok(()),
            _ => Err(SchedulerError::OutOfBounds {
                start,
                duration,
                interval_length: self.interval_length,
            }),
        }
    }
}

impl<'a> IntoIterator for &'a AllocationList {
    type Item = &'a AllocationRecord;
    type IntoIter = std::slice::Iter<'a, AllocationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
