//! Simulated time: a monotonic microsecond clock and a cancellable queue of
//! pending events.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Monotonically increasing clock in microseconds.
#[derive(Debug, Default, Clone)]
pub struct SimClock {
    now_us: u64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now_us
    }

    /// Move the clock to `t_us`. Going backwards is an error.
    pub fn advance_to(&mut self, t_us: u64) -> anyhow::Result<()> {
        if t_us < self.now_us {
            anyhow::bail!("clock cannot move backwards from {}us to {}us", self.now_us, t_us);
        }
        self.now_us = t_us;
        Ok(())
    }
}

/// Handle for a scheduled event, used to cancel it before it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(u64);

/// Time-ordered queue of pending events. Events with equal timestamps fire
/// in the order they were scheduled.
#[derive(Debug)]
pub struct EventQueue<E> {
    order: BinaryHeap<Reverse<(u64, u64)>>,
    pending: HashMap<u64, E>,
    next_seq: u64,
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        EventQueue {
            order: BinaryHeap::new(),
            pending: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, at_us: u64, event: E) -> EventId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.push(Reverse((at_us, seq)));
        self.pending.insert(seq, event);
        EventId(seq)
    }

    /// Cancel a pending event. Returns false if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, id: EventId) -> bool {
        self.pending.remove(&id.0).is_some()
    }

    /// Pop the earliest pending event scheduled strictly before `limit_us`.
    pub fn pop_before(&mut self, limit_us: u64) -> Option<(u64, E)> {
        while let Some(&Reverse((at, seq))) = self.order.peek() {
            if at >= limit_us {
                return None;
            }
            self.order.pop();
            // cancelled events leave a stale heap entry behind
            if let Some(event) = self.pending.remove(&seq) {
                return Some((at, event));
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic() {
        let mut clock = SimClock::new();
        clock.advance_to(100).unwrap();
        clock.advance_to(100).unwrap();
        assert!(clock.advance_to(99).is_err());
        assert_eq!(clock.now(), 100);
    }

    #[test]
    fn events_pop_in_time_then_fifo_order() {
        let mut q = EventQueue::new();
        q.schedule(30, "c");
        q.schedule(10, "a");
        q.schedule(10, "b");
        q.schedule(50, "d");

        assert_eq!(q.pop_before(40), Some((10, "a")));
        assert_eq!(q.pop_before(40), Some((10, "b")));
        assert_eq!(q.pop_before(40), Some((30, "c")));
        assert_eq!(q.pop_before(40), None);
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop_before(51), Some((50, "d")));
        assert!(q.is_empty());
    }

    #[test]
    fn cancelled_events_never_fire() {
        let mut q = EventQueue::new();
        let a = q.schedule(10, 1);
        q.schedule(20, 2);
        assert!(q.cancel(a));
        assert!(!q.cancel(a));
        assert_eq!(q.pop_before(100), Some((20, 2)));
        assert_eq!(q.pop_before(100), None);
    }
}
