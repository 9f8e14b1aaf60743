//! # Interval driver
//!
//! Plays the part of the MAC layer and its event loop. Requests are queued
//! with a delivery time; [`IntervalDriver::run_interval`] delivers every
//! request due before the next beacon, then at the beacon instant:
//!
//! 1. finalizes the schedule announced in that beacon
//! 2. hands it to the [`BeaconSink`]
//! 3. rolls the policy over, releasing non-persistent reservations
//!
//! Requests are processed one at a time to completion. A contract
//! violation reported by the policy stops the run.

use airtime_core::policy::AdmissionPolicy;
use airtime_core::request::StatusCode;
use airtime_core::Schedule;
use anyhow::Context;
use serde::Serialize;
use tracing::{debug, info};

use crate::clock::{EventId, EventQueue, SimClock};
use crate::event::RequestEvent;
use crate::generator::RequestGenerator;
use crate::sink::BeaconSink;

/// Outcome of one interval.
#[derive(Debug, Clone, Serialize)]
pub struct IntervalReport {
    pub index: u64,
    pub start_us: u64,
    /// Beacon instant at which the schedule was finalized.
    pub finalized_at_us: u64,
    pub accepted: u32,
    pub rejected: u32,
    /// Non-persistent reservations released after finalization.
    pub released: usize,
    pub schedule: Schedule,
}

pub struct IntervalDriver {
    policy: Box<dyn AdmissionPolicy>,
    clock: SimClock,
    queue: EventQueue<RequestEvent>,
    beacon_interval_us: u64,
    index: u64,
}

impl IntervalDriver {
    pub fn new(policy: Box<dyn AdmissionPolicy>, beacon_interval_us: u64) -> anyhow::Result<Self> {
        let interval_length = u64::from(policy.config().interval_length);
        if beacon_interval_us < interval_length {
            anyhow::bail!(
                "beacon interval {}us is shorter than the {}us scheduled interval",
                beacon_interval_us,
                interval_length
            );
        }
        Ok(IntervalDriver {
            policy,
            clock: SimClock::new(),
            queue: EventQueue::new(),
            beacon_interval_us,
            index: 0,
        })
    }

    pub fn policy(&self) -> &dyn AdmissionPolicy {
        self.policy.as_ref()
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    pub fn beacon_interval_us(&self) -> u64 {
        self.beacon_interval_us
    }

    /// Start time of the interval currently collecting requests.
    pub fn interval_start(&self) -> u64 {
        self.index * self.beacon_interval_us
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Queue a request for delivery at `at_us`. Requests dated in the past
    /// are delivered at the next opportunity.
    pub fn submit(&mut self, at_us: u64, event: RequestEvent) -> EventId {
        self.queue.schedule(at_us.max(self.clock.now()), event)
    }

    pub fn cancel(&mut self, id: EventId) -> bool {
        self.queue.cancel(id)
    }

    /// Deliver the requests of the current interval and finalize it.
    pub fn run_interval(&mut self, sink: &mut dyn BeaconSink) -> anyhow::Result<IntervalReport> {
        let start_us = self.interval_start();
        let beacon_at = start_us + self.beacon_interval_us;
        let mut accepted = 0;
        let mut rejected = 0;

        while let Some((at, event)) = self.queue.pop_before(beacon_at) {
            self.clock.advance_to(at)?;
            let status = event.dispatch(self.policy.as_mut()).with_context(|| {
                format!(
                    "{:?} request from source {} (allocation {}) at {}us",
                    event.action, event.source_id, event.info.id, at
                )
            })?;
            match status {
                StatusCode::Success => accepted += 1,
                StatusCode::Failure => rejected += 1,
            }
            debug!(at_us = at, action = ?event.action, source = event.source_id, id = event.info.id, ?status, "request handled");
        }

        self.clock.advance_to(beacon_at)?;
        let schedule = self
            .policy
            .finalize_interval()
            .with_context(|| format!("finalizing interval {}", self.index))?;

        let mut report = IntervalReport {
            index: self.index,
            start_us,
            finalized_at_us: beacon_at,
            accepted,
            rejected,
            released: 0,
            schedule,
        };
        report.released = self.policy.begin_interval()?;
        sink.publish(&report)?;

        info!(
            interval = report.index,
            accepted,
            rejected,
            reserved = report.schedule.reserved().count(),
            filler_us = report.schedule.filler_time(),
            released = report.released,
            "interval finalized"
        );
        self.index += 1;
        Ok(report)
    }

    /// Run `intervals` intervals with the requests already queued.
    pub fn run(
        &mut self,
        intervals: u64,
        sink: &mut dyn BeaconSink,
    ) -> anyhow::Result<Vec<IntervalReport>> {
        let mut reports = Vec::new();
        for _ in 0..intervals {
            reports.push(self.run_interval(sink)?);
        }
        Ok(reports)
    }

    /// Run `intervals` intervals, asking `generator` for a fresh batch of
    /// requests at the start of each one.
    pub fn run_generated(
        &mut self,
        generator: &mut RequestGenerator,
        intervals: u64,
        sink: &mut dyn BeaconSink,
    ) -> anyhow::Result<Vec<IntervalReport>> {
        let mut reports = Vec::new();
        for _ in 0..intervals {
            let batch = generator.plan(
                self.policy.allocations(),
                self.interval_start(),
                self.beacon_interval_us,
            );
            for (at, event) in batch {
                self.submit(at, event);
            }
            reports.push(self.run_interval(sink)?);
        }
        Ok(reports)
    }
}
