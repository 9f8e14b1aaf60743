//! Consumers of finalized schedules (the beacon broadcaster side).

use std::io::Write;

use anyhow::Context;

use crate::driver::IntervalReport;

/// Receives one report per finalized interval.
pub trait BeaconSink {
    fn publish(&mut self, report: &IntervalReport) -> anyhow::Result<()>;
}

/// Keeps every report in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub reports: Vec<IntervalReport>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BeaconSink for RecordingSink {
    fn publish(&mut self, report: &IntervalReport) -> anyhow::Result<()> {
        self.reports.push(report.clone());
        Ok(())
    }
}

/// Writes each report as one JSON line.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        JsonLinesSink { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> BeaconSink for JsonLinesSink<W> {
    fn publish(&mut self, report: &IntervalReport) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.out, report).context("failed to encode interval report")?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}
