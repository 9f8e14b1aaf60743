//! TOML scenario files: scheduler configuration plus a timed request list.
//!
//! ```toml
//! intervals = 3
//! beacon_interval_us = 102400
//!
//! [scheduler]
//! interval_length_us = 100000
//! guard_time_us = 10
//!
//! [[requests]]
//! at_us = 0
//! action = "add"
//! source = 1
//! destination = 2
//! id = 1
//! kind = "isochronous"
//! min_us = 1000
//! max_us = 3000
//! persistent = true
//! ```

use std::path::Path;

use airtime_core::allocation::AllocationKind;
use airtime_core::config::SchedulerConfigInput;
use airtime_core::request::{AllocationInfo, Tspec};
use airtime_core::{build_policy, SchedulerConfig};
use anyhow::Context;
use serde::Deserialize;

use crate::driver::IntervalDriver;
use crate::event::{RequestAction, RequestEvent};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScenarioInput {
    pub intervals: Option<u64>,
    pub beacon_interval_us: Option<u64>,
    pub scheduler: SchedulerConfigInput,
    pub requests: Vec<RequestInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestInput {
    pub at_us: u64,
    pub action: RequestAction,
    pub source: u8,
    pub destination: u8,
    pub id: u8,
    #[serde(default = "default_kind")]
    pub kind: AllocationKind,
    #[serde(default)]
    pub min_us: u32,
    #[serde(default)]
    pub max_us: u32,
    #[serde(default)]
    pub period: u16,
    #[serde(default)]
    pub persistent: bool,
}

fn default_kind() -> AllocationKind {
    AllocationKind::Isochronous
}

impl RequestInput {
    fn into_event(self) -> (u64, RequestEvent) {
        let event = RequestEvent {
            action: self.action,
            source_id: self.source,
            tspec: Tspec {
                min_duration: self.min_us,
                max_duration: self.max_us,
                period: self.period,
            },
            info: AllocationInfo {
                id: self.id,
                kind: self.kind,
                destination_id: self.destination,
                persistent: self.persistent,
            },
        };
        (self.at_us, event)
    }
}

/// A resolved scenario, ready to drive.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub config: SchedulerConfig,
    pub beacon_interval_us: u64,
    pub intervals: u64,
    pub requests: Vec<(u64, RequestEvent)>,
}

impl Scenario {
    pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
        let parsed: ScenarioInput = toml::from_str(input).context("invalid scenario TOML")?;
        let config = parsed.scheduler.resolve()?;
        let beacon_interval_us = parsed
            .beacon_interval_us
            .unwrap_or(u64::from(config.interval_length));
        let intervals = match parsed.intervals {
            Some(0) => anyhow::bail!("scenario must run at least one interval"),
            other => other.unwrap_or(1),
        };
        Ok(Scenario {
            beacon_interval_us,
            intervals,
            requests: parsed
                .requests
                .into_iter()
                .map(RequestInput::into_event)
                .collect(),
            config,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in scenario {}", path.display()))
    }

    /// Driver with the scenario's policy and every request queued.
    pub fn driver(&self) -> anyhow::Result<IntervalDriver> {
        let policy = build_policy(self.config.clone())?;
        let mut driver = IntervalDriver::new(policy, self.beacon_interval_us)?;
        for (at, event) in &self.requests {
            driver.submit(*at, *event);
        }
        Ok(driver)
    }
}
