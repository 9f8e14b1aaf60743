use serde::Deserialize;

use crate::error::ConfigError;
use crate::filler;

pub const CONFIG_VERSION: u32 = 1;

/// Upper bound of a nonzero inter-allocation distance.
pub const MAX_INTER_ALLOCATION_DISTANCE: u32 = 65535;
/// Lower bound of a nonzero inter-allocation distance.
pub const MIN_INTER_ALLOCATION_DISTANCE: u32 = 10;

/// Which admission policy drives the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PolicyKind {
    #[default]
    Basic,
    ContentionOnly,
}

impl PolicyKind {
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(PolicyKind::Basic),
            "contention-only" | "contention_only" => Ok(PolicyKind::ContentionOnly),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Basic => "basic",
            PolicyKind::ContentionOnly => "contention-only",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchedulerConfigInput {
    pub version: u32,
    pub policy: Option<String>,
    pub interval_length_us: Option<u32>,
    pub guard_time_us: Option<u32>,
    pub min_filler_budget_us: Option<u32>,
    pub inter_allocation_distance_us: Option<u32>,
}

/// Scheduler parameters, fixed for the lifetime of an interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub version: u32,
    pub policy: PolicyKind,
    /// Length of the scheduled interval.
    pub interval_length: u32,
    /// Idle gap enforced after every slice.
    pub guard_time: u32,
    /// Minimum cumulative filler time per interval.
    pub min_filler_budget: u32,
    /// Filler inserted between adjacent reservations; 0 disables it.
    pub inter_allocation_distance: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            policy: PolicyKind::Basic,
            interval_length: 100_000,
            guard_time: 10,
            min_filler_budget: 4096,
            inter_allocation_distance: 0,
        }
    }
}

impl SchedulerConfigInput {
    pub fn resolve(self) -> Result<SchedulerConfig, ConfigError> {
        let version = if self.version == 0 {
            CONFIG_VERSION
        } else {
            self.version
        };
        if version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion(version));
        }

        let defaults = SchedulerConfig::default();
        let policy = match self.policy.as_deref() {
            Some(name) => PolicyKind::parse(name)?,
            None => defaults.policy,
        };

        let cfg = SchedulerConfig {
            version,
            policy,
            interval_length: self.interval_length_us.unwrap_or(defaults.interval_length),
            guard_time: self.guard_time_us.unwrap_or(defaults.guard_time),
            min_filler_budget: self
                .min_filler_budget_us
                .unwrap_or(defaults.min_filler_budget),
            inter_allocation_distance: self
                .inter_allocation_distance_us
                .unwrap_or(defaults.inter_allocation_distance),
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

impl SchedulerConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(SchedulerConfig::default());
        }
        let parsed: SchedulerConfigInput =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        parsed.resolve()
    }

    /// Unreserved time the interval must keep so that its trailing filler
    /// reaches `min_filler_budget`. Admission never lets the remaining
    /// budget drop below this.
    pub fn filler_reserve(&self) -> u64 {
        filler::filler_reserve(self.min_filler_budget, self.guard_time)
    }

    /// Check the cross-field constraints. Called by `resolve`; call it again
    /// after building a config by hand.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_length == 0 {
            return Err(ConfigError::EmptyInterval);
        }
        if self.guard_time >= self.interval_length {
            return Err(ConfigError::GuardTooLong {
                guard_time: self.guard_time,
                interval_length: self.interval_length,
            });
        }
        if self.filler_reserve() > u64::from(self.interval_length) {
            return Err(ConfigError::FillerBudgetTooLarge {
                min_filler_budget: self.min_filler_budget,
                interval_length: self.interval_length,
            });
        }
        let d = self.inter_allocation_distance;
        if d != 0 && !(MIN_INTER_ALLOCATION_DISTANCE..=MAX_INTER_ALLOCATION_DISTANCE).contains(&d) {
            return Err(ConfigError::InterAllocationDistance(d));
        }
        Ok(())
    }
}
