//! Rolling-update policy
//!
//! A deployment carries one default [`UpdateConfig`]; each job may override
//! individual fields. The merge is field-wise: an absent override keeps the
//! deployment-wide value.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How instances of a job are rolled during an update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Instances updated first, as a smoke test for the rest
    pub canaries: u32,

    /// Instances updated simultaneously after canaries pass
    pub max_in_flight: u32,

    /// How long to watch a canary before declaring it healthy
    pub canary_watch_time: WatchTime,

    /// How long to watch a non-canary instance
    pub update_watch_time: WatchTime,

    /// Whether jobs update one after another rather than in parallel
    pub serial: bool,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            canaries: 1,
            max_in_flight: 1,
            canary_watch_time: WatchTime::range(30_000, 90_000),
            update_watch_time: WatchTime::range(30_000, 90_000),
            serial: true,
        }
    }
}

impl UpdateConfig {
    /// Apply a job-level override on top of this deployment-wide default
    pub fn merge(&self, overrides: &UpdateOverrides) -> Result<UpdateConfig, UpdateConfigError> {
        let canary_watch_time = match &overrides.canary_watch_time {
            Some(spec) => WatchTime::from_spec(spec)?,
            None => self.canary_watch_time.clone(),
        };
        let update_watch_time = match &overrides.update_watch_time {
            Some(spec) => WatchTime::from_spec(spec)?,
            None => self.update_watch_time.clone(),
        };

        Ok(UpdateConfig {
            canaries: overrides.canaries.unwrap_or(self.canaries),
            max_in_flight: overrides.max_in_flight.unwrap_or(self.max_in_flight),
            canary_watch_time,
            update_watch_time,
            serial: overrides.serial.unwrap_or(self.serial),
        })
    }
}

/// Job-level update overrides, exactly as they appear in the manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateOverrides {
    pub canaries: Option<u32>,
    pub max_in_flight: Option<u32>,
    pub canary_watch_time: Option<WatchTimeSpec>,
    pub update_watch_time: Option<WatchTimeSpec>,
    pub serial: Option<bool>,
}

/// A watch interval in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchTime {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl WatchTime {
    pub fn range(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Parse the manifest form: either a bare millisecond count or a
    /// `"min - max"` range string
    pub fn from_spec(spec: &WatchTimeSpec) -> Result<Self, UpdateConfigError> {
        match spec {
            WatchTimeSpec::Millis(ms) => Ok(WatchTime::range(*ms, *ms)),
            WatchTimeSpec::Range(raw) => {
                let mut parts = raw.splitn(2, '-');
                let min = parts.next().map(str::trim).unwrap_or("");
                let max = parts.next().map(str::trim);

                let (min, max) = match max {
                    Some(max) => (
                        min.parse::<u64>()
                            .map_err(|_| UpdateConfigError::InvalidWatchTime(raw.clone()))?,
                        max.parse::<u64>()
                            .map_err(|_| UpdateConfigError::InvalidWatchTime(raw.clone()))?,
                    ),
                    None => {
                        let ms = min
                            .parse::<u64>()
                            .map_err(|_| UpdateConfigError::InvalidWatchTime(raw.clone()))?;
                        (ms, ms)
                    }
                };

                if min > max {
                    return Err(UpdateConfigError::InvalidWatchTime(raw.clone()));
                }
                Ok(WatchTime::range(min, max))
            }
        }
    }
}

/// The manifest spelling of a watch time
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WatchTimeSpec {
    Millis(u64),
    Range(String),
}

/// Errors merging an update override
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateConfigError {
    #[error("Invalid watch time range '{0}'")]
    InvalidWatchTime(String),
}
