//! Tunable parameters of the director and their validation.

use std::time::Duration;

use pacing_director_core::TemplateId;
use pacing_director_system_pacing as pacing;
use pacing_director_system_watchdog as watchdog;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_TIME_SLICE_SECS: f32 = 25.0;
const DEFAULT_TARGET_RATE: f32 = 0.3;
const DEFAULT_MAX_REPORT_GAP_SECS: f32 = 30.0;
const DEFAULT_OVERSHOOT_FACTOR: f32 = 1.5;
const DEFAULT_RNG_SEED: u64 = 0x5eed_d1ec_7041_0001;

/// Recognised director options. Durations are expressed in seconds.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectorConfig {
    /// Length of the trailing kill-rate window and of the evaluation period.
    pub time_slice: f32,
    /// Desired challenge rating eliminated per second.
    pub target_rate: f32,
    /// Longest tolerated silence between target sightings.
    pub max_report_gap: f32,
    /// Multiplier applied to the target rate when sizing a correction.
    pub overshoot_factor: f32,
    /// Unit requested from a spawn point once sightings go stale. Required.
    pub discovery_template: Option<TemplateId>,
    /// Seed of the generator used for every random pick the director makes.
    pub rng_seed: u64,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            time_slice: DEFAULT_TIME_SLICE_SECS,
            target_rate: DEFAULT_TARGET_RATE,
            max_report_gap: DEFAULT_MAX_REPORT_GAP_SECS,
            overshoot_factor: DEFAULT_OVERSHOOT_FACTOR,
            discovery_template: None,
            rng_seed: DEFAULT_RNG_SEED,
        }
    }
}

impl DirectorConfig {
    /// Returns the default configuration with the discovery template filled in.
    #[must_use]
    pub fn with_discovery_template(template: TemplateId) -> Self {
        Self {
            discovery_template: Some(template),
            ..Self::default()
        }
    }

    /// Checks every option and converts them into per-system configurations.
    pub(crate) fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        let discovery_template = self
            .discovery_template
            .ok_or(ConfigError::MissingDiscoveryTemplate)?;

        let time_slice = seconds("time_slice", self.time_slice)?;
        if time_slice.is_zero() {
            return Err(ConfigError::NonPositive {
                option: "time_slice",
                value: self.time_slice,
            });
        }

        if !self.target_rate.is_finite() || self.target_rate < 0.0 {
            return Err(ConfigError::InvalidRate {
                value: self.target_rate,
            });
        }

        if !self.overshoot_factor.is_finite() || self.overshoot_factor <= 0.0 {
            return Err(ConfigError::NonPositive {
                option: "overshoot_factor",
                value: self.overshoot_factor,
            });
        }

        let max_report_gap = seconds("max_report_gap", self.max_report_gap)?;

        Ok(ValidatedConfig {
            pacing: pacing::Config::new(time_slice, self.target_rate, self.overshoot_factor),
            watchdog: watchdog::Config::new(max_report_gap, discovery_template),
            rng_seed: self.rng_seed,
        })
    }
}

fn seconds(option: &'static str, value: f32) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f32(value).map_err(|_| ConfigError::InvalidDuration { option, value })
}

/// Per-system configurations derived from a validated [`DirectorConfig`].
#[derive(Clone, Copy, Debug)]
pub(crate) struct ValidatedConfig {
    pub(crate) pacing: pacing::Config,
    pub(crate) watchdog: watchdog::Config,
    pub(crate) rng_seed: u64,
}

/// Misconfiguration detected while constructing the director.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// No discovery template was configured.
    #[error("no discovery template configured")]
    MissingDiscoveryTemplate,
    /// A duration option was negative, NaN, or too large.
    #[error("`{option}` must be a finite, non-negative number of seconds (got {value})")]
    InvalidDuration {
        /// Name of the offending option.
        option: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// An option that must be strictly positive was not.
    #[error("`{option}` must be greater than zero (got {value})")]
    NonPositive {
        /// Name of the offending option.
        option: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// The target rate was negative or not finite.
    #[error("`target_rate` must be a finite, non-negative rate (got {value})")]
    InvalidRate {
        /// Rejected value.
        value: f32,
    },
}
