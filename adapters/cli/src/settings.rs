//! Encounter settings: an optional TOML file refined by command-line overrides.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use clap::Args;
use pacing_director::DirectorConfig;
use pacing_director_core::TemplateId;
use serde::Deserialize;

/// Discovery unit requested when no settings file is provided.
const DEFAULT_DISCOVERY_TEMPLATE: TemplateId = TemplateId::new(1);

/// Complete configuration of a simulated encounter.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    /// Options forwarded to the pacing director.
    pub(crate) director: DirectorConfig,
    /// Shape of the scripted encounter.
    pub(crate) scenario: ScenarioConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            director: DirectorConfig::with_discovery_template(DEFAULT_DISCOVERY_TEMPLATE),
            scenario: ScenarioConfig::default(),
        }
    }
}

impl Settings {
    /// Reads settings from the TOML file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| {
            format!("failed to read encounter settings at {}", path.display())
        })?;
        Self::from_toml(&contents)
            .with_context(|| format!("invalid encounter settings in {}", path.display()))
    }

    /// Parses settings from TOML contents. Missing tables and keys keep their defaults.
    pub(crate) fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse encounter settings toml contents")
    }

    /// Applies command-line overrides on top of the loaded values.
    pub(crate) fn apply(&mut self, overrides: &Overrides) {
        if let Some(seed) = overrides.seed {
            self.director.rng_seed = seed;
            self.scenario.seed = seed;
        }
        if let Some(duration) = overrides.duration {
            self.scenario.duration = duration;
        }
        if let Some(dt) = overrides.dt {
            self.scenario.dt = dt;
        }
        if let Some(target_rate) = overrides.target_rate {
            self.director.target_rate = target_rate;
        }
    }
}

/// Command-line overrides applied on top of the loaded settings.
#[derive(Clone, Debug, Default, Args)]
pub(crate) struct Overrides {
    /// Seed shared by the director and the scripted encounter.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Simulated encounter length in seconds.
    #[arg(long)]
    pub(crate) duration: Option<f32>,
    /// Simulated seconds between director pumps.
    #[arg(long)]
    pub(crate) dt: Option<f32>,
    /// Desired challenge rating eliminated per second.
    #[arg(long)]
    pub(crate) target_rate: Option<f32>,
}

/// Scripted encounter parameters. Times are expressed in seconds.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ScenarioConfig {
    /// Simulated encounter length.
    pub(crate) duration: f32,
    /// Simulated time between director pumps.
    pub(crate) dt: f32,
    /// Seed of the generator driving the scripted world.
    pub(crate) seed: u64,
    /// Number of spawn points placed around the arena.
    pub(crate) spawn_points: u32,
    /// Distance of the spawn points from the arena centre.
    pub(crate) arena_radius: f32,
    /// Challenge rating credited when a spawn point is destroyed.
    pub(crate) spawn_point_weight: f32,
    /// Time between spawns at each spawn point.
    pub(crate) spawn_interval: f32,
    /// Upper bound on routinely spawned combatants alive at once.
    pub(crate) max_combatants: usize,
    /// Challenge ratings spawned combatants are drawn from.
    pub(crate) combatant_weights: Vec<f32>,
    /// Shortest time an ordered combatant survives its attack.
    pub(crate) min_engagement: f32,
    /// Longest time an ordered combatant survives its attack.
    pub(crate) max_engagement: f32,
    /// Time between routine target sightings.
    pub(crate) report_interval: f32,
    /// Uncertainty radius of routine sightings; zero reports exact fixes.
    pub(crate) report_radius: f32,
    /// Window during which routine sightings stop.
    pub(crate) silence: Option<SilenceWindow>,
    /// Time between spawn points destroyed by the target.
    pub(crate) demolition_interval: Option<f32>,
    /// Challenge rating of units produced for discovery spawns.
    pub(crate) discovery_weight: f32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            duration: 300.0,
            dt: 0.5,
            seed: 0x00c0_ffee,
            spawn_points: 4,
            arena_radius: 40.0,
            spawn_point_weight: 4.0,
            spawn_interval: 8.0,
            max_combatants: 24,
            combatant_weights: vec![0.5, 1.0, 2.0],
            min_engagement: 4.0,
            max_engagement: 12.0,
            report_interval: 4.0,
            report_radius: 6.0,
            silence: Some(SilenceWindow {
                start: 120.0,
                end: 200.0,
            }),
            demolition_interval: Some(90.0),
            discovery_weight: 0.5,
        }
    }
}

/// Span of the encounter during which the target goes unseen.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SilenceWindow {
    /// Time the silence begins.
    pub(crate) start: f32,
    /// Time routine sightings resume.
    pub(crate) end: f32,
}

/// Converts a seconds option into a [`Duration`], naming the option on failure.
pub(crate) fn seconds(option: &str, value: f32) -> Result<Duration> {
    Duration::try_from_secs_f32(value).with_context(|| {
        format!("`{option}` must be a finite, non-negative number of seconds (got {value})")
    })
}
