#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Watchdog that requests a discovery spawn when target sightings go stale.

use std::time::Duration;

use pacing_director_core::{Command, SpawnPoint, SpawnPointId, TemplateId};
use rand::Rng;

/// Configuration parameters required to construct the watchdog.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    max_report_gap: Duration,
    discovery_template: TemplateId,
}

impl Config {
    /// Creates a new configuration using the tolerated silence and the unit to spawn.
    #[must_use]
    pub const fn new(max_report_gap: Duration, discovery_template: TemplateId) -> Self {
        Self {
            max_report_gap,
            discovery_template,
        }
    }

    /// Longest tolerated gap between target sightings.
    #[must_use]
    pub const fn max_report_gap(&self) -> Duration {
        self.max_report_gap
    }

    /// Template requested from a spawn point once sightings go stale.
    #[must_use]
    pub const fn discovery_template(&self) -> TemplateId {
        self.discovery_template
    }
}

/// Pure system checking sighting freshness on every tick.
#[derive(Debug)]
pub struct IdleWatchdog {
    config: Config,
    requests: u64,
}

impl IdleWatchdog {
    /// Creates a new watchdog using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            requests: 0,
        }
    }

    /// Number of discovery spawns requested so far.
    #[must_use]
    pub const fn requests(&self) -> u64 {
        self.requests
    }

    /// Emits at most one discovery spawn request when sightings are stale.
    ///
    /// Nothing happens unless the gap since `last_report_at` exceeds the
    /// configured maximum, a target is present, and at least one spawn point
    /// is live. The chosen spawn point is returned alongside the command
    /// appended to `out`.
    pub fn handle<R>(
        &mut self,
        now: Duration,
        last_report_at: Duration,
        spawn_points: &[SpawnPoint],
        target_present: bool,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) -> Option<SpawnPointId>
    where
        R: Rng + ?Sized,
    {
        if !target_present || spawn_points.is_empty() {
            return None;
        }

        if now.saturating_sub(last_report_at) <= self.config.max_report_gap {
            return None;
        }

        let spawn_point = spawn_points[rng.gen_range(0..spawn_points.len())].id();
        out.push(Command::RequestSpawn {
            spawn_point,
            template: self.config.discovery_template,
        });
        self.requests += 1;
        Some(spawn_point)
    }
}
