//! Scripted encounter that drives the director end to end.
//!
//! The encounter plays the producers' side: spawn points emit combatants on a
//! fixed cadence, ordered combatants close in on the reported position and
//! fall after a randomized engagement, and the target is sighted on a
//! schedule that may include a silent window. Every change is published
//! through a [`Publisher`]; the director is pumped once per tick and its
//! commands are applied back to the scripted world.

use std::{f32::consts::TAU, fmt, time::Duration};

use anyhow::{ensure, Context, Result};
use glam::Vec3;
use pacing_director::{Director, Publisher, PUMP_BATCH_LIMIT};
use pacing_director_core::{
    Combatant, CombatantId, Command, Event, Precision, SpawnPoint, SpawnPointId, TemplateId,
};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::settings::{seconds, ScenarioConfig, Settings};

/// Angular speed of the target around the arena centre, in radians per second.
const TARGET_ORBIT_SPEED: f32 = 0.05;

/// Fraction of the remaining distance an engaged combatant closes each tick.
const ENGAGEMENT_STRIDE: f32 = 0.2;

/// Counters accumulated while the encounter runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct EncounterStats {
    /// Combatants that entered the encounter, discovery units included.
    pub(crate) combatants_spawned: u64,
    /// Combatants that fell.
    pub(crate) kills: u64,
    /// Spawn points destroyed by the target.
    pub(crate) spawn_points_destroyed: u64,
    /// Attack orders received from the director.
    pub(crate) attack_orders: u64,
    /// Attack orders that sent an idle combatant into combat.
    pub(crate) engagements: u64,
    /// Discovery spawns requested by the director.
    pub(crate) discovery_spawns: u64,
    /// Target sightings published.
    pub(crate) sightings: u64,
}

/// Outcome of a complete run.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Summary {
    /// Simulated time covered by the run.
    pub(crate) elapsed: Duration,
    /// Counters gathered by the scripted world.
    pub(crate) stats: EncounterStats,
    /// Eliminations the director recorded.
    pub(crate) ledger_entries: usize,
    /// Kill rate measured by the director's last evaluation.
    pub(crate) final_rate: f32,
    /// Kill rate the director aimed for.
    pub(crate) target_rate: f32,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "encounter finished after {:.1}s",
            self.elapsed.as_secs_f32()
        )?;
        writeln!(
            f,
            "  combatants spawned: {}",
            self.stats.combatants_spawned
        )?;
        writeln!(f, "  kills:              {}", self.stats.kills)?;
        writeln!(
            f,
            "  spawn points lost:  {}",
            self.stats.spawn_points_destroyed
        )?;
        writeln!(f, "  ledger entries:     {}", self.ledger_entries)?;
        writeln!(
            f,
            "  attack orders:      {} ({} engagements)",
            self.stats.attack_orders, self.stats.engagements
        )?;
        writeln!(f, "  discovery spawns:   {}", self.stats.discovery_spawns)?;
        writeln!(f, "  sightings:          {}", self.stats.sightings)?;
        write!(
            f,
            "  final rate:         {:.3} (target {:.3})",
            self.final_rate, self.target_rate
        )
    }
}

/// Runs the configured encounter to completion.
pub(crate) fn run(settings: &Settings) -> Result<Summary> {
    let mut director =
        Director::new(&settings.director).context("invalid director configuration")?;
    let length = seconds("scenario.duration", settings.scenario.duration)?;
    let mut encounter = Encounter::new(&settings.scenario, director.publisher())?;

    let mut commands = Vec::new();
    while encounter.elapsed() < length {
        encounter.step()?;
        while director.pump(&mut commands) == PUMP_BATCH_LIMIT {}
        encounter.apply(&commands)?;
        commands.clear();
    }

    let pacing = director.pacing_state();
    Ok(Summary {
        elapsed: encounter.elapsed(),
        stats: encounter.stats().clone(),
        ledger_entries: director.ledger().len(),
        final_rate: pacing.current_rate(),
        target_rate: pacing.target_rate(),
    })
}

#[derive(Clone, Copy, Debug)]
struct Site {
    id: SpawnPointId,
    position: Vec3,
    next_spawn_at: Duration,
}

#[derive(Clone, Copy, Debug)]
struct Engagement {
    target: Vec3,
    falls_at: Duration,
}

#[derive(Clone, Copy, Debug)]
struct Unit {
    id: CombatantId,
    position: Vec3,
    engagement: Option<Engagement>,
}

/// Producer side of a scripted encounter.
#[derive(Debug)]
pub(crate) struct Encounter {
    scenario: ScenarioConfig,
    publisher: Publisher,
    rng: ChaCha8Rng,
    clock: Duration,
    dt: Duration,
    spawn_interval: Duration,
    report_interval: Duration,
    engagement: (Duration, Duration),
    silence: Option<(Duration, Duration)>,
    demolition_interval: Option<Duration>,
    next_report_at: Duration,
    next_demolition_at: Option<Duration>,
    next_combatant: u32,
    sites: Vec<Site>,
    units: Vec<Unit>,
    stats: EncounterStats,
}

impl Encounter {
    /// Validates the scenario, then announces its spawn points and the target.
    pub(crate) fn new(scenario: &ScenarioConfig, publisher: Publisher) -> Result<Self> {
        let dt = seconds("scenario.dt", scenario.dt)?;
        ensure!(!dt.is_zero(), "`scenario.dt` must be greater than zero");
        let spawn_interval = seconds("scenario.spawn_interval", scenario.spawn_interval)?;
        ensure!(
            !spawn_interval.is_zero(),
            "`scenario.spawn_interval` must be greater than zero"
        );
        let report_interval = seconds("scenario.report_interval", scenario.report_interval)?;
        ensure!(
            !report_interval.is_zero(),
            "`scenario.report_interval` must be greater than zero"
        );
        let engagement = (
            seconds("scenario.min_engagement", scenario.min_engagement)?,
            seconds("scenario.max_engagement", scenario.max_engagement)?,
        );
        ensure!(
            engagement.0 <= engagement.1,
            "`scenario.min_engagement` must not exceed `scenario.max_engagement`"
        );
        let silence = match scenario.silence {
            Some(window) => Some((
                seconds("scenario.silence.start", window.start)?,
                seconds("scenario.silence.end", window.end)?,
            )),
            None => None,
        };
        let demolition_interval = match scenario.demolition_interval {
            Some(interval) => {
                let interval = seconds("scenario.demolition_interval", interval)?;
                ensure!(
                    !interval.is_zero(),
                    "`scenario.demolition_interval` must be greater than zero"
                );
                Some(interval)
            }
            None => None,
        };
        ensure!(
            !scenario.combatant_weights.is_empty(),
            "`scenario.combatant_weights` must list at least one challenge rating"
        );
        ensure!(
            scenario.report_radius.is_finite() && scenario.report_radius >= 0.0,
            "`scenario.report_radius` must be a finite, non-negative radius (got {})",
            scenario.report_radius
        );

        let mut encounter = Self {
            scenario: scenario.clone(),
            publisher,
            rng: ChaCha8Rng::seed_from_u64(scenario.seed),
            clock: Duration::ZERO,
            dt,
            spawn_interval,
            report_interval,
            engagement,
            silence,
            demolition_interval,
            next_report_at: Duration::ZERO,
            next_demolition_at: demolition_interval,
            next_combatant: 0,
            sites: Vec::new(),
            units: Vec::new(),
            stats: EncounterStats::default(),
        };
        encounter.open()?;
        Ok(encounter)
    }

    fn open(&mut self) -> Result<()> {
        let count = self.scenario.spawn_points;
        for index in 0..count {
            let angle = TAU * index as f32 / count as f32;
            let position = Vec3::new(angle.cos(), 0.0, angle.sin()) * self.scenario.arena_radius;
            let id = SpawnPointId::new(index + 1);
            self.sites.push(Site {
                id,
                position,
                next_spawn_at: Duration::ZERO,
            });
            self.publish(Event::SpawnPointCreated {
                spawn_point: SpawnPoint::new(id, position, self.scenario.spawn_point_weight),
            })?;
        }
        info!(spawn_points = count, "encounter opened");
        self.publish(Event::TargetPresenceChanged { present: true })
    }

    /// Simulated time elapsed since the encounter opened.
    #[must_use]
    pub(crate) const fn elapsed(&self) -> Duration {
        self.clock
    }

    /// Counters gathered so far.
    #[must_use]
    pub(crate) const fn stats(&self) -> &EncounterStats {
        &self.stats
    }

    /// Advances the scripted world by one tick and publishes what changed,
    /// ending with the time advance itself.
    pub(crate) fn step(&mut self) -> Result<()> {
        self.clock += self.dt;
        self.spawn_wave()?;
        self.resolve_engagements()?;
        self.demolish()?;
        self.sight_target()?;
        self.publish(Event::TimeAdvanced { dt: self.dt })
    }

    /// Carries out the director's commands.
    pub(crate) fn apply(&mut self, commands: &[Command]) -> Result<()> {
        for command in commands {
            match command {
                Command::RequestAttack { combatant, target } => self.engage(*combatant, *target),
                Command::RequestSpawn {
                    spawn_point,
                    template,
                } => self.discover(*spawn_point, *template)?,
            }
        }
        Ok(())
    }

    fn publish(&self, event: Event) -> Result<()> {
        self.publisher
            .publish(event)
            .context("director stopped accepting events")
    }

    fn target_position(&self) -> Vec3 {
        let angle = self.clock.as_secs_f32() * TARGET_ORBIT_SPEED;
        Vec3::new(angle.cos(), 0.0, angle.sin()) * (self.scenario.arena_radius * 0.5)
    }

    fn is_silent(&self) -> bool {
        self.silence
            .is_some_and(|(start, end)| self.clock >= start && self.clock < end)
    }

    fn enlist(&mut self, combatant: Combatant) -> Result<()> {
        self.units.push(Unit {
            id: combatant.id(),
            position: combatant.position(),
            engagement: None,
        });
        self.stats.combatants_spawned += 1;
        self.publish(Event::CombatantSpawned { combatant })
    }

    fn next_id(&mut self) -> CombatantId {
        self.next_combatant += 1;
        CombatantId::new(self.next_combatant)
    }

    fn spawn_wave(&mut self) -> Result<()> {
        for index in 0..self.sites.len() {
            if self.units.len() >= self.scenario.max_combatants {
                break;
            }
            let site = self.sites[index];
            if self.clock < site.next_spawn_at {
                continue;
            }
            self.sites[index].next_spawn_at = self.clock + self.spawn_interval;

            let weight = self
                .scenario
                .combatant_weights
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(1.0);
            let id = self.next_id();
            self.enlist(Combatant::new(id, site.position, weight).with_origin(site.id))?;
        }
        Ok(())
    }

    fn resolve_engagements(&mut self) -> Result<()> {
        let mut index = 0;
        while index < self.units.len() {
            let unit = self.units[index];
            let Some(engagement) = unit.engagement else {
                index += 1;
                continue;
            };

            if self.clock >= engagement.falls_at {
                let _ = self.units.remove(index);
                self.stats.kills += 1;
                self.publish(Event::CombatantDied {
                    combatant: unit.id,
                    position: unit.position,
                })?;
                continue;
            }

            let position = unit.position.lerp(engagement.target, ENGAGEMENT_STRIDE);
            self.units[index].position = position;
            self.publish(Event::CombatantMoved {
                combatant: unit.id,
                position,
            })?;
            index += 1;
        }
        Ok(())
    }

    fn demolish(&mut self) -> Result<()> {
        let Some(due) = self.next_demolition_at else {
            return Ok(());
        };
        if self.clock < due || self.sites.is_empty() {
            return Ok(());
        }
        self.next_demolition_at = self.demolition_interval.map(|interval| due + interval);

        let index = self.rng.gen_range(0..self.sites.len());
        let site = self.sites.remove(index);
        self.stats.spawn_points_destroyed += 1;
        info!(spawn_point = site.id.get(), "target destroyed a spawn point");
        self.publish(Event::SpawnPointDestroyed {
            spawn_point: site.id,
        })
    }

    fn sight_target(&mut self) -> Result<()> {
        if self.clock < self.next_report_at {
            return Ok(());
        }
        self.next_report_at = self.clock + self.report_interval;
        if self.is_silent() {
            return Ok(());
        }

        let radius = self.scenario.report_radius;
        let mut position = self.target_position();
        if radius > 0.0 {
            position += Vec3::new(
                self.rng.gen_range(-radius..=radius),
                0.0,
                self.rng.gen_range(-radius..=radius),
            );
        }
        self.stats.sightings += 1;
        self.publish(Event::LocationReported {
            position,
            precision: Precision::from_radius(radius),
        })
    }

    fn engage(&mut self, combatant: CombatantId, target: Vec3) {
        self.stats.attack_orders += 1;
        let (shortest, longest) = self.engagement;
        let falls_at = self.clock + self.rng.gen_range(shortest..=longest);

        let Some(unit) = self.units.iter_mut().find(|unit| unit.id == combatant) else {
            debug!(
                combatant = combatant.get(),
                "attack order for a combatant that already fell"
            );
            return;
        };
        if unit.engagement.is_some() {
            return;
        }
        unit.engagement = Some(Engagement { target, falls_at });
        self.stats.engagements += 1;
    }

    fn discover(&mut self, spawn_point: SpawnPointId, template: TemplateId) -> Result<()> {
        self.stats.discovery_spawns += 1;
        let Some(site) = self.sites.iter().find(|site| site.id == spawn_point).copied() else {
            debug!(
                spawn_point = spawn_point.get(),
                "discovery spawn requested from a destroyed spawn point"
            );
            return Ok(());
        };

        let id = self.next_id();
        let scout = Combatant::new(id, site.position, self.scenario.discovery_weight)
            .with_origin(site.id)
            .with_label(format!("discovery-{}-{}", template.get(), id.get()));
        self.enlist(scout)?;

        // the discovery unit sweeps the arena and pins the target down
        self.stats.sightings += 1;
        self.publish(Event::LocationReported {
            position: self.target_position(),
            precision: Precision::Exact,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SilenceWindow;

    fn seeded(seed: u64) -> Settings {
        let mut settings = Settings::default();
        settings.director.rng_seed = seed;
        settings.scenario.seed = seed;
        settings
    }

    #[test]
    fn default_encounter_exercises_every_reaction() {
        let summary = run(&Settings::default()).expect("default encounter runs");

        assert_eq!(summary.elapsed, Duration::from_secs(300));
        assert!(summary.stats.kills > 0);
        assert!(summary.stats.attack_orders > 0);
        assert!(summary.stats.engagements > 0);
        assert!(summary.stats.discovery_spawns > 0, "silence outlasts the gap");
        assert_eq!(summary.stats.spawn_points_destroyed, 3);
        assert_eq!(
            summary.ledger_entries as u64,
            summary.stats.kills + summary.stats.spawn_points_destroyed
        );
        assert_eq!(summary.target_rate, 0.3);
    }

    #[test]
    fn same_seed_replays_identically() {
        let first = run(&seeded(11)).expect("encounter runs");
        let second = run(&seeded(11)).expect("encounter runs");
        assert_eq!(first, second);
    }

    #[test]
    fn constant_sightings_never_trigger_discovery() {
        let mut settings = Settings::default();
        settings.scenario.silence = None;
        settings.scenario.duration = 120.0;

        let summary = run(&settings).expect("encounter runs");
        assert_eq!(summary.stats.discovery_spawns, 0);
    }

    #[test]
    fn discovery_units_break_the_silence() {
        let mut settings = Settings::default();
        settings.scenario.duration = 100.0;
        settings.scenario.demolition_interval = None;
        settings.scenario.silence = Some(SilenceWindow {
            start: 10.0,
            end: 1_000.0,
        });

        let summary = run(&settings).expect("encounter runs");
        // Sightings stop at t=10; each discovery unit refreshes them, so
        // requests come roughly once per tolerated gap instead of every tick.
        assert!(summary.stats.discovery_spawns >= 2);
        assert!(summary.stats.discovery_spawns <= 4);
    }

    #[test]
    fn invalid_scenarios_are_rejected_before_running() {
        let mut zero_tick = Settings::default();
        zero_tick.scenario.dt = 0.0;
        assert!(run(&zero_tick).is_err());

        let mut no_weights = Settings::default();
        no_weights.scenario.combatant_weights.clear();
        assert!(run(&no_weights).is_err());

        let mut inverted = Settings::default();
        inverted.scenario.min_engagement = 20.0;
        assert!(run(&inverted).is_err());
    }

    #[test]
    fn missing_discovery_template_is_reported() {
        let mut settings = Settings::default();
        settings.director.discovery_template = None;

        let error = run(&settings).expect_err("template is required");
        assert!(format!("{error:#}").contains("discovery template"));
    }

    #[test]
    fn summary_lists_every_counter() {
        let summary = Summary {
            elapsed: Duration::from_secs(60),
            stats: EncounterStats {
                kills: 7,
                discovery_spawns: 2,
                ..EncounterStats::default()
            },
            ledger_entries: 8,
            final_rate: 0.25,
            target_rate: 0.3,
        };
        let rendered = summary.to_string();

        assert!(rendered.starts_with("encounter finished after 60.0s"));
        assert!(rendered.contains("kills:              7"));
        assert!(rendered.contains("discovery spawns:   2"));
        assert!(rendered.contains("final rate:         0.250 (target 0.300)"));
    }
}
