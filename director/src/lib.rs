#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Adaptive pacing director for encounter sessions.
//!
//! The [`Director`] owns every pacing component for the lifetime of a session.
//! Producers publish [`Event`] values either directly through
//! [`Director::handle`] or from other threads through [`Publisher`] handles
//! drained by [`Director::pump`]. Time only moves when an
//! [`Event::TimeAdvanced`] is processed; each advance checks the idle
//! watchdog and, once per time slice, runs the pacing evaluator. Every
//! reaction is expressed as [`Command`] values appended to the caller's
//! buffer.

mod config;
mod intake;

use std::time::Duration;

use glam::Vec3;
use pacing_director_core::{Command, Event, KillRecord, LocationReport};
use pacing_director_system_location::LocationEstimator;
use pacing_director_system_pacing::PacingEvaluator;
use pacing_director_system_watchdog::IdleWatchdog;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

pub use config::{ConfigError, DirectorConfig};
pub use intake::{IntakeError, Publisher};
pub use pacing_director_core as core;
pub use pacing_director_registry::{self as registry, query, Registry};
pub use pacing_director_system_kill_ledger::KillLedger;
pub use pacing_director_system_pacing::{Evaluation, PacingState};

use intake::Intake;

/// Upper bound on events drained by a single [`Director::pump`].
pub const PUMP_BATCH_LIMIT: usize = 1_024;

/// Composition root routing producer events to the pacing components.
#[derive(Debug)]
pub struct Director {
    clock: Duration,
    registry: Registry,
    location: LocationEstimator,
    ledger: KillLedger,
    pacing: PacingEvaluator,
    watchdog: IdleWatchdog,
    rng: ChaCha8Rng,
    intake: Intake,
    last_evaluation: Option<Evaluation>,
    kill_scratch: Vec<KillRecord>,
    event_scratch: Vec<Event>,
}

impl Director {
    /// Builds a director for a new session with the clock at zero.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is incomplete or
    /// contains values the pacing components cannot work with.
    pub fn new(config: &DirectorConfig) -> Result<Self, ConfigError> {
        let validated = config.validate()?;
        debug!(
            time_slice = config.time_slice,
            target_rate = config.target_rate,
            max_report_gap = config.max_report_gap,
            overshoot_factor = config.overshoot_factor,
            "director configured"
        );

        Ok(Self {
            clock: Duration::ZERO,
            registry: Registry::new(),
            location: LocationEstimator::new(),
            ledger: KillLedger::new(),
            pacing: PacingEvaluator::new(validated.pacing),
            watchdog: IdleWatchdog::new(validated.watchdog),
            rng: ChaCha8Rng::seed_from_u64(validated.rng_seed),
            intake: Intake::new(),
            last_evaluation: None,
            kill_scratch: Vec::new(),
            event_scratch: Vec::new(),
        })
    }

    /// Hands out a publisher producers can use from any thread.
    #[must_use]
    pub fn publisher(&self) -> Publisher {
        self.intake.publisher()
    }

    /// Number of publisher handles still attached to this director.
    #[must_use]
    pub fn attached_publishers(&self) -> usize {
        self.intake.attached()
    }

    /// Processes events queued by publishers, oldest first.
    ///
    /// At most [`PUMP_BATCH_LIMIT`] events are processed per call; the rest
    /// stay queued for the next pump. Returns the number of events processed.
    pub fn pump(&mut self, out: &mut Vec<Command>) -> usize {
        let mut events = std::mem::take(&mut self.event_scratch);
        let drained = self.intake.drain_into(PUMP_BATCH_LIMIT, &mut events);
        self.handle(&events, out);
        events.clear();
        self.event_scratch = events;
        drained
    }

    /// Processes a batch of events in order, appending reactions to `out`.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            self.route(event, out);
        }
    }

    fn route(&mut self, event: &Event, out: &mut Vec<Command>) {
        match event {
            Event::TimeAdvanced { dt } => {
                self.clock = self.clock.saturating_add(*dt);
                self.tick(out);
            }
            Event::LocationReported {
                position,
                precision,
            } => {
                self.location
                    .report(&LocationReport::new(*position, *precision, self.clock));
                registry::apply(
                    &mut self.registry,
                    event,
                    self.clock,
                    &mut self.kill_scratch,
                );
            }
            _ => {
                registry::apply(
                    &mut self.registry,
                    event,
                    self.clock,
                    &mut self.kill_scratch,
                );
                for record in self.kill_scratch.drain(..) {
                    debug!(
                        source = ?record.source(),
                        label = record.label(),
                        challenge_rating = record.challenge_rating(),
                        at = record.timestamp().as_secs_f32(),
                        "kill recorded"
                    );
                    self.ledger.append(record);
                }
            }
        }
    }

    fn tick(&mut self, out: &mut Vec<Command>) {
        let now = self.clock;

        let discovery = self.watchdog.handle(
            now,
            self.location.last_report_at(),
            query::spawn_points(&self.registry),
            query::target_present(&self.registry),
            &mut self.rng,
            out,
        );
        if let Some(spawn_point) = discovery {
            info!(
                spawn_point = spawn_point.get(),
                silence = now.saturating_sub(self.location.last_report_at()).as_secs_f32(),
                "target sightings stale, requesting discovery spawn"
            );
        }

        if !self.pacing.is_due(now) {
            return;
        }

        let target = self.location.estimate();
        let Some(evaluation) = self.pacing.handle(
            now,
            &self.ledger,
            query::combatants(&self.registry),
            target,
            &mut self.rng,
            out,
        ) else {
            return;
        };

        debug!(
            current_rate = evaluation.current_rate(),
            target_rate = evaluation.target_rate(),
            "pacing evaluated"
        );
        if evaluation.corrected() {
            info!(
                orders = evaluation.orders(),
                active = evaluation.active_combatants(),
                dispatched_weight = evaluation.dispatched_weight(),
                current_rate = evaluation.current_rate(),
                target_rate = evaluation.target_rate(),
                "kill rate below target, ordering attack"
            );
        }
        self.last_evaluation = Some(evaluation);
    }

    /// Session time accumulated from processed time advances.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.clock
    }

    /// Read-only view of the pacing evaluator's state.
    #[must_use]
    pub fn pacing_state(&self) -> &PacingState {
        self.pacing.state()
    }

    /// Outcome of the most recent pacing evaluation.
    #[must_use]
    pub fn last_evaluation(&self) -> Option<&Evaluation> {
        self.last_evaluation.as_ref()
    }

    /// Current estimate of the target's location.
    #[must_use]
    pub fn estimate(&self) -> Vec3 {
        self.location.estimate()
    }

    /// Session time of the most recent target sighting.
    #[must_use]
    pub const fn last_report_at(&self) -> Duration {
        self.location.last_report_at()
    }

    /// Ledger of every elimination observed during the session.
    #[must_use]
    pub fn ledger(&self) -> &KillLedger {
        &self.ledger
    }

    /// Registry of live spawn points and combatants.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Number of discovery spawns requested so far.
    #[must_use]
    pub const fn discovery_requests(&self) -> u64 {
        self.watchdog.requests()
    }
}

impl Drop for Director {
    fn drop(&mut self) {
        debug!(
            attached_publishers = self.intake.attached(),
            kills = self.ledger.len(),
            "director torn down"
        );
    }
}
