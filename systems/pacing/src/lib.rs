#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Windowed kill-rate controller that orders idle combatants to attack.
//!
//! Every time slice the evaluator measures the intensity-weighted kill rate
//! over the trailing slice and, when it falls short of the target, samples
//! combatants until the dispatched weight overshoots the target rate.

use std::time::Duration;

use glam::Vec3;
use pacing_director_core::{Combatant, Command};
use pacing_director_system_kill_ledger::KillLedger;
use rand::Rng;

/// Configuration parameters required to construct the pacing evaluator.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    time_slice: Duration,
    target_rate: f32,
    overshoot_factor: f32,
}

impl Config {
    /// Creates a new configuration.
    ///
    /// `target_rate` is measured in challenge rating per second. The time
    /// slice must be non-zero; the director validates this before building
    /// the evaluator.
    #[must_use]
    pub const fn new(time_slice: Duration, target_rate: f32, overshoot_factor: f32) -> Self {
        Self {
            time_slice,
            target_rate,
            overshoot_factor,
        }
    }

    /// Length of the trailing measurement window and of the evaluation period.
    #[must_use]
    pub const fn time_slice(&self) -> Duration {
        self.time_slice
    }

    /// Desired kill rate.
    #[must_use]
    pub const fn target_rate(&self) -> f32 {
        self.target_rate
    }

    /// Multiplier applied to the target rate when sizing a correction.
    #[must_use]
    pub const fn overshoot_factor(&self) -> f32 {
        self.overshoot_factor
    }
}

/// Read-only view of the evaluator's pacing state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PacingState {
    last_evaluated_at: Option<Duration>,
    current_rate: f32,
    target_rate: f32,
    time_slice: Duration,
    next_evaluation_after: Duration,
}

impl PacingState {
    /// Session time of the most recent evaluation, if one happened.
    #[must_use]
    pub const fn last_evaluated_at(&self) -> Option<Duration> {
        self.last_evaluated_at
    }

    /// Kill rate computed by the most recent evaluation.
    #[must_use]
    pub const fn current_rate(&self) -> f32 {
        self.current_rate
    }

    /// Desired kill rate.
    #[must_use]
    pub const fn target_rate(&self) -> f32 {
        self.target_rate
    }

    /// Length of the measurement window.
    #[must_use]
    pub const fn time_slice(&self) -> Duration {
        self.time_slice
    }

    /// The next evaluation happens on the first tick strictly after this time.
    #[must_use]
    pub const fn next_evaluation_after(&self) -> Duration {
        self.next_evaluation_after
    }
}

/// Outcome of a single measure-and-correct pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    evaluated_at: Duration,
    current_rate: f32,
    target_rate: f32,
    active_combatants: usize,
    orders: usize,
    dispatched_weight: f32,
}

impl Evaluation {
    /// Session time at which the pass ran.
    #[must_use]
    pub const fn evaluated_at(&self) -> Duration {
        self.evaluated_at
    }

    /// Measured kill rate over the trailing slice.
    #[must_use]
    pub const fn current_rate(&self) -> f32 {
        self.current_rate
    }

    /// Desired kill rate at the time of the pass.
    #[must_use]
    pub const fn target_rate(&self) -> f32 {
        self.target_rate
    }

    /// Size of the active combatant pool sampled from.
    #[must_use]
    pub const fn active_combatants(&self) -> usize {
        self.active_combatants
    }

    /// Number of attack orders issued. Repeated picks of the same combatant count separately.
    #[must_use]
    pub const fn orders(&self) -> usize {
        self.orders
    }

    /// Total challenge rating of the combatants ordered to attack.
    #[must_use]
    pub const fn dispatched_weight(&self) -> f32 {
        self.dispatched_weight
    }

    /// Reports whether the pass issued a correction.
    #[must_use]
    pub const fn corrected(&self) -> bool {
        self.orders > 0
    }
}

/// Pure system that paces eliminations against a target rate.
#[derive(Debug)]
pub struct PacingEvaluator {
    config: Config,
    state: PacingState,
}

impl PacingEvaluator {
    /// Creates a new evaluator. The first evaluation runs on the first tick after session start.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: PacingState {
                last_evaluated_at: None,
                current_rate: 0.0,
                target_rate: config.target_rate,
                time_slice: config.time_slice,
                next_evaluation_after: Duration::ZERO,
            },
        }
    }

    /// Returns the current pacing state.
    #[must_use]
    pub fn state(&self) -> &PacingState {
        &self.state
    }

    /// Reports whether a tick at `now` would run an evaluation.
    #[must_use]
    pub fn is_due(&self, now: Duration) -> bool {
        now > self.state.next_evaluation_after
    }

    /// Runs a measure-and-correct pass when the current slice has elapsed.
    ///
    /// The next deadline is derived from `now` rather than the previous
    /// deadline, so a stalled host produces one late evaluation instead of a
    /// burst. Attack orders target `target` and are appended to `out`.
    pub fn handle<R>(
        &mut self,
        now: Duration,
        ledger: &KillLedger,
        combatants: &[Combatant],
        target: Vec3,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) -> Option<Evaluation>
    where
        R: Rng + ?Sized,
    {
        if !self.is_due(now) {
            return None;
        }

        self.state.next_evaluation_after = now.saturating_add(self.config.time_slice);
        let current_rate = self.measure(now, ledger);

        let mut orders = 0;
        let mut dispatched_weight = 0.0;
        if !combatants.is_empty() && current_rate < self.config.target_rate {
            (orders, dispatched_weight) = self.correct(combatants, target, rng, out);
        }

        Some(Evaluation {
            evaluated_at: now,
            current_rate,
            target_rate: self.config.target_rate,
            active_combatants: combatants.len(),
            orders,
            dispatched_weight,
        })
    }

    fn measure(&mut self, now: Duration, ledger: &KillLedger) -> f32 {
        let window = self.config.time_slice;
        let current_rate = ledger.aggregate_window(now, window) / window.as_secs_f32();
        self.state.last_evaluated_at = Some(now);
        self.state.current_rate = current_rate;
        current_rate
    }

    /// Samples combatants with replacement until the dispatched rate reaches
    /// the overshoot budget or as many picks as there are combatants were made.
    fn correct<R>(
        &self,
        combatants: &[Combatant],
        target: Vec3,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) -> (usize, f32)
    where
        R: Rng + ?Sized,
    {
        let slice_secs = self.config.time_slice.as_secs_f32();
        let budget = self.config.target_rate * self.config.overshoot_factor;

        let mut dispatched = 0.0;
        let mut orders = 0;
        while dispatched / slice_secs < budget && orders < combatants.len() {
            orders += 1;
            let pick = &combatants[rng.gen_range(0..combatants.len())];
            dispatched += pick.challenge_rating();
            out.push(Command::RequestAttack {
                combatant: pick.id(),
                target,
            });
        }
        (orders, dispatched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacing_director_core::CombatantId;
    use rand::RngCore;

    /// Generator that always yields zero, pinning every pick to the first combatant.
    struct Pinned;

    impl RngCore for Pinned {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            dest.fill(0);
            Ok(())
        }
    }

    #[test]
    fn sampling_reuses_the_same_combatant() {
        let mut evaluator = PacingEvaluator::new(Config::new(Duration::from_secs(25), 0.3, 1.5));
        let combatants: Vec<Combatant> = (1..=3)
            .map(|raw| Combatant::new(CombatantId::new(raw), Vec3::ZERO, 1.0))
            .collect();
        let mut out = Vec::new();

        let evaluation = evaluator
            .handle(
                Duration::from_secs(1),
                &KillLedger::new(),
                &combatants,
                Vec3::ONE,
                &mut Pinned,
                &mut out,
            )
            .expect("first tick evaluates");

        assert_eq!(evaluation.orders(), 3);
        assert!(out.iter().all(|command| matches!(
            command,
            Command::RequestAttack { combatant, .. } if *combatant == CombatantId::new(1)
        )));
    }

    #[test]
    fn no_evaluation_at_session_start() {
        let evaluator = PacingEvaluator::new(Config::new(Duration::from_secs(25), 0.3, 1.5));
        assert!(!evaluator.is_due(Duration::ZERO));
        assert!(evaluator.is_due(Duration::from_millis(1)));
        assert_eq!(evaluator.state().last_evaluated_at(), None);
    }
}
