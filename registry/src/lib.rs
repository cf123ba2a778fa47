#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative membership of the entities observed by the pacing director.
//!
//! The registry never owns the entities themselves; producers do. It keeps the
//! identity and the latest snapshot of every live spawn point and combatant,
//! releases them on lifecycle-end events, and converts those endings into
//! [`KillRecord`] values for the ledger.

use std::{collections::HashSet, time::Duration};

use glam::Vec3;
use pacing_director_core::{
    Combatant, CombatantId, Event, KillRecord, KillSource, SpawnPoint, SpawnPointId,
};
use tracing::trace;

/// Live spawn points and combatants tracked for the current encounter.
///
/// Identities of destroyed spawn points and fallen combatants are remembered
/// for the whole session so that late or repeated events cannot revive them.
/// That memory grows by one entry per ending and is never pruned; drop the
/// registry with its session.
#[derive(Debug, Default)]
pub struct Registry {
    spawn_points: Vec<SpawnPoint>,
    destroyed: HashSet<SpawnPointId>,
    combatants: Vec<Combatant>,
    fallen: HashSet<CombatantId>,
    target_present: bool,
}

impl Registry {
    /// Creates an empty registry with no target present.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn spawn_point_index(&self, id: SpawnPointId) -> Option<usize> {
        self.spawn_points
            .iter()
            .position(|spawn_point| spawn_point.id() == id)
    }

    fn combatant_index(&self, id: CombatantId) -> Option<usize> {
        self.combatants
            .iter()
            .position(|combatant| combatant.id() == id)
    }

    fn register_spawn_point(&mut self, spawn_point: &SpawnPoint) {
        let id = spawn_point.id();
        if self.destroyed.contains(&id) {
            trace!(spawn_point = id.get(), "ignoring creation of destroyed spawn point");
            return;
        }
        if self.spawn_point_index(id).is_some() {
            trace!(spawn_point = id.get(), "ignoring duplicate spawn point creation");
            return;
        }
        self.spawn_points.push(spawn_point.clone());
    }

    fn release_spawn_point(&mut self, id: SpawnPointId, now: Duration) -> Option<KillRecord> {
        let Some(index) = self.spawn_point_index(id) else {
            trace!(spawn_point = id.get(), "ignoring destruction of unknown spawn point");
            return None;
        };

        let spawn_point = self.spawn_points.remove(index);
        let _ = self.destroyed.insert(id);
        Some(KillRecord::new(
            now,
            spawn_point.challenge_rating(),
            KillSource::SpawnPoint(id),
            spawn_point.label(),
            spawn_point.position(),
        ))
    }

    fn register_combatant(&mut self, combatant: &Combatant) {
        let id = combatant.id();
        if self.fallen.contains(&id) {
            trace!(combatant = id.get(), "ignoring spawn of fallen combatant");
            return;
        }
        if self.combatant_index(id).is_some() {
            trace!(combatant = id.get(), "ignoring duplicate combatant spawn");
            return;
        }
        self.combatants.push(combatant.clone());
    }

    fn release_combatant(
        &mut self,
        id: CombatantId,
        position: Vec3,
        now: Duration,
    ) -> Option<KillRecord> {
        let Some(index) = self.combatant_index(id) else {
            trace!(combatant = id.get(), "ignoring death of untracked combatant");
            return None;
        };

        let combatant = self.combatants.remove(index);
        let _ = self.fallen.insert(id);
        Some(KillRecord::new(
            now,
            combatant.challenge_rating(),
            KillSource::Combatant(id),
            combatant.label(),
            position,
        ))
    }
}

/// Folds a lifecycle event into the registry.
///
/// Kill records produced by spawn-point destruction and combatant death are
/// appended to `out_kills` stamped with `now`. Events the registry does not
/// track, duplicates, and endings of unknown identities leave it untouched.
pub fn apply(
    registry: &mut Registry,
    event: &Event,
    now: Duration,
    out_kills: &mut Vec<KillRecord>,
) {
    match event {
        Event::SpawnPointCreated { spawn_point } => registry.register_spawn_point(spawn_point),
        Event::SpawnPointDestroyed { spawn_point } => {
            if let Some(record) = registry.release_spawn_point(*spawn_point, now) {
                out_kills.push(record);
            }
        }
        Event::CombatantSpawned { combatant } => registry.register_combatant(combatant),
        Event::CombatantDied {
            combatant,
            position,
        } => {
            if let Some(record) = registry.release_combatant(*combatant, *position, now) {
                out_kills.push(record);
            }
        }
        Event::CombatantMoved {
            combatant,
            position,
        } => {
            if let Some(index) = registry.combatant_index(*combatant) {
                registry.combatants[index].relocate(*position);
            }
        }
        Event::TargetPresenceChanged { present } => registry.target_present = *present,
        Event::LocationReported { .. } => registry.target_present = true,
        Event::TimeAdvanced { .. } => {}
    }
}

/// Query functions that provide read-only access to the registry.
pub mod query {
    use pacing_director_core::{Combatant, CombatantId, SpawnPoint, SpawnPointId};

    use super::Registry;

    /// Live spawn points in registration order.
    #[must_use]
    pub fn spawn_points(registry: &Registry) -> &[SpawnPoint] {
        &registry.spawn_points
    }

    /// Live combatants in registration order.
    #[must_use]
    pub fn combatants(registry: &Registry) -> &[Combatant] {
        &registry.combatants
    }

    /// Looks up a live combatant by identifier.
    #[must_use]
    pub fn combatant(registry: &Registry, id: CombatantId) -> Option<&Combatant> {
        registry
            .combatant_index(id)
            .map(|index| &registry.combatants[index])
    }

    /// Reports whether the spawn point is live.
    #[must_use]
    pub fn is_spawn_point_active(registry: &Registry, id: SpawnPointId) -> bool {
        registry.spawn_point_index(id).is_some()
    }

    /// Reports whether the spawn point has been destroyed during the encounter.
    #[must_use]
    pub fn is_spawn_point_destroyed(registry: &Registry, id: SpawnPointId) -> bool {
        registry.destroyed.contains(&id)
    }

    /// Reports whether a target currently exists in the encounter.
    ///
    /// Any sighting marks the target present; an explicit presence change
    /// overrides that until the next sighting.
    #[must_use]
    pub fn target_present(registry: &Registry) -> bool {
        registry.target_present
    }
}
