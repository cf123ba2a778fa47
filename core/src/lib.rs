#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the pacing director.
//!
//! This crate defines the message surface that connects producers, the
//! entity registry, and the pure pacing systems. Producers publish [`Event`]
//! values describing lifecycle changes, location sightings, and the passage
//! of time. The director folds those events into its registry and ledgers and
//! responds exclusively with [`Command`] batches addressed back to the
//! producers.

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Commands the director issues to spawn-point and combatant producers.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Orders a combatant to attack the provided position.
    RequestAttack {
        /// Combatant receiving the order.
        combatant: CombatantId,
        /// Suspected location of the target at the time of the order.
        target: Vec3,
    },
    /// Requests that a spawn point produce a unit from the given template.
    RequestSpawn {
        /// Spawn point asked to produce the unit.
        spawn_point: SpawnPointId,
        /// Template describing the unit to produce.
        template: TemplateId,
    },
}

/// Events producers publish into the director.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that a spawn point became active.
    SpawnPointCreated {
        /// Snapshot of the spawn point at creation time.
        spawn_point: SpawnPoint,
    },
    /// Announces that a spawn point was destroyed. Destruction is terminal.
    SpawnPointDestroyed {
        /// Identifier of the destroyed spawn point.
        spawn_point: SpawnPointId,
    },
    /// Announces that a combatant entered the encounter.
    CombatantSpawned {
        /// Snapshot of the combatant at spawn time.
        combatant: Combatant,
    },
    /// Announces that a combatant was eliminated. Death is terminal.
    CombatantDied {
        /// Identifier of the eliminated combatant.
        combatant: CombatantId,
        /// Position at which the combatant died.
        position: Vec3,
    },
    /// Refreshes the last known position of a live combatant.
    CombatantMoved {
        /// Identifier of the combatant that moved.
        combatant: CombatantId,
        /// Position the combatant now occupies.
        position: Vec3,
    },
    /// Reports a sighting of the target.
    LocationReported {
        /// Position at which the target was sighted.
        position: Vec3,
        /// How trustworthy the sighting is.
        precision: Precision,
    },
    /// Announces whether a target currently exists in the encounter.
    TargetPresenceChanged {
        /// Whether a target is present after the change.
        present: bool,
    },
    /// Indicates that the host clock advanced.
    TimeAdvanced {
        /// Actual time that elapsed since the previous advance.
        dt: Duration,
    },
}

/// Unique identifier assigned to a spawn point by its producer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpawnPointId(u32);

impl SpawnPointId {
    /// Creates a new spawn point identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a combatant by its producer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatantId(u32);

impl CombatantId {
    /// Creates a new combatant identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a unit template a spawn point knows how to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(u32);

impl TemplateId {
    /// Creates a new template identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Spawning subsystem observed by the director.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnPoint {
    id: SpawnPointId,
    position: Vec3,
    challenge_rating: f32,
    label: String,
}

impl SpawnPoint {
    /// Creates a new spawn point snapshot.
    ///
    /// `challenge_rating` is credited to the kill ledger when the spawn point
    /// is destroyed.
    #[must_use]
    pub fn new(id: SpawnPointId, position: Vec3, challenge_rating: f32) -> Self {
        Self {
            id,
            position,
            challenge_rating,
            label: format!("spawn-point-{}", id.get()),
        }
    }

    /// Replaces the human readable label carried into kill records.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Identifier of the spawn point.
    #[must_use]
    pub const fn id(&self) -> SpawnPointId {
        self.id
    }

    /// World position of the spawn point.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Intensity weight credited when the spawn point is destroyed.
    #[must_use]
    pub const fn challenge_rating(&self) -> f32 {
        self.challenge_rating
    }

    /// Human readable label of the spawn point.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Combatant entity that can be ordered to attack.
#[derive(Clone, Debug, PartialEq)]
pub struct Combatant {
    id: CombatantId,
    position: Vec3,
    challenge_rating: f32,
    label: String,
    origin: Option<SpawnPointId>,
}

impl Combatant {
    /// Creates a new combatant snapshot.
    #[must_use]
    pub fn new(id: CombatantId, position: Vec3, challenge_rating: f32) -> Self {
        Self {
            id,
            position,
            challenge_rating,
            label: format!("combatant-{}", id.get()),
            origin: None,
        }
    }

    /// Records the spawn point that produced the combatant.
    #[must_use]
    pub fn with_origin(mut self, origin: SpawnPointId) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Replaces the human readable label carried into kill records.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Identifier of the combatant.
    #[must_use]
    pub const fn id(&self) -> CombatantId {
        self.id
    }

    /// Last known position of the combatant.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Intensity weight of the combatant.
    #[must_use]
    pub const fn challenge_rating(&self) -> f32 {
        self.challenge_rating
    }

    /// Human readable label of the combatant.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Spawn point that produced the combatant, when known.
    #[must_use]
    pub const fn origin(&self) -> Option<SpawnPointId> {
        self.origin
    }

    /// Moves the combatant snapshot to a new position.
    pub fn relocate(&mut self, position: Vec3) {
        self.position = position;
    }
}

/// Trustworthiness of a target sighting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Precision {
    /// The sighting pinpoints the target.
    Exact,
    /// The sighting is only accurate to within the given radius.
    Approximate {
        /// Uncertainty radius reported alongside the sighting.
        radius: f32,
    },
}

impl Precision {
    /// Interprets a reporter's uncertainty radius; zero denotes an exact fix.
    #[must_use]
    pub fn from_radius(radius: f32) -> Self {
        if radius == 0.0 {
            Self::Exact
        } else {
            Self::Approximate { radius }
        }
    }

    /// Reports whether the sighting pinpoints the target.
    ///
    /// An approximate sighting with a zero radius counts as exact.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        match self {
            Self::Exact => true,
            Self::Approximate { radius } => *radius == 0.0,
        }
    }
}

/// Target sighting stamped with the director clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocationReport {
    position: Vec3,
    precision: Precision,
    timestamp: Duration,
}

impl LocationReport {
    /// Creates a new location report.
    #[must_use]
    pub const fn new(position: Vec3, precision: Precision, timestamp: Duration) -> Self {
        Self {
            position,
            precision,
            timestamp,
        }
    }

    /// Position at which the target was sighted.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Trustworthiness of the sighting.
    #[must_use]
    pub const fn precision(&self) -> Precision {
        self.precision
    }

    /// Session time at which the sighting was received.
    #[must_use]
    pub const fn timestamp(&self) -> Duration {
        self.timestamp
    }
}

/// Entity whose elimination produced a kill record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KillSource {
    /// A destroyed spawn point.
    SpawnPoint(SpawnPointId),
    /// An eliminated combatant.
    Combatant(CombatantId),
}

/// Immutable record of a single elimination.
#[derive(Clone, Debug, PartialEq)]
pub struct KillRecord {
    timestamp: Duration,
    challenge_rating: f32,
    source: KillSource,
    label: String,
    position: Vec3,
}

impl KillRecord {
    /// Creates a new kill record.
    #[must_use]
    pub fn new(
        timestamp: Duration,
        challenge_rating: f32,
        source: KillSource,
        label: impl Into<String>,
        position: Vec3,
    ) -> Self {
        Self {
            timestamp,
            challenge_rating,
            source,
            label: label.into(),
            position,
        }
    }

    /// Session time at which the elimination was observed.
    #[must_use]
    pub const fn timestamp(&self) -> Duration {
        self.timestamp
    }

    /// Intensity weight credited by the elimination.
    #[must_use]
    pub const fn challenge_rating(&self) -> f32 {
        self.challenge_rating
    }

    /// Entity that was eliminated.
    #[must_use]
    pub const fn source(&self) -> KillSource {
        self.source
    }

    /// Label of the eliminated entity.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Position at which the elimination happened.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }
}
