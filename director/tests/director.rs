use std::{thread, time::Duration};

use glam::Vec3;
use pacing_director::{
    query, ConfigError, Director, DirectorConfig, IntakeError, PUMP_BATCH_LIMIT,
};
use pacing_director_core::{
    Combatant, CombatantId, Command, Event, Precision, SpawnPoint, SpawnPointId, TemplateId,
};

const DISCOVERY: TemplateId = TemplateId::new(77);

fn director() -> Director {
    Director::new(&DirectorConfig::with_discovery_template(DISCOVERY)).expect("valid config")
}

fn advance(seconds: u64) -> Event {
    Event::TimeAdvanced {
        dt: Duration::from_secs(seconds),
    }
}

fn spawn_point(raw: u32) -> Event {
    Event::SpawnPointCreated {
        spawn_point: SpawnPoint::new(
            SpawnPointId::new(raw),
            Vec3::new(raw as f32, 0.0, 0.0),
            2.0,
        ),
    }
}

fn combatant(raw: u32, weight: f32) -> Event {
    Event::CombatantSpawned {
        combatant: Combatant::new(CombatantId::new(raw), Vec3::ZERO, weight)
            .with_origin(SpawnPointId::new(1)),
    }
}

fn death(raw: u32) -> Event {
    Event::CombatantDied {
        combatant: CombatantId::new(raw),
        position: Vec3::ZERO,
    }
}

fn discovery_spawns(commands: &[Command]) -> Vec<SpawnPointId> {
    commands
        .iter()
        .filter_map(|command| match command {
            Command::RequestSpawn {
                spawn_point,
                template,
            } => {
                assert_eq!(*template, DISCOVERY);
                Some(*spawn_point)
            }
            Command::RequestAttack { .. } => None,
        })
        .collect()
}

fn attack_orders(commands: &[Command]) -> Vec<(CombatantId, Vec3)> {
    commands
        .iter()
        .filter_map(|command| match command {
            Command::RequestAttack { combatant, target } => Some((*combatant, *target)),
            Command::RequestSpawn { .. } => None,
        })
        .collect()
}

#[test]
fn missing_discovery_template_is_rejected_at_construction() {
    let error = Director::new(&DirectorConfig::default()).expect_err("template is required");
    assert_eq!(error, ConfigError::MissingDiscoveryTemplate);
}

#[test]
fn stale_sightings_request_one_discovery_per_check() {
    let mut director = director();
    let mut commands = Vec::new();

    director.handle(
        &[
            spawn_point(1),
            Event::TargetPresenceChanged { present: true },
            advance(31),
        ],
        &mut commands,
    );
    assert_eq!(discovery_spawns(&commands), vec![SpawnPointId::new(1)]);
    assert_eq!(director.discovery_requests(), 1);

    commands.clear();
    director.handle(
        &[
            Event::SpawnPointDestroyed {
                spawn_point: SpawnPointId::new(1),
            },
            advance(0),
        ],
        &mut commands,
    );
    assert!(discovery_spawns(&commands).is_empty());
    assert_eq!(director.now(), Duration::from_secs(31));
}

#[test]
fn watchdog_keeps_asking_until_a_sighting_arrives() {
    let mut director = director();
    let mut commands = Vec::new();

    director.handle(
        &[
            spawn_point(1),
            spawn_point(2),
            Event::TargetPresenceChanged { present: true },
            advance(31),
            advance(1),
            advance(1),
        ],
        &mut commands,
    );
    assert_eq!(discovery_spawns(&commands).len(), 3);

    commands.clear();
    director.handle(
        &[
            Event::LocationReported {
                position: Vec3::new(1.0, 0.0, 1.0),
                precision: Precision::from_radius(8.0),
            },
            advance(30),
        ],
        &mut commands,
    );
    assert!(discovery_spawns(&commands).is_empty());
    assert_eq!(director.last_report_at(), Duration::from_secs(33));
}

#[test]
fn prior_sighting_arms_watchdog_without_presence_event() {
    let mut director = director();
    let mut commands = Vec::new();

    director.handle(
        &[
            spawn_point(1),
            Event::LocationReported {
                position: Vec3::new(2.0, 0.0, 2.0),
                precision: Precision::Exact,
            },
            advance(31),
        ],
        &mut commands,
    );

    assert_eq!(discovery_spawns(&commands), vec![SpawnPointId::new(1)]);
    assert_eq!(director.last_report_at(), Duration::ZERO);
}

#[test]
fn watchdog_is_silent_without_target() {
    let mut director = director();
    let mut commands = Vec::new();

    director.handle(&[spawn_point(1), advance(120)], &mut commands);

    assert!(discovery_spawns(&commands).is_empty());
}

#[test]
fn slow_kill_rate_orders_attacks_on_estimated_location() {
    let mut director = director();
    let mut events: Vec<Event> = (1..=20).map(|raw| combatant(raw, 1.0)).collect();
    events.push(Event::LocationReported {
        position: Vec3::new(5.0, 0.0, 5.0),
        precision: Precision::Exact,
    });
    events.push(advance(1));

    let mut commands = Vec::new();
    director.handle(&events, &mut commands);

    let orders = attack_orders(&commands);
    assert_eq!(orders.len(), 12);
    assert!(orders
        .iter()
        .all(|(_, target)| *target == Vec3::new(5.0, 0.0, 5.0)));
    assert!(orders
        .iter()
        .all(|(id, _)| query::combatant(director.registry(), *id).is_some()));

    let evaluation = director.last_evaluation().expect("evaluation ran");
    assert!(evaluation.corrected());
    assert_eq!(director.pacing_state().current_rate(), 0.0);
}

#[test]
fn sufficient_kill_rate_holds_fire() {
    let mut director = director();
    let mut events: Vec<Event> = (1..=20).map(|raw| combatant(raw, 1.0)).collect();
    events.push(advance(1));
    let mut commands = Vec::new();
    director.handle(&events, &mut commands);
    assert!(!attack_orders(&commands).is_empty());

    commands.clear();
    let mut kills = vec![advance(9)];
    kills.extend((1..=8).map(death));
    kills.push(death(1));
    kills.push(advance(17));
    director.handle(&kills, &mut commands);

    assert_eq!(director.ledger().len(), 8, "duplicate death is ignored");
    assert_eq!(director.now(), Duration::from_secs(27));
    let evaluation = director.last_evaluation().expect("second evaluation ran");
    assert_eq!(evaluation.evaluated_at(), Duration::from_secs(27));
    assert!(evaluation.current_rate() >= 0.3);
    assert!(attack_orders(&commands).is_empty());
    assert_eq!(query::combatants(director.registry()).len(), 12);
}

#[test]
fn destroyed_spawn_point_counts_towards_kill_rate() {
    let mut director = director();
    let mut commands = Vec::new();
    director.handle(
        &[
            spawn_point(4),
            advance(3),
            Event::SpawnPointDestroyed {
                spawn_point: SpawnPointId::new(4),
            },
        ],
        &mut commands,
    );

    assert_eq!(director.ledger().len(), 1);
    assert_eq!(director.ledger().records()[0].timestamp(), Duration::from_secs(3));
    assert_eq!(director.ledger().records()[0].challenge_rating(), 2.0);
    assert!(query::spawn_points(director.registry()).is_empty());
}

#[test]
fn publishers_feed_the_director_across_threads() {
    let mut director = director();
    let publisher = director.publisher();
    assert_eq!(director.attached_publishers(), 1);

    let worker = {
        let publisher = publisher.clone();
        thread::spawn(move || {
            for raw in 1..=5 {
                publisher
                    .publish(combatant(raw, 1.0))
                    .expect("director alive");
            }
        })
    };
    worker.join().expect("producer thread");
    assert_eq!(director.attached_publishers(), 1, "worker handle dropped");

    let mut commands = Vec::new();
    assert_eq!(director.pump(&mut commands), 5);
    assert_eq!(query::combatants(director.registry()).len(), 5);
    assert_eq!(director.pump(&mut commands), 0);

    drop(director);
    let rejected = publisher
        .publish(advance(1))
        .expect_err("director torn down");
    assert_eq!(rejected, IntakeError::Closed(Box::new(advance(1))));
}

#[test]
fn pump_is_bounded_per_call() {
    let mut director = director();
    let publisher = director.publisher();
    for _ in 0..PUMP_BATCH_LIMIT + 10 {
        publisher.publish(advance(0)).expect("director alive");
    }

    let mut commands = Vec::new();
    assert_eq!(director.pump(&mut commands), PUMP_BATCH_LIMIT);
    assert_eq!(director.pump(&mut commands), 10);
}
