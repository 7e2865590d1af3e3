use std::time::Duration;

use wings_runner_core::{
    Command, EndReason, Event, HeartSlot, HeartState, HeartTint, ObstacleId, Phase, SceneName,
    TargetRoute,
};
use wings_runner_system_carryover::CarryoverStore;
use wings_runner_world::{self as world, query, Config, Session};

fn start(config: Config, carryover: &mut CarryoverStore) -> Session {
    let mut session = Session::new(config, 0.0);
    let mut events = Vec::new();
    world::start_new_session(&mut session, carryover, &mut events);
    session
}

fn tick(session: &mut Session, seconds: f32) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        session,
        Command::Tick {
            dt: Duration::from_secs_f32(seconds),
        },
        &mut events,
    );
    events
}

fn target_events(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::TargetReached { .. }))
        .count()
}

#[test]
fn score_and_multiplier_never_decrease_while_playing() {
    let config = Config {
        target_score: f32::MAX,
        ..Config::default()
    };
    let mut session = start(config, &mut CarryoverStore::new());

    let steps = [0.016, 0.5, 0.0, 3.2, 1.7, 0.033, 6.0, 0.25, 10.0];
    let mut previous_score = query::score(&session);
    let mut previous_multiplier = query::speed_multiplier(&session);
    for step in steps {
        let _ = tick(&mut session, step);
        assert!(query::score(&session) >= previous_score);
        assert!(query::speed_multiplier(&session) >= previous_multiplier);
        previous_score = query::score(&session);
        previous_multiplier = query::speed_multiplier(&session);
    }
    assert!(previous_multiplier > 1.0);
}

#[test]
fn crossing_the_target_in_one_tick_triggers_the_finale_once() {
    let mut carryover = CarryoverStore::new();
    carryover.set_score(2990.0);
    let mut session = start(Config::default(), &mut carryover);

    let events = tick(&mut session, 5.0);
    assert!((query::score(&session) - 3015.0).abs() < 1e-3);
    assert_eq!(target_events(&events), 1);
    assert!(events.contains(&Event::TargetReached {
        score: query::score(&session),
        route: TargetRoute::Finale,
    }));
    assert_eq!(query::phase(&session), Phase::FinaleTriggered);
    assert!(query::target_latched(&session));

    let mut later = Vec::new();
    for _ in 0..20 {
        later.extend(tick(&mut session, 0.5));
    }
    assert_eq!(target_events(&later), 0);
}

#[test]
fn target_fires_once_regardless_of_tick_granularity() {
    for step in [0.01_f32, 0.1, 1.0, 7.5] {
        let config = Config {
            target_score: 40.0,
            finale_enabled: false,
            auto_stop_at_target: false,
            ..Config::default()
        };
        let mut session = start(config, &mut CarryoverStore::new());
        let mut fired = 0;
        let mut elapsed = 0.0;
        while elapsed < 30.0 {
            fired += target_events(&tick(&mut session, step));
            elapsed += step;
        }
        assert_eq!(fired, 1, "step {step}");
        assert_eq!(query::phase(&session), Phase::Playing);
    }
}

#[test]
fn finale_trigger_slows_the_world() {
    let mut carryover = CarryoverStore::new();
    carryover.set_score(2999.0);
    let mut session = start(Config::default(), &mut carryover);
    let _ = tick(&mut session, 1.0);

    assert!((query::base_speed(&session) - 3.75).abs() < 1e-5);
    assert!((query::speed_multiplier(&session) - 0.75).abs() < 1e-5);
}

#[test]
fn two_hits_leave_one_life_and_a_third_ends_the_session() {
    let mut session = start(Config::default(), &mut CarryoverStore::new());
    let mut events = Vec::new();
    world::apply(&mut session, Command::ApplyDamage, &mut events);
    world::apply(&mut session, Command::ApplyDamage, &mut events);

    assert_eq!(query::lives(&session), 1);
    assert_eq!(
        query::hearts(&session),
        vec![HeartState::Full, HeartState::Empty, HeartState::Empty]
    );
    assert_eq!(query::phase(&session), Phase::Playing);

    world::apply(&mut session, Command::ApplyDamage, &mut events);
    assert_eq!(query::lives(&session), 0);
    assert_eq!(query::phase(&session), Phase::Ended);
    assert_eq!(query::end_reason(&session), Some(EndReason::GameOver));
}

#[test]
fn last_life_ends_exactly_once() {
    let config = Config {
        starting_lives: 1,
        ..Config::default()
    };
    let mut session = start(config, &mut CarryoverStore::new());
    let mut events = Vec::new();
    for _ in 0..4 {
        world::apply(&mut session, Command::ApplyDamage, &mut events);
    }

    let game_overs = events
        .iter()
        .filter(|event| matches!(event, Event::GameOver))
        .count();
    assert_eq!(game_overs, 1);
    assert_eq!(query::lives(&session), 0);
    assert_eq!(query::world_speed(&session), 0.0);
    assert!(!query::spawning_enabled(&session));
    assert!(events.contains(&Event::SpawningHalted));
}

#[test]
fn game_over_restores_the_flashing_heart() {
    let config = Config {
        starting_lives: 1,
        ..Config::default()
    };
    let mut session = start(config, &mut CarryoverStore::new());
    let mut events = Vec::new();
    world::apply(&mut session, Command::ApplyDamage, &mut events);

    assert!(!query::heart_is_flashing(&session, HeartSlot::new(0)));
    assert_eq!(
        events.iter().rev().find_map(|event| match event {
            Event::HeartTintChanged { tint, .. } => Some(*tint),
            _ => None,
        }),
        Some(HeartTint::Normal)
    );
}

fn restored_tint(events: &[Event], slot: HeartSlot) -> bool {
    events.iter().any(|event| {
        *event
            == Event::HeartTintChanged {
                slot,
                tint: HeartTint::Normal,
            }
    })
}

#[test]
fn final_freeze_restores_a_flashing_heart() {
    let mut session = start(Config::default(), &mut CarryoverStore::new());
    let mut events = Vec::new();
    world::apply(&mut session, Command::ApplyDamage, &mut events);
    assert!(query::heart_is_flashing(&session, HeartSlot::new(2)));

    let mut events = Vec::new();
    world::apply(&mut session, Command::ForceFinalFreeze, &mut events);

    assert_eq!(query::phase(&session), Phase::FinaleCinematic);
    assert!(restored_tint(&events, HeartSlot::new(2)));
    assert!(!query::heart_is_flashing(&session, HeartSlot::new(2)));
}

#[test]
fn completing_the_part_restores_a_flashing_heart() {
    let mut carryover = CarryoverStore::new();
    carryover.set_score(9.9);
    let config = Config {
        target_score: 10.0,
        finale_enabled: false,
        auto_stop_at_target: true,
        freeze_player_on_finish: true,
        ..Config::default()
    };
    let mut session = start(config, &mut carryover);
    let mut events = Vec::new();
    world::apply(&mut session, Command::ApplyDamage, &mut events);
    assert!(query::heart_is_flashing(&session, HeartSlot::new(2)));

    let events = tick(&mut session, 0.03);

    assert_eq!(query::phase(&session), Phase::FinaleCinematic);
    assert_eq!(query::end_reason(&session), Some(EndReason::TargetReached));
    assert!(restored_tint(&events, HeartSlot::new(2)));
    assert!(!query::heart_is_flashing(&session, HeartSlot::new(2)));
}

#[test]
fn hits_beyond_the_displayed_slots_are_skipped() {
    let config = Config {
        starting_lives: 5,
        heart_slots: 0,
        ..Config::default()
    };
    let mut session = start(config, &mut CarryoverStore::new());
    assert_eq!(query::lives(&session), 5);

    let mut events = Vec::new();
    world::apply(&mut session, Command::ApplyDamage, &mut events);
    assert!(events.contains(&Event::PlayerHit {
        slot: None,
        lives: 4
    }));
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::HeartTintChanged { .. })));
}

#[test]
fn starting_lives_clamp_to_heart_slots() {
    let config = Config {
        starting_lives: 5,
        heart_slots: 3,
        ..Config::default()
    };
    let session = start(config, &mut CarryoverStore::new());
    assert_eq!(query::lives(&session), 3);
}

#[test]
fn force_final_freeze_is_idempotent() {
    let mut session = start(Config::default(), &mut CarryoverStore::new());
    let mut first = Vec::new();
    world::apply(&mut session, Command::ForceFinalFreeze, &mut first);
    assert_eq!(query::phase(&session), Phase::FinaleCinematic);
    assert_eq!(query::world_speed(&session), 0.0);
    assert!(query::target_latched(&session));
    assert!(!first.is_empty());

    let mut second = Vec::new();
    world::apply(&mut session, Command::ForceFinalFreeze, &mut second);
    assert!(second.is_empty());

    let score = query::score(&session);
    assert!(tick(&mut session, 10.0).is_empty());
    assert_eq!(query::score(&session), score);

    let mut damage = Vec::new();
    world::apply(&mut session, Command::ApplyDamage, &mut damage);
    assert!(damage.is_empty());
    assert_eq!(query::lives(&session), 3);
}

#[test]
fn repeated_contacts_with_one_obstacle_damage_once() {
    let mut session = start(Config::default(), &mut CarryoverStore::new());
    let mut events = Vec::new();
    world::apply(&mut session, Command::SpawnObstacle { altitude: 0.5 }, &mut events);
    let obstacle = ObstacleId::new(0);

    for _ in 0..6 {
        world::apply(&mut session, Command::ReportContact { obstacle }, &mut events);
    }
    assert_eq!(query::lives(&session), 2);

    let _ = tick(&mut session, 0.4);
    assert!(query::obstacle(&session, obstacle).is_none());
}

#[test]
fn departed_obstacles_leave_the_session() {
    let mut session = start(Config::default(), &mut CarryoverStore::new());
    let mut events = Vec::new();
    world::apply(&mut session, Command::SpawnObstacle { altitude: 0.5 }, &mut events);
    events.clear();

    let obstacle = ObstacleId::new(0);
    world::apply(&mut session, Command::DespawnObstacle { obstacle }, &mut events);
    world::apply(&mut session, Command::DespawnObstacle { obstacle }, &mut events);
    assert_eq!(events, vec![Event::ObstacleRemoved { obstacle }]);
    assert_eq!(query::obstacle_count(&session), 0);
}

#[test]
fn contacts_after_the_cooldown_damage_again() {
    let mut session = start(Config::default(), &mut CarryoverStore::new());
    let mut events = Vec::new();
    world::apply(&mut session, Command::SpawnObstacle { altitude: 0.5 }, &mut events);
    world::apply(&mut session, Command::SpawnObstacle { altitude: 1.5 }, &mut events);

    world::apply(
        &mut session,
        Command::ReportContact {
            obstacle: ObstacleId::new(0),
        },
        &mut events,
    );
    let _ = tick(&mut session, 0.4);
    world::apply(
        &mut session,
        Command::ReportContact {
            obstacle: ObstacleId::new(1),
        },
        &mut events,
    );
    assert_eq!(query::lives(&session), 1);
}

#[test]
fn completion_route_freezes_and_disarms() {
    let config = Config {
        finale_pickup_available: false,
        target_score: 10.0,
        ..Config::default()
    };
    let mut session = start(config, &mut CarryoverStore::new());
    let mut events = Vec::new();
    world::apply(&mut session, Command::SpawnObstacle { altitude: 0.0 }, &mut events);

    let events = tick(&mut session, 3.0);
    assert!(events.contains(&Event::TargetReached {
        score: query::score(&session),
        route: TargetRoute::Completion,
    }));
    assert_eq!(query::phase(&session), Phase::FinaleCinematic);
    assert_eq!(query::end_reason(&session), Some(EndReason::TargetReached));
    assert!(query::obstacles(&session).iter().all(|o| o.consumed));
}

#[test]
fn completion_without_player_freeze_ends_the_session() {
    let config = Config {
        finale_enabled: false,
        freeze_player_on_finish: false,
        target_score: 10.0,
        ..Config::default()
    };
    let mut session = start(config, &mut CarryoverStore::new());
    let _ = tick(&mut session, 3.0);
    assert_eq!(query::phase(&session), Phase::Ended);
    assert_eq!(query::world_speed(&session), 0.0);
}

#[test]
fn next_part_requires_a_scene_and_auto_advance() {
    let mut session = start(Config::default(), &mut CarryoverStore::new());
    let mut events = Vec::new();
    world::apply(&mut session, Command::AdvanceToNextPart, &mut events);
    assert!(events.is_empty());

    let scene = SceneName::new("Part2");
    let config = Config {
        next_scene: scene.clone(),
        auto_advance: false,
        ..Config::default()
    };
    let mut session = start(config, &mut CarryoverStore::new());
    world::apply(&mut session, Command::AdvanceToNextPart, &mut events);
    assert!(events.is_empty());

    let config = Config {
        next_scene: scene.clone(),
        ..Config::default()
    };
    let mut session = start(config, &mut CarryoverStore::new());
    world::apply(&mut session, Command::ApplyDamage, &mut events);
    events.clear();
    world::apply(&mut session, Command::AdvanceToNextPart, &mut events);
    assert_eq!(
        events,
        vec![Event::NextPartRequested {
            scene: SceneName::new("Part2").expect("valid scene"),
            lives: 2,
            score: 0.0,
        }]
    );
}

#[test]
fn carryover_is_consumed_by_the_next_session_only() {
    let mut carryover = CarryoverStore::new();
    carryover.set_lives(2);
    carryover.set_score(1500.0);

    let first = start(Config::default(), &mut carryover);
    assert_eq!(query::lives(&first), 2);
    assert_eq!(query::score(&first), 1500.0);
    assert!(!carryover.is_pending());

    let second = start(Config::default(), &mut carryover);
    assert_eq!(query::lives(&second), 3);
    assert_eq!(query::score(&second), 0.0);
}

#[test]
fn start_score_override_applies_without_carryover() {
    let config = Config {
        start_score_override: Some(250.0),
        ..Config::default()
    };
    let session = start(config, &mut CarryoverStore::new());
    assert_eq!(query::score(&session), 250.0);
}

#[test]
fn high_score_tracks_the_best_run() {
    let mut session = Session::new(Config::default(), 20.0);
    let mut events = Vec::new();
    world::start_new_session(&mut session, &mut CarryoverStore::new(), &mut events);

    let events = tick(&mut session, 2.0);
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::HighScoreImproved { .. })));

    let events = tick(&mut session, 3.0);
    assert!(events.contains(&Event::HighScoreImproved { score: 25.0 }));
    assert_eq!(query::high_score(&session), 25.0);
}
