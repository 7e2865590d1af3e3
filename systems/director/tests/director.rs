use std::time::Duration;

use wings_runner_core::{Event, Phase, SceneName};
use wings_runner_system_completion::CompletionStage;
use wings_runner_system_director::{Director, FrameInput, SceneCatalog, SceneSetup};
use wings_runner_system_finale::FinaleStage;
use wings_runner_system_scene_transition::{
    Config as TransitionConfig, LoadProgress, SceneLoadError, SceneLoader, TransitionPhase,
};
use wings_runner_world::{query, Config as SessionConfig};

const FRAME: Duration = Duration::from_millis(50);

/// Loader that resolves a fixed set of scenes on the first poll.
struct CatalogLoader {
    known: Vec<SceneName>,
    loads: usize,
}

impl CatalogLoader {
    fn new(catalog: &SceneCatalog) -> Self {
        Self {
            known: catalog.names().cloned().collect(),
            loads: 0,
        }
    }
}

impl SceneLoader for CatalogLoader {
    fn begin_load(&mut self, scene: &SceneName) -> Result<(), SceneLoadError> {
        if !self.known.contains(scene) {
            return Err(SceneLoadError::UnknownScene {
                scene: scene.clone(),
            });
        }
        self.loads += 1;
        Ok(())
    }

    fn poll(&mut self) -> LoadProgress {
        LoadProgress::Ready
    }
}

fn scene(name: &str) -> SceneName {
    SceneName::new(name).expect("valid scene")
}

fn two_part_catalog() -> SceneCatalog {
    let mut catalog = SceneCatalog::new();
    catalog
        .insert(
            scene("Part1"),
            SceneSetup {
                session: SessionConfig {
                    target_score: 50.0,
                    next_scene: Some(scene("Part2")),
                    ..SessionConfig::default()
                },
                ..SceneSetup::default()
            },
        )
        .expect("valid part one");
    catalog
        .insert(
            scene("Part2"),
            SceneSetup {
                session: SessionConfig {
                    target_score: 120.0,
                    finale_enabled: false,
                    ..SessionConfig::default()
                },
                ..SceneSetup::default()
            },
        )
        .expect("valid part two");
    catalog
}

/// Drives frames until `done` holds, feeding a pickup contact whenever the
/// pickup is in the world.
fn run_until(
    director: &mut Director,
    loader: &mut CatalogLoader,
    log: &mut Vec<Event>,
    mut done: impl FnMut(&Director) -> bool,
) {
    for _ in 0..4000 {
        if done(director) {
            return;
        }
        let mut input = FrameInput::new(FRAME);
        input.pickup_contact = director.finale_stage() == FinaleStage::Spawned;
        let output = director.frame(input, loader);
        log.extend(output.events);
    }
    panic!("condition not reached within the frame budget");
}

#[test]
fn finale_hands_lives_and_score_to_the_next_part_once() {
    let catalog = two_part_catalog();
    let mut loader = CatalogLoader::new(&catalog);
    let mut director = Director::new(catalog, scene("Part1"), TransitionConfig::default(), 0.0)
        .expect("scene exists");

    let mut first = FrameInput::new(FRAME);
    first.damage = 1;
    let mut log = director.frame(first, &mut loader).events;

    run_until(&mut director, &mut loader, &mut log, |director| {
        director.active_scene().as_str() == "Part2"
            && director.transition_phase() == TransitionPhase::Idle
    });

    let requests: Vec<(u32, f32)> = log
        .iter()
        .filter_map(|event| match event {
            Event::NextPartRequested { lives, score, .. } => Some((*lives, *score)),
            _ => None,
        })
        .collect();
    assert_eq!(requests.len(), 1);
    let (lives, score) = requests[0];
    assert_eq!(lives, 2);
    assert!(score >= 50.0);

    let starts: Vec<(u32, f32)> = log
        .iter()
        .filter_map(|event| match event {
            Event::SessionStarted { lives, score, .. } => Some((*lives, *score)),
            _ => None,
        })
        .collect();
    assert_eq!(starts, vec![(3, 0.0), (lives, score)]);

    assert_eq!(loader.loads, 1);
    assert!(!director.carryover().is_pending());
    assert_eq!(query::phase(director.session()), Phase::Playing);
    assert_eq!(query::lives(director.session()), 2);
}

#[test]
fn second_part_completes_without_a_further_hand_off() {
    let catalog = two_part_catalog();
    let mut loader = CatalogLoader::new(&catalog);
    let mut director = Director::new(catalog, scene("Part1"), TransitionConfig::default(), 0.0)
        .expect("scene exists");
    let mut log = Vec::new();

    run_until(&mut director, &mut loader, &mut log, |director| {
        director.active_scene().as_str() == "Part2"
    });
    log.clear();

    run_until(&mut director, &mut loader, &mut log, |director| {
        director.completion_stage() == CompletionStage::Done
    });

    assert_eq!(query::phase(director.session()), Phase::FinaleCinematic);
    assert_eq!(query::world_speed(director.session()), 0.0);
    assert_eq!(query::obstacle_count(director.session()), 0);
    assert!(!log
        .iter()
        .any(|event| matches!(event, Event::NextPartRequested { .. })));
    assert_eq!(director.transition_phase(), TransitionPhase::Idle);
    assert_eq!(loader.loads, 1);
}

#[test]
fn finale_freezes_the_world_before_the_hand_off() {
    let catalog = two_part_catalog();
    let mut loader = CatalogLoader::new(&catalog);
    let mut director = Director::new(catalog, scene("Part1"), TransitionConfig::default(), 0.0)
        .expect("scene exists");
    let mut log = Vec::new();

    run_until(&mut director, &mut loader, &mut log, |director| {
        director.finale_stage() >= FinaleStage::WingsLoop
    });

    assert_eq!(query::phase(director.session()), Phase::FinaleCinematic);
    assert_eq!(query::world_speed(director.session()), 0.0);
    assert!(!query::spawning_enabled(director.session()));
    assert_eq!(query::obstacle_count(director.session()), 0);

    let score = query::score(director.session());
    let mut input = FrameInput::new(FRAME);
    input.damage = 3;
    let _ = director.frame(input, &mut loader);
    assert_eq!(query::score(director.session()), score);
    assert_eq!(query::lives(director.session()), 3);
}

#[test]
fn game_over_stops_the_run_without_a_hand_off() {
    let catalog = two_part_catalog();
    let mut loader = CatalogLoader::new(&catalog);
    let mut director = Director::new(catalog, scene("Part1"), TransitionConfig::default(), 0.0)
        .expect("scene exists");

    let mut input = FrameInput::new(FRAME);
    input.damage = 3;
    let output = director.frame(input, &mut loader);
    assert!(output.events.contains(&Event::GameOver));

    let mut log = Vec::new();
    for _ in 0..400 {
        log.extend(director.frame(FrameInput::new(FRAME), &mut loader).events);
    }
    assert_eq!(query::phase(director.session()), Phase::Ended);
    assert_eq!(director.finale_stage(), FinaleStage::Idle);
    assert!(!log
        .iter()
        .any(|event| matches!(event, Event::ObstacleSpawned { .. })));
}
