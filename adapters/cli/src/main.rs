#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line driver for Wings Runner.
//!
//! Runs the director against logging collaborators and a crude contact model,
//! so whole runs can be replayed and inspected without an engine.

mod config;
mod simulation;
mod store;
mod surfaces;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wings_runner_core::{EndReason, Event, SceneName};
use wings_runner_presentation::{HighScoreStore, Presenter, Surfaces};
use wings_runner_system_completion::CompletionStage;
use wings_runner_system_director::{Director, FrameInput};
use wings_runner_system_finale::FinaleStage;
use wings_runner_system_scene_transition::TransitionPhase;
use wings_runner_world::query;

use crate::{
    simulation::{FrameLatencyLoader, Playfield, PlayerBody},
    store::TomlHighScoreStore,
    surfaces::{LogEffects, LogUi},
};

/// Runs Wings Runner headless and logs the outcome.
#[derive(Debug, Parser)]
#[command(name = "wings-runner", version, about)]
struct Args {
    /// TOML game configuration. The built-in two-part run is used when omitted.
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Largest number of frames to simulate.
    #[arg(long, default_value_t = 72_000)]
    frames: u32,
    /// Simulated frames per second.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=1000))]
    fps: u32,
    /// Seed for obstacle placement and the autopilot.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// File holding the persisted high score.
    #[arg(long, default_value = "wings-runner-highscore.toml")]
    high_score: PathBuf,
    /// Scene to start in instead of the configured one.
    #[arg(long)]
    scene: Option<String>,
}

/// Entry point for the Wings Runner command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();
    run(&args)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn run(args: &Args) -> Result<()> {
    let config = config::load(args.config.as_deref(), args.seed)?;
    let start = match &args.scene {
        Some(name) => SceneName::new(name.as_str()).context("scene names must not be blank")?,
        None => config.start_scene.clone(),
    };

    let mut store = TomlHighScoreStore::new(&args.high_score);
    let high_score = store.load().unwrap_or_else(|error| {
        warn!(
            error = %format!("{error:#}"),
            path = %store.path().display(),
            "ignoring unreadable high score"
        );
        0.0
    });

    let mut director = Director::new(config.catalog, start, config.transition, high_score)
        .context("failed to start the first scene")?;
    let mut loader = FrameLatencyLoader::new(
        director.catalog().names().cloned(),
        config.load_latency_frames,
    );

    let mut presenter = Presenter::new(config.heart_color);
    let mut field = Playfield::default();
    let mut body = PlayerBody::new(args.seed);
    let mut effects = LogEffects::default();
    let mut ui = LogUi::default();

    let dt = Duration::from_secs(1) / args.fps;
    let mut hits = 0_usize;
    let mut frames_run = 0_u32;

    for frame in 0..args.frames {
        let report = simulation::step(&mut field, &mut body, dt.as_secs_f32());
        let input = FrameInput {
            dt,
            real_dt: dt,
            contacts: report.contacts,
            departed: report.departed,
            damage: 0,
            pickup_contact: report.pickup_contact,
            player: report.player,
        };
        let output = director.frame(input, &mut loader);
        frames_run = frame + 1;

        hits += output
            .events
            .iter()
            .filter(|event| matches!(event, Event::PlayerHit { .. }))
            .count();
        if let Some(scene) = &output.activated {
            info!(%scene, frame, "scene activated");
        }

        let mut surfaces = Surfaces {
            sprite: &mut body,
            world: &mut field,
            effects: &mut effects,
            ui: &mut ui,
            store: &mut store,
        };
        presenter.present(&output.events, &output.cues, &mut surfaces);

        if run_finished(&director) {
            break;
        }
    }

    store.flush()?;

    let session = director.session();
    info!(
        scene = %director.active_scene(),
        phase = ?query::phase(session),
        end = ?query::end_reason(session),
        score = ui.score(),
        high_score = ui.high_score(),
        lives = query::lives(session),
        hearts = ui.full_hearts(),
        hits,
        shakes = effects.shakes(),
        scene_loads = loader.loads(),
        obstacles = field.obstacle_count(),
        frames = frames_run,
        "run finished"
    );
    Ok(())
}

/// Whether nothing further can happen without a new run.
fn run_finished(director: &Director) -> bool {
    if director.transition_phase() != TransitionPhase::Idle {
        return false;
    }
    query::end_reason(director.session()) == Some(EndReason::GameOver)
        || director.finale_stage() == FinaleStage::Done
        || director.completion_stage() == CompletionStage::Done
}
