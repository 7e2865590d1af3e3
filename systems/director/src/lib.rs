#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-frame pipeline that drives the session and its sequencers.
//!
//! The [`Director`] owns the authoritative [`Session`], the carryover store and
//! the scene transition controller. Each call to [`Director::frame`] feeds
//! collaborator input through the session and the pure systems in a fixed
//! order:
//!
//! 1. contact reports, direct damage and departed obstacles,
//! 2. the gameplay tick,
//! 3. the obstacle spawner,
//! 4. the finale and completion sequencers,
//! 5. the next-part hand-off (carryover write and transition request),
//! 6. the transition update, activating the next scene once it has loaded.

use std::{collections::BTreeMap, mem, time::Duration};

use thiserror::Error;
use tracing::{debug, info, warn};
use wings_runner_core::{Command, Cue, Event, ObstacleId, SceneName, WorldPoint};
use wings_runner_system_carryover::CarryoverStore;
use wings_runner_system_completion::{
    CompletionSequence, CompletionStage, Config as CompletionConfig,
};
use wings_runner_system_finale::{Config as FinaleConfig, FinaleSequencer, FinaleStage};
use wings_runner_system_scene_transition::{
    Config as TransitionConfig, SceneLoader, SceneTransition, TransitionPhase,
};
use wings_runner_system_spawning::{Config as SpawnConfig, SpawnContext, Spawning};
use wings_runner_world::{self as world, query, Config as SessionConfig, ConfigError, Session};

/// Everything required to run one scene.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneSetup {
    /// Session parameters.
    pub session: SessionConfig,
    /// Obstacle spawner parameters.
    pub spawning: SpawnConfig,
    /// Finale cinematic parameters.
    pub finale: FinaleConfig,
    /// Completion sequence parameters.
    pub completion: CompletionConfig,
}

/// Errors raised while assembling or starting the director.
#[derive(Debug, Error)]
pub enum DirectorError {
    /// The requested scene is not part of the catalog.
    #[error("scene `{0}` is not in the catalog")]
    UnknownScene(SceneName),
    /// A scene failed configuration validation.
    #[error("scene `{scene}` has an invalid configuration")]
    InvalidScene {
        /// Scene whose configuration was rejected.
        scene: SceneName,
        /// Validation failure.
        #[source]
        source: ConfigError,
    },
}

/// Validated scene setups keyed by scene name.
#[derive(Clone, Debug, Default)]
pub struct SceneCatalog {
    scenes: BTreeMap<SceneName, SceneSetup>,
}

impl SceneCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and registers a scene, replacing any previous setup.
    pub fn insert(&mut self, scene: SceneName, setup: SceneSetup) -> Result<(), DirectorError> {
        setup
            .session
            .validate()
            .map_err(|source| DirectorError::InvalidScene {
                scene: scene.clone(),
                source,
            })?;
        if let Some(next) = &setup.session.next_scene {
            debug!(%scene, %next, "scene hands off to next part");
        }
        let _ = self.scenes.insert(scene, setup);
        Ok(())
    }

    /// Looks up a scene setup.
    #[must_use]
    pub fn get(&self, scene: &SceneName) -> Option<&SceneSetup> {
        self.scenes.get(scene)
    }

    /// Names of every registered scene in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &SceneName> {
        self.scenes.keys()
    }
}

/// Collaborator input gathered by the adapter for a single frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameInput {
    /// Gameplay time elapsed since the previous frame.
    pub dt: Duration,
    /// Unscaled time elapsed since the previous frame.
    pub real_dt: Duration,
    /// Obstacles the player overlapped during this frame's physics steps.
    pub contacts: Vec<ObstacleId>,
    /// Obstacles that scrolled out of the playfield.
    pub departed: Vec<ObstacleId>,
    /// Number of direct damage requests raised this frame.
    pub damage: u32,
    /// Whether the player overlapped the finale pickup.
    pub pickup_contact: bool,
    /// Current position of the player.
    pub player: WorldPoint,
}

impl FrameInput {
    /// Creates an input with no contacts where gameplay and real time agree.
    #[must_use]
    pub fn new(dt: Duration) -> Self {
        Self {
            dt,
            real_dt: dt,
            contacts: Vec::new(),
            departed: Vec::new(),
            damage: 0,
            pickup_contact: false,
            player: WorldPoint::default(),
        }
    }
}

/// Everything the session and systems produced during a frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameOutput {
    /// Session events in emission order.
    pub events: Vec<Event>,
    /// Presentation cues in emission order.
    pub cues: Vec<Cue>,
    /// Scene activated during this frame, if any.
    pub activated: Option<SceneName>,
}

#[derive(Debug)]
struct SceneSystems {
    spawning: Spawning,
    finale: FinaleSequencer,
    completion: CompletionSequence,
}

impl SceneSystems {
    fn new(setup: &SceneSetup) -> Self {
        Self {
            spawning: Spawning::new(setup.spawning),
            finale: FinaleSequencer::new(setup.finale.clone()),
            completion: CompletionSequence::new(setup.completion),
        }
    }
}

/// Owner of the session and its hand-off state.
#[derive(Debug)]
pub struct Director {
    catalog: SceneCatalog,
    active: SceneName,
    session: Session,
    carryover: CarryoverStore,
    systems: SceneSystems,
    transition: SceneTransition,
    pending: Vec<Event>,
}

impl Director {
    /// Starts the named scene from the catalog.
    ///
    /// The session start events are reported by the first call to
    /// [`Director::frame`].
    pub fn new(
        catalog: SceneCatalog,
        first: SceneName,
        transition: TransitionConfig,
        high_score: f32,
    ) -> Result<Self, DirectorError> {
        let setup = catalog
            .get(&first)
            .cloned()
            .ok_or_else(|| DirectorError::UnknownScene(first.clone()))?;

        let mut carryover = CarryoverStore::new();
        let mut session = Session::new(setup.session.clone(), high_score);
        let mut pending = Vec::new();
        world::start_new_session(&mut session, &mut carryover, &mut pending);
        info!(scene = %first, "scene started");

        Ok(Self {
            systems: SceneSystems::new(&setup),
            catalog,
            active: first,
            session,
            carryover,
            transition: SceneTransition::new(transition),
            pending,
        })
    }

    /// Runs one frame of the pipeline.
    pub fn frame(&mut self, input: FrameInput, loader: &mut dyn SceneLoader) -> FrameOutput {
        let mut events = mem::take(&mut self.pending);
        let mut cues = Vec::new();
        let mut commands = Vec::new();

        commands.extend(
            input
                .contacts
                .iter()
                .map(|&obstacle| Command::ReportContact { obstacle }),
        );
        commands.extend((0..input.damage).map(|_| Command::ApplyDamage));
        commands.extend(
            input
                .departed
                .iter()
                .map(|&obstacle| Command::DespawnObstacle { obstacle }),
        );
        commands.push(Command::Tick { dt: input.dt });
        self.apply_all(&mut commands, &mut events);

        let context = SpawnContext {
            spawning_enabled: query::spawning_enabled(&self.session),
            speed_multiplier: query::speed_multiplier(&self.session),
            world_speed: query::world_speed(&self.session),
        };
        self.systems.spawning.handle(&events, context, &mut commands);
        self.apply_all(&mut commands, &mut events);

        if input.pickup_contact {
            self.systems.finale.on_pickup_contact();
        }
        let observed = events.clone();
        self.systems.finale.handle(
            &observed,
            input.real_dt,
            input.player,
            &mut commands,
            &mut cues,
        );
        self.systems
            .completion
            .handle(&observed, input.real_dt, &mut commands, &mut cues);
        self.apply_all(&mut commands, &mut events);

        self.hand_off(&events);

        let activated = self.transition.update(input.real_dt, loader, &mut cues);
        if let Some(scene) = &activated {
            self.activate(scene, &mut events);
        }

        FrameOutput {
            events,
            cues,
            activated,
        }
    }

    fn apply_all(&mut self, commands: &mut Vec<Command>, events: &mut Vec<Event>) {
        for command in commands.drain(..) {
            world::apply(&mut self.session, command, events);
        }
    }

    fn hand_off(&mut self, events: &[Event]) {
        for event in events {
            if let Event::NextPartRequested {
                scene,
                lives,
                score,
            } = event
            {
                self.carryover.set_lives(*lives);
                self.carryover.set_score(*score);
                if !self.transition.load_scene_with_fade(scene.as_str()) {
                    debug!(%scene, "next part already requested");
                }
            }
        }
    }

    fn activate(&mut self, scene: &SceneName, events: &mut Vec<Event>) {
        let Some(setup) = self.catalog.get(scene).cloned() else {
            warn!(%scene, "loaded scene has no setup; keeping the current session");
            return;
        };

        let high_score = query::high_score(&self.session);
        self.session = Session::new(setup.session.clone(), high_score);
        self.systems = SceneSystems::new(&setup);
        world::start_new_session(&mut self.session, &mut self.carryover, events);
        self.active = scene.clone();
        info!(%scene, "scene activated");
    }

    /// Read-only access to the running session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Scene currently running.
    #[must_use]
    pub fn active_scene(&self) -> &SceneName {
        &self.active
    }

    /// Scene catalog the director was built with.
    #[must_use]
    pub fn catalog(&self) -> &SceneCatalog {
        &self.catalog
    }

    /// Values waiting to be consumed by the next scene.
    #[must_use]
    pub fn carryover(&self) -> &CarryoverStore {
        &self.carryover
    }

    /// Current stage of the finale cinematic.
    #[must_use]
    pub fn finale_stage(&self) -> FinaleStage {
        self.systems.finale.stage()
    }

    /// Current stage of the completion sequence.
    #[must_use]
    pub fn completion_stage(&self) -> CompletionStage {
        self.systems.completion.stage()
    }

    /// Current state of the scene transition.
    #[must_use]
    pub fn transition_phase(&self) -> TransitionPhase {
        self.transition.phase()
    }
}
