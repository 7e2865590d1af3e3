#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state management for Wings Runner.
//!
//! A [`Session`] owns score, lives, difficulty and the phase of the current
//! run. It is started with [`start_new_session`], mutated exclusively through
//! [`apply`], and observed through the [`query`] module.

mod clock;
mod hearts;
mod obstacles;

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};
use wings_runner_core::{Command, EndReason, Event, ObstacleId, Phase, SceneName, TargetRoute};
use wings_runner_system_carryover::CarryoverStore;

pub use clock::ClockConfig;
pub use obstacles::DamageGuard;

use clock::DifficultyClock;
use hearts::HeartDisplay;
use obstacles::{ContactOutcome, ObstacleRegistry};

const DEFAULT_BASE_SPEED: f32 = 5.0;
const DEFAULT_TARGET_SCORE: f32 = 3000.0;
const DEFAULT_FINALE_SLOW_FACTOR: f32 = 0.75;

/// Configuration parameters required to construct a session.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Score accrual and difficulty ramp parameters.
    pub clock: ClockConfig,
    /// World scroll speed at a multiplier of one.
    pub base_speed: f32,
    /// Lives granted when no carryover is present.
    pub starting_lives: u32,
    /// Number of heart slots available for display.
    pub heart_slots: u32,
    /// Score whose crossing ends normal play.
    pub target_score: f32,
    /// Whether the finale may run in this scene.
    pub finale_enabled: bool,
    /// Whether the finale pickup asset is available.
    pub finale_pickup_available: bool,
    /// Whether reaching the target without a finale stops the run.
    pub auto_stop_at_target: bool,
    /// Whether the completion path freezes the player as well as the world.
    pub freeze_player_on_finish: bool,
    /// Score to start from when no carryover is present.
    pub start_score_override: Option<f32>,
    /// Factor applied to world speed when the finale begins.
    pub finale_slow_factor: f32,
    /// Scene loaded once this part is finished.
    pub next_scene: Option<SceneName>,
    /// Whether finishing the part hands off to the next scene.
    pub auto_advance: bool,
    /// Window after a contact hit during which further contacts do no damage.
    pub hit_cooldown: Duration,
    /// Delay between an obstacle consuming its hit and its removal.
    pub obstacle_removal_grace: Duration,
    /// Duration of the camera shake requested on a hit.
    pub shake_duration: Duration,
    /// Magnitude of the camera shake requested on a hit.
    pub shake_magnitude: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clock: ClockConfig::default(),
            base_speed: DEFAULT_BASE_SPEED,
            starting_lives: 3,
            heart_slots: 3,
            target_score: DEFAULT_TARGET_SCORE,
            finale_enabled: true,
            finale_pickup_available: true,
            auto_stop_at_target: true,
            freeze_player_on_finish: true,
            start_score_override: None,
            finale_slow_factor: DEFAULT_FINALE_SLOW_FACTOR,
            next_scene: None,
            auto_advance: true,
            hit_cooldown: Duration::from_millis(350),
            obstacle_removal_grace: Duration::from_millis(400),
            shake_duration: Duration::from_millis(150),
            shake_magnitude: 0.15,
        }
    }
}

impl Config {
    /// Checks that every numeric parameter is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let numbers = [
            ("score_rate", self.clock.score_rate),
            ("ramp_increment", self.clock.ramp_increment),
            ("base_speed", self.base_speed),
            ("target_score", self.target_score),
            ("shake_magnitude", self.shake_magnitude),
            (
                "start_score_override",
                self.start_score_override.unwrap_or(0.0),
            ),
        ];
        for (field, value) in numbers {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidNumber { field, value });
            }
        }
        if !(0.0..=1.0).contains(&self.finale_slow_factor) {
            return Err(ConfigError::SlowFactorOutOfRange(self.finale_slow_factor));
        }
        Ok(())
    }

    /// Path taken once the score target is crossed.
    #[must_use]
    pub fn target_route(&self) -> TargetRoute {
        if self.finale_enabled && self.finale_pickup_available {
            TargetRoute::Finale
        } else if self.auto_stop_at_target {
            TargetRoute::Completion
        } else {
            TargetRoute::Continue
        }
    }

    fn lives_ceiling(&self, lives: u32) -> u32 {
        if self.heart_slots > 0 {
            self.heart_slots
        } else {
            lives
        }
    }
}

/// Errors reported when validating a session configuration.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A numeric parameter was negative, infinite or NaN.
    #[error("`{field}` must be a finite, non-negative number (got {value})")]
    InvalidNumber {
        /// Name of the offending parameter.
        field: &'static str,
        /// Value that was rejected.
        value: f32,
    },
    /// The finale slow factor fell outside the unit interval.
    #[error("finale slow factor must lie within 0.0..=1.0 (got {0})")]
    SlowFactorOutOfRange(f32),
}

/// Represents the authoritative state of a single run.
#[derive(Debug)]
pub struct Session {
    config: Config,
    phase: Phase,
    score: f32,
    lives: u32,
    base_speed: f32,
    speed_multiplier: f32,
    clock: DifficultyClock,
    target_latched: bool,
    spawning_enabled: bool,
    end_reason: Option<EndReason>,
    high_score: f32,
    hearts: HeartDisplay,
    obstacles: ObstacleRegistry,
    invulnerable_for: Duration,
}

impl Session {
    /// Creates a session in its default playing state.
    ///
    /// Call [`start_new_session`] before ticking so carryover and overrides
    /// take effect.
    #[must_use]
    pub fn new(config: Config, high_score: f32) -> Self {
        let lives = config
            .starting_lives
            .min(config.lives_ceiling(config.starting_lives));
        Self {
            phase: Phase::Playing,
            score: 0.0,
            lives,
            base_speed: config.base_speed,
            speed_multiplier: 1.0,
            clock: DifficultyClock::new(config.clock),
            target_latched: false,
            spawning_enabled: true,
            end_reason: None,
            high_score: high_score.max(0.0),
            hearts: HeartDisplay::new(config.heart_slots),
            obstacles: ObstacleRegistry::new(config.obstacle_removal_grace),
            invulnerable_for: Duration::ZERO,
            config,
        }
    }

    fn set_phase(&mut self, to: Phase, out: &mut Vec<Event>) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        if to.cancels_flashes() {
            self.hearts.cancel_all(out);
        }
        info!(?from, ?to, "session phase changed");
        out.push(Event::PhaseChanged { from, to });
    }

    fn set_world_speed(&mut self, base_speed: f32, speed_multiplier: f32, out: &mut Vec<Event>) {
        if self.base_speed == base_speed && self.speed_multiplier == speed_multiplier {
            return;
        }
        self.base_speed = base_speed;
        self.speed_multiplier = speed_multiplier;
        out.push(Event::WorldSpeedChanged {
            speed: self.world_speed(),
        });
    }

    fn halt_spawning(&mut self, out: &mut Vec<Event>) {
        if self.spawning_enabled {
            self.spawning_enabled = false;
            out.push(Event::SpawningHalted);
        }
    }

    fn world_speed(&self) -> f32 {
        self.base_speed * self.speed_multiplier
    }

    fn apply_damage(&mut self, out: &mut Vec<Event>) {
        if !self.phase.accepts_damage() {
            debug!(phase = ?self.phase, "damage ignored outside play");
            return;
        }

        self.lives = self.lives.saturating_sub(1);
        out.push(Event::CameraShakeRequested {
            duration: self.config.shake_duration,
            magnitude: self.config.shake_magnitude,
        });

        let slot = self.hearts.slot(self.lives);
        if let Some(slot) = slot {
            self.hearts.start_flash(slot, out);
        }
        debug!(lives = self.lives, "player hit");
        out.push(Event::PlayerHit {
            slot,
            lives: self.lives,
        });

        if self.lives == 0 {
            self.game_over(out);
        }
    }

    fn game_over(&mut self, out: &mut Vec<Event>) {
        self.end_reason = Some(EndReason::GameOver);
        self.set_phase(Phase::Ended, out);
        self.halt_spawning(out);
        self.set_world_speed(0.0, 0.0, out);
        info!(score = self.score, "game over");
        out.push(Event::GameOver);
    }

    fn report_contact(&mut self, obstacle: ObstacleId, out: &mut Vec<Event>) {
        if self.phase != Phase::Playing {
            return;
        }
        if self.obstacles.contact(obstacle) == ContactOutcome::Ignored {
            return;
        }
        out.push(Event::ObstacleConsumed { obstacle });

        if !self.invulnerable_for.is_zero() {
            debug!(obstacle = obstacle.get(), "contact inside hit cooldown");
            return;
        }
        self.invulnerable_for = self.config.hit_cooldown;
        self.apply_damage(out);
    }

    fn tick(&mut self, dt: Duration, out: &mut Vec<Event>) {
        if self.phase == Phase::FinaleCinematic {
            return;
        }
        out.push(Event::TimeAdvanced { dt });

        self.invulnerable_for = self.invulnerable_for.saturating_sub(dt);
        self.hearts.advance(dt, out);

        let mut removed = Vec::new();
        self.obstacles.advance(dt, &mut removed);
        out.extend(
            removed
                .into_iter()
                .map(|obstacle| Event::ObstacleRemoved { obstacle }),
        );

        if self.phase != Phase::Playing {
            return;
        }

        let step = self.clock.advance(dt, &mut self.speed_multiplier);
        self.score += step.score_gained;
        out.push(Event::ScoreAdvanced { score: self.score });
        if step.ramped {
            debug!(multiplier = self.speed_multiplier, "difficulty increased");
            out.push(Event::DifficultyIncreased {
                speed_multiplier: self.speed_multiplier,
            });
            out.push(Event::WorldSpeedChanged {
                speed: self.world_speed(),
            });
        }

        if self.score > self.high_score {
            self.high_score = self.score;
            out.push(Event::HighScoreImproved { score: self.score });
        }

        self.check_target(out);
    }

    fn check_target(&mut self, out: &mut Vec<Event>) {
        if self.target_latched || self.score < self.config.target_score {
            return;
        }
        self.target_latched = true;

        if self.config.finale_enabled && !self.config.finale_pickup_available {
            warn!("finale enabled without a pickup asset; finale disabled for this scene");
        }

        let route = self.config.target_route();
        info!(score = self.score, ?route, "score target reached");
        out.push(Event::TargetReached {
            score: self.score,
            route,
        });

        match route {
            TargetRoute::Finale => {
                self.set_phase(Phase::FinaleTriggered, out);
                let factor = self.config.finale_slow_factor;
                self.set_world_speed(
                    self.base_speed * factor,
                    self.speed_multiplier * factor,
                    out,
                );
            }
            TargetRoute::Completion => self.finish(out),
            TargetRoute::Continue => {}
        }
    }

    fn finish(&mut self, out: &mut Vec<Event>) {
        self.end_reason = Some(EndReason::TargetReached);
        let phase = if self.config.freeze_player_on_finish {
            Phase::FinaleCinematic
        } else {
            Phase::Ended
        };
        self.set_phase(phase, out);
        self.halt_spawning(out);
        self.set_world_speed(0.0, 0.0, out);
        self.obstacles.disarm_all();
    }

    fn force_final_freeze(&mut self, out: &mut Vec<Event>) {
        self.target_latched = true;
        self.halt_spawning(out);
        self.set_world_speed(0.0, 0.0, out);
        self.set_phase(Phase::FinaleCinematic, out);
    }

    fn advance_to_next_part(&self, out: &mut Vec<Event>) {
        if !self.config.auto_advance {
            debug!("auto advance disabled; staying in scene");
            return;
        }
        let Some(scene) = self.config.next_scene.clone() else {
            debug!("no next scene configured");
            return;
        };
        info!(%scene, lives = self.lives, score = self.score, "advancing to next part");
        out.push(Event::NextPartRequested {
            scene,
            lives: self.lives,
            score: self.score,
        });
    }
}

/// Resets the session for a new run, consuming any carried-over values.
pub fn start_new_session(
    session: &mut Session,
    carryover: &mut CarryoverStore,
    out: &mut Vec<Event>,
) {
    let config = &session.config;

    let score = carryover
        .try_consume_score()
        .or(config.start_score_override)
        .unwrap_or(0.0)
        .max(0.0);
    let lives = carryover
        .try_consume_lives()
        .unwrap_or(config.starting_lives);
    let lives = lives.min(config.lives_ceiling(lives));

    session.hearts.cancel_all(out);
    session.hearts = HeartDisplay::new(config.heart_slots);
    for obstacle in session.obstacles.clear() {
        out.push(Event::ObstacleRemoved { obstacle });
    }

    session.score = score;
    session.lives = lives;
    session.base_speed = config.base_speed;
    session.speed_multiplier = 1.0;
    session.clock.reset();
    session.phase = Phase::Playing;
    session.target_latched = false;
    session.spawning_enabled = true;
    session.end_reason = None;
    session.invulnerable_for = Duration::ZERO;

    if config.heart_slots == 0 {
        warn!("no heart slots configured; lives display hidden");
    }
    info!(score, lives, "session started");
    out.push(Event::SessionStarted {
        score,
        lives,
        heart_slots: session.hearts.slots(),
        high_score: session.high_score,
    });
    out.push(Event::WorldSpeedChanged {
        speed: session.world_speed(),
    });
}

/// Applies the provided command to the session, mutating state deterministically.
pub fn apply(session: &mut Session, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => session.tick(dt, out_events),
        Command::ApplyDamage => session.apply_damage(out_events),
        Command::ReportContact { obstacle } => session.report_contact(obstacle, out_events),
        Command::SpawnObstacle { altitude } => {
            if !session.spawning_enabled {
                debug!("spawn request ignored while spawning is halted");
                return;
            }
            let obstacle = session.obstacles.spawn(altitude);
            out_events.push(Event::ObstacleSpawned { obstacle, altitude });
        }
        Command::DespawnObstacle { obstacle } => {
            if session.obstacles.remove(obstacle) {
                out_events.push(Event::ObstacleRemoved { obstacle });
            }
        }
        Command::ClearObstacles => {
            for obstacle in session.obstacles.clear() {
                out_events.push(Event::ObstacleRemoved { obstacle });
            }
            session.halt_spawning(out_events);
        }
        Command::ForceFinalFreeze => session.force_final_freeze(out_events),
        Command::AdvanceToNextPart => session.advance_to_next_part(out_events),
    }
}

/// Query functions that provide read-only access to the session state.
pub mod query {
    use std::time::Duration;

    use super::{Config, Session};
    use wings_runner_core::{EndReason, HeartSlot, HeartState, ObstacleId, Phase};

    /// Current phase of the session.
    #[must_use]
    pub fn phase(session: &Session) -> Phase {
        session.phase
    }

    /// Current score.
    #[must_use]
    pub fn score(session: &Session) -> f32 {
        session.score
    }

    /// Best score recorded, including the current run.
    #[must_use]
    pub fn high_score(session: &Session) -> f32 {
        session.high_score
    }

    /// Lives remaining.
    #[must_use]
    pub fn lives(session: &Session) -> u32 {
        session.lives
    }

    /// Current speed multiplier.
    #[must_use]
    pub fn speed_multiplier(session: &Session) -> f32 {
        session.speed_multiplier
    }

    /// Current base speed.
    #[must_use]
    pub fn base_speed(session: &Session) -> f32 {
        session.base_speed
    }

    /// Effective world scroll speed.
    #[must_use]
    pub fn world_speed(session: &Session) -> f32 {
        session.world_speed()
    }

    /// Gameplay time accumulated toward the next difficulty step.
    #[must_use]
    pub fn difficulty_timer(session: &Session) -> Duration {
        session.clock.timer()
    }

    /// Whether the score target has already fired.
    #[must_use]
    pub fn target_latched(session: &Session) -> bool {
        session.target_latched
    }

    /// Whether obstacle spawning is still allowed.
    #[must_use]
    pub fn spawning_enabled(session: &Session) -> bool {
        session.spawning_enabled
    }

    /// Why the run ended, if it has.
    #[must_use]
    pub fn end_reason(session: &Session) -> Option<EndReason> {
        session.end_reason
    }

    /// Configuration the session was built from.
    #[must_use]
    pub fn config(session: &Session) -> &Config {
        &session.config
    }

    /// Display state of every heart slot.
    #[must_use]
    pub fn hearts(session: &Session) -> Vec<HeartState> {
        session.hearts.states(session.lives)
    }

    /// Whether the slot is mid-flash.
    #[must_use]
    pub fn heart_is_flashing(session: &Session, slot: HeartSlot) -> bool {
        session.hearts.is_flashing(slot)
    }

    /// Number of obstacles currently in the world.
    #[must_use]
    pub fn obstacle_count(session: &Session) -> usize {
        session.obstacles.len()
    }

    /// Snapshot of a single obstacle.
    #[must_use]
    pub fn obstacle(session: &Session, id: ObstacleId) -> Option<ObstacleSnapshot> {
        session
            .obstacles
            .get(id)
            .map(|state| ObstacleSnapshot {
                id,
                altitude: state.altitude,
                consumed: state.guard.is_consumed(),
            })
    }

    /// Snapshots of all obstacles in ascending identifier order.
    #[must_use]
    pub fn obstacles(session: &Session) -> Vec<ObstacleSnapshot> {
        session
            .obstacles
            .iter()
            .map(|(id, state)| ObstacleSnapshot {
                id,
                altitude: state.altitude,
                consumed: state.guard.is_consumed(),
            })
            .collect()
    }

    /// Immutable representation of an obstacle used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ObstacleSnapshot {
        /// Identifier assigned to the obstacle.
        pub id: ObstacleId,
        /// Vertical position of the obstacle.
        pub altitude: f32,
        /// Whether the obstacle has already used its single hit.
        pub consumed: bool,
    }
}
