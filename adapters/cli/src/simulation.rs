//! Crude stand-in for engine physics.
//!
//! Obstacles enter at the right edge and scroll left at the world speed while
//! the player holds x = 0 and drifts between altitudes. Overlaps are reported
//! on every step for as long as they last, the way physics callbacks repeat.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use wings_runner_core::{ObstacleId, PlayerFrame, SceneName, WorldPoint};
use wings_runner_presentation::{SpriteSurface, WorldSurface};
use wings_runner_system_scene_transition::{LoadProgress, SceneLoadError, SceneLoader};

const SPAWN_X: f32 = 12.0;
const DEPART_X: f32 = -20.0;
/// Largest centre distance per axis at which two bodies touch.
const CONTACT_REACH: Vec2 = Vec2::new(1.0, 1.0);
const CLIMB_RATE: f32 = 4.0;
const FALL_RATE: f32 = 6.0;
const FLOOR: f32 = -10.0;
const CRUISE_ALTITUDE: (f32, f32) = (-1.5, 4.5);
const LOOKAHEAD: f32 = 6.0;
const DODGE: f32 = 2.0;

/// Scrolling world: obstacle bodies, the pickup and the scroll speed.
#[derive(Debug, Default)]
pub(crate) struct Playfield {
    obstacles: BTreeMap<ObstacleId, Vec2>,
    pickup: Option<Vec2>,
    scroll_speed: f32,
    world_alpha: f32,
}

impl Playfield {
    /// Number of obstacle bodies currently in the world.
    pub(crate) fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }
}

impl WorldSurface for Playfield {
    fn spawn_obstacle(&mut self, obstacle: ObstacleId, altitude: f32) {
        let _ = self
            .obstacles
            .insert(obstacle, Vec2::new(SPAWN_X, altitude));
    }

    fn remove_obstacle(&mut self, obstacle: ObstacleId) {
        let _ = self.obstacles.remove(&obstacle);
    }

    fn set_scroll_speed(&mut self, speed: f32) {
        debug!(speed, "scroll speed");
        self.scroll_speed = speed;
    }

    fn show_pickup(&mut self, position: Vec2) {
        info!(x = position.x, y = position.y, "pickup placed");
        self.pickup = Some(position);
    }

    fn hide_pickup(&mut self) {
        self.pickup = None;
    }

    fn remove_pickup(&mut self) {
        debug!("pickup removed");
        self.pickup = None;
    }

    fn set_world_alpha(&mut self, alpha: f32) {
        if alpha != self.world_alpha {
            debug!(alpha, "world alpha");
        }
        self.world_alpha = alpha;
    }
}

/// Player body steered by a simple autopilot.
#[derive(Debug)]
pub(crate) struct PlayerBody {
    position: Vec2,
    target_altitude: f32,
    retarget_in: f32,
    frozen: bool,
    falling: bool,
    rng: ChaCha8Rng,
}

impl PlayerBody {
    /// Creates a player at the origin whose wandering is seeded by `seed`.
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            position: Vec2::ZERO,
            target_altitude: 0.0,
            retarget_in: 0.0,
            frozen: false,
            falling: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn advance(&mut self, dt: f32, field: &Playfield) {
        if self.falling {
            self.position.y = (self.position.y - FALL_RATE * dt).max(FLOOR);
            return;
        }
        if self.frozen {
            return;
        }

        if let Some(pickup) = field.pickup {
            self.target_altitude = pickup.y;
        } else {
            self.retarget_in -= dt;
            if self.retarget_in <= 0.0 {
                self.retarget_in = self.rng.gen_range(0.4..=1.2);
                self.target_altitude = self
                    .rng
                    .gen_range(CRUISE_ALTITUDE.0..=CRUISE_ALTITUDE.1);
            }
            self.dodge(field);
        }

        let gap = self.target_altitude - self.position.y;
        let climb = CLIMB_RATE * dt;
        self.position.y += gap.clamp(-climb, climb);
    }

    fn dodge(&mut self, field: &Playfield) {
        let threat = field
            .obstacles
            .values()
            .filter(|obstacle| obstacle.x > 0.0 && obstacle.x < LOOKAHEAD)
            .find(|obstacle| (obstacle.y - self.target_altitude).abs() < CONTACT_REACH.y * 1.5);
        if let Some(obstacle) = threat {
            let middle = (CRUISE_ALTITUDE.0 + CRUISE_ALTITUDE.1) / 2.0;
            let away = if obstacle.y > middle { -DODGE } else { DODGE };
            self.target_altitude =
                (obstacle.y + away).clamp(CRUISE_ALTITUDE.0, CRUISE_ALTITUDE.1);
        }
    }
}

impl SpriteSurface for PlayerBody {
    fn show_frame(&mut self, frame: PlayerFrame) {
        info!(?frame, "player frame");
    }

    fn set_airborne(&mut self, airborne: bool) {
        debug!(airborne, "player pose");
    }

    fn freeze(&mut self) {
        self.frozen = true;
    }

    fn unfreeze(&mut self) {
        self.frozen = false;
        self.falling = false;
    }

    fn start_loop_animation(&mut self) {
        info!("wings loop started");
    }

    fn play_hurt_flash(&mut self) {
        debug!(y = self.position.y, "player hurt");
    }

    fn begin_death_fall(&mut self) {
        info!("player falls");
        self.falling = true;
    }
}

/// Contacts and departures observed during one step.
#[derive(Debug, Default)]
pub(crate) struct StepReport {
    /// Obstacles overlapping the player.
    pub(crate) contacts: Vec<ObstacleId>,
    /// Obstacles that scrolled past the left edge.
    pub(crate) departed: Vec<ObstacleId>,
    /// Whether the player overlaps the pickup.
    pub(crate) pickup_contact: bool,
    /// Player position after the step.
    pub(crate) player: WorldPoint,
}

/// Moves every body by `dt` seconds and reports the resulting overlaps.
pub(crate) fn step(field: &mut Playfield, body: &mut PlayerBody, dt: f32) -> StepReport {
    let travel = field.scroll_speed * dt;
    for position in field.obstacles.values_mut() {
        position.x -= travel;
    }
    if let Some(pickup) = &mut field.pickup {
        pickup.x -= travel;
    }
    body.advance(dt, field);

    let mut report = StepReport {
        player: WorldPoint::new(body.position.x, body.position.y),
        ..StepReport::default()
    };
    for (&obstacle, &position) in &field.obstacles {
        if position.x < DEPART_X {
            report.departed.push(obstacle);
        } else if touches(position, body.position) {
            report.contacts.push(obstacle);
        }
    }
    report.pickup_contact = field
        .pickup
        .is_some_and(|pickup| touches(pickup, body.position));
    report
}

fn touches(a: Vec2, b: Vec2) -> bool {
    let gap = (a - b).abs();
    gap.x < CONTACT_REACH.x && gap.y < CONTACT_REACH.y
}

/// Loader that knows a fixed set of scenes and spends a number of polls on
/// each load.
#[derive(Debug)]
pub(crate) struct FrameLatencyLoader {
    known: Vec<SceneName>,
    latency: u32,
    remaining: Option<u32>,
    loads: u32,
}

impl FrameLatencyLoader {
    /// Creates a loader for `known` scenes.
    pub(crate) fn new(known: impl IntoIterator<Item = SceneName>, latency: u32) -> Self {
        Self {
            known: known.into_iter().collect(),
            latency,
            remaining: None,
            loads: 0,
        }
    }

    /// Number of loads started so far.
    pub(crate) fn loads(&self) -> u32 {
        self.loads
    }
}

impl SceneLoader for FrameLatencyLoader {
    fn begin_load(&mut self, scene: &SceneName) -> Result<(), SceneLoadError> {
        if !self.known.contains(scene) {
            return Err(SceneLoadError::UnknownScene {
                scene: scene.clone(),
            });
        }
        info!(%scene, latency = self.latency, "loading scene");
        self.remaining = Some(self.latency);
        self.loads += 1;
        Ok(())
    }

    fn poll(&mut self) -> LoadProgress {
        match self.remaining {
            Some(0) | None => {
                self.remaining = None;
                LoadProgress::Ready
            }
            Some(left) => {
                self.remaining = Some(left - 1);
                LoadProgress::Pending
            }
        }
    }
}
