#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Presentation contracts for Wings Runner adapters.
//!
//! Engines implement the surface traits; the [`Presenter`] translates the
//! events and cues produced by a frame into calls on those surfaces.

use std::time::Duration;

use anyhow::Result as AnyResult;
use glam::Vec2;
use tracing::{debug, warn};
use wings_runner_core::{
    Cue, Event, HeartSlot, HeartState, HeartTint, ObstacleId, PlayerFrame, TextSlot, WorldPoint,
};

/// RGBA color used when tinting interface elements.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque red.
    pub const RED: Self = Self::new(1.0, 0.0, 0.0, 1.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Player sprite and animation collaborator.
pub trait SpriteSurface {
    /// Shows a specific frame, overriding the run cycle.
    fn show_frame(&mut self, frame: PlayerFrame);
    /// Switches between the airborne and grounded pose.
    fn set_airborne(&mut self, airborne: bool);
    /// Stops all animation and movement.
    fn freeze(&mut self);
    /// Resumes animation and movement.
    fn unfreeze(&mut self);
    /// Starts the looping wings animation.
    fn start_loop_animation(&mut self);
    /// Plays the short hurt flash on the player.
    fn play_hurt_flash(&mut self);
    /// Hands the player to an uncontrolled fall.
    fn begin_death_fall(&mut self);
}

/// Scrolling world collaborator: obstacles, the finale pickup and parallax.
pub trait WorldSurface {
    /// Creates the visual and physical entity for an obstacle.
    fn spawn_obstacle(&mut self, obstacle: ObstacleId, altitude: f32);
    /// Destroys an obstacle entity.
    fn remove_obstacle(&mut self, obstacle: ObstacleId);
    /// Sets the scroll speed of the world and its parallax layers.
    fn set_scroll_speed(&mut self, speed: f32);
    /// Places the finale pickup.
    fn show_pickup(&mut self, position: Vec2);
    /// Hides the finale pickup and disables its contact.
    fn hide_pickup(&mut self);
    /// Destroys the finale pickup.
    fn remove_pickup(&mut self);
    /// Scales the alpha of the player and obstacle sprites.
    fn set_world_alpha(&mut self, alpha: f32);
}

/// Camera and effects collaborator.
pub trait EffectsSurface {
    /// Shakes the camera.
    fn shake(&mut self, duration: Duration, magnitude: f32);
    /// Plays a particle burst.
    fn spawn_particle_burst(&mut self, position: Vec2);
    /// Flashes the whole screen.
    fn screen_flash(&mut self, peak_alpha: f32, fade_in: Duration, fade_out: Duration);
}

/// Interface collaborator.
pub trait UiSurface {
    /// Replaces the heart row.
    fn set_hearts(&mut self, hearts: &[HeartState]);
    /// Tints a single heart.
    fn set_heart_tint(&mut self, slot: HeartSlot, color: Color);
    /// Updates the score label.
    fn set_score(&mut self, score: u32);
    /// Updates the high-score label.
    fn set_high_score(&mut self, score: u32);
    /// Sets the alpha of an on-screen message.
    fn set_text_alpha(&mut self, text: TextSlot, alpha: f32);
    /// Sets the alpha of the transition overlay.
    fn set_overlay_alpha(&mut self, alpha: f32);
}

/// Persistent store for the single high-score value.
pub trait HighScoreStore {
    /// Reads the stored high score, zero when nothing was stored yet.
    fn load(&mut self) -> AnyResult<f32>;
    /// Persists a new high score.
    fn save(&mut self, score: f32) -> AnyResult<()>;
}

/// Borrowed set of collaborators a frame is presented to.
pub struct Surfaces<'a> {
    /// Player sprite.
    pub sprite: &'a mut dyn SpriteSurface,
    /// Scrolling world.
    pub world: &'a mut dyn WorldSurface,
    /// Camera and effects.
    pub effects: &'a mut dyn EffectsSurface,
    /// Interface.
    pub ui: &'a mut dyn UiSurface,
    /// High-score persistence.
    pub store: &'a mut dyn HighScoreStore,
}

/// Translates session events and sequencer cues into collaborator calls.
#[derive(Clone, Debug)]
pub struct Presenter {
    heart_color: Color,
    heart_slots: u32,
}

impl Presenter {
    /// Creates a presenter whose hearts return to `heart_color` after a flash.
    #[must_use]
    pub const fn new(heart_color: Color) -> Self {
        Self {
            heart_color,
            heart_slots: 0,
        }
    }

    /// Color shown for a heart tint.
    #[must_use]
    pub fn tint_color(&self, tint: HeartTint) -> Color {
        match tint {
            HeartTint::Normal => self.heart_color,
            HeartTint::White => Color::WHITE,
            HeartTint::Red => Color::RED,
        }
    }

    /// Presents one frame worth of events followed by its cues.
    pub fn present(&mut self, events: &[Event], cues: &[Cue], surfaces: &mut Surfaces<'_>) {
        for event in events {
            self.present_event(event, surfaces);
        }
        for cue in cues {
            present_cue(cue, surfaces);
        }
    }

    fn hearts(&self, lives: u32) -> Vec<HeartState> {
        (0..self.heart_slots)
            .map(|slot| {
                if slot < lives {
                    HeartState::Full
                } else {
                    HeartState::Empty
                }
            })
            .collect()
    }

    fn present_event(&mut self, event: &Event, surfaces: &mut Surfaces<'_>) {
        match event {
            Event::SessionStarted {
                score,
                lives,
                heart_slots,
                high_score,
            } => {
                self.heart_slots = *heart_slots;
                surfaces.ui.set_hearts(&self.hearts(*lives));
                surfaces.ui.set_score(label(*score));
                surfaces.ui.set_high_score(label(*high_score));
                surfaces.ui.set_text_alpha(TextSlot::Wings, 0.0);
                surfaces.ui.set_text_alpha(TextSlot::Completion, 0.0);
                surfaces.world.set_world_alpha(1.0);
                surfaces.sprite.unfreeze();
            }
            Event::ScoreAdvanced { score } => surfaces.ui.set_score(label(*score)),
            Event::HighScoreImproved { score } => {
                surfaces.ui.set_high_score(label(*score));
                if let Err(error) = surfaces.store.save(*score) {
                    warn!(%error, "failed to persist high score");
                }
            }
            Event::PlayerHit { lives, .. } => {
                surfaces.ui.set_hearts(&self.hearts(*lives));
                surfaces.sprite.play_hurt_flash();
            }
            Event::CameraShakeRequested {
                duration,
                magnitude,
            } => surfaces.effects.shake(*duration, *magnitude),
            Event::HeartTintChanged { slot, tint } => {
                surfaces.ui.set_heart_tint(*slot, self.tint_color(*tint));
            }
            Event::GameOver => surfaces.sprite.begin_death_fall(),
            Event::WorldSpeedChanged { speed } => surfaces.world.set_scroll_speed(*speed),
            Event::ObstacleSpawned { obstacle, altitude } => {
                surfaces.world.spawn_obstacle(*obstacle, *altitude);
            }
            Event::ObstacleRemoved { obstacle } => surfaces.world.remove_obstacle(*obstacle),
            Event::PhaseChanged { from, to } => debug!(?from, ?to, "phase presented"),
            Event::TimeAdvanced { .. }
            | Event::DifficultyIncreased { .. }
            | Event::TargetReached { .. }
            | Event::SpawningHalted
            | Event::ObstacleConsumed { .. }
            | Event::NextPartRequested { .. } => {}
        }
    }
}

fn present_cue(cue: &Cue, surfaces: &mut Surfaces<'_>) {
    match cue {
        Cue::PlayerFrame(frame) => surfaces.sprite.show_frame(*frame),
        Cue::FreezePlayer => surfaces.sprite.freeze(),
        Cue::PlayerAirborne(airborne) => surfaces.sprite.set_airborne(*airborne),
        Cue::StartWingsLoop => surfaces.sprite.start_loop_animation(),
        Cue::SpawnPickup { position } => surfaces.world.show_pickup(to_vec2(*position)),
        Cue::HidePickup => surfaces.world.hide_pickup(),
        Cue::RemovePickup => surfaces.world.remove_pickup(),
        Cue::ParticleBurst { position } => {
            surfaces.effects.spawn_particle_burst(to_vec2(*position));
        }
        Cue::ScreenFlash {
            peak_alpha,
            fade_in,
            fade_out,
        } => surfaces
            .effects
            .screen_flash(*peak_alpha, *fade_in, *fade_out),
        Cue::TextAlpha { text, alpha } => surfaces.ui.set_text_alpha(*text, *alpha),
        Cue::WorldAlpha { alpha } => surfaces.world.set_world_alpha(*alpha),
        Cue::OverlayAlpha { alpha } => surfaces.ui.set_overlay_alpha(*alpha),
    }
}

/// Converts a world-space point into a glam vector.
#[must_use]
pub fn to_vec2(point: WorldPoint) -> Vec2 {
    Vec2::new(point.x, point.y)
}

/// Score shown on labels: whole points, never negative.
fn label(score: f32) -> u32 {
    score.max(0.0).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        hearts: Vec<HeartState>,
        tints: Vec<(HeartSlot, Color)>,
        high_score: u32,
    }

    impl SpriteSurface for Recorder {
        fn show_frame(&mut self, frame: PlayerFrame) {
            self.calls.push(format!("frame {frame:?}"));
        }
        fn set_airborne(&mut self, airborne: bool) {
            self.calls.push(format!("airborne {airborne}"));
        }
        fn freeze(&mut self) {
            self.calls.push("freeze".to_owned());
        }
        fn unfreeze(&mut self) {
            self.calls.push("unfreeze".to_owned());
        }
        fn start_loop_animation(&mut self) {
            self.calls.push("loop".to_owned());
        }
        fn play_hurt_flash(&mut self) {
            self.calls.push("hurt".to_owned());
        }
        fn begin_death_fall(&mut self) {
            self.calls.push("fall".to_owned());
        }
    }

    impl WorldSurface for Recorder {
        fn spawn_obstacle(&mut self, obstacle: ObstacleId, _altitude: f32) {
            self.calls.push(format!("spawn {}", obstacle.get()));
        }
        fn remove_obstacle(&mut self, obstacle: ObstacleId) {
            self.calls.push(format!("remove {}", obstacle.get()));
        }
        fn set_scroll_speed(&mut self, speed: f32) {
            self.calls.push(format!("speed {speed}"));
        }
        fn show_pickup(&mut self, position: Vec2) {
            self.calls.push(format!("pickup {} {}", position.x, position.y));
        }
        fn hide_pickup(&mut self) {
            self.calls.push("hide pickup".to_owned());
        }
        fn remove_pickup(&mut self) {
            self.calls.push("remove pickup".to_owned());
        }
        fn set_world_alpha(&mut self, alpha: f32) {
            self.calls.push(format!("world alpha {alpha}"));
        }
    }

    impl EffectsSurface for Recorder {
        fn shake(&mut self, _duration: Duration, _magnitude: f32) {
            self.calls.push("shake".to_owned());
        }
        fn spawn_particle_burst(&mut self, _position: Vec2) {
            self.calls.push("burst".to_owned());
        }
        fn screen_flash(&mut self, _peak_alpha: f32, _fade_in: Duration, _fade_out: Duration) {
            self.calls.push("flash".to_owned());
        }
    }

    impl UiSurface for Recorder {
        fn set_hearts(&mut self, hearts: &[HeartState]) {
            self.hearts = hearts.to_vec();
        }
        fn set_heart_tint(&mut self, slot: HeartSlot, color: Color) {
            self.tints.push((slot, color));
        }
        fn set_score(&mut self, _score: u32) {}
        fn set_high_score(&mut self, score: u32) {
            self.high_score = score;
        }
        fn set_text_alpha(&mut self, _text: TextSlot, _alpha: f32) {}
        fn set_overlay_alpha(&mut self, _alpha: f32) {}
    }

    struct FailingStore;

    impl HighScoreStore for FailingStore {
        fn load(&mut self) -> AnyResult<f32> {
            Ok(0.0)
        }
        fn save(&mut self, _score: f32) -> AnyResult<()> {
            bail!("disk full")
        }
    }

    fn present(presenter: &mut Presenter, events: &[Event], cues: &[Cue]) -> Recorder {
        let mut sprite = Recorder::default();
        let mut world = Recorder::default();
        let mut effects = Recorder::default();
        let mut ui = Recorder::default();
        let mut store = FailingStore;
        let mut surfaces = Surfaces {
            sprite: &mut sprite,
            world: &mut world,
            effects: &mut effects,
            ui: &mut ui,
            store: &mut store,
        };
        presenter.present(events, cues, &mut surfaces);
        ui.calls.extend(sprite.calls);
        ui.calls.extend(world.calls);
        ui.calls.extend(effects.calls);
        ui
    }

    #[test]
    fn hit_updates_hearts_and_tints() {
        let heart = Color::from_rgb_u8(0xe5, 0x39, 0x35);
        let mut presenter = Presenter::new(heart);
        let recorder = present(
            &mut presenter,
            &[
                Event::SessionStarted {
                    score: 0.0,
                    lives: 3,
                    heart_slots: 3,
                    high_score: 10.0,
                },
                Event::PlayerHit {
                    slot: Some(HeartSlot::new(2)),
                    lives: 2,
                },
                Event::HeartTintChanged {
                    slot: HeartSlot::new(2),
                    tint: HeartTint::White,
                },
                Event::HeartTintChanged {
                    slot: HeartSlot::new(2),
                    tint: HeartTint::Normal,
                },
            ],
            &[],
        );

        assert_eq!(
            recorder.hearts,
            vec![HeartState::Full, HeartState::Full, HeartState::Empty]
        );
        assert_eq!(
            recorder.tints,
            vec![
                (HeartSlot::new(2), Color::WHITE),
                (HeartSlot::new(2), heart)
            ]
        );
        assert!(recorder.calls.contains(&"hurt".to_owned()));
    }

    #[test]
    fn store_failures_do_not_interrupt_presentation() {
        let mut presenter = Presenter::new(Color::RED);
        let recorder = present(
            &mut presenter,
            &[Event::HighScoreImproved { score: 42.7 }, Event::GameOver],
            &[],
        );
        assert_eq!(recorder.high_score, 42);
        assert!(recorder.calls.contains(&"fall".to_owned()));
    }

    #[test]
    fn cues_reach_their_surfaces() {
        let mut presenter = Presenter::new(Color::RED);
        let recorder = present(
            &mut presenter,
            &[],
            &[
                Cue::FreezePlayer,
                Cue::PlayerFrame(PlayerFrame::Drink1),
                Cue::SpawnPickup {
                    position: WorldPoint::new(5.5, -0.3),
                },
                Cue::HidePickup,
                Cue::StartWingsLoop,
                Cue::ParticleBurst {
                    position: WorldPoint::default(),
                },
                Cue::RemovePickup,
            ],
        );
        assert_eq!(
            recorder.calls,
            vec![
                "freeze".to_owned(),
                "frame Drink1".to_owned(),
                "loop".to_owned(),
                "pickup 5.5 -0.3".to_owned(),
                "hide pickup".to_owned(),
                "remove pickup".to_owned(),
                "burst".to_owned(),
            ]
        );
    }

    #[test]
    fn labels_floor_and_clamp() {
        assert_eq!(label(12.9), 12);
        assert_eq!(label(-3.0), 0);
    }
}
