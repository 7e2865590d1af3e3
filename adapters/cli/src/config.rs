//! TOML game configuration.
//!
//! Every table and field is optional. Missing values fall back to the library
//! defaults, and an empty `scenes` list describes the standard two-part run:
//! `Part1` ends with the finale and hands off to `Part2`, which stops at its
//! target through the completion sequence.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::warn;
use wings_runner_core::{SceneName, WorldPoint};
use wings_runner_presentation::Color;
use wings_runner_system_completion::{CompletionText, Config as CompletionConfig};
use wings_runner_system_director::{SceneCatalog, SceneSetup};
use wings_runner_system_finale::{Config as FinaleConfig, FlashTimings, TextTimings};
use wings_runner_system_scene_transition::Config as TransitionConfig;
use wings_runner_system_spawning::Config as SpawnConfig;
use wings_runner_world::{ClockConfig, Config as SessionConfig};

/// Fully resolved configuration for a run.
#[derive(Clone, Debug)]
pub(crate) struct GameConfig {
    /// Scene the run starts in.
    pub(crate) start_scene: SceneName,
    /// Validated scene setups.
    pub(crate) catalog: SceneCatalog,
    /// Fade timings used between scenes.
    pub(crate) transition: TransitionConfig,
    /// Frames the loader spends on each scene load.
    pub(crate) load_latency_frames: u32,
    /// Resting color of the heart row.
    pub(crate) heart_color: Color,
}

/// Reads and resolves the configuration at `path`, or the defaults when no
/// path is given.
pub(crate) fn load(path: Option<&Path>, seed: u64) -> Result<GameConfig> {
    let Some(path) = path else {
        return parse("", seed);
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read game configuration at {}", path.display()))?;
    parse(&contents, seed).with_context(|| format!("invalid game configuration {}", path.display()))
}

/// Resolves a configuration from TOML source.
///
/// Scenes without an explicit spawner seed derive one from `seed` and their
/// position in the file.
pub(crate) fn parse(contents: &str, seed: u64) -> Result<GameConfig> {
    let raw: TomlConfig =
        toml::from_str(contents).context("failed to parse game configuration toml contents")?;

    let scenes = if raw.scenes.is_empty() {
        default_scenes()
    } else {
        raw.scenes
    };

    let mut catalog = SceneCatalog::new();
    let mut first = None;
    for (index, scene) in scenes.into_iter().enumerate() {
        let name = scene_name(&scene.name)?;
        if catalog.get(&name).is_some() {
            bail!("scene `{name}` is defined more than once");
        }
        let setup = scene
            .into_setup(seed.wrapping_add(index as u64))
            .with_context(|| format!("invalid settings for scene `{name}`"))?;
        catalog
            .insert(name.clone(), setup)
            .with_context(|| format!("scene `{name}` was rejected"))?;
        let _ = first.get_or_insert(name);
    }

    for name in catalog.names() {
        let next = catalog
            .get(name)
            .and_then(|setup| setup.session.next_scene.as_ref());
        if let Some(next) = next {
            if catalog.get(next).is_none() {
                warn!(scene = %name, %next, "next scene is not defined; the hand-off will fail");
            }
        }
    }

    let start_scene = match raw.start_scene {
        Some(name) => scene_name(&name)?,
        None => first.context("no scenes configured")?,
    };
    if catalog.get(&start_scene).is_none() {
        bail!("start scene `{start_scene}` is not defined");
    }

    let [red, green, blue] = raw.ui.heart_color;
    Ok(GameConfig {
        start_scene,
        catalog,
        transition: TransitionConfig {
            fade_out: seconds("transition.fade_out_secs", raw.transition.fade_out_secs)?,
            fade_in: seconds("transition.fade_in_secs", raw.transition.fade_in_secs)?,
        },
        load_latency_frames: raw.transition.load_latency_frames,
        heart_color: Color::from_rgb_u8(red, green, blue),
    })
}

fn scene_name(name: &str) -> Result<SceneName> {
    SceneName::new(name).context("scene names must not be blank")
}

fn seconds(field: &str, value: f32) -> Result<Duration> {
    Duration::try_from_secs_f32(value).with_context(|| {
        format!("`{field}` must be a finite, non-negative number of seconds, got {value}")
    })
}

// ── TOML schema ──

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TomlConfig {
    start_scene: Option<String>,
    transition: TomlTransition,
    ui: TomlUi,
    scenes: Vec<TomlScene>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TomlTransition {
    fade_out_secs: f32,
    fade_in_secs: f32,
    load_latency_frames: u32,
}

impl Default for TomlTransition {
    fn default() -> Self {
        let config = TransitionConfig::default();
        Self {
            fade_out_secs: config.fade_out.as_secs_f32(),
            fade_in_secs: config.fade_in.as_secs_f32(),
            load_latency_frames: 3,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TomlUi {
    heart_color: [u8; 3],
}

impl Default for TomlUi {
    fn default() -> Self {
        Self {
            heart_color: [0xe5, 0x39, 0x35],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlScene {
    name: String,
    #[serde(default)]
    next_scene: Option<String>,
    #[serde(default)]
    session: TomlSession,
    #[serde(default)]
    spawning: TomlSpawning,
    #[serde(default)]
    finale: TomlFinale,
    #[serde(default)]
    completion: TomlCompletion,
}

impl TomlScene {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            next_scene: None,
            session: TomlSession::default(),
            spawning: TomlSpawning::default(),
            finale: TomlFinale::default(),
            completion: TomlCompletion::default(),
        }
    }

    fn into_setup(self, fallback_seed: u64) -> Result<SceneSetup> {
        let next_scene = self.next_scene.as_deref().map(scene_name).transpose()?;
        Ok(SceneSetup {
            session: self.session.into_config(next_scene)?,
            spawning: self.spawning.into_config(fallback_seed)?,
            finale: self.finale.into_config()?,
            completion: self.completion.into_config()?,
        })
    }
}

fn default_scenes() -> Vec<TomlScene> {
    let mut part_one = TomlScene::named("Part1");
    part_one.next_scene = Some("Part2".to_owned());

    let mut part_two = TomlScene::named("Part2");
    part_two.session.finale_enabled = false;

    vec![part_one, part_two]
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TomlSession {
    score_rate: f32,
    ramp_interval_secs: f32,
    ramp_increment: f32,
    base_speed: f32,
    starting_lives: u32,
    heart_slots: u32,
    target_score: f32,
    finale_enabled: bool,
    finale_pickup_available: bool,
    auto_stop_at_target: bool,
    freeze_player_on_finish: bool,
    start_score: Option<f32>,
    finale_slow_factor: f32,
    auto_advance: bool,
    hit_cooldown_secs: f32,
    obstacle_removal_grace_secs: f32,
    shake_duration_secs: f32,
    shake_magnitude: f32,
}

impl Default for TomlSession {
    fn default() -> Self {
        let config = SessionConfig::default();
        Self {
            score_rate: config.clock.score_rate,
            ramp_interval_secs: config.clock.ramp_interval.as_secs_f32(),
            ramp_increment: config.clock.ramp_increment,
            base_speed: config.base_speed,
            starting_lives: config.starting_lives,
            heart_slots: config.heart_slots,
            target_score: config.target_score,
            finale_enabled: config.finale_enabled,
            finale_pickup_available: config.finale_pickup_available,
            auto_stop_at_target: config.auto_stop_at_target,
            freeze_player_on_finish: config.freeze_player_on_finish,
            start_score: config.start_score_override,
            finale_slow_factor: config.finale_slow_factor,
            auto_advance: config.auto_advance,
            hit_cooldown_secs: config.hit_cooldown.as_secs_f32(),
            obstacle_removal_grace_secs: config.obstacle_removal_grace.as_secs_f32(),
            shake_duration_secs: config.shake_duration.as_secs_f32(),
            shake_magnitude: config.shake_magnitude,
        }
    }
}

impl TomlSession {
    fn into_config(self, next_scene: Option<SceneName>) -> Result<SessionConfig> {
        Ok(SessionConfig {
            clock: ClockConfig {
                score_rate: self.score_rate,
                ramp_interval: seconds("session.ramp_interval_secs", self.ramp_interval_secs)?,
                ramp_increment: self.ramp_increment,
            },
            base_speed: self.base_speed,
            starting_lives: self.starting_lives,
            heart_slots: self.heart_slots,
            target_score: self.target_score,
            finale_enabled: self.finale_enabled,
            finale_pickup_available: self.finale_pickup_available,
            auto_stop_at_target: self.auto_stop_at_target,
            freeze_player_on_finish: self.freeze_player_on_finish,
            start_score_override: self.start_score,
            finale_slow_factor: self.finale_slow_factor,
            next_scene,
            auto_advance: self.auto_advance,
            hit_cooldown: seconds("session.hit_cooldown_secs", self.hit_cooldown_secs)?,
            obstacle_removal_grace: seconds(
                "session.obstacle_removal_grace_secs",
                self.obstacle_removal_grace_secs,
            )?,
            shake_duration: seconds("session.shake_duration_secs", self.shake_duration_secs)?,
            shake_magnitude: self.shake_magnitude,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TomlSpawning {
    min_delay_secs: f32,
    max_delay_secs: f32,
    min_altitude: f32,
    max_altitude: f32,
    seed: Option<u64>,
}

impl Default for TomlSpawning {
    fn default() -> Self {
        Self {
            min_delay_secs: 0.8,
            max_delay_secs: 1.6,
            min_altitude: -1.5,
            max_altitude: 4.5,
            seed: None,
        }
    }
}

impl TomlSpawning {
    fn into_config(self, fallback_seed: u64) -> Result<SpawnConfig> {
        if !(self.min_altitude.is_finite() && self.max_altitude.is_finite()) {
            bail!("spawn altitudes must be finite");
        }
        Ok(SpawnConfig::new(
            (
                seconds("spawning.min_delay_secs", self.min_delay_secs)?,
                seconds("spawning.max_delay_secs", self.max_delay_secs)?,
            ),
            (self.min_altitude, self.max_altitude),
            self.seed.unwrap_or(fallback_seed),
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TomlFinale {
    pickup_spawn_delay_secs: f32,
    pickup_position: [f32; 2],
    pickup_timeout_secs: f32,
    drink_frame_hold_secs: f32,
    wings_pre_loop_hold_secs: f32,
    wings_loop_hold_secs: f32,
    show_text: bool,
    text_fade_in_secs: f32,
    text_hold_secs: f32,
    text_fade_out_secs: f32,
    flash_peak_alpha: f32,
    flash_fade_in_secs: f32,
    flash_fade_out_secs: f32,
    advance_delay_secs: f32,
}

impl Default for TomlFinale {
    fn default() -> Self {
        let config = FinaleConfig::default();
        let text = config.text.unwrap_or(TextTimings {
            fade_in: Duration::ZERO,
            hold: Duration::ZERO,
            fade_out: Duration::ZERO,
        });
        Self {
            pickup_spawn_delay_secs: config.pickup_spawn_delay.as_secs_f32(),
            pickup_position: [config.pickup_position.x, config.pickup_position.y],
            pickup_timeout_secs: config.pickup_timeout.as_secs_f32(),
            drink_frame_hold_secs: config.drink_frame_hold.as_secs_f32(),
            wings_pre_loop_hold_secs: config.wings_pre_loop_hold.as_secs_f32(),
            wings_loop_hold_secs: config.wings_loop_hold.as_secs_f32(),
            show_text: config.text.is_some(),
            text_fade_in_secs: text.fade_in.as_secs_f32(),
            text_hold_secs: text.hold.as_secs_f32(),
            text_fade_out_secs: text.fade_out.as_secs_f32(),
            flash_peak_alpha: config.flash.peak_alpha,
            flash_fade_in_secs: config.flash.fade_in.as_secs_f32(),
            flash_fade_out_secs: config.flash.fade_out.as_secs_f32(),
            advance_delay_secs: config.advance_delay.as_secs_f32(),
        }
    }
}

impl TomlFinale {
    fn into_config(self) -> Result<FinaleConfig> {
        let text = if self.show_text {
            Some(TextTimings {
                fade_in: seconds("finale.text_fade_in_secs", self.text_fade_in_secs)?,
                hold: seconds("finale.text_hold_secs", self.text_hold_secs)?,
                fade_out: seconds("finale.text_fade_out_secs", self.text_fade_out_secs)?,
            })
        } else {
            None
        };
        let [x, y] = self.pickup_position;
        Ok(FinaleConfig {
            pickup_spawn_delay: seconds(
                "finale.pickup_spawn_delay_secs",
                self.pickup_spawn_delay_secs,
            )?,
            pickup_position: WorldPoint::new(x, y),
            pickup_timeout: seconds("finale.pickup_timeout_secs", self.pickup_timeout_secs)?,
            drink_frame_hold: seconds("finale.drink_frame_hold_secs", self.drink_frame_hold_secs)?,
            wings_pre_loop_hold: seconds(
                "finale.wings_pre_loop_hold_secs",
                self.wings_pre_loop_hold_secs,
            )?,
            wings_loop_hold: seconds("finale.wings_loop_hold_secs", self.wings_loop_hold_secs)?,
            text,
            flash: FlashTimings {
                peak_alpha: self.flash_peak_alpha.clamp(0.0, 1.0),
                fade_in: seconds("finale.flash_fade_in_secs", self.flash_fade_in_secs)?,
                fade_out: seconds("finale.flash_fade_out_secs", self.flash_fade_out_secs)?,
            },
            advance_delay: seconds("finale.advance_delay_secs", self.advance_delay_secs)?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TomlCompletion {
    world_fade_secs: f32,
    destroy_after_fade: bool,
    show_text: bool,
    text_fade_in_secs: f32,
    text_hold_secs: f32,
    text_fade_out_secs: f32,
}

impl Default for TomlCompletion {
    fn default() -> Self {
        let config = CompletionConfig::default();
        let text = config.text.unwrap_or(CompletionText {
            fade_in: Duration::ZERO,
            hold: Duration::ZERO,
            fade_out: Duration::ZERO,
        });
        Self {
            world_fade_secs: config.world_fade.as_secs_f32(),
            destroy_after_fade: config.destroy_after_fade,
            show_text: config.text.is_some(),
            text_fade_in_secs: text.fade_in.as_secs_f32(),
            text_hold_secs: text.hold.as_secs_f32(),
            text_fade_out_secs: text.fade_out.as_secs_f32(),
        }
    }
}

impl TomlCompletion {
    fn into_config(self) -> Result<CompletionConfig> {
        let text = if self.show_text {
            Some(CompletionText {
                fade_in: seconds("completion.text_fade_in_secs", self.text_fade_in_secs)?,
                hold: seconds("completion.text_hold_secs", self.text_hold_secs)?,
                fade_out: seconds("completion.text_fade_out_secs", self.text_fade_out_secs)?,
            })
        } else {
            None
        };
        Ok(CompletionConfig {
            world_fade: seconds("completion.world_fade_secs", self.world_fade_secs)?,
            destroy_after_fade: self.destroy_after_fade,
            text,
        })
    }
}
