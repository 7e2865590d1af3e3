#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Wings Runner engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative session, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the session executes those
//! commands via its `apply` entry point and broadcasts [`Event`] values for
//! systems to react to deterministically. Systems that drive presentation
//! (cinematics, fades) additionally emit [`Cue`] values that adapters forward
//! to the engine collaborators.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Smallest duration used as a divisor when computing fade progress.
const MIN_FADE_SECONDS: f32 = 0.0001;

/// Top-level state of a running session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Normal gameplay: score accrues and damage applies.
    Playing,
    /// The run is over, either through game over or a completed finish.
    Ended,
    /// The score target was reached and the finale is underway.
    FinaleTriggered,
    /// The world is frozen for the remainder of the session.
    FinaleCinematic,
}

impl Phase {
    /// Reports whether damage may be applied in this phase.
    #[must_use]
    pub const fn accepts_damage(self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Reports whether the phase halts in-flight gameplay timers such as heart flashes.
    #[must_use]
    pub const fn cancels_flashes(self) -> bool {
        matches!(self, Self::Ended | Self::FinaleCinematic)
    }
}

/// Reason recorded when a session leaves normal play for good.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndReason {
    /// The player ran out of lives.
    GameOver,
    /// The score target was reached through the completion path.
    TargetReached,
}

/// Path the session takes once the score target is crossed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetRoute {
    /// Hand control to the finale cinematic.
    Finale,
    /// Stop the world and fade out without a cinematic.
    Completion,
    /// Neither path is configured; play continues.
    Continue,
}

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the gameplay clock by the provided delta time.
    Tick {
        /// Duration of gameplay time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Removes one life from the player unconditionally (subject to phase).
    ApplyDamage,
    /// Reports that the player overlaps an obstacle during this physics step.
    ReportContact {
        /// Obstacle the engine reported contact with.
        obstacle: ObstacleId,
    },
    /// Requests that a new obstacle enter the world.
    SpawnObstacle {
        /// Vertical position assigned to the obstacle.
        altitude: f32,
    },
    /// Reports that an obstacle scrolled out of the playfield.
    DespawnObstacle {
        /// Obstacle that left the playfield.
        obstacle: ObstacleId,
    },
    /// Removes every obstacle from the world and halts further spawning.
    ClearObstacles,
    /// Pins the session to the cinematic phase with a frozen world.
    ForceFinalFreeze,
    /// Requests the hand-off of lives and score to the next scene.
    AdvanceToNextPart,
}

/// Events broadcast by the session after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the gameplay clock advanced.
    TimeAdvanced {
        /// Duration of gameplay time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces a freshly started session.
    SessionStarted {
        /// Score the session starts from.
        score: f32,
        /// Lives the session starts with.
        lives: u32,
        /// Number of heart slots available for display.
        heart_slots: u32,
        /// Best score recorded so far.
        high_score: f32,
    },
    /// Reports the score after gameplay time accrued.
    ScoreAdvanced {
        /// Current score.
        score: f32,
    },
    /// Reports that the difficulty ramp raised the speed multiplier.
    DifficultyIncreased {
        /// Speed multiplier after the increase.
        speed_multiplier: f32,
    },
    /// Reports that the score surpassed the stored high score.
    HighScoreImproved {
        /// New high score.
        score: f32,
    },
    /// Confirms that the player lost a life.
    PlayerHit {
        /// Heart slot that emptied, when it is displayed.
        slot: Option<HeartSlot>,
        /// Lives remaining after the hit.
        lives: u32,
    },
    /// Requests a camera shake in response to a hit.
    CameraShakeRequested {
        /// Duration of the shake.
        duration: Duration,
        /// Peak displacement of the shake.
        magnitude: f32,
    },
    /// Reports a change in a heart slot's tint during a flash.
    HeartTintChanged {
        /// Slot whose tint changed.
        slot: HeartSlot,
        /// Tint now applied to the slot.
        tint: HeartTint,
    },
    /// Announces a phase transition.
    PhaseChanged {
        /// Phase that was active before the transition.
        from: Phase,
        /// Phase that is active after the transition.
        to: Phase,
    },
    /// Announces that the player ran out of lives and must enter a death fall.
    GameOver,
    /// Announces that the score target was crossed.
    TargetReached {
        /// Score at the moment of crossing.
        score: f32,
        /// Path the session takes from here.
        route: TargetRoute,
    },
    /// Reports the world scroll speed after a change.
    WorldSpeedChanged {
        /// Effective scroll speed (base speed times multiplier).
        speed: f32,
    },
    /// Announces that obstacle spawning was permanently disabled.
    SpawningHalted,
    /// Confirms that an obstacle was created.
    ObstacleSpawned {
        /// Identifier assigned to the obstacle.
        obstacle: ObstacleId,
        /// Vertical position of the obstacle.
        altitude: f32,
    },
    /// Confirms that an obstacle consumed its single hit.
    ObstacleConsumed {
        /// Obstacle that became inert.
        obstacle: ObstacleId,
    },
    /// Confirms that an obstacle left the world.
    ObstacleRemoved {
        /// Obstacle that was removed.
        obstacle: ObstacleId,
    },
    /// Requests that lives and score carry over into the named scene.
    NextPartRequested {
        /// Scene that should be loaded next.
        scene: SceneName,
        /// Lives to carry over.
        lives: u32,
        /// Score to carry over.
        score: f32,
    },
}

/// Presentation requests emitted by systems for engine collaborators.
#[derive(Clone, Debug, PartialEq)]
pub enum Cue {
    /// Shows a specific player sprite frame, overriding the run cycle.
    PlayerFrame(PlayerFrame),
    /// Hard-freezes the player's animation and movement.
    FreezePlayer,
    /// Sets the player's airborne pose.
    PlayerAirborne(bool),
    /// Starts the looping wings animation.
    StartWingsLoop,
    /// Places the finale pickup in the world.
    SpawnPickup {
        /// Position of the pickup.
        position: WorldPoint,
    },
    /// Hides the finale pickup and stops it reporting contacts.
    HidePickup,
    /// Removes the finale pickup from the world.
    RemovePickup,
    /// Plays a particle burst.
    ParticleBurst {
        /// Position of the burst.
        position: WorldPoint,
    },
    /// Flashes the whole screen.
    ScreenFlash {
        /// Alpha reached at the peak of the flash.
        peak_alpha: f32,
        /// Time spent fading in.
        fade_in: Duration,
        /// Time spent fading out.
        fade_out: Duration,
    },
    /// Sets the alpha of an on-screen message.
    TextAlpha {
        /// Message being faded.
        text: TextSlot,
        /// Alpha in the range 0.0..=1.0.
        alpha: f32,
    },
    /// Scales the alpha of the player and obstacle visuals.
    WorldAlpha {
        /// Alpha factor in the range 0.0..=1.0.
        alpha: f32,
    },
    /// Sets the alpha of the full-screen transition overlay.
    OverlayAlpha {
        /// Alpha in the range 0.0..=1.0.
        alpha: f32,
    },
}

/// Sprite frames that the cinematic forces onto the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerFrame {
    /// First frame of the drink animation.
    Drink1,
    /// Second frame of the drink animation.
    Drink2,
    /// Third frame of the drink animation.
    Drink3,
    /// Wings revealed, before the loop starts.
    Wings,
}

/// On-screen messages faded by the sequencers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextSlot {
    /// Message shown at the end of the finale cinematic.
    Wings,
    /// Message shown at the end of the completion path.
    Completion,
}

/// Tint applied to a heart slot while it flashes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeartTint {
    /// The slot's original tint.
    Normal,
    /// White highlight.
    White,
    /// Red highlight.
    Red,
}

/// Display state of a single heart slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeartState {
    /// The slot represents a remaining life.
    Full,
    /// The slot represents a lost life.
    Empty,
}

/// Zero-based index of a heart display slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HeartSlot(u32);

impl HeartSlot {
    /// Creates a new heart slot index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric slot index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId(u32);

impl ObstacleId {
    /// Creates a new obstacle identifier with the provided numeric value.
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

/// Name of a scene that can be loaded.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneName(String);

impl SceneName {
    /// Creates a scene name, returning `None` for blank names.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            None
        } else {
            Some(Self(name))
        }
    }

    /// Borrows the scene name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SceneName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position in world units.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl WorldPoint {
    /// Creates a new world-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Fraction of a linear fade that has completed, clamped to 0.0..=1.0.
///
/// Zero-length fades complete immediately.
#[must_use]
pub fn fade_progress(elapsed: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    let progress = elapsed.as_secs_f32() / duration.as_secs_f32().max(MIN_FADE_SECONDS);
    progress.clamp(0.0, 1.0)
}
