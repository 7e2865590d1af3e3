#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Finale sequencer that scripts the end-of-run cinematic.
//!
//! The sequencer reacts to [`Event::TargetReached`] with the finale route and
//! walks a strictly linear list of [`FinaleStage`] values. Every stage is a
//! resumable `{stage, elapsed}` pair advanced by unscaled frame time, so the
//! cinematic reads at a constant pace regardless of how far the world has
//! been slowed. Stage entry actions are expressed as session [`Command`]s and
//! presentation [`Cue`]s.

use std::time::Duration;

use tracing::{info, warn};
use wings_runner_core::{
    fade_progress, Command, Cue, Event, PlayerFrame, TargetRoute, TextSlot, WorldPoint,
};

/// Stages of the finale cinematic in the order they are entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FinaleStage {
    /// Waiting for the score target.
    Idle,
    /// The world has slowed; the pickup has not appeared yet.
    Approaching,
    /// The pickup is in the world, waiting for the player to reach it.
    Spawned,
    /// First drink frame.
    Drinking1,
    /// Second drink frame.
    Drinking2,
    /// Third drink frame.
    Drinking3,
    /// Wings frame shown before the loop starts.
    WingsReveal,
    /// Wings loop running; the world is frozen from here on.
    WingsLoop,
    /// Wings message fading in, holding and fading out.
    TextFade,
    /// Pickup removed, hand-off pending.
    Advancing,
    /// The hand-off was requested.
    Done,
}

impl FinaleStage {
    /// Stage that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Approaching),
            Self::Approaching => Some(Self::Spawned),
            Self::Spawned => Some(Self::Drinking1),
            Self::Drinking1 => Some(Self::Drinking2),
            Self::Drinking2 => Some(Self::Drinking3),
            Self::Drinking3 => Some(Self::WingsReveal),
            Self::WingsReveal => Some(Self::WingsLoop),
            Self::WingsLoop => Some(Self::TextFade),
            Self::TextFade => Some(Self::Advancing),
            Self::Advancing => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// Reports whether the cinematic is underway.
    #[must_use]
    pub const fn is_running(self) -> bool {
        !matches!(self, Self::Idle | Self::Done)
    }
}

/// Fade-in, hold and fade-out timings for an on-screen message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextTimings {
    /// Time taken to fade the message in.
    pub fade_in: Duration,
    /// Time the message stays fully visible.
    pub hold: Duration,
    /// Time taken to fade the message out.
    pub fade_out: Duration,
}

impl TextTimings {
    /// Total time the message occupies.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.fade_in
            .saturating_add(self.hold)
            .saturating_add(self.fade_out)
    }

    /// Alpha of the message `elapsed` into its timeline.
    #[must_use]
    pub fn alpha_at(&self, elapsed: Duration) -> f32 {
        if elapsed < self.fade_in {
            return fade_progress(elapsed, self.fade_in);
        }
        let after_in = elapsed - self.fade_in;
        if after_in < self.hold {
            return 1.0;
        }
        1.0 - fade_progress(after_in - self.hold, self.fade_out)
    }
}

/// Parameters of the full-screen flash played when the wings appear.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlashTimings {
    /// Alpha reached at the peak of the flash.
    pub peak_alpha: f32,
    /// Time spent fading in.
    pub fade_in: Duration,
    /// Time spent fading out.
    pub fade_out: Duration,
}

/// Configuration parameters required to construct the finale sequencer.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Delay between the trigger and the pickup appearing.
    pub pickup_spawn_delay: Duration,
    /// Where the pickup appears.
    pub pickup_position: WorldPoint,
    /// Longest wait for the player to reach the pickup.
    pub pickup_timeout: Duration,
    /// Hold for each of the three drink frames.
    pub drink_frame_hold: Duration,
    /// Hold on the wings frame before the loop starts.
    pub wings_pre_loop_hold: Duration,
    /// Hold after the loop starts and before the message.
    pub wings_loop_hold: Duration,
    /// Wings message timings; `None` when no message is configured.
    pub text: Option<TextTimings>,
    /// Screen flash played with the wings loop.
    pub flash: FlashTimings,
    /// Delay between removing the pickup and requesting the hand-off.
    pub advance_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pickup_spawn_delay: Duration::from_millis(100),
            pickup_position: WorldPoint::new(5.5, -0.3),
            pickup_timeout: Duration::from_secs(3),
            drink_frame_hold: Duration::from_millis(220),
            wings_pre_loop_hold: Duration::from_millis(300),
            wings_loop_hold: Duration::ZERO,
            text: Some(TextTimings {
                fade_in: Duration::from_millis(350),
                hold: Duration::from_secs(1),
                fade_out: Duration::from_millis(600),
            }),
            flash: FlashTimings {
                peak_alpha: 0.35,
                fade_in: Duration::from_millis(60),
                fade_out: Duration::from_millis(250),
            },
            advance_delay: Duration::ZERO,
        }
    }
}

/// How long a stage lasts before the sequencer moves on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Hold {
    For(Duration),
    UntilPickup { timeout: Duration },
    Forever,
}

/// Pure system driving the finale cinematic.
#[derive(Debug)]
pub struct FinaleSequencer {
    config: Config,
    stage: FinaleStage,
    elapsed: Duration,
    pickup_reached: bool,
}

impl FinaleSequencer {
    /// Creates an idle sequencer.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            stage: FinaleStage::Idle,
            elapsed: Duration::ZERO,
            pickup_reached: false,
        }
    }

    /// Current stage of the cinematic.
    #[must_use]
    pub fn stage(&self) -> FinaleStage {
        self.stage
    }

    /// Time spent in the current stage.
    #[must_use]
    pub fn elapsed_in_stage(&self) -> Duration {
        self.elapsed
    }

    /// Records that the player touched the pickup.
    ///
    /// Only honoured while the pickup is in the world; repeated reports are
    /// harmless.
    pub fn on_pickup_contact(&mut self) {
        if self.stage == FinaleStage::Spawned {
            self.pickup_reached = true;
        }
    }

    /// Consumes session events and advances the cinematic by `real_dt`.
    ///
    /// `player` anchors the particle burst played with the wings loop.
    pub fn handle(
        &mut self,
        events: &[Event],
        real_dt: Duration,
        player: WorldPoint,
        commands: &mut Vec<Command>,
        cues: &mut Vec<Cue>,
    ) {
        let mut budget = real_dt;
        for event in events {
            match event {
                Event::SessionStarted { .. } => self.reset(),
                Event::TargetReached {
                    route: TargetRoute::Finale,
                    ..
                } if self.stage == FinaleStage::Idle => {
                    self.enter(FinaleStage::Approaching, player, commands, cues);
                    budget = Duration::ZERO;
                }
                _ => {}
            }
        }

        self.advance(budget, player, commands, cues);
    }

    fn reset(&mut self) {
        self.stage = FinaleStage::Idle;
        self.elapsed = Duration::ZERO;
        self.pickup_reached = false;
    }

    fn hold(&self) -> Hold {
        match self.stage {
            FinaleStage::Idle | FinaleStage::Done => Hold::Forever,
            FinaleStage::Approaching => Hold::For(self.config.pickup_spawn_delay),
            FinaleStage::Spawned => Hold::UntilPickup {
                timeout: self.config.pickup_timeout,
            },
            FinaleStage::Drinking1 | FinaleStage::Drinking2 | FinaleStage::Drinking3 => {
                Hold::For(self.config.drink_frame_hold)
            }
            FinaleStage::WingsReveal => Hold::For(self.config.wings_pre_loop_hold),
            FinaleStage::WingsLoop => Hold::For(self.config.wings_loop_hold),
            FinaleStage::TextFade => Hold::For(
                self.config
                    .text
                    .map_or(Duration::ZERO, |text| text.total()),
            ),
            FinaleStage::Advancing => Hold::For(self.config.advance_delay),
        }
    }

    fn advance(
        &mut self,
        mut budget: Duration,
        player: WorldPoint,
        commands: &mut Vec<Command>,
        cues: &mut Vec<Cue>,
    ) {
        loop {
            let room = match self.hold() {
                Hold::Forever => return,
                Hold::UntilPickup { .. } if self.pickup_reached => Duration::ZERO,
                Hold::UntilPickup { timeout } | Hold::For(timeout) => {
                    timeout.saturating_sub(self.elapsed)
                }
            };

            if budget < room {
                self.elapsed += budget;
                self.emit_text_alpha(cues);
                return;
            }

            budget -= room;
            if self.stage == FinaleStage::Spawned && !self.pickup_reached {
                warn!("pickup was never reached; continuing the finale");
            }
            let Some(next) = self.stage.next() else {
                return;
            };
            self.enter(next, player, commands, cues);
        }
    }

    fn enter(
        &mut self,
        stage: FinaleStage,
        player: WorldPoint,
        commands: &mut Vec<Command>,
        cues: &mut Vec<Cue>,
    ) {
        if self.stage == FinaleStage::TextFade && self.config.text.is_some() {
            cues.push(Cue::TextAlpha {
                text: TextSlot::Wings,
                alpha: 0.0,
            });
        }

        info!(from = ?self.stage, to = ?stage, "finale stage changed");
        self.stage = stage;
        self.elapsed = Duration::ZERO;

        match stage {
            FinaleStage::Idle | FinaleStage::Approaching => {}
            FinaleStage::Spawned => {
                commands.push(Command::ClearObstacles);
                cues.push(Cue::SpawnPickup {
                    position: self.config.pickup_position,
                });
            }
            FinaleStage::Drinking1 => {
                cues.push(Cue::HidePickup);
                cues.push(Cue::FreezePlayer);
                cues.push(Cue::PlayerAirborne(false));
                cues.push(Cue::PlayerFrame(PlayerFrame::Drink1));
            }
            FinaleStage::Drinking2 => cues.push(Cue::PlayerFrame(PlayerFrame::Drink2)),
            FinaleStage::Drinking3 => cues.push(Cue::PlayerFrame(PlayerFrame::Drink3)),
            FinaleStage::WingsReveal => cues.push(Cue::PlayerFrame(PlayerFrame::Wings)),
            FinaleStage::WingsLoop => {
                cues.push(Cue::StartWingsLoop);
                cues.push(Cue::ParticleBurst { position: player });
                let flash = self.config.flash;
                cues.push(Cue::ScreenFlash {
                    peak_alpha: flash.peak_alpha,
                    fade_in: flash.fade_in,
                    fade_out: flash.fade_out,
                });
                commands.push(Command::ForceFinalFreeze);
            }
            FinaleStage::TextFade => self.emit_text_alpha(cues),
            FinaleStage::Advancing => cues.push(Cue::RemovePickup),
            FinaleStage::Done => commands.push(Command::AdvanceToNextPart),
        }
    }

    fn emit_text_alpha(&self, cues: &mut Vec<Cue>) {
        if self.stage != FinaleStage::TextFade {
            return;
        }
        if let Some(text) = self.config.text {
            cues.push(Cue::TextAlpha {
                text: TextSlot::Wings,
                alpha: text.alpha_at(self.elapsed),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger() -> Event {
        Event::TargetReached {
            score: 3000.0,
            route: TargetRoute::Finale,
        }
    }

    #[test]
    fn stage_order_is_linear() {
        let mut stage = FinaleStage::Idle;
        let mut order = vec![stage];
        while let Some(next) = stage.next() {
            assert!(next > stage);
            order.push(next);
            stage = next;
        }
        assert_eq!(order.len(), 11);
        assert_eq!(order.last(), Some(&FinaleStage::Done));
    }

    #[test]
    fn text_alpha_rises_holds_and_falls() {
        let text = TextTimings {
            fade_in: Duration::from_millis(400),
            hold: Duration::from_secs(1),
            fade_out: Duration::from_millis(500),
        };
        assert_eq!(text.alpha_at(Duration::ZERO), 0.0);
        assert!((text.alpha_at(Duration::from_millis(200)) - 0.5).abs() < 1e-5);
        assert_eq!(text.alpha_at(Duration::from_millis(900)), 1.0);
        assert!((text.alpha_at(Duration::from_millis(1650)) - 0.5).abs() < 1e-5);
        assert_eq!(text.alpha_at(text.total()), 0.0);
    }

    #[test]
    fn other_routes_do_not_start_the_finale() {
        let mut sequencer = FinaleSequencer::new(Config::default());
        let mut commands = Vec::new();
        let mut cues = Vec::new();
        sequencer.handle(
            &[Event::TargetReached {
                score: 3000.0,
                route: TargetRoute::Completion,
            }],
            Duration::from_secs(10),
            WorldPoint::default(),
            &mut commands,
            &mut cues,
        );
        assert_eq!(sequencer.stage(), FinaleStage::Idle);
        assert!(commands.is_empty() && cues.is_empty());
    }

    #[test]
    fn trigger_frame_does_not_consume_time() {
        let mut sequencer = FinaleSequencer::new(Config::default());
        let mut commands = Vec::new();
        let mut cues = Vec::new();
        sequencer.handle(
            &[trigger()],
            Duration::from_secs(1),
            WorldPoint::default(),
            &mut commands,
            &mut cues,
        );
        assert_eq!(sequencer.stage(), FinaleStage::Approaching);
        assert_eq!(sequencer.elapsed_in_stage(), Duration::ZERO);
    }

    #[test]
    fn contact_before_the_pickup_exists_is_ignored() {
        let mut sequencer = FinaleSequencer::new(Config::default());
        let mut commands = Vec::new();
        let mut cues = Vec::new();
        sequencer.handle(
            &[trigger()],
            Duration::ZERO,
            WorldPoint::default(),
            &mut commands,
            &mut cues,
        );
        sequencer.on_pickup_contact();
        sequencer.handle(
            &[],
            Duration::from_millis(100),
            WorldPoint::default(),
            &mut commands,
            &mut cues,
        );
        assert_eq!(sequencer.stage(), FinaleStage::Spawned);
    }
}
