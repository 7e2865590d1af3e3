#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Completion sequence played when the score target stops the run without a finale.

use std::time::Duration;

use tracing::info;
use wings_runner_core::{fade_progress, Command, Cue, Event, TargetRoute, TextSlot};

/// Stages of the completion sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompletionStage {
    /// Waiting for the score target.
    Idle,
    /// Player and obstacles fading out.
    FadingWorld,
    /// Completion message fading in.
    TextFadeIn,
    /// Completion message fully visible.
    TextHold,
    /// Completion message fading out.
    TextFadeOut,
    /// Sequence finished.
    Done,
}

impl CompletionStage {
    /// Stage that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::FadingWorld),
            Self::FadingWorld => Some(Self::TextFadeIn),
            Self::TextFadeIn => Some(Self::TextHold),
            Self::TextHold => Some(Self::TextFadeOut),
            Self::TextFadeOut => Some(Self::Done),
            Self::Done => None,
        }
    }
}

/// Timings of the completion message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompletionText {
    /// Time taken to fade the message in.
    pub fade_in: Duration,
    /// Time the message stays fully visible.
    pub hold: Duration,
    /// Time taken to fade the message out.
    pub fade_out: Duration,
}

/// Configuration parameters required to construct the completion sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Time taken to fade the player and obstacles out.
    pub world_fade: Duration,
    /// Whether faded obstacles are removed once invisible.
    pub destroy_after_fade: bool,
    /// Completion message timings; `None` skips the message.
    pub text: Option<CompletionText>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world_fade: Duration::from_millis(600),
            destroy_after_fade: true,
            text: Some(CompletionText {
                fade_in: Duration::from_millis(450),
                hold: Duration::from_millis(1100),
                fade_out: Duration::from_millis(600),
            }),
        }
    }
}

/// Pure system fading the world out and showing the completion message.
#[derive(Debug)]
pub struct CompletionSequence {
    config: Config,
    stage: CompletionStage,
    elapsed: Duration,
}

impl CompletionSequence {
    /// Creates an idle sequence.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            stage: CompletionStage::Idle,
            elapsed: Duration::ZERO,
        }
    }

    /// Current stage of the sequence.
    #[must_use]
    pub fn stage(&self) -> CompletionStage {
        self.stage
    }

    /// Consumes session events and advances the sequence by `real_dt`.
    pub fn handle(
        &mut self,
        events: &[Event],
        real_dt: Duration,
        commands: &mut Vec<Command>,
        cues: &mut Vec<Cue>,
    ) {
        let mut budget = real_dt;
        for event in events {
            match event {
                Event::SessionStarted { .. } => {
                    self.stage = CompletionStage::Idle;
                    self.elapsed = Duration::ZERO;
                }
                Event::TargetReached {
                    route: TargetRoute::Completion,
                    ..
                } if self.stage == CompletionStage::Idle => {
                    self.enter(CompletionStage::FadingWorld, commands, cues);
                    budget = Duration::ZERO;
                }
                _ => {}
            }
        }

        loop {
            let Some(duration) = self.duration() else {
                return;
            };
            let room = duration.saturating_sub(self.elapsed);
            if budget < room {
                self.elapsed += budget;
                self.emit_alpha(cues);
                return;
            }
            budget -= room;
            self.elapsed = duration;
            self.emit_alpha(cues);

            let Some(next) = self.stage.next() else {
                return;
            };
            self.leave(commands);
            self.enter(next, commands, cues);
        }
    }

    fn duration(&self) -> Option<Duration> {
        let text = self.config.text;
        match self.stage {
            CompletionStage::Idle | CompletionStage::Done => None,
            CompletionStage::FadingWorld => Some(self.config.world_fade),
            CompletionStage::TextFadeIn => Some(text.map_or(Duration::ZERO, |t| t.fade_in)),
            CompletionStage::TextHold => Some(text.map_or(Duration::ZERO, |t| t.hold)),
            CompletionStage::TextFadeOut => Some(text.map_or(Duration::ZERO, |t| t.fade_out)),
        }
    }

    fn leave(&mut self, commands: &mut Vec<Command>) {
        if self.stage == CompletionStage::FadingWorld && self.config.destroy_after_fade {
            commands.push(Command::ClearObstacles);
        }
    }

    fn enter(&mut self, stage: CompletionStage, commands: &mut Vec<Command>, cues: &mut Vec<Cue>) {
        info!(from = ?self.stage, to = ?stage, "completion stage changed");
        self.stage = stage;
        self.elapsed = Duration::ZERO;

        match stage {
            CompletionStage::FadingWorld | CompletionStage::TextFadeIn => self.emit_alpha(cues),
            CompletionStage::Done => commands.push(Command::AdvanceToNextPart),
            CompletionStage::Idle | CompletionStage::TextHold | CompletionStage::TextFadeOut => {}
        }
    }

    fn emit_alpha(&self, cues: &mut Vec<Cue>) {
        let Some(duration) = self.duration() else {
            return;
        };
        let progress = fade_progress(self.elapsed, duration);
        match self.stage {
            CompletionStage::FadingWorld => cues.push(Cue::WorldAlpha {
                alpha: 1.0 - progress,
            }),
            CompletionStage::TextFadeIn if self.config.text.is_some() => {
                cues.push(Cue::TextAlpha {
                    text: TextSlot::Completion,
                    alpha: progress,
                });
            }
            CompletionStage::TextFadeOut if self.config.text.is_some() => {
                cues.push(Cue::TextAlpha {
                    text: TextSlot::Completion,
                    alpha: 1.0 - progress,
                });
            }
            _ => {}
        }
    }
}
