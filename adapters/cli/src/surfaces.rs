//! Collaborators that log what an engine would draw.

use std::time::Duration;

use glam::Vec2;
use tracing::{debug, info};
use wings_runner_core::{HeartSlot, HeartState, TextSlot};
use wings_runner_presentation::{Color, EffectsSurface, UiSurface};

/// Camera and effects stand-in.
#[derive(Debug, Default)]
pub(crate) struct LogEffects {
    shakes: u32,
}

impl LogEffects {
    /// Number of camera shakes requested so far.
    pub(crate) fn shakes(&self) -> u32 {
        self.shakes
    }
}

impl EffectsSurface for LogEffects {
    fn shake(&mut self, duration: Duration, magnitude: f32) {
        self.shakes += 1;
        debug!(?duration, magnitude, "camera shake");
    }

    fn spawn_particle_burst(&mut self, position: Vec2) {
        info!(x = position.x, y = position.y, "particle burst");
    }

    fn screen_flash(&mut self, peak_alpha: f32, fade_in: Duration, fade_out: Duration) {
        info!(peak_alpha, ?fade_in, ?fade_out, "screen flash");
    }
}

/// Interface stand-in that remembers the labels it was last given.
#[derive(Debug, Default)]
pub(crate) struct LogUi {
    hearts: Vec<HeartState>,
    score: u32,
    high_score: u32,
    overlay_alpha: f32,
}

impl LogUi {
    /// Last score label.
    pub(crate) fn score(&self) -> u32 {
        self.score
    }

    /// Last high-score label.
    pub(crate) fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Hearts currently drawn as full.
    pub(crate) fn full_hearts(&self) -> usize {
        self.hearts
            .iter()
            .filter(|heart| **heart == HeartState::Full)
            .count()
    }
}

impl UiSurface for LogUi {
    fn set_hearts(&mut self, hearts: &[HeartState]) {
        self.hearts = hearts.to_vec();
        debug!(?hearts, "hearts");
    }

    fn set_heart_tint(&mut self, slot: HeartSlot, color: Color) {
        debug!(slot = slot.get(), ?color, "heart tint");
    }

    fn set_score(&mut self, score: u32) {
        // Logged once per hundred points.
        if score / 100 != self.score / 100 {
            debug!(score, "score");
        }
        self.score = score;
    }

    fn set_high_score(&mut self, score: u32) {
        self.high_score = score;
    }

    fn set_text_alpha(&mut self, text: TextSlot, alpha: f32) {
        if alpha >= 1.0 {
            info!(?text, "message fully shown");
        }
    }

    fn set_overlay_alpha(&mut self, alpha: f32) {
        if alpha >= 1.0 && self.overlay_alpha < 1.0 {
            info!("screen faded out");
        }
        self.overlay_alpha = alpha;
    }
}
