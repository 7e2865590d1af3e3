#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! One-shot transfer of lives and score across a scene load.
//!
//! Each value is written by the outgoing scene and consumed at most once by
//! the next scene's session start. A successful consume clears the slot, so a
//! second read before a fresh write reports the value as absent.

use tracing::debug;

/// Store holding the values handed from one scene to the next.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CarryoverStore {
    lives: Option<u32>,
    score: Option<f32>,
}

impl CarryoverStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the lives to hand to the next scene.
    pub fn set_lives(&mut self, lives: u32) {
        debug!(lives, "carryover lives stored");
        self.lives = Some(lives);
    }

    /// Records the score to hand to the next scene, clamping negatives to zero.
    pub fn set_score(&mut self, score: f32) {
        let score = if score.is_finite() { score.max(0.0) } else { 0.0 };
        debug!(score, "carryover score stored");
        self.score = Some(score);
    }

    /// Takes the stored lives, leaving the slot empty.
    pub fn try_consume_lives(&mut self) -> Option<u32> {
        self.lives.take()
    }

    /// Takes the stored score, leaving the slot empty.
    pub fn try_consume_score(&mut self) -> Option<f32> {
        self.score.take()
    }

    /// Reports whether any value is waiting to be consumed.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.lives.is_some() || self.score.is_some()
    }
}
