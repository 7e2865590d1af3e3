//! Score accrual and the open-ended difficulty ramp.

use std::time::Duration;

/// Parameters governing score accrual and the difficulty ramp.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockConfig {
    /// Points earned per second at a speed multiplier of one.
    pub score_rate: f32,
    /// Gameplay time between successive multiplier increases.
    pub ramp_interval: Duration,
    /// Amount added to the speed multiplier at each ramp step.
    pub ramp_increment: f32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            score_rate: 5.0,
            ramp_interval: Duration::from_secs(5),
            ramp_increment: 0.05,
        }
    }
}

/// Result of advancing the clock by one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ClockStep {
    pub(crate) score_gained: f32,
    pub(crate) ramped: bool,
}

/// Accumulates the difficulty timer between ramp steps.
#[derive(Clone, Debug)]
pub(crate) struct DifficultyClock {
    config: ClockConfig,
    timer: Duration,
}

impl DifficultyClock {
    pub(crate) fn new(config: ClockConfig) -> Self {
        Self {
            config,
            timer: Duration::ZERO,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.timer = Duration::ZERO;
    }

    pub(crate) fn timer(&self) -> Duration {
        self.timer
    }

    /// Accrues score at the current multiplier, then advances the ramp.
    ///
    /// A ramp step resets the timer to zero rather than carrying the excess,
    /// so at most one increase happens per tick.
    pub(crate) fn advance(&mut self, dt: Duration, speed_multiplier: &mut f32) -> ClockStep {
        let score_gained = (self.config.score_rate * *speed_multiplier * dt.as_secs_f32()).max(0.0);

        self.timer = self.timer.saturating_add(dt);
        let ramped =
            !self.config.ramp_interval.is_zero() && self.timer >= self.config.ramp_interval;
        if ramped {
            self.timer = Duration::ZERO;
            *speed_multiplier += self.config.ramp_increment.max(0.0);
        }

        ClockStep {
            score_gained,
            ramped,
        }
    }
}
