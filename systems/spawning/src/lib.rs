#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for emitting obstacle spawn commands.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;
use wings_runner_core::{Command, Event};

/// Smallest multiplier used when shortening spawn delays.
const MIN_DIFFICULTY_DIVISOR: f32 = 0.5;
/// Floor applied to drawn delays so a degenerate range cannot spin forever.
const MIN_SPAWN_DELAY: Duration = Duration::from_millis(10);

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    min_delay: Duration,
    max_delay: Duration,
    min_altitude: f32,
    max_altitude: f32,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration from delay and altitude ranges and a seed.
    ///
    /// Reversed ranges are reordered.
    #[must_use]
    pub fn new(delay: (Duration, Duration), altitude: (f32, f32), rng_seed: u64) -> Self {
        let (min_delay, max_delay) = if delay.0 <= delay.1 {
            delay
        } else {
            (delay.1, delay.0)
        };
        let (min_altitude, max_altitude) = if altitude.0 <= altitude.1 {
            altitude
        } else {
            (altitude.1, altitude.0)
        };
        Self {
            min_delay,
            max_delay,
            min_altitude,
            max_altitude,
            rng_seed,
        }
    }

    /// Returns a copy of the configuration that uses a different seed.
    #[must_use]
    pub const fn with_seed(mut self, rng_seed: u64) -> Self {
        self.rng_seed = rng_seed;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            (Duration::from_millis(800), Duration::from_millis(1600)),
            (-1.5, 4.5),
            0,
        )
    }
}

/// Read-only view of the session state the spawner depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnContext {
    /// Whether the session still accepts new obstacles.
    pub spawning_enabled: bool,
    /// Current speed multiplier.
    pub speed_multiplier: f32,
    /// Current effective world speed.
    pub world_speed: f32,
}

/// Pure system that emits spawn commands while the world is moving.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    rng: ChaCha8Rng,
    until_next: Option<Duration>,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
            until_next: None,
        }
    }

    /// Consumes events and the session view to emit spawn commands.
    pub fn handle(&mut self, events: &[Event], context: SpawnContext, out: &mut Vec<Command>) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => accumulated = accumulated.saturating_add(*dt),
                Event::SessionStarted { .. } => self.until_next = None,
                _ => {}
            }
        }

        if !context.spawning_enabled || context.world_speed == 0.0 {
            self.until_next = None;
            return;
        }

        while !accumulated.is_zero() {
            let delay = match self.until_next {
                Some(remaining) => remaining,
                None => self.draw_delay(context.speed_multiplier),
            };
            if accumulated < delay {
                self.until_next = Some(delay - accumulated);
                break;
            }
            accumulated -= delay;
            self.until_next = None;

            let altitude = self.draw_altitude();
            debug!(altitude, "obstacle spawn requested");
            out.push(Command::SpawnObstacle { altitude });
        }
    }

    /// Delay remaining before the next spawn, once one has been scheduled.
    #[must_use]
    pub fn pending_delay(&self) -> Option<Duration> {
        self.until_next
    }

    fn draw_delay(&mut self, speed_multiplier: f32) -> Duration {
        let seconds = self.rng.gen_range(
            self.config.min_delay.as_secs_f32()..=self.config.max_delay.as_secs_f32(),
        );
        let divisor = speed_multiplier.max(MIN_DIFFICULTY_DIVISOR);
        Duration::from_secs_f32(seconds / divisor).max(MIN_SPAWN_DELAY)
    }

    fn draw_altitude(&mut self) -> f32 {
        self.rng.gen_range(self.config.min_altitude..=self.config.max_altitude)
    }
}
