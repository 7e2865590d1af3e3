//! Authoritative obstacle state and the one-hit damage guard.

use std::{collections::BTreeMap, time::Duration};

use wings_runner_core::ObstacleId;

/// One-shot latch ensuring an obstacle damages the player at most once.
///
/// Engines report overlap once per physics step while two bodies touch, so a
/// single obstacle can produce many contact notifications. Only the first call
/// to [`DamageGuard::try_consume`] succeeds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DamageGuard {
    consumed: bool,
}

impl DamageGuard {
    /// Creates an armed guard.
    #[must_use]
    pub const fn new() -> Self {
        Self { consumed: false }
    }

    /// Consumes the guard, returning `true` only on the first call.
    pub fn try_consume(&mut self) -> bool {
        if self.consumed {
            return false;
        }
        self.consumed = true;
        true
    }

    /// Reports whether the guard has already been consumed.
    #[must_use]
    pub const fn is_consumed(&self) -> bool {
        self.consumed
    }
}

/// Obstacle stored inside the session.
#[derive(Clone, Debug)]
pub(crate) struct ObstacleState {
    pub(crate) altitude: f32,
    pub(crate) guard: DamageGuard,
    /// Remaining grace time before removal, once scheduled.
    pub(crate) removal_in: Option<Duration>,
}

/// Outcome of a contact report against the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ContactOutcome {
    /// The obstacle was armed and has now consumed its hit.
    Consumed,
    /// The obstacle is unknown or already inert.
    Ignored,
}

/// Registry that stores obstacles and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct ObstacleRegistry {
    entries: BTreeMap<ObstacleId, ObstacleState>,
    next_id: u32,
    removal_grace: Duration,
}

impl ObstacleRegistry {
    /// Creates an empty registry whose consumed obstacles linger for `removal_grace`.
    pub(crate) fn new(removal_grace: Duration) -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 0,
            removal_grace,
        }
    }

    /// Registers a fully configured obstacle and returns its identifier.
    pub(crate) fn spawn(&mut self, altitude: f32) -> ObstacleId {
        let id = ObstacleId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let previous = self.entries.insert(
            id,
            ObstacleState {
                altitude,
                guard: DamageGuard::new(),
                removal_in: None,
            },
        );
        debug_assert!(previous.is_none(), "obstacle identifiers must be unique");
        id
    }

    /// Routes a contact report through the obstacle's guard.
    pub(crate) fn contact(&mut self, id: ObstacleId) -> ContactOutcome {
        let grace = self.removal_grace;
        let Some(obstacle) = self.entries.get_mut(&id) else {
            return ContactOutcome::Ignored;
        };
        if !obstacle.guard.try_consume() {
            return ContactOutcome::Ignored;
        }
        if !grace.is_zero() {
            obstacle.removal_in = Some(grace);
        }
        ContactOutcome::Consumed
    }

    /// Makes every obstacle inert without scheduling removal.
    pub(crate) fn disarm_all(&mut self) {
        for obstacle in self.entries.values_mut() {
            let _ = obstacle.guard.try_consume();
        }
    }

    /// Advances removal timers and returns the obstacles whose grace expired.
    pub(crate) fn advance(&mut self, dt: Duration, out: &mut Vec<ObstacleId>) {
        for (id, obstacle) in &mut self.entries {
            if let Some(remaining) = obstacle.removal_in {
                let remaining = remaining.saturating_sub(dt);
                obstacle.removal_in = Some(remaining);
                if remaining.is_zero() {
                    out.push(*id);
                }
            }
        }
        for id in out.iter() {
            let _ = self.entries.remove(id);
        }
    }

    /// Removes a single obstacle, reporting whether it existed.
    pub(crate) fn remove(&mut self, id: ObstacleId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Removes every obstacle, reporting their identifiers in ascending order.
    pub(crate) fn clear(&mut self) -> Vec<ObstacleId> {
        let ids: Vec<ObstacleId> = self.entries.keys().copied().collect();
        self.entries.clear();
        ids
    }

    pub(crate) fn get(&self, id: ObstacleId) -> Option<&ObstacleState> {
        self.entries.get(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (ObstacleId, &ObstacleState)> {
        self.entries.iter().map(|(id, state)| (*id, state))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
