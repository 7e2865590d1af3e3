//! Heart display slots and their transient hit flashes.

use std::time::Duration;

use wings_runner_core::{Event, HeartSlot, HeartState, HeartTint};

const FLASH_SEQUENCE: [HeartTint; 3] = [HeartTint::White, HeartTint::Red, HeartTint::White];
const FLASH_STEP: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug)]
struct HeartFlash {
    slot: HeartSlot,
    step: usize,
    elapsed: Duration,
}

/// Configured heart slots together with in-flight flashes.
///
/// Flashes are resumable timers advanced by gameplay ticks; a flash on a slot
/// outside the configured range is never started.
#[derive(Clone, Debug)]
pub(crate) struct HeartDisplay {
    slots: u32,
    flashes: Vec<HeartFlash>,
}

impl HeartDisplay {
    pub(crate) fn new(slots: u32) -> Self {
        Self {
            slots,
            flashes: Vec::new(),
        }
    }

    pub(crate) fn slots(&self) -> u32 {
        self.slots
    }

    /// Resolves a slot index, returning `None` when it is not displayed.
    pub(crate) fn slot(&self, index: u32) -> Option<HeartSlot> {
        (index < self.slots).then_some(HeartSlot::new(index))
    }

    /// Starts flashing the slot, restarting any flash already running on it.
    pub(crate) fn start_flash(&mut self, slot: HeartSlot, out: &mut Vec<Event>) {
        self.flashes.retain(|flash| flash.slot != slot);
        self.flashes.push(HeartFlash {
            slot,
            step: 0,
            elapsed: Duration::ZERO,
        });
        out.push(Event::HeartTintChanged {
            slot,
            tint: FLASH_SEQUENCE[0],
        });
    }

    pub(crate) fn advance(&mut self, dt: Duration, out: &mut Vec<Event>) {
        for flash in &mut self.flashes {
            flash.elapsed = flash.elapsed.saturating_add(dt);
            while flash.elapsed >= FLASH_STEP && flash.step < FLASH_SEQUENCE.len() {
                flash.elapsed -= FLASH_STEP;
                flash.step += 1;
                let tint = FLASH_SEQUENCE
                    .get(flash.step)
                    .copied()
                    .unwrap_or(HeartTint::Normal);
                out.push(Event::HeartTintChanged {
                    slot: flash.slot,
                    tint,
                });
            }
        }
        self.flashes.retain(|flash| flash.step < FLASH_SEQUENCE.len());
    }

    /// Stops every flash and restores the original tints.
    pub(crate) fn cancel_all(&mut self, out: &mut Vec<Event>) {
        for flash in self.flashes.drain(..) {
            out.push(Event::HeartTintChanged {
                slot: flash.slot,
                tint: HeartTint::Normal,
            });
        }
    }

    pub(crate) fn is_flashing(&self, slot: HeartSlot) -> bool {
        self.flashes.iter().any(|flash| flash.slot == slot)
    }

    pub(crate) fn states(&self, lives: u32) -> Vec<HeartState> {
        (0..self.slots)
            .map(|index| {
                if index < lives {
                    HeartState::Full
                } else {
                    HeartState::Empty
                }
            })
            .collect()
    }
}
