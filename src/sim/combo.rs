//! Consecutive-catch combo tracking

use serde::{Deserialize, Serialize};

use crate::consts::{COMBO_BONUS_STEP, COMBO_IDLE_WINDOW_MS};

/// Current combo (read-only snapshot)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComboState {
    pub count: u32,
    pub multiplier: f32,
    /// Timestamp (ms) of the last successful catch
    pub last_hit_ms: Option<u64>,
}

impl Default for ComboState {
    fn default() -> Self {
        Self {
            count: 0,
            multiplier: 1.0,
            last_hit_ms: None,
        }
    }
}

/// Combo counter with multiplier tiers and idle decay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboSystem {
    state: ComboState,
    /// Longest combo reached this round
    best: u32,
    idle_window_ms: u64,
    bonus_step: f32,
}

impl Default for ComboSystem {
    fn default() -> Self {
        Self::new(COMBO_IDLE_WINDOW_MS, COMBO_BONUS_STEP)
    }
}

impl ComboSystem {
    pub fn new(idle_window_ms: u64, bonus_step: f32) -> Self {
        Self {
            state: ComboState::default(),
            best: 0,
            idle_window_ms,
            bonus_step,
        }
    }

    /// Multiplier for a given streak: one bonus step per 10 catches
    pub fn multiplier_for(&self, count: u32) -> f32 {
        1.0 + (count / 10) as f32 * self.bonus_step
    }

    /// Record a successful catch. Returns true when the multiplier tier rose.
    pub fn register_hit(&mut self, now_ms: u64) -> bool {
        let previous = self.state.multiplier;
        self.state.count += 1;
        self.state.multiplier = self.multiplier_for(self.state.count);
        self.state.last_hit_ms = Some(now_ms);
        self.best = self.best.max(self.state.count);
        self.state.multiplier > previous
    }

    /// Hazard caught: streak broken
    pub fn register_hazard(&mut self) {
        self.reset();
    }

    /// Idle decay check. Compares against the stamp of the most recent hit,
    /// so a hit registered just before this call is never zeroed.
    /// Returns true if the combo was reset.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if self.state.count == 0 {
            return false;
        }
        let Some(last_hit) = self.state.last_hit_ms else {
            return false;
        };
        if now_ms.saturating_sub(last_hit) > self.idle_window_ms {
            self.reset();
            return true;
        }
        false
    }

    /// Move the last-hit stamp forward (time spent paused does not count)
    pub fn shift(&mut self, delta_ms: u64) {
        if let Some(last_hit) = self.state.last_hit_ms.as_mut() {
            *last_hit = last_hit.saturating_add(delta_ms);
        }
    }

    fn reset(&mut self) {
        self.state.count = 0;
        self.state.multiplier = 1.0;
    }

    pub fn state(&self) -> ComboState {
        self.state
    }

    pub fn count(&self) -> u32 {
        self.state.count
    }

    pub fn multiplier(&self) -> f32 {
        self.state.multiplier
    }

    pub fn best(&self) -> u32 {
        self.best
    }
}
