//! Time-boxed power-up effects

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::item::PowerUpKind;

/// An active effect and when it runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePowerUp {
    pub kind: PowerUpKind,
    pub expires_at_ms: u64,
}

impl ActivePowerUp {
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at_ms.saturating_sub(now_ms)
    }
}

/// Effect -> expiry map, ticked once per frame
///
/// Ordered by kind so expiry callbacks fire in a stable order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerUpState {
    expiries: BTreeMap<PowerUpKind, u64>,
}

impl PowerUpState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) an effect. Durations do not stack: a second pickup
    /// overwrites the timer.
    pub fn activate(&mut self, kind: PowerUpKind, duration_ms: u64, now_ms: u64) {
        self.expiries.insert(kind, now_ms.saturating_add(duration_ms));
    }

    /// Remove an effect early (e.g. shield consumed). Returns whether it was present.
    pub fn deactivate(&mut self, kind: PowerUpKind) -> bool {
        self.expiries.remove(&kind).is_some()
    }

    pub fn is_active(&self, kind: PowerUpKind, now_ms: u64) -> bool {
        self.expiries.get(&kind).is_some_and(|&expiry| now_ms < expiry)
    }

    /// Drop expired effects, reporting each through `on_expire`
    pub fn tick(&mut self, now_ms: u64, mut on_expire: impl FnMut(PowerUpKind)) {
        let expired: Vec<PowerUpKind> = self
            .expiries
            .iter()
            .filter(|&(_, &expiry)| now_ms >= expiry)
            .map(|(&kind, _)| kind)
            .collect();
        for kind in expired {
            self.expiries.remove(&kind);
            on_expire(kind);
        }
    }

    /// Push every expiry back (time spent paused does not count)
    pub fn shift(&mut self, delta_ms: u64) {
        for expiry in self.expiries.values_mut() {
            *expiry = expiry.saturating_add(delta_ms);
        }
    }

    /// Snapshot of active effects
    pub fn active(&self) -> Vec<ActivePowerUp> {
        self.expiries
            .iter()
            .map(|(&kind, &expires_at_ms)| ActivePowerUp {
                kind,
                expires_at_ms,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.expiries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.expiries.is_empty()
    }
}
