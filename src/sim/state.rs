//! Round state and the read-only views handed to collaborators

use serde::{Deserialize, Serialize};

use super::blockage::{Blockage, WarningLevel};
use super::combo::ComboState;
use super::item::FallingItem;
use super::powerup::ActivePowerUp;

/// Current phase of a round
///
/// `Idle -> Active <-> Paused -> Ended`; `Ended` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Created, not started
    Idle,
    /// Drivers running
    Active,
    /// Drivers halted, entities frozen
    Paused,
    /// Round over
    Ended,
}

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    OutOfLives,
    /// A miss found no room in a full blockage stack
    Blocked,
    /// Ended by the host (quit, teardown)
    Stopped,
}

/// Running totals for the round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundStats {
    pub score: u64,
    pub coins: u64,
    pub lives: u32,
    pub time_survived_secs: u64,
    /// Hazards that reached the floor without hurting the cart
    pub obstacles_avoided: u32,
    pub power_ups_used: u32,
    pub items_caught: u32,
    pub valuables_caught: u32,
    pub items_missed: u32,
    pub blockages_created: u32,
}

impl RoundStats {
    pub fn new(lives: u32) -> Self {
        Self {
            lives,
            ..Default::default()
        }
    }

    /// Apply a signed score delta without wrapping below zero
    pub fn add_score(&mut self, delta: i64) {
        self.score = self.score.saturating_add_signed(delta);
    }

    pub fn add_coins(&mut self, delta: i64) {
        self.coins = self.coins.saturating_add_signed(delta);
    }
}

/// Record handed to the session collaborator at round end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub score: u64,
    pub coins: u64,
    pub time_survived_secs: u64,
    /// Best combo reached
    pub combo: u32,
    pub obstacles_avoided: u32,
    pub power_ups_used: u32,
    pub end_reason: EndReason,
}

impl RoundSummary {
    pub fn from_stats(stats: &RoundStats, best_combo: u32, end_reason: EndReason) -> Self {
        Self {
            score: stats.score,
            coins: stats.coins,
            time_survived_secs: stats.time_survived_secs,
            combo: best_combo,
            obstacles_avoided: stats.obstacles_avoided,
            power_ups_used: stats.power_ups_used,
            end_reason,
        }
    }
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub phase: RoundPhase,
    pub level: u32,
    pub stats: RoundStats,
    pub items: Vec<FallingItem>,
    pub blockages: Vec<Blockage>,
    pub blockage_percentage: f32,
    pub warning_level: WarningLevel,
    pub power_ups: Vec<ActivePowerUp>,
    pub combo: ComboState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_never_underflows() {
        let mut stats = RoundStats::new(3);
        stats.add_score(5);
        stats.add_score(-20);
        assert_eq!(stats.score, 0);
        stats.add_coins(3);
        assert_eq!(stats.coins, 3);
    }

    #[test]
    fn test_summary_serializes_to_json() {
        let mut stats = RoundStats::new(3);
        stats.score = 120;
        stats.time_survived_secs = 42;
        let summary = RoundSummary::from_stats(&stats, 7, EndReason::Blocked);
        let json = serde_json::to_string(&summary).expect("serializable");
        assert!(json.contains("\"score\":120"));
        assert!(json.contains("\"combo\":7"));
        let back: RoundSummary = serde_json::from_str(&json).expect("deserializable");
        assert_eq!(back, summary);
    }
}
