//! Per-round milestones, each unlocked at most once

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Achievement {
    Combo10,
    Combo25,
    Combo50,
    Survive60,
    Survive180,
    FirstPowerUp,
    GemCollector,
    ShieldBlock,
}

/// Catches of valuables needed for [`Achievement::GemCollector`]
pub const GEM_COLLECTOR_TARGET: u32 = 10;

const COMBO_MILESTONES: [(u32, Achievement); 3] = [
    (10, Achievement::Combo10),
    (25, Achievement::Combo25),
    (50, Achievement::Combo50),
];

const SURVIVAL_MILESTONES: [(u64, Achievement); 2] = [
    (60, Achievement::Survive60),
    (180, Achievement::Survive180),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AchievementTracker {
    unlocked: BTreeSet<Achievement>,
}

impl AchievementTracker {
    /// Record an achievement; returns it only the first time
    pub fn unlock(&mut self, achievement: Achievement) -> Option<Achievement> {
        self.unlocked.insert(achievement).then_some(achievement)
    }

    pub fn on_combo(&mut self, count: u32) -> Vec<Achievement> {
        COMBO_MILESTONES
            .iter()
            .filter(|(threshold, _)| count >= *threshold)
            .filter_map(|&(_, a)| self.unlock(a))
            .collect()
    }

    pub fn on_time_survived(&mut self, secs: u64) -> Vec<Achievement> {
        SURVIVAL_MILESTONES
            .iter()
            .filter(|(threshold, _)| secs >= *threshold)
            .filter_map(|&(_, a)| self.unlock(a))
            .collect()
    }

    pub fn on_valuables(&mut self, caught: u32) -> Option<Achievement> {
        (caught >= GEM_COLLECTOR_TARGET)
            .then_some(Achievement::GemCollector)
            .and_then(|a| self.unlock(a))
    }

    pub fn is_unlocked(&self, achievement: Achievement) -> bool {
        self.unlocked.contains(&achievement)
    }

    pub fn unlocked(&self) -> impl Iterator<Item = Achievement> + '_ {
        self.unlocked.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlock_once() {
        let mut tracker = AchievementTracker::default();
        assert_eq!(tracker.unlock(Achievement::FirstPowerUp), Some(Achievement::FirstPowerUp));
        assert_eq!(tracker.unlock(Achievement::FirstPowerUp), None);
        assert!(tracker.is_unlocked(Achievement::FirstPowerUp));
    }

    #[test]
    fn test_combo_milestones() {
        let mut tracker = AchievementTracker::default();
        assert!(tracker.on_combo(9).is_empty());
        assert_eq!(tracker.on_combo(10), vec![Achievement::Combo10]);
        assert!(tracker.on_combo(11).is_empty());
        assert_eq!(tracker.on_combo(50), vec![Achievement::Combo25, Achievement::Combo50]);
    }

    #[test]
    fn test_survival_and_valuables() {
        let mut tracker = AchievementTracker::default();
        assert!(tracker.on_time_survived(59).is_empty());
        assert_eq!(tracker.on_time_survived(60), vec![Achievement::Survive60]);
        assert_eq!(tracker.on_valuables(9), None);
        assert_eq!(tracker.on_valuables(10), Some(Achievement::GemCollector));
        assert_eq!(tracker.on_valuables(11), None);
        assert_eq!(tracker.unlocked().count(), 2);
    }
}
