//! Item spawning, difficulty curve, and the blockage policy
//!
//! The difficulty collaborator decides *what* falls and how fast; the
//! spawner only draws from its weight table with the round's seeded RNG.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::item::{FallingItem, ItemId, ItemKind, PowerUpKind};
use crate::tuning::Tuning;

/// Highest level the default curve reaches
pub const MAX_LEVEL: u32 = 10;

/// One row of a spawn table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnWeight {
    pub kind: ItemKind,
    pub weight: u32,
}

impl SpawnWeight {
    pub const fn new(kind: ItemKind, weight: u32) -> Self {
        Self { kind, weight }
    }
}

/// Difficulty collaborator: pure reads keyed by level
pub trait Difficulty {
    fn spawn_weights(&self, level: u32) -> Vec<SpawnWeight>;
    fn fall_speed_multiplier(&self, level: u32) -> f32;
    fn spawn_interval_ms(&self, level: u32) -> u64;
}

/// Default curve: more hazards, faster falls, denser spawns as levels rise
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DifficultyCurve;

impl Difficulty for DifficultyCurve {
    fn spawn_weights(&self, level: u32) -> Vec<SpawnWeight> {
        let step = level.clamp(1, MAX_LEVEL) - 1;
        vec![
            SpawnWeight::new(ItemKind::Fruit, 60),
            SpawnWeight::new(ItemKind::Gem, 12),
            SpawnWeight::new(ItemKind::Diamond, 3),
            SpawnWeight::new(ItemKind::Bomb, 10 + step * 2),
            SpawnWeight::new(ItemKind::Spike, 4 + step),
            SpawnWeight::new(ItemKind::PowerUp(PowerUpKind::Magnet), 3),
            SpawnWeight::new(ItemKind::PowerUp(PowerUpKind::Shield), 3),
            SpawnWeight::new(ItemKind::PowerUp(PowerUpKind::Multiplier), 2),
            SpawnWeight::new(ItemKind::PowerUp(PowerUpKind::ClearBlockages), 2),
        ]
    }

    fn fall_speed_multiplier(&self, level: u32) -> f32 {
        1.0 + (level.clamp(1, MAX_LEVEL) - 1) as f32 * 0.1
    }

    fn spawn_interval_ms(&self, level: u32) -> u64 {
        let step = (level.clamp(1, MAX_LEVEL) - 1) as u64;
        1200u64.saturating_sub(step * 80).max(400)
    }
}

/// Decides which uncaught items turn into blockages
pub trait BlockagePolicy {
    fn creates_blockage(&self, item: &FallingItem) -> bool;
}

impl<F: Fn(&FallingItem) -> bool> BlockagePolicy for F {
    fn creates_blockage(&self, item: &FallingItem) -> bool {
        self(item)
    }
}

/// Only missed hazards pile up
#[derive(Debug, Clone, Copy, Default)]
pub struct HazardsOnly;

impl BlockagePolicy for HazardsOnly {
    fn creates_blockage(&self, item: &FallingItem) -> bool {
        item.kind.is_hazard()
    }
}

/// Every miss piles up (power-ups excepted)
#[derive(Debug, Clone, Copy, Default)]
pub struct AllMisses;

impl BlockagePolicy for AllMisses {
    fn creates_blockage(&self, item: &FallingItem) -> bool {
        !matches!(item.kind, ItemKind::PowerUp(_))
    }
}

/// Weighted random item factory
#[derive(Debug, Clone)]
pub struct Spawner {
    rng: Pcg32,
    next_id: ItemId,
    play_width: f32,
    item_size: f32,
    base_fall_speed: f32,
}

impl Spawner {
    pub fn new(rng: Pcg32, tuning: &Tuning) -> Self {
        Self {
            rng,
            next_id: 1,
            play_width: tuning.play_width,
            item_size: tuning.item_size,
            base_fall_speed: tuning.base_fall_speed,
        }
    }

    pub fn from_seed(seed: u64, tuning: &Tuning) -> Self {
        Self::new(Pcg32::seed_from_u64(seed), tuning)
    }

    /// Draw one row from a weight table; `None` if every weight is zero
    pub fn pick(&mut self, weights: &[SpawnWeight]) -> Option<SpawnWeight> {
        let total: u32 = weights.iter().map(|w| w.weight).sum();
        if total == 0 {
            return None;
        }
        let mut roll = self.rng.random_range(0..total);
        for entry in weights {
            if roll < entry.weight {
                return Some(*entry);
            }
            roll -= entry.weight;
        }
        None
    }

    /// Spawn an item just above the play area
    pub fn spawn(&mut self, difficulty: &dyn Difficulty, level: u32) -> Option<FallingItem> {
        let entry = self.pick(&difficulty.spawn_weights(level))?;
        let half = self.item_size / 2.0;
        let x = if self.play_width > self.item_size {
            self.rng.random_range(half..=self.play_width - half)
        } else {
            self.play_width / 2.0
        };
        let speed = self.base_fall_speed
            * entry.kind.speed_factor()
            * difficulty.fall_speed_multiplier(level).max(0.0);

        let id = self.next_id;
        self.next_id += 1;
        let mut item = FallingItem::new(
            id,
            entry.kind,
            Vec2::new(x, -self.item_size),
            speed,
            Vec2::splat(self.item_size),
        );
        item.weight = entry.weight;
        Some(item)
    }

    /// Next spawn delay: the level's interval jittered by up to ±25%
    pub fn next_interval_ms(&mut self, difficulty: &dyn Difficulty, level: u32) -> u64 {
        let base = difficulty.spawn_interval_ms(level).max(1) as f32;
        let jitter = self.rng.random_range(0.75f32..=1.25);
        ((base * jitter).round() as u64).max(1)
    }

    /// Allocate an id without spawning (items injected by the host)
    pub fn next_item_id(&mut self) -> ItemId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_respects_zero_weights() {
        let mut spawner = Spawner::from_seed(7, &Tuning::default());
        let table = [
            SpawnWeight::new(ItemKind::Fruit, 0),
            SpawnWeight::new(ItemKind::Gem, 5),
            SpawnWeight::new(ItemKind::Bomb, 0),
        ];
        for _ in 0..100 {
            assert_eq!(spawner.pick(&table).map(|w| w.kind), Some(ItemKind::Gem));
        }
        assert_eq!(spawner.pick(&[SpawnWeight::new(ItemKind::Fruit, 0)]), None);
        assert_eq!(spawner.pick(&[]), None);
    }

    #[test]
    fn test_pick_roughly_follows_weights() {
        let mut spawner = Spawner::from_seed(42, &Tuning::default());
        let table = [
            SpawnWeight::new(ItemKind::Fruit, 90),
            SpawnWeight::new(ItemKind::Diamond, 10),
        ];
        let fruit = (0..2000)
            .filter(|_| spawner.pick(&table).map(|w| w.kind) == Some(ItemKind::Fruit))
            .count();
        assert!(fruit > 1600 && fruit < 1950, "fruit count {fruit}");
    }

    #[test]
    fn test_spawned_items_inside_play_area() {
        let tuning = Tuning::default();
        let mut spawner = Spawner::from_seed(3, &tuning);
        let mut last_id = 0;
        for _ in 0..200 {
            let item = spawner.spawn(&DifficultyCurve, 1).expect("non-empty table");
            assert!(item.id > last_id);
            last_id = item.id;
            assert!(item.bounds().min.x >= 0.0);
            assert!(item.bounds().max().x <= tuning.play_width);
            assert!(item.bottom() <= 0.0);
            assert!(item.fall_speed > 0.0);
            assert!(item.weight > 0);
            assert!(!item.collected);
        }
    }

    #[test]
    fn test_same_seed_same_items() {
        let tuning = Tuning::default();
        let mut a = Spawner::from_seed(99, &tuning);
        let mut b = Spawner::from_seed(99, &tuning);
        for _ in 0..50 {
            assert_eq!(a.spawn(&DifficultyCurve, 3), b.spawn(&DifficultyCurve, 3));
            assert_eq!(
                a.next_interval_ms(&DifficultyCurve, 3),
                b.next_interval_ms(&DifficultyCurve, 3)
            );
        }
    }

    #[test]
    fn test_curve_gets_harder() {
        let curve = DifficultyCurve;
        assert!(curve.fall_speed_multiplier(5) > curve.fall_speed_multiplier(1));
        assert!(curve.spawn_interval_ms(5) < curve.spawn_interval_ms(1));
        assert_eq!(curve.spawn_interval_ms(MAX_LEVEL), 480);
        assert_eq!(curve.spawn_interval_ms(99), curve.spawn_interval_ms(MAX_LEVEL));
        let bombs = |level| {
            curve
                .spawn_weights(level)
                .iter()
                .find(|w| w.kind == ItemKind::Bomb)
                .map(|w| w.weight)
        };
        assert!(bombs(8) > bombs(1));
    }

    #[test]
    fn test_interval_jitter_bounds() {
        let mut spawner = Spawner::from_seed(1, &Tuning::default());
        for _ in 0..100 {
            let ms = spawner.next_interval_ms(&DifficultyCurve, 1);
            assert!((900..=1500).contains(&ms), "interval {ms}");
        }
    }

    #[test]
    fn test_blockage_policies() {
        let bomb = FallingItem::new(1, ItemKind::Bomb, Vec2::ZERO, 1.0, Vec2::ONE);
        let fruit = FallingItem::new(2, ItemKind::Fruit, Vec2::ZERO, 1.0, Vec2::ONE);
        let magnet = FallingItem::new(
            3,
            ItemKind::PowerUp(PowerUpKind::Magnet),
            Vec2::ZERO,
            1.0,
            Vec2::ONE,
        );
        assert!(HazardsOnly.creates_blockage(&bomb));
        assert!(!HazardsOnly.creates_blockage(&fruit));
        assert!(AllMisses.creates_blockage(&fruit));
        assert!(!AllMisses.creates_blockage(&magnet));
        let only_fruit = |item: &FallingItem| item.kind == ItemKind::Fruit;
        assert!(only_fruit.creates_blockage(&fruit));
        assert!(!only_fruit.creates_blockage(&bomb));
    }
}
