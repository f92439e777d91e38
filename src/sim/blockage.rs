//! Blockage stacking: missed items pile up near the cart
//!
//! Each miss that the blockage policy accepts becomes an obstacle placed in
//! the lowest layer where its horizontal span is free. When every layer is
//! taken and a new layer would exceed `max_layers`, the round is lost.
//!
//! Layers live in stable slots (with a free list) and a separate dense
//! `order` vector maps visual index -> slot. Removing a layer only shifts
//! slot ids in `order`; blockages are never moved, and their layer index
//! and y position are derived when a snapshot is taken.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::item::{FallingItem, ItemClass, ItemKind};
use crate::tuning::Tuning;

pub type BlockageId = u32;

/// Blockage placement and health parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockageConfig {
    pub max_layers: usize,
    pub block_height: f32,
    pub block_spacing: f32,
    pub play_width: f32,
    /// Floor line; layer 0 sits directly on it
    pub floor_y: f32,
    pub danger_threshold: f32,
    pub warning_thresholds: [f32; 3],
    pub hazard_health: u32,
    pub valuable_health: u32,
    pub ordinary_health: u32,
}

impl Default for BlockageConfig {
    fn default() -> Self {
        Self::from(&Tuning::default())
    }
}

impl From<&Tuning> for BlockageConfig {
    fn from(t: &Tuning) -> Self {
        Self {
            max_layers: t.max_layers,
            block_height: t.block_height,
            block_spacing: t.block_spacing,
            play_width: t.play_width,
            floor_y: t.play_height,
            danger_threshold: t.danger_threshold,
            warning_thresholds: t.warning_thresholds,
            hazard_health: t.hazard_block_health,
            valuable_health: t.valuable_block_health,
            ordinary_health: t.ordinary_block_health,
        }
    }
}

impl BlockageConfig {
    /// Tougher obstacles from bigger misses
    pub fn health_for(&self, source: ItemKind) -> u32 {
        match source.class() {
            ItemClass::Hazard => self.hazard_health,
            ItemClass::Valuable => self.valuable_health,
            ItemClass::Ordinary | ItemClass::PowerUp => self.ordinary_health,
        }
    }

    /// Top edge of blocks in the given layer
    pub fn layer_y(&self, layer: usize) -> f32 {
        let base_y = self.floor_y - self.block_height;
        (base_y - layer as f32 * (self.block_height + self.block_spacing)).max(0.0)
    }
}

/// UI signal for how full the blockage stack is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WarningLevel {
    Safe,
    Warning,
    Danger,
    Critical,
}

/// Read-only view of an obstacle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blockage {
    pub id: BlockageId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Dense layer index, 0 = nearest the floor
    pub layer: usize,
    pub source: ItemKind,
    pub health: u32,
    pub max_health: u32,
    /// Damaged but not yet destroyed
    pub is_breaking: bool,
}

#[derive(Debug, Clone)]
struct StoredBlockage {
    id: BlockageId,
    x: f32,
    width: f32,
    source: ItemKind,
    health: u32,
    max_health: u32,
}

impl StoredBlockage {
    #[inline]
    fn overlaps_span(&self, x: f32, width: f32) -> bool {
        self.x < x + width && self.x + self.width > x
    }
}

#[derive(Debug, Clone, Default)]
struct Layer {
    blockages: Vec<StoredBlockage>,
}

impl Layer {
    fn fits(&self, x: f32, width: f32) -> bool {
        !self.blockages.iter().any(|b| b.overlaps_span(x, width))
    }
}

/// Result of converting a miss into a blockage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOutcome {
    /// The placed obstacle, `None` when there was no room
    pub placed: Option<Blockage>,
    /// No layer fits and the stack is already at `max_layers`
    pub game_over: bool,
    pub percentage: f32,
    pub is_dangerous: bool,
}

/// Result of [`BlockageManager::check_cart_passage`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartPassage {
    pub blocked: bool,
    pub colliding: Vec<Blockage>,
}

/// Result of [`BlockageManager::damage_blockage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// Unknown id (already removed this frame, or never existed)
    NotFound,
    Damaged { health: u32 },
    Destroyed { layer_removed: bool },
}

/// Stacked obstacles across bounded horizontal layers
#[derive(Debug, Clone)]
pub struct BlockageManager {
    config: BlockageConfig,
    /// Stable layer storage; `None` slots are on the free list
    slots: Vec<Option<Layer>>,
    free_slots: Vec<usize>,
    /// Dense visual order: `order[layer_index] = slot`
    order: Vec<usize>,
    /// Blockage id -> slot
    index: HashMap<BlockageId, usize>,
    next_id: BlockageId,
}

impl Default for BlockageManager {
    fn default() -> Self {
        Self::new(BlockageConfig::default())
    }
}

impl BlockageManager {
    pub fn new(config: BlockageConfig) -> Self {
        Self {
            slots: Vec::with_capacity(config.max_layers),
            free_slots: Vec::new(),
            order: Vec::with_capacity(config.max_layers),
            index: HashMap::new(),
            next_id: 1,
            config,
        }
    }

    pub fn config(&self) -> &BlockageConfig {
        &self.config
    }

    /// Convert a missed item into an obstacle in the lowest layer it fits
    pub fn add_missed_item(&mut self, item: &FallingItem) -> AddOutcome {
        let play_width = self.config.play_width.max(0.0);
        let width = item.size.x.max(1.0).min(play_width);
        let x = (item.pos.x - width / 2.0).max(0.0).min(play_width - width);

        let existing = self.order.iter().copied().find(|&slot| {
            self.slots[slot]
                .as_ref()
                .is_some_and(|layer| layer.fits(x, width))
        });

        let slot = match existing {
            Some(slot) => slot,
            None if self.order.len() < self.config.max_layers => {
                let slot = self.allocate_slot();
                self.order.push(slot);
                slot
            }
            None => {
                log::debug!("No room for blockage at x={x:.1}; stack full");
                return AddOutcome {
                    placed: None,
                    game_over: true,
                    percentage: self.blockage_percentage(),
                    is_dangerous: self.is_dangerous(),
                };
            }
        };

        let health = self.config.health_for(item.kind);
        let id = self.next_id;
        self.next_id += 1;
        let stored = StoredBlockage {
            id,
            x,
            width,
            source: item.kind,
            health,
            max_health: health,
        };
        if let Some(layer) = self.slots[slot].as_mut() {
            layer.blockages.push(stored);
        }
        self.index.insert(id, slot);

        let placed = self.get(id);
        if let Some(b) = &placed {
            log::debug!(
                "Blockage {} from {:?} placed in layer {} (hp {})",
                b.id,
                b.source,
                b.layer,
                b.health
            );
        }

        AddOutcome {
            placed,
            game_over: false,
            percentage: self.blockage_percentage(),
            is_dangerous: self.is_dangerous(),
        }
    }

    /// Blockages overlapping the cart's horizontal span, across all layers
    pub fn check_cart_passage(&self, cart_x: f32, cart_width: f32) -> CartPassage {
        let colliding: Vec<Blockage> = self
            .views()
            .filter(|b| b.x < cart_x + cart_width && b.x + b.width > cart_x)
            .collect();
        CartPassage {
            blocked: !colliding.is_empty(),
            colliding,
        }
    }

    /// Reduce an obstacle's health, removing it (and its layer, if emptied)
    /// once health reaches zero
    pub fn damage_blockage(&mut self, id: BlockageId, amount: u32) -> DamageOutcome {
        let Some(&slot) = self.index.get(&id) else {
            return DamageOutcome::NotFound;
        };
        let Some(layer) = self.slots[slot].as_mut() else {
            return DamageOutcome::NotFound;
        };
        let Some(pos) = layer.blockages.iter().position(|b| b.id == id) else {
            return DamageOutcome::NotFound;
        };

        let blockage = &mut layer.blockages[pos];
        blockage.health = blockage.health.saturating_sub(amount);
        if blockage.health > 0 {
            return DamageOutcome::Damaged {
                health: blockage.health,
            };
        }

        layer.blockages.remove(pos);
        self.index.remove(&id);
        let layer_removed = self.release_if_empty(slot);
        DamageOutcome::Destroyed { layer_removed }
    }

    /// Remove `ceil(total * fraction)` obstacles, topmost layers first.
    /// Returns how many were removed.
    pub fn clear_blockages(&mut self, fraction: f32) -> usize {
        let total = self.len();
        let target = ((total as f32 * crate::clamp_unit(fraction)).ceil() as usize).min(total);

        let mut removed = 0;
        for layer_index in (0..self.order.len()).rev() {
            if removed == target {
                break;
            }
            let slot = self.order[layer_index];
            if let Some(layer) = self.slots[slot].as_mut() {
                while removed < target {
                    let Some(b) = layer.blockages.pop() else {
                        break;
                    };
                    self.index.remove(&b.id);
                    removed += 1;
                }
            }
            self.release_if_empty(slot);
        }

        if removed > 0 {
            log::debug!("Cleared {removed} of {total} blockages");
        }
        removed
    }

    /// Filled layers as a fraction of `max_layers`
    pub fn blockage_percentage(&self) -> f32 {
        crate::clamp_unit(self.order.len() as f32 / self.config.max_layers as f32)
    }

    pub fn is_dangerous(&self) -> bool {
        self.blockage_percentage() > self.config.danger_threshold
    }

    pub fn warning_level(&self) -> WarningLevel {
        let pct = self.blockage_percentage();
        let [safe, warning, danger] = self.config.warning_thresholds;
        if pct < safe {
            WarningLevel::Safe
        } else if pct < warning {
            WarningLevel::Warning
        } else if pct < danger {
            WarningLevel::Danger
        } else {
            WarningLevel::Critical
        }
    }

    /// Every layer is in use
    pub fn is_game_over(&self) -> bool {
        self.order.len() >= self.config.max_layers
    }

    pub fn layer_count(&self) -> usize {
        self.order.len()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&self, id: BlockageId) -> Option<Blockage> {
        let slot = *self.index.get(&id)?;
        let layer_index = self.order.iter().position(|&s| s == slot)?;
        let layer = self.slots[slot].as_ref()?;
        layer
            .blockages
            .iter()
            .find(|b| b.id == id)
            .map(|b| self.view(b, layer_index))
    }

    /// Snapshot of every obstacle, bottom layer first
    pub fn all_blockages(&self) -> Vec<Blockage> {
        self.views().collect()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_slots.clear();
        self.order.clear();
        self.index.clear();
    }

    fn views(&self) -> impl Iterator<Item = Blockage> + '_ {
        self.order
            .iter()
            .enumerate()
            .filter_map(|(layer_index, &slot)| {
                self.slots[slot].as_ref().map(|layer| (layer_index, layer))
            })
            .flat_map(move |(layer_index, layer)| {
                layer.blockages.iter().map(move |b| self.view(b, layer_index))
            })
    }

    fn view(&self, b: &StoredBlockage, layer_index: usize) -> Blockage {
        Blockage {
            id: b.id,
            x: b.x,
            y: self.config.layer_y(layer_index),
            width: b.width,
            height: self.config.block_height,
            layer: layer_index,
            source: b.source,
            health: b.health,
            max_health: b.max_health,
            is_breaking: b.health < b.max_health,
        }
    }

    fn allocate_slot(&mut self) -> usize {
        if let Some(slot) = self.free_slots.pop() {
            self.slots[slot] = Some(Layer::default());
            slot
        } else {
            self.slots.push(Some(Layer::default()));
            self.slots.len() - 1
        }
    }

    /// Drop an emptied layer; layers above it slide down one index
    fn release_if_empty(&mut self, slot: usize) -> bool {
        let empty = self.slots[slot]
            .as_ref()
            .is_some_and(|layer| layer.blockages.is_empty());
        if !empty {
            return false;
        }
        self.slots[slot] = None;
        self.free_slots.push(slot);
        self.order.retain(|&s| s != slot);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use glam::Vec2;

    fn miss(kind: ItemKind, x: f32) -> FallingItem {
        FallingItem::new(0, kind, Vec2::new(x, 710.0), 4.0, Vec2::splat(40.0))
    }

    fn manager(max_layers: usize) -> BlockageManager {
        BlockageManager::new(BlockageConfig {
            max_layers,
            ..BlockageConfig::default()
        })
    }

    fn assert_layers_disjoint(m: &BlockageManager) {
        let all = m.all_blockages();
        for a in &all {
            for b in &all {
                if a.id != b.id && a.layer == b.layer {
                    assert!(
                        !(a.x < b.x + b.width && a.x + a.width > b.x),
                        "blockages {} and {} overlap in layer {}",
                        a.id,
                        b.id,
                        a.layer
                    );
                }
            }
        }
    }

    #[test]
    fn test_disjoint_spans_share_lowest_layer() {
        let mut m = manager(8);
        for x in [50.0, 150.0, 250.0, 350.0] {
            let out = m.add_missed_item(&miss(ItemKind::Bomb, x));
            assert_eq!(out.placed.map(|b| b.layer), Some(0));
        }
        assert_eq!(m.layer_count(), 1);
        assert_eq!(m.len(), 4);
        assert_layers_disjoint(&m);
    }

    #[test]
    fn test_stacking_until_game_over() {
        let max = 5;
        let mut m = manager(max);
        for n in 1..=max {
            let out = m.add_missed_item(&miss(ItemKind::Bomb, 200.0));
            assert!(!out.game_over);
            assert_eq!(out.placed.map(|b| b.layer), Some(n - 1));
            assert_eq!(m.layer_count(), n);
        }
        assert!(m.is_game_over());
        let out = m.add_missed_item(&miss(ItemKind::Bomb, 200.0));
        assert!(out.game_over);
        assert!(out.placed.is_none());
        assert_eq!(m.layer_count(), max);
    }

    #[test]
    fn test_lowest_free_layer_wins() {
        let mut m = manager(8);
        m.add_missed_item(&miss(ItemKind::Bomb, 100.0));
        m.add_missed_item(&miss(ItemKind::Bomb, 100.0));
        // Fits beside the first block in layer 0
        let out = m.add_missed_item(&miss(ItemKind::Bomb, 300.0));
        assert_eq!(out.placed.map(|b| b.layer), Some(0));
    }

    #[test]
    fn test_health_by_source() {
        let mut m = manager(8);
        let hazard = m.add_missed_item(&miss(ItemKind::Spike, 50.0)).placed.unwrap();
        let valuable = m.add_missed_item(&miss(ItemKind::Gem, 150.0)).placed.unwrap();
        let ordinary = m.add_missed_item(&miss(ItemKind::Fruit, 250.0)).placed.unwrap();
        assert_eq!(hazard.health, 3);
        assert_eq!(valuable.health, 2);
        assert_eq!(ordinary.health, 1);
        assert!(!hazard.is_breaking);
    }

    #[test]
    fn test_span_clamped_to_play_area() {
        let mut m = manager(8);
        let b = m.add_missed_item(&miss(ItemKind::Bomb, -30.0)).placed.unwrap();
        assert_eq!(b.x, 0.0);
        let b = m.add_missed_item(&miss(ItemKind::Bomb, 1000.0)).placed.unwrap();
        assert_eq!(b.x, PLAY_WIDTH - 40.0);
    }

    #[test]
    fn test_narrow_play_area_never_panics() {
        let mut m = BlockageManager::new(BlockageConfig {
            play_width: 0.5,
            ..BlockageConfig::default()
        });
        let tiny = FallingItem::new(0, ItemKind::Spike, Vec2::new(0.2, 710.0), 1.0, Vec2::splat(0.4));
        let out = m.add_missed_item(&tiny);
        let placed = out.placed.expect("room in an empty stack");
        assert_eq!(placed.x, 0.0);
        assert_eq!(placed.width, 0.5);
    }

    #[test]
    fn test_layer_y_positions() {
        let mut m = manager(8);
        let b0 = m.add_missed_item(&miss(ItemKind::Bomb, 200.0)).placed.unwrap();
        let b1 = m.add_missed_item(&miss(ItemKind::Bomb, 200.0)).placed.unwrap();
        assert_eq!(b0.y, PLAY_HEIGHT - BLOCK_HEIGHT);
        assert_eq!(b1.y, PLAY_HEIGHT - BLOCK_HEIGHT - (BLOCK_HEIGHT + BLOCK_SPACING));
    }

    #[test]
    fn test_damage_and_destroy() {
        let mut m = manager(8);
        let id = m.add_missed_item(&miss(ItemKind::Bomb, 200.0)).placed.unwrap().id;
        assert_eq!(m.damage_blockage(id, 1), DamageOutcome::Damaged { health: 2 });
        assert!(m.get(id).unwrap().is_breaking);
        assert_eq!(
            m.damage_blockage(id, 5),
            DamageOutcome::Destroyed { layer_removed: true }
        );
        assert_eq!(m.damage_blockage(id, 1), DamageOutcome::NotFound);
        assert_eq!(m.damage_blockage(9999, 1), DamageOutcome::NotFound);
        assert!(m.is_empty());
        assert_eq!(m.layer_count(), 0);
    }

    #[test]
    fn test_removing_middle_layer_shifts_upper_layers_down() {
        let mut m = manager(8);
        let ids: Vec<_> = (0..3)
            .map(|_| m.add_missed_item(&miss(ItemKind::Fruit, 200.0)).placed.unwrap().id)
            .collect();
        assert_eq!(m.damage_blockage(ids[1], 1), DamageOutcome::Destroyed { layer_removed: true });

        let top = m.get(ids[2]).unwrap();
        assert_eq!(top.layer, 1);
        assert_eq!(top.y, m.config().layer_y(1));
        assert_eq!(m.layer_count(), 2);

        // Freed slot is reused and the new layer goes on top
        let b = m.add_missed_item(&miss(ItemKind::Fruit, 200.0)).placed.unwrap();
        assert_eq!(b.layer, 2);
        let layers: Vec<_> = m.all_blockages().iter().map(|b| b.layer).collect();
        assert_eq!(layers, vec![0, 1, 2]);
    }

    #[test]
    fn test_clear_from_top_first() {
        let mut m = manager(8);
        let bottom = m.add_missed_item(&miss(ItemKind::Fruit, 200.0)).placed.unwrap().id;
        m.add_missed_item(&miss(ItemKind::Fruit, 200.0));
        m.add_missed_item(&miss(ItemKind::Fruit, 200.0));
        m.add_missed_item(&miss(ItemKind::Fruit, 200.0));

        // ceil(4 * 0.5) = 2 removed from layers 3 and 2
        assert_eq!(m.clear_blockages(0.5), 2);
        assert_eq!(m.layer_count(), 2);
        assert!(m.get(bottom).is_some());

        // ceil(2 * 0.1) = 1
        assert_eq!(m.clear_blockages(0.1), 1);
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn test_clear_all_resets_percentage() {
        let mut m = manager(4);
        for _ in 0..4 {
            m.add_missed_item(&miss(ItemKind::Bomb, 200.0));
        }
        assert_eq!(m.blockage_percentage(), 1.0);
        assert_eq!(m.clear_blockages(1.0), 4);
        assert_eq!(m.blockage_percentage(), 0.0);
        assert_eq!(m.clear_blockages(1.0), 0);
    }

    #[test]
    fn test_cart_passage() {
        let mut m = manager(8);
        m.add_missed_item(&miss(ItemKind::Bomb, 100.0)); // span 80..120
        m.add_missed_item(&miss(ItemKind::Bomb, 100.0));
        let passage = m.check_cart_passage(110.0, 100.0);
        assert!(passage.blocked);
        assert_eq!(passage.colliding.len(), 2);
        let passage = m.check_cart_passage(120.0, 100.0);
        assert!(!passage.blocked);
        assert!(passage.colliding.is_empty());
    }

    #[test]
    fn test_warning_levels_and_danger() {
        let mut m = manager(10);
        assert_eq!(m.warning_level(), WarningLevel::Safe);
        let mut outcomes = Vec::new();
        for _ in 0..8 {
            outcomes.push(m.add_missed_item(&miss(ItemKind::Bomb, 200.0)));
        }
        // 3/10 -> warning, 5/10 -> danger, 7/10 -> critical
        assert!(!outcomes[6].is_dangerous);
        assert!(outcomes[7].is_dangerous);
        assert_eq!(m.warning_level(), WarningLevel::Critical);
        m.clear_blockages(0.5);
        assert_eq!(m.warning_level(), WarningLevel::Warning);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn percentage_monotonic_while_filling(
                xs in proptest::collection::vec(0.0f32..400.0, 1..80),
            ) {
                let mut m = manager(6);
                let mut last = 0.0;
                for x in xs {
                    let out = m.add_missed_item(&miss(ItemKind::Bomb, x));
                    prop_assert!(out.percentage >= last);
                    prop_assert!(m.layer_count() <= 6);
                    last = out.percentage;
                }
                assert_layers_disjoint(&m);
                m.clear_blockages(1.0);
                prop_assert_eq!(m.blockage_percentage(), 0.0);
                prop_assert!(m.is_empty());
            }
        }
    }
}
