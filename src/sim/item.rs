//! Falling items, the cart, and the boxes used to collide them
//!
//! Coordinates are logical pixels with y growing downward. A falling item's
//! `pos.x` is its horizontal centre and `pos.y` its top edge; the cart's
//! `pos` is its top-left corner.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Unique id of a falling item within a round
pub type ItemId = u32;

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Pulls nearby valuables toward the cart
    Magnet,
    /// Absorbs exactly one hazard hit
    Shield,
    /// Scales score gains
    Multiplier,
    /// Instantly removes a share of the blockages
    ClearBlockages,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::Magnet,
        PowerUpKind::Shield,
        PowerUpKind::Multiplier,
        PowerUpKind::ClearBlockages,
    ];

    /// Whether the effect runs on a timer rather than firing once
    pub fn is_timed(self) -> bool {
        !matches!(self, PowerUpKind::ClearBlockages)
    }
}

/// Falling item types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ItemKind {
    /// Ordinary catch
    #[default]
    Fruit,
    Gem,
    Diamond,
    Bomb,
    Spike,
    PowerUp(PowerUpKind),
}

/// Broad gameplay class of an item kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemClass {
    Ordinary,
    Valuable,
    Hazard,
    PowerUp,
}

impl ItemKind {
    pub fn class(self) -> ItemClass {
        match self {
            ItemKind::Fruit => ItemClass::Ordinary,
            ItemKind::Gem | ItemKind::Diamond => ItemClass::Valuable,
            ItemKind::Bomb | ItemKind::Spike => ItemClass::Hazard,
            ItemKind::PowerUp(_) => ItemClass::PowerUp,
        }
    }

    #[inline]
    pub fn is_hazard(self) -> bool {
        self.class() == ItemClass::Hazard
    }

    #[inline]
    pub fn is_valuable(self) -> bool {
        self.class() == ItemClass::Valuable
    }

    /// Base (score, coins) awarded for catching this kind
    pub fn reward(self) -> (i64, i64) {
        match self {
            ItemKind::Fruit => (10, 1),
            ItemKind::Gem => (50, 5),
            ItemKind::Diamond => (100, 10),
            ItemKind::PowerUp(_) => (5, 0),
            ItemKind::Bomb | ItemKind::Spike => (0, 0),
        }
    }

    /// Fall speed relative to the base speed
    pub fn speed_factor(self) -> f32 {
        match self {
            ItemKind::Fruit => 1.0,
            ItemKind::Gem => 1.1,
            ItemKind::Diamond => 1.25,
            ItemKind::Bomb => 1.0,
            ItemKind::Spike => 1.2,
            ItemKind::PowerUp(_) => 0.9,
        }
    }
}

/// Axis-aligned bounding box (top-left + size)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }
}

/// A falling item entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallingItem {
    pub id: ItemId,
    pub kind: ItemKind,
    /// Horizontal centre, top edge
    pub pos: Vec2,
    /// Pixels per frame
    pub fall_speed: f32,
    /// Logical box size
    pub size: Vec2,
    /// Spawn weight this kind was drawn with
    pub weight: u32,
    pub collected: bool,
}

impl FallingItem {
    pub fn new(id: ItemId, kind: ItemKind, pos: Vec2, fall_speed: f32, size: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            fall_speed,
            size,
            weight: 0,
            collected: false,
        }
    }

    /// Box centred horizontally on `pos.x`
    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            self.pos.x - self.size.x / 2.0,
            self.pos.y,
            self.size.x,
            self.size.y,
        )
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }
}

/// The player's cart (read-only to the simulation)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
}

impl Cart {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb {
            min: self.pos,
            size: self.size,
        }
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.pos.x + self.size.x / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_bounds_centered() {
        let item = FallingItem::new(1, ItemKind::Fruit, Vec2::new(200.0, 10.0), 5.0, Vec2::splat(40.0));
        let b = item.bounds();
        assert_eq!(b.min, Vec2::new(180.0, 10.0));
        assert_eq!(b.max(), Vec2::new(220.0, 50.0));
        assert_eq!(item.bottom(), 50.0);
    }

    #[test]
    fn test_item_classes() {
        assert_eq!(ItemKind::Fruit.class(), ItemClass::Ordinary);
        assert!(ItemKind::Diamond.is_valuable());
        assert!(ItemKind::Spike.is_hazard());
        assert_eq!(ItemKind::PowerUp(PowerUpKind::Shield).class(), ItemClass::PowerUp);
        assert!(!PowerUpKind::ClearBlockages.is_timed());
    }

    #[test]
    fn test_cart_center() {
        let cart = Cart::new(200.0, 600.0, 100.0, 40.0);
        assert_eq!(cart.center_x(), 250.0);
        assert_eq!(cart.bounds().max(), Vec2::new(300.0, 640.0));
    }
}
