//! Collision detection between falling items and the cart
//!
//! Pure functions over axis-aligned boxes. The cart gets a slightly enlarged
//! hitbox so catches near the rim still count, and the range tests used by
//! the magnet and bomb blast only look at horizontal distance.

use serde::{Deserialize, Serialize};

use super::item::{Aabb, Cart, FallingItem, ItemKind, PowerUpKind};
use crate::consts::{HITBOX_HEIGHT_SCALE, HITBOX_WIDTH_SCALE};

/// Scale factors for the forgiving cart hitbox
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartHitbox {
    pub width_scale: f32,
    pub height_scale: f32,
}

impl Default for CartHitbox {
    fn default() -> Self {
        Self {
            width_scale: HITBOX_WIDTH_SCALE,
            height_scale: HITBOX_HEIGHT_SCALE,
        }
    }
}

impl CartHitbox {
    /// Extended cart box: wider on both sides, taller on top only
    pub fn extend(&self, cart: &Cart) -> Aabb {
        let w = cart.size.x * self.width_scale;
        let h = cart.size.y * self.height_scale;
        Aabb::new(
            cart.pos.x - (w - cart.size.x) / 2.0,
            cart.pos.y - (h - cart.size.y),
            w,
            h,
        )
    }
}

/// Standard AABB overlap. Touching edges do not collide.
#[inline]
pub fn boxes_overlap(a: &Aabb, b: &Aabb) -> bool {
    let a_max = a.max();
    let b_max = b.max();
    a.min.x < b_max.x && a_max.x > b.min.x && a.min.y < b_max.y && a_max.y > b.min.y
}

/// Check whether an item touches the cart's extended hitbox
///
/// Already-collected items never collide again.
pub fn check_item_collision(item: &FallingItem, cart: &Cart, hitbox: &CartHitbox) -> bool {
    if item.collected {
        return false;
    }
    boxes_overlap(&item.bounds(), &hitbox.extend(cart))
}

/// Cheap vertical pre-filter: the item's bottom has reached the cart's top
/// and its top is still above the cart's bottom.
#[inline]
pub fn is_item_in_cart_range(item: &FallingItem, cart: &Cart) -> bool {
    item.bottom() >= cart.pos.y && item.top() < cart.pos.y + cart.size.y
}

/// Horizontal distance between item centre and cart centre
#[inline]
fn horizontal_distance(item: &FallingItem, cart: &Cart) -> f32 {
    (item.pos.x - cart.center_x()).abs()
}

/// Whether an item is within magnet reach (vertical distance ignored)
pub fn check_magnet_range(item: &FallingItem, cart: &Cart, radius: f32) -> bool {
    horizontal_distance(item, cart) <= radius
}

/// Whether a bomb blast at the item reaches the cart (vertical distance ignored)
pub fn check_explosion_range(item: &FallingItem, cart: &Cart, radius: f32) -> bool {
    radius > 0.0 && horizontal_distance(item, cart) <= radius
}

/// Processing order for items colliding in the same frame (higher first)
pub fn collision_priority(kind: ItemKind) -> u8 {
    match kind {
        ItemKind::Diamond => 100,
        ItemKind::Gem => 90,
        ItemKind::PowerUp(PowerUpKind::Shield) => 80,
        ItemKind::PowerUp(_) => 70,
        ItemKind::Fruit => 50,
        ItemKind::Spike => 20,
        ItemKind::Bomb => 10,
    }
}
