//! One movement frame
//!
//! Movement is applied before collision detection so items are never tested
//! against stale positions.

use super::collision::check_magnet_range;
use super::events::EventSink;
use super::handler::{CollisionHandler, FrameOutcome};
use super::item::{Cart, FallingItem, PowerUpKind};
use super::spawner::BlockagePolicy;
use crate::tuning::Tuning;

/// Advance every live item by its fall speed
pub fn advance_items(items: &mut [FallingItem]) {
    for item in items.iter_mut().filter(|item| !item.collected) {
        item.pos.y += item.fall_speed;
    }
}

/// Pull valuables within reach toward the cart centre by a fraction of the
/// remaining horizontal gap (decaying pursuit, never a snap)
pub fn apply_magnet(items: &mut [FallingItem], cart: &Cart, tuning: &Tuning) {
    let target = cart.center_x();
    for item in items.iter_mut() {
        if item.collected || !item.kind.is_valuable() {
            continue;
        }
        if !check_magnet_range(item, cart, tuning.magnet_radius) {
            continue;
        }
        let half = item.size.x / 2.0;
        let x = item.pos.x + (target - item.pos.x) * tuning.magnet_pull;
        item.pos.x = x.clamp(half, (tuning.play_width - half).max(half));
    }
}

/// Move, attract, collide, then expire power-ups
pub fn step_frame<S: EventSink>(
    items: &mut Vec<FallingItem>,
    cart: &Cart,
    handler: &mut CollisionHandler<S>,
    policy: &dyn BlockagePolicy,
    tuning: &Tuning,
    now_ms: u64,
) -> FrameOutcome {
    advance_items(items);
    if handler.power_ups().is_active(PowerUpKind::Magnet, now_ms) {
        apply_magnet(items, cart, tuning);
    }
    let outcome = handler.process_frame(items, cart, now_ms, policy);
    handler.tick_power_ups(now_ms);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::EventLog;
    use crate::sim::item::ItemKind;
    use crate::sim::spawner::HazardsOnly;
    use glam::Vec2;

    fn item(id: u32, kind: ItemKind, x: f32, y: f32) -> FallingItem {
        FallingItem::new(id, kind, Vec2::new(x, y), 5.0, Vec2::splat(40.0))
    }

    #[test]
    fn test_advance_skips_collected() {
        let mut items = vec![item(1, ItemKind::Fruit, 100.0, 0.0), item(2, ItemKind::Fruit, 100.0, 0.0)];
        items[1].collected = true;
        advance_items(&mut items);
        assert_eq!(items[0].pos.y, 5.0);
        assert_eq!(items[1].pos.y, 0.0);
    }

    #[test]
    fn test_magnet_is_decaying_pursuit() {
        let tuning = Tuning::default();
        let cart = Cart::new(150.0, 600.0, 100.0, 40.0); // centre 200
        let mut items = vec![
            item(1, ItemKind::Gem, 300.0, 100.0),
            item(2, ItemKind::Fruit, 300.0, 100.0),
            item(3, ItemKind::Diamond, 390.0, 100.0),
        ];
        apply_magnet(&mut items, &cart, &tuning);
        // Gap 100 closes by 15%
        assert!((items[0].pos.x - 285.0).abs() < 1e-3);
        // Ordinary items ignore the magnet
        assert_eq!(items[1].pos.x, 300.0);
        // Out of reach (190 > 150)
        assert_eq!(items[2].pos.x, 390.0);

        let mut prev_gap = (items[0].pos.x - 200.0).abs();
        for _ in 0..20 {
            apply_magnet(&mut items, &cart, &tuning);
            let gap = (items[0].pos.x - 200.0).abs();
            assert!(gap < prev_gap && gap > 0.0);
            prev_gap = gap;
        }
    }

    #[test]
    fn test_step_frame_moves_before_colliding() {
        let tuning = Tuning::default();
        let mut handler = CollisionHandler::new(EventLog::new(), &tuning);
        let cart = Cart::new(150.0, 600.0, 100.0, 40.0);
        // Bottom at 599: only in range after this frame's move
        let mut items = vec![item(1, ItemKind::Fruit, 200.0, 559.0)];
        let out = step_frame(&mut items, &cart, &mut handler, &HazardsOnly, &tuning, 16);
        assert_eq!(out.caught, 1);
        assert!(items.is_empty());
    }
}
