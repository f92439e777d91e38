//! Collision orchestration: turns catches and misses into game effects
//!
//! The handler owns the per-round subsystems (combo, power-ups, blockages,
//! achievements, stats) and reports every change through the injected
//! [`EventSink`].

use std::cmp::Reverse;

use super::achievements::{Achievement, AchievementTracker};
use super::blockage::{AddOutcome, BlockageConfig, BlockageId, BlockageManager, DamageOutcome};
use super::collision::{
    CartHitbox, check_explosion_range, check_item_collision, collision_priority,
    is_item_in_cart_range,
};
use super::combo::ComboSystem;
use super::events::{EventSink, SoundCue};
use super::item::{Cart, FallingItem, ItemKind, PowerUpKind};
use super::powerup::PowerUpState;
use super::spawner::BlockagePolicy;
use super::state::{EndReason, RoundStats};
use crate::tuning::Tuning;

/// What a single catch did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// No live item with that id (already removed, or never spawned)
    NotFound,
    /// Item was already collected earlier this frame
    AlreadyCollected,
    Scored { score: i64, coins: i64 },
    PowerUp(PowerUpKind),
    ShieldAbsorbed,
    LifeLost,
}

/// What an uncaught item did on reaching the floor
#[derive(Debug, Clone, PartialEq)]
pub enum MissOutcome {
    /// Disappeared without effect
    Vanished,
    /// A hazard that fell clear of the cart
    Dodged,
    /// A bomb that went off beside the cart
    Blasted(HitOutcome),
    /// Turned into a blockage (or found no room)
    Blockage(AddOutcome),
}

/// Result of one collision frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    pub caught: usize,
    pub missed: usize,
    pub end: Option<EndReason>,
}

pub struct CollisionHandler<S: EventSink> {
    sink: S,
    tuning: Tuning,
    hitbox: CartHitbox,
    combo: ComboSystem,
    power_ups: PowerUpState,
    blockages: BlockageManager,
    achievements: AchievementTracker,
    stats: RoundStats,
}

impl<S: EventSink> CollisionHandler<S> {
    pub fn new(sink: S, tuning: &Tuning) -> Self {
        Self {
            sink,
            hitbox: CartHitbox {
                width_scale: tuning.hitbox_width_scale,
                height_scale: tuning.hitbox_height_scale,
            },
            combo: ComboSystem::new(tuning.combo_idle_window_ms, tuning.combo_bonus_step),
            power_ups: PowerUpState::new(),
            blockages: BlockageManager::new(BlockageConfig::from(tuning)),
            achievements: AchievementTracker::default(),
            stats: RoundStats::new(tuning.starting_lives),
            tuning: tuning.clone(),
        }
    }

    /// Resolve one catch. Marks the item collected in every branch.
    pub fn handle_item_collision(&mut self, item: &mut FallingItem, now_ms: u64) -> HitOutcome {
        if item.collected {
            return HitOutcome::AlreadyCollected;
        }
        item.collected = true;

        let outcome = match item.kind {
            ItemKind::PowerUp(kind) => self.pick_up(kind, now_ms),
            kind if kind.is_hazard() => self.resolve_hazard(now_ms),
            kind => self.score_catch(kind, now_ms),
        };

        self.sink.on_item_collect(item.id);
        outcome
    }

    /// Per-frame loop: resolve every colliding item (highest priority first),
    /// drop collected items, then hand floor misses to the blockage stack.
    pub fn process_frame(
        &mut self,
        items: &mut Vec<FallingItem>,
        cart: &Cart,
        now_ms: u64,
        policy: &dyn BlockagePolicy,
    ) -> FrameOutcome {
        // Pre-filter against the extended box so the forgiving band above
        // the rim is not skipped
        let ext = self.hitbox.extend(cart);
        let reach = Cart::new(ext.min.x, ext.min.y, ext.size.x, ext.size.y);
        let mut hits: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                !item.collected
                    && is_item_in_cart_range(item, &reach)
                    && check_item_collision(item, cart, &self.hitbox)
            })
            .map(|(i, _)| i)
            .collect();
        hits.sort_by_key(|&i| Reverse(collision_priority(items[i].kind)));

        let mut outcome = FrameOutcome::default();
        for i in hits {
            if self.handle_item_collision(&mut items[i], now_ms) != HitOutcome::AlreadyCollected {
                outcome.caught += 1;
            }
        }
        items.retain(|item| !item.collected);

        let floor = self.tuning.play_height;
        let (missed, remaining): (Vec<_>, Vec<_>) =
            items.drain(..).partition(|item| item.top() > floor);
        *items = remaining;

        for item in &missed {
            outcome.missed += 1;
            if let MissOutcome::Blockage(AddOutcome { game_over: true, .. }) =
                self.handle_miss(item, cart, now_ms, policy)
            {
                outcome.end = Some(EndReason::Blocked);
                break;
            }
        }

        if outcome.end.is_none() && self.stats.lives == 0 {
            outcome.end = Some(EndReason::OutOfLives);
        }
        outcome
    }

    /// An uncaught item left the play area
    pub fn handle_miss(
        &mut self,
        item: &FallingItem,
        cart: &Cart,
        now_ms: u64,
        policy: &dyn BlockagePolicy,
    ) -> MissOutcome {
        if item.collected {
            return MissOutcome::Vanished;
        }
        self.stats.items_missed += 1;

        if item.kind == ItemKind::Bomb
            && check_explosion_range(item, cart, self.tuning.explosion_radius)
        {
            log::debug!("Bomb {} exploded beside the cart", item.id);
            return MissOutcome::Blasted(self.resolve_hazard(now_ms));
        }

        let dodged = item.kind.is_hazard();
        if dodged {
            self.stats.obstacles_avoided += 1;
        }

        if !policy.creates_blockage(item) {
            return if dodged {
                MissOutcome::Dodged
            } else {
                MissOutcome::Vanished
            };
        }

        let level_before = self.blockages.warning_level();
        let added = self.blockages.add_missed_item(item);
        if added.placed.is_some() {
            self.stats.blockages_created += 1;
            self.sink.on_sound_play(SoundCue::BlockagePlaced);
            if self.blockages.warning_level() > level_before {
                log::info!(
                    "Blockage warning level now {:?} ({:.0}%)",
                    self.blockages.warning_level(),
                    added.percentage * 100.0
                );
                self.sink.on_sound_play(SoundCue::Warning);
            }
        }
        MissOutcome::Blockage(added)
    }

    /// Damage an obstacle; unknown ids are a no-op
    pub fn damage_blockage(&mut self, id: BlockageId, amount: u32) -> DamageOutcome {
        let outcome = self.blockages.damage_blockage(id, amount);
        if let DamageOutcome::Destroyed { .. } = outcome {
            self.sink.on_sound_play(SoundCue::BlockageBroken);
        }
        outcome
    }

    /// Expire power-ups (every frame)
    pub fn tick_power_ups(&mut self, now_ms: u64) {
        let sink = &mut self.sink;
        self.power_ups.tick(now_ms, |kind| {
            log::debug!("{kind:?} expired");
            sink.on_power_up_expire(kind);
        });
    }

    /// Slow tick: time survived and combo decay
    pub fn tick_second(&mut self, now_ms: u64) {
        self.stats.time_survived_secs += 1;
        if self.combo.tick(now_ms) {
            self.sink.on_combo_update(self.combo.state());
        }
        for a in self
            .achievements
            .on_time_survived(self.stats.time_survived_secs)
        {
            self.announce(a);
        }
    }

    /// Shift timers forward by time spent paused
    pub fn shift_timers(&mut self, delta_ms: u64) {
        self.power_ups.shift(delta_ms);
        self.combo.shift(delta_ms);
    }

    /// Drop every pending power-up timer (round teardown)
    pub fn clear_timers(&mut self) {
        self.power_ups.clear();
    }

    fn score_catch(&mut self, kind: ItemKind, now_ms: u64) -> HitOutcome {
        let tier_up = self.combo.register_hit(now_ms);
        let (base_score, coins) = kind.reward();
        let mut factor = self.combo.multiplier();
        if self.power_ups.is_active(PowerUpKind::Multiplier, now_ms) {
            factor *= self.tuning.multiplier_factor;
        }
        let score = (base_score as f32 * factor).round() as i64;

        self.stats.add_score(score);
        self.stats.add_coins(coins);
        self.stats.items_caught += 1;
        self.sink.on_score_change(score);
        if coins != 0 {
            self.sink.on_coin_change(coins);
        }
        self.sink.on_combo_update(self.combo.state());

        let cue = if kind.is_valuable() {
            SoundCue::ValuableCatch
        } else {
            SoundCue::Catch
        };
        self.sink.on_sound_play(cue);
        if tier_up {
            self.sink.on_sound_play(SoundCue::ComboTierUp);
        }

        for a in self.achievements.on_combo(self.combo.count()) {
            self.announce(a);
        }
        if kind.is_valuable() {
            self.stats.valuables_caught += 1;
            if let Some(a) = self.achievements.on_valuables(self.stats.valuables_caught) {
                self.announce(a);
            }
        }

        HitOutcome::Scored { score, coins }
    }

    fn pick_up(&mut self, kind: PowerUpKind, now_ms: u64) -> HitOutcome {
        let (score, _) = ItemKind::PowerUp(kind).reward();
        self.stats.add_score(score);
        self.stats.items_caught += 1;
        self.stats.power_ups_used += 1;
        self.sink.on_score_change(score);

        let duration = self.tuning.power_up_duration_ms(kind);
        if kind.is_timed() {
            self.power_ups.activate(kind, duration, now_ms);
        } else {
            self.blockages.clear_blockages(self.tuning.clear_fraction);
        }
        log::info!("Power-up {kind:?} activated ({duration} ms)");
        self.sink.on_power_up_activate(kind, duration);
        self.sink.on_sound_play(SoundCue::PowerUp);

        if let Some(a) = self.achievements.unlock(Achievement::FirstPowerUp) {
            self.announce(a);
        }
        HitOutcome::PowerUp(kind)
    }

    /// Hazard contact: the shield absorbs one hit, otherwise a life is lost
    fn resolve_hazard(&mut self, now_ms: u64) -> HitOutcome {
        if self.power_ups.is_active(PowerUpKind::Shield, now_ms) {
            self.power_ups.deactivate(PowerUpKind::Shield);
            self.sink.on_power_up_expire(PowerUpKind::Shield);
            self.sink.on_sound_play(SoundCue::ShieldBlock);
            if let Some(a) = self.achievements.unlock(Achievement::ShieldBlock) {
                self.announce(a);
            }
            return HitOutcome::ShieldAbsorbed;
        }

        self.stats.lives = self.stats.lives.saturating_sub(1);
        self.sink.on_life_change(-1);
        self.combo.register_hazard();
        self.sink.on_combo_update(self.combo.state());
        self.sink.on_sound_play(SoundCue::HazardHit);
        HitOutcome::LifeLost
    }

    fn announce(&mut self, achievement: Achievement) {
        log::info!("Achievement unlocked: {achievement:?}");
        self.sink.on_achievement(achievement);
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn stats(&self) -> &RoundStats {
        &self.stats
    }

    pub fn combo(&self) -> &ComboSystem {
        &self.combo
    }

    pub fn power_ups(&self) -> &PowerUpState {
        &self.power_ups
    }

    pub fn blockages(&self) -> &BlockageManager {
        &self.blockages
    }

    pub fn achievements(&self) -> &AchievementTracker {
        &self.achievements
    }

    pub fn hitbox(&self) -> &CartHitbox {
        &self.hitbox
    }
}
