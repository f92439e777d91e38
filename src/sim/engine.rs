//! Round engine: phase machine and driver loop
//!
//! The host calls [`GameEngine::update`] as often as it likes (every render
//! frame, or from a test loop). Each call reads the injected clock and runs
//! every spawn, frame and second tick that fell due since the last call, in
//! chronological order.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::blockage::{Blockage, BlockageId, CartPassage, DamageOutcome, WarningLevel};
use super::combo::ComboState;
use super::events::{EventSink, SoundCue};
use super::handler::{CollisionHandler, HitOutcome};
use super::item::{Cart, FallingItem, ItemId, ItemKind};
use super::powerup::ActivePowerUp;
use super::spawner::{BlockagePolicy, Difficulty, DifficultyCurve, HazardsOnly, MAX_LEVEL, Spawner};
use super::state::{EndReason, RoundPhase, RoundSnapshot, RoundStats, RoundSummary};
use super::tick::step_frame;
use super::timers::{Driver, Timers};
use crate::clock::Clock;
use crate::error::{ConfigError, Result, RoundError};
use crate::tuning::Tuning;

/// What one `update` call simulated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub frames: u32,
    pub seconds: u32,
    pub spawned: u32,
    pub caught: u32,
    /// Frames skipped because the call ran too late
    pub dropped_frames: u64,
}

pub struct GameEngine<S: EventSink, C: Clock> {
    tuning: Tuning,
    clock: C,
    handler: CollisionHandler<S>,
    spawner: Spawner,
    difficulty: Box<dyn Difficulty>,
    policy: Box<dyn BlockagePolicy>,
    items: Vec<FallingItem>,
    timers: Timers,
    phase: RoundPhase,
    paused_at_ms: Option<u64>,
    level: u32,
    summary: Option<RoundSummary>,
}

impl<S: EventSink, C: Clock> GameEngine<S, C> {
    /// Create an idle round with the default difficulty curve and policy
    pub fn new(tuning: Tuning, sink: S, clock: C, seed: u64) -> Result<Self, ConfigError> {
        tuning.validate()?;
        Ok(Self {
            handler: CollisionHandler::new(sink, &tuning),
            spawner: Spawner::new(Pcg32::seed_from_u64(seed), &tuning),
            difficulty: Box::new(DifficultyCurve),
            policy: Box::new(HazardsOnly),
            clock,
            items: Vec::new(),
            timers: Timers::default(),
            phase: RoundPhase::Idle,
            paused_at_ms: None,
            level: 1,
            summary: None,
            tuning,
        })
    }

    pub fn with_difficulty(mut self, difficulty: impl Difficulty + 'static) -> Self {
        self.difficulty = Box::new(difficulty);
        self
    }

    pub fn with_policy(mut self, policy: impl BlockagePolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    // === Phase transitions ===

    /// `Idle -> Active`: arm the drivers
    pub fn start(&mut self) -> Result<()> {
        self.expect_phase(RoundPhase::Idle, "start")?;
        let now = self.clock.now_ms();
        self.phase = RoundPhase::Active;
        self.arm_drivers(now);
        log::info!("Round started at {now} ms");
        Ok(())
    }

    /// `Active -> Paused`: freeze the drivers where they stand; `update`
    /// runs nothing until resumed
    pub fn pause(&mut self) -> Result<()> {
        self.expect_phase(RoundPhase::Active, "pause")?;
        let now = self.clock.now_ms();
        self.paused_at_ms = Some(now);
        self.phase = RoundPhase::Paused;
        log::info!("Round paused at {now} ms");
        Ok(())
    }

    /// `Paused -> Active`: every driver, power-up and the combo stamp moves
    /// forward by the paused span, so nothing is replayed and no partly run
    /// interval is lost
    pub fn resume(&mut self) -> Result<()> {
        self.expect_phase(RoundPhase::Paused, "resume")?;
        let now = self.clock.now_ms();
        let paused_for = self
            .paused_at_ms
            .take()
            .map_or(0, |at| now.saturating_sub(at));
        self.handler.shift_timers(paused_for);
        self.timers.shift(paused_for);
        self.phase = RoundPhase::Active;
        log::info!("Round resumed after {paused_for} ms");
        Ok(())
    }

    /// End the round from the host side (any phase but `Ended`)
    pub fn end(&mut self) -> Result<RoundSummary> {
        if self.phase == RoundPhase::Ended {
            return Err(RoundError::Ended);
        }
        Ok(self.finish(EndReason::Stopped))
    }

    // === Driver loop ===

    /// Run every driver tick due by now. No-op unless the round is active.
    pub fn update(&mut self, cart: &Cart) -> UpdateReport {
        let mut report = UpdateReport::default();
        if self.phase != RoundPhase::Active {
            return report;
        }

        let now = self.clock.now_ms();
        while self.phase == RoundPhase::Active {
            let Some((driver, due)) = self.timers.next_due(now) else {
                break;
            };
            match driver {
                Driver::Spawn => {
                    if let Some(item) = self.spawner.spawn(self.difficulty.as_ref(), self.level) {
                        log::debug!("Spawned {:?} #{} at x={:.0}", item.kind, item.id, item.pos.x);
                        self.items.push(item);
                        report.spawned += 1;
                    }
                    let next = self
                        .spawner
                        .next_interval_ms(self.difficulty.as_ref(), self.level);
                    self.timers.spawn.arm_at(due + next);
                }
                Driver::Frame => {
                    if report.frames >= self.tuning.max_catch_up_frames {
                        report.dropped_frames += self.drop_backlog(now, due);
                        continue;
                    }
                    let outcome = step_frame(
                        &mut self.items,
                        cart,
                        &mut self.handler,
                        self.policy.as_ref(),
                        &self.tuning,
                        due,
                    );
                    report.frames += 1;
                    report.caught += outcome.caught as u32;
                    self.timers.frame.arm_at(due + self.tuning.frame_ms);
                    if let Some(reason) = outcome.end {
                        self.finish(reason);
                    }
                }
                Driver::Second => {
                    self.handler.tick_second(due);
                    report.seconds += 1;
                    self.update_level();
                    self.timers.second.arm_at(due + self.tuning.second_ms);
                }
            }
        }
        report
    }

    /// Skip the frame backlog (and any spawns queued behind it); returns the
    /// number of frames dropped
    fn drop_backlog(&mut self, now: u64, due: u64) -> u64 {
        let frame_ms = self.tuning.frame_ms;
        let dropped = (now - due) / frame_ms + 1;
        log::warn!("Update ran late, dropping {dropped} frames");
        self.timers.frame.arm_at(now + frame_ms);
        if self.timers.spawn.is_due(now) {
            let next = self
                .spawner
                .next_interval_ms(self.difficulty.as_ref(), self.level);
            self.timers.spawn.arm_at(now + next);
        }
        dropped
    }

    fn update_level(&mut self) {
        let secs = self.handler.stats().time_survived_secs;
        let period = u64::from(self.tuning.level_up_secs.max(1));
        let level = (1 + secs / period).min(u64::from(MAX_LEVEL)) as u32;
        if level != self.level {
            log::info!("Level up: {} -> {level}", self.level);
            self.level = level;
        }
    }

    fn arm_drivers(&mut self, now: u64) {
        self.timers.frame.arm_at(now + self.tuning.frame_ms);
        self.timers.second.arm_at(now + self.tuning.second_ms);
        let next = self
            .spawner
            .next_interval_ms(self.difficulty.as_ref(), self.level);
        self.timers.spawn.arm_at(now + next);
    }

    /// Tear down drivers and power-up expiries, then report the round once
    fn finish(&mut self, reason: EndReason) -> RoundSummary {
        self.timers.cancel_all();
        self.handler.clear_timers();
        self.paused_at_ms = None;
        self.phase = RoundPhase::Ended;

        let summary = RoundSummary::from_stats(
            self.handler.stats(),
            self.handler.combo().best(),
            reason,
        );
        log::info!(
            "Round ended ({reason:?}): score {}, {} s survived",
            summary.score,
            summary.time_survived_secs
        );
        let sink = self.handler.sink_mut();
        sink.on_sound_play(SoundCue::GameOver);
        sink.on_round_end(&summary);
        self.summary = Some(summary.clone());
        summary
    }

    fn expect_phase(&self, expected: RoundPhase, action: &'static str) -> Result<()> {
        match self.phase {
            RoundPhase::Ended => Err(RoundError::Ended),
            phase if phase == expected => Ok(()),
            from => {
                log::warn!("Rejected {action} while {from:?}");
                Err(RoundError::InvalidTransition { from, action })
            }
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.phase == RoundPhase::Ended {
            Err(RoundError::Ended)
        } else {
            Ok(())
        }
    }

    // === Host mutations ===

    /// Place an item directly (scripted drops, tutorials, tests)
    pub fn drop_item(&mut self, kind: ItemKind, pos: Vec2, fall_speed: f32) -> Result<ItemId> {
        self.ensure_open()?;
        let id = self.spawner.next_item_id();
        let size = Vec2::splat(self.tuning.item_size);
        self.items
            .push(FallingItem::new(id, kind, pos, fall_speed, size));
        Ok(id)
    }

    /// Collect a live item by id outside the frame loop (host-side pickups).
    /// Ids already removed yield `HitOutcome::NotFound`.
    pub fn collect_item(&mut self, id: ItemId) -> Result<HitOutcome> {
        self.ensure_open()?;
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return Ok(HitOutcome::NotFound);
        };
        let now = self.clock.now_ms();
        let outcome = self.handler.handle_item_collision(item, now);
        self.items.retain(|item| !item.collected);
        if self.handler.stats().lives == 0 {
            self.finish(EndReason::OutOfLives);
        }
        Ok(outcome)
    }

    /// Damage an obstacle; unknown ids yield `DamageOutcome::NotFound`
    pub fn damage_blockage(&mut self, id: BlockageId, amount: u32) -> Result<DamageOutcome> {
        self.ensure_open()?;
        Ok(self.handler.damage_blockage(id, amount))
    }

    // === Reads ===

    pub fn check_cart_passage(&self, cart_x: f32, cart_width: f32) -> CartPassage {
        self.handler
            .blockages()
            .check_cart_passage(cart_x, cart_width)
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn stats(&self) -> &RoundStats {
        self.handler.stats()
    }

    pub fn items(&self) -> &[FallingItem] {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&FallingItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn blockages(&self) -> Vec<Blockage> {
        self.handler.blockages().all_blockages()
    }

    pub fn blockage_percentage(&self) -> f32 {
        self.handler.blockages().blockage_percentage()
    }

    pub fn warning_level(&self) -> WarningLevel {
        self.handler.blockages().warning_level()
    }

    pub fn power_ups(&self) -> Vec<ActivePowerUp> {
        self.handler.power_ups().active()
    }

    pub fn combo(&self) -> ComboState {
        self.handler.combo().state()
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            phase: self.phase,
            level: self.level,
            stats: self.handler.stats().clone(),
            items: self.items.clone(),
            blockages: self.blockages(),
            blockage_percentage: self.blockage_percentage(),
            warning_level: self.warning_level(),
            power_ups: self.power_ups(),
            combo: self.combo(),
        }
    }

    /// Set once the round has ended
    pub fn summary(&self) -> Option<&RoundSummary> {
        self.summary.as_ref()
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn sink(&self) -> &S {
        self.handler.sink()
    }

    pub fn sink_mut(&mut self) -> &mut S {
        self.handler.sink_mut()
    }

    pub fn into_sink(self) -> S {
        self.handler.into_sink()
    }
}
