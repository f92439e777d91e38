//! Outbound notifications from the simulation
//!
//! [`EventSink`] is the only channel from the core to the outside world
//! (HUD, audio, persistence). Every method has a no-op default so a
//! collaborator only overrides what it cares about.

use serde::{Deserialize, Serialize};

use super::achievements::Achievement;
use super::combo::ComboState;
use super::item::{ItemId, PowerUpKind};
use super::state::RoundSummary;

/// Sounds the audio collaborator may play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    Catch,
    ValuableCatch,
    HazardHit,
    ShieldBlock,
    PowerUp,
    ComboTierUp,
    BlockagePlaced,
    BlockageBroken,
    Warning,
    GameOver,
}

/// Callback contract between the simulation and its collaborators
#[allow(unused_variables)]
pub trait EventSink {
    fn on_score_change(&mut self, delta: i64) {}
    fn on_coin_change(&mut self, delta: i64) {}
    fn on_life_change(&mut self, delta: i32) {}
    fn on_power_up_activate(&mut self, kind: PowerUpKind, duration_ms: u64) {}
    fn on_power_up_expire(&mut self, kind: PowerUpKind) {}
    fn on_item_collect(&mut self, id: ItemId) {}
    fn on_combo_update(&mut self, combo: ComboState) {}
    fn on_achievement(&mut self, achievement: Achievement) {}
    fn on_sound_play(&mut self, cue: SoundCue) {}
    /// Fired exactly once when the round ends
    fn on_round_end(&mut self, summary: &RoundSummary) {}
}

/// Discards every event
impl EventSink for () {}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn on_score_change(&mut self, delta: i64) {
        (**self).on_score_change(delta)
    }
    fn on_coin_change(&mut self, delta: i64) {
        (**self).on_coin_change(delta)
    }
    fn on_life_change(&mut self, delta: i32) {
        (**self).on_life_change(delta)
    }
    fn on_power_up_activate(&mut self, kind: PowerUpKind, duration_ms: u64) {
        (**self).on_power_up_activate(kind, duration_ms)
    }
    fn on_power_up_expire(&mut self, kind: PowerUpKind) {
        (**self).on_power_up_expire(kind)
    }
    fn on_item_collect(&mut self, id: ItemId) {
        (**self).on_item_collect(id)
    }
    fn on_combo_update(&mut self, combo: ComboState) {
        (**self).on_combo_update(combo)
    }
    fn on_achievement(&mut self, achievement: Achievement) {
        (**self).on_achievement(achievement)
    }
    fn on_sound_play(&mut self, cue: SoundCue) {
        (**self).on_sound_play(cue)
    }
    fn on_round_end(&mut self, summary: &RoundSummary) {
        (**self).on_round_end(summary)
    }
}

/// A recorded notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreChanged(i64),
    CoinsChanged(i64),
    LifeChanged(i32),
    PowerUpActivated { kind: PowerUpKind, duration_ms: u64 },
    PowerUpExpired(PowerUpKind),
    ItemCollected(ItemId),
    ComboUpdated(ComboState),
    AchievementUnlocked(Achievement),
    Sound(SoundCue),
    RoundEnded(RoundSummary),
}

/// Sink that records everything, for replays and tests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    pub events: Vec<GameEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&GameEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    /// Sum of all score deltas
    pub fn score_total(&self) -> i64 {
        self.events
            .iter()
            .filter_map(|e| match e {
                GameEvent::ScoreChanged(d) => Some(*d),
                _ => None,
            })
            .sum()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for EventLog {
    fn on_score_change(&mut self, delta: i64) {
        self.events.push(GameEvent::ScoreChanged(delta));
    }
    fn on_coin_change(&mut self, delta: i64) {
        self.events.push(GameEvent::CoinsChanged(delta));
    }
    fn on_life_change(&mut self, delta: i32) {
        self.events.push(GameEvent::LifeChanged(delta));
    }
    fn on_power_up_activate(&mut self, kind: PowerUpKind, duration_ms: u64) {
        self.events
            .push(GameEvent::PowerUpActivated { kind, duration_ms });
    }
    fn on_power_up_expire(&mut self, kind: PowerUpKind) {
        self.events.push(GameEvent::PowerUpExpired(kind));
    }
    fn on_item_collect(&mut self, id: ItemId) {
        self.events.push(GameEvent::ItemCollected(id));
    }
    fn on_combo_update(&mut self, combo: ComboState) {
        self.events.push(GameEvent::ComboUpdated(combo));
    }
    fn on_achievement(&mut self, achievement: Achievement) {
        self.events.push(GameEvent::AchievementUnlocked(achievement));
    }
    fn on_sound_play(&mut self, cue: SoundCue) {
        self.events.push(GameEvent::Sound(cue));
    }
    fn on_round_end(&mut self, summary: &RoundSummary) {
        self.events.push(GameEvent::RoundEnded(summary.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(sink: &mut impl EventSink) {
        sink.on_score_change(10);
        sink.on_score_change(-3);
        sink.on_sound_play(SoundCue::Catch);
    }

    #[test]
    fn test_event_log_records_through_reference() {
        let mut log = EventLog::new();
        emit(&mut &mut log);
        assert_eq!(log.events.len(), 3);
        assert_eq!(log.score_total(), 7);
        assert_eq!(log.count(|e| matches!(e, GameEvent::Sound(_))), 1);
        log.clear();
        assert!(log.events.is_empty());
    }

    #[test]
    fn test_unit_sink_is_silent() {
        emit(&mut ());
    }
}
