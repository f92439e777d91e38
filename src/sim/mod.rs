//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only from the injected clock
//! - Seeded RNG only
//! - Stable iteration order (spawn order for items, layer order for blockages)
//! - No rendering, audio or persistence; effects leave through [`EventSink`]

pub mod achievements;
pub mod blockage;
pub mod collision;
pub mod combo;
pub mod engine;
pub mod events;
pub mod handler;
pub mod item;
pub mod powerup;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod timers;

pub use achievements::{Achievement, AchievementTracker};
pub use blockage::{
    AddOutcome, Blockage, BlockageConfig, BlockageId, BlockageManager, CartPassage, DamageOutcome,
    WarningLevel,
};
pub use collision::{
    CartHitbox, boxes_overlap, check_explosion_range, check_item_collision, check_magnet_range,
    collision_priority, is_item_in_cart_range,
};
pub use combo::{ComboState, ComboSystem};
pub use engine::{GameEngine, UpdateReport};
pub use events::{EventLog, EventSink, GameEvent, SoundCue};
pub use handler::{CollisionHandler, FrameOutcome, HitOutcome, MissOutcome};
pub use item::{Aabb, Cart, FallingItem, ItemClass, ItemId, ItemKind, PowerUpKind};
pub use powerup::{ActivePowerUp, PowerUpState};
pub use spawner::{
    AllMisses, BlockagePolicy, Difficulty, DifficultyCurve, HazardsOnly, MAX_LEVEL, SpawnWeight,
    Spawner,
};
pub use state::{EndReason, RoundPhase, RoundSnapshot, RoundStats, RoundSummary};
