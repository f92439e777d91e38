//! Catch Rush - A falling-item catch arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, motion, collisions, combo, blockages)
//! - `tuning`: Data-driven game balance
//! - `clock`: Injected time source for the round drivers
//! - `error`: Config and round transition errors
//!
//! Rendering, audio playback and persistence live outside this crate and talk
//! to the simulation through [`sim::EventSink`] and read-only snapshots.

pub mod clock;
pub mod error;
pub mod sim;
pub mod tuning;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, RoundError};
pub use tuning::Tuning;

/// Game configuration constants (defaults for [`Tuning`])
pub mod consts {
    /// Fast tick: item movement and collision checks (~60 Hz)
    pub const FRAME_MS: u64 = 16;
    /// Slow tick: time survived and combo decay
    pub const SECOND_MS: u64 = 1000;
    /// Maximum frames simulated per update to prevent spiral of death
    pub const MAX_CATCH_UP_FRAMES: u32 = 8;

    /// Play area dimensions (logical pixels, y grows downward)
    pub const PLAY_WIDTH: f32 = 400.0;
    pub const PLAY_HEIGHT: f32 = 700.0;

    /// Falling item defaults
    pub const ITEM_SIZE: f32 = 40.0;
    /// Pixels per frame at difficulty multiplier 1.0
    pub const BASE_FALL_SPEED: f32 = 4.0;

    /// Cart hitbox extension (forgiving catches)
    pub const HITBOX_WIDTH_SCALE: f32 = 1.2;
    pub const HITBOX_HEIGHT_SCALE: f32 = 1.1;

    /// Combo decays after this long without a catch
    pub const COMBO_IDLE_WINDOW_MS: u64 = 3000;
    /// Multiplier bonus added per 10 consecutive catches
    pub const COMBO_BONUS_STEP: f32 = 0.5;

    /// Blockage stacking
    pub const MAX_BLOCKAGE_LAYERS: usize = 8;
    pub const BLOCK_HEIGHT: f32 = 20.0;
    pub const BLOCK_SPACING: f32 = 2.0;
    pub const BLOCKAGE_DANGER_THRESHOLD: f32 = 0.7;

    /// Starting lives
    pub const STARTING_LIVES: u32 = 3;
}

/// Clamp a value into `[0, 1]`, mapping NaN to 0
#[inline]
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}
