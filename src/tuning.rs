//! Data-driven game balance
//!
//! Every gameplay constant the simulation reads lives here so it can be
//! overridden from JSON without touching code. Missing fields fall back to
//! the defaults in [`crate::consts`].

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::PowerUpKind;

/// Tunable gameplay parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Drivers ===
    /// Fast tick interval (movement + collisions)
    pub frame_ms: u64,
    /// Slow tick interval (time survived + combo decay)
    pub second_ms: u64,
    /// Frames simulated at most per update; older backlog is dropped
    pub max_catch_up_frames: u32,

    // === Play area ===
    pub play_width: f32,
    /// Items whose top edge passes this line are misses
    pub play_height: f32,
    pub item_size: f32,
    pub base_fall_speed: f32,

    // === Cart hitbox ===
    pub hitbox_width_scale: f32,
    pub hitbox_height_scale: f32,

    // === Combo ===
    pub combo_idle_window_ms: u64,
    pub combo_bonus_step: f32,

    // === Blockages ===
    pub max_layers: usize,
    pub block_height: f32,
    pub block_spacing: f32,
    /// Fill fraction above which `add_missed_item` reports danger
    pub danger_threshold: f32,
    /// Upper bounds for safe / warning / danger warning levels
    pub warning_thresholds: [f32; 3],
    pub hazard_block_health: u32,
    pub valuable_block_health: u32,
    pub ordinary_block_health: u32,

    // === Power-ups ===
    pub magnet_duration_ms: u64,
    pub shield_duration_ms: u64,
    pub multiplier_duration_ms: u64,
    pub multiplier_factor: f32,
    /// Horizontal reach of the magnet from the cart centre
    pub magnet_radius: f32,
    /// Fraction of the remaining horizontal gap closed per frame
    pub magnet_pull: f32,
    /// Horizontal blast reach of a bomb landing beside the cart (0 disables)
    pub explosion_radius: f32,
    /// Share of all blockages removed by the clear power-up
    pub clear_fraction: f32,

    // === Round ===
    pub starting_lives: u32,
    /// Seconds survived per difficulty level
    pub level_up_secs: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            frame_ms: FRAME_MS,
            second_ms: SECOND_MS,
            max_catch_up_frames: MAX_CATCH_UP_FRAMES,

            play_width: PLAY_WIDTH,
            play_height: PLAY_HEIGHT,
            item_size: ITEM_SIZE,
            base_fall_speed: BASE_FALL_SPEED,

            hitbox_width_scale: HITBOX_WIDTH_SCALE,
            hitbox_height_scale: HITBOX_HEIGHT_SCALE,

            combo_idle_window_ms: COMBO_IDLE_WINDOW_MS,
            combo_bonus_step: COMBO_BONUS_STEP,

            max_layers: MAX_BLOCKAGE_LAYERS,
            block_height: BLOCK_HEIGHT,
            block_spacing: BLOCK_SPACING,
            danger_threshold: BLOCKAGE_DANGER_THRESHOLD,
            warning_thresholds: [0.3, 0.5, 0.7],
            hazard_block_health: 3,
            valuable_block_health: 2,
            ordinary_block_health: 1,

            magnet_duration_ms: 8_000,
            shield_duration_ms: 10_000,
            multiplier_duration_ms: 10_000,
            multiplier_factor: 2.0,
            magnet_radius: 150.0,
            magnet_pull: 0.15,
            explosion_radius: 90.0,
            clear_fraction: 0.5,

            starting_lives: STARTING_LIVES,
            level_up_secs: 30,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Serialize to pretty JSON (for writing a template file)
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Timed duration for a power-up kind (0 for instant effects)
    pub fn power_up_duration_ms(&self, kind: PowerUpKind) -> u64 {
        match kind {
            PowerUpKind::Magnet => self.magnet_duration_ms,
            PowerUpKind::Shield => self.shield_duration_ms,
            PowerUpKind::Multiplier => self.multiplier_duration_ms,
            PowerUpKind::ClearBlockages => 0,
        }
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if self.frame_ms == 0 {
            return Err(invalid("frame_ms", "must be positive"));
        }
        if self.second_ms == 0 {
            return Err(invalid("second_ms", "must be positive"));
        }
        if self.max_catch_up_frames == 0 {
            return Err(invalid("max_catch_up_frames", "must be at least 1"));
        }
        for (field, value) in [
            ("play_width", self.play_width),
            ("play_height", self.play_height),
            ("item_size", self.item_size),
            ("base_fall_speed", self.base_fall_speed),
            ("block_height", self.block_height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(field, format!("must be a positive number, got {value}")));
            }
        }
        if self.item_size > self.play_width {
            return Err(invalid("item_size", "wider than the play area"));
        }
        // Blockages are at least one pixel wide
        if self.play_width < 1.0 {
            return Err(invalid("play_width", format!("must be at least 1, got {}", self.play_width)));
        }
        for (field, value) in [
            ("hitbox_width_scale", self.hitbox_width_scale),
            ("hitbox_height_scale", self.hitbox_height_scale),
        ] {
            if value.is_nan() || value < 1.0 {
                return Err(invalid(field, format!("must be >= 1.0, got {value}")));
            }
        }
        if self.max_layers == 0 {
            return Err(invalid("max_layers", "must be at least 1"));
        }
        for (field, value) in [
            ("danger_threshold", self.danger_threshold),
            ("magnet_pull", self.magnet_pull),
            ("clear_fraction", self.clear_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, format!("must be within 0..=1, got {value}")));
            }
        }
        let [safe, warning, danger] = self.warning_thresholds;
        if !(safe <= warning && warning <= danger) {
            return Err(invalid("warning_thresholds", "must be ascending"));
        }
        for (field, value) in [
            ("hazard_block_health", self.hazard_block_health),
            ("valuable_block_health", self.valuable_block_health),
            ("ordinary_block_health", self.ordinary_block_health),
        ] {
            if value == 0 {
                return Err(invalid(field, "block health must be at least 1"));
            }
        }
        if self.starting_lives == 0 {
            return Err(invalid("starting_lives", "must be at least 1"));
        }
        if self.level_up_secs == 0 {
            return Err(invalid("level_up_secs", "must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "max_layers": 4, "combo_idle_window_ms": 2500 }"#)
            .expect("valid tuning");
        assert_eq!(tuning.max_layers, 4);
        assert_eq!(tuning.combo_idle_window_ms, 2500);
        assert_eq!(tuning.frame_ms, FRAME_MS);
        assert!((tuning.hitbox_width_scale - 1.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = Tuning::from_json(r#"{ "max_layers": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_layers", .. }));

        let err = Tuning::from_json(r#"{ "clear_fraction": 1.5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "clear_fraction", .. }));

        let err = Tuning::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_errors_name_the_failing_field() {
        let err = Tuning::from_json(r#"{ "hitbox_height_scale": 0.5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "hitbox_height_scale", .. }));

        let err = Tuning::from_json(r#"{ "ordinary_block_health": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "ordinary_block_health", .. }));
    }

    #[test]
    fn test_rejects_sub_pixel_play_area() {
        let tuning = Tuning {
            play_width: 0.5,
            item_size: 0.4,
            ..Tuning::default()
        };
        assert!(matches!(
            tuning.validate(),
            Err(ConfigError::Invalid { field: "play_width", .. })
        ));
    }

    #[test]
    fn test_json_roundtrip_preserves_values() {
        let mut tuning = Tuning::default();
        tuning.explosion_radius = 0.0;
        let json = tuning.to_json().expect("serializable");
        assert_eq!(Tuning::from_json(&json).expect("valid"), tuning);
    }

    #[test]
    fn test_power_up_durations() {
        let tuning = Tuning::default();
        assert_eq!(tuning.power_up_duration_ms(PowerUpKind::Shield), 10_000);
        assert_eq!(tuning.power_up_duration_ms(PowerUpKind::ClearBlockages), 0);
    }
}
