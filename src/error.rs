//! Error types for configuration loading and round control.

use thiserror::Error;

use crate::sim::RoundPhase;

/// Errors raised while loading or validating [`crate::Tuning`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tuning JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors raised by round phase transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    #[error("cannot {action} while round is {from:?}")]
    InvalidTransition {
        from: RoundPhase,
        action: &'static str,
    },

    #[error("round has ended; no further changes are accepted")]
    Ended,
}

pub type Result<T, E = RoundError> = std::result::Result<T, E>;
