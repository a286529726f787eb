//! Error types for coordgame.
//!
//! All errors are strongly typed using thiserror. Extraction never fails:
//! an unparseable answer is recorded as a `NoNumberFound` guess instead of
//! being raised.

use thiserror::Error;

/// Validation errors raised before any computation or round is played.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

impl ValidationError {
    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// Failures reported by a text-generation collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("Generation timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Generation rate limited: {message}")]
    RateLimited {
        message: String,
    },

    #[error("Malformed upstream response: {message}")]
    MalformedResponse {
        message: String,
    },

    #[error("No scripted response left for participant {participant_id}")]
    Exhausted {
        participant_id: u32,
    },

    #[error("Generation failed: {message}")]
    Other {
        message: String,
    },
}

impl GenerationError {
    /// Returns true if calling the generator again may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::RateLimited { .. })
    }
}

/// Errors raised while driving a game.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Game already finished after {rounds_played} round(s)")]
    GameFinished {
        rounds_played: u32,
    },

    #[error("Participant {participant_id} failed in round {round}: {source}")]
    Generation {
        participant_id: u32,
        round: u32,
        #[source]
        source: GenerationError,
    },

    #[error("Failed to write run log: {message}")]
    Log {
        message: String,
    },
}

/// Top-level error type for coordgame.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),
}

impl GameError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this error originated in the text generator.
    #[must_use]
    pub const fn is_generation(&self) -> bool {
        matches!(
            self,
            Self::Generation(_) | Self::Simulation(SimulationError::Generation { .. })
        )
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Generation(e) | Self::Simulation(SimulationError::Generation { source: e, .. }) => {
                e.is_retryable()
            }
            Self::Simulation(_) => false,
        }
    }
}

/// Result type alias for coordgame operations.
pub type GameResult<T> = Result<T, GameError>;
