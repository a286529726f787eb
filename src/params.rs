//! Game parameters.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Immutable parameters of one coordination game.
///
/// `target` may be any integer. Targets outside `[0, N·K]` are accepted but
/// can never be hit, so every round fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameParameters {
    /// Number of participants (N).
    pub participant_count: u32,
    /// Largest number a participant may choose (K); guesses lie in `[0, K]`.
    pub range_max: u32,
    /// Sum that constitutes success (T).
    pub target: i64,
    /// Maximum number of rounds before the game is exhausted.
    pub max_rounds: u32,
}

impl GameParameters {
    /// Creates validated parameters.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidParameter` if `participant_count` or
    /// `max_rounds` is zero.
    pub fn new(
        participant_count: u32,
        range_max: u32,
        target: i64,
        max_rounds: u32,
    ) -> Result<Self, ValidationError> {
        let params = Self {
            participant_count,
            range_max,
            target,
            max_rounds,
        };
        params.validate()?;
        Ok(params)
    }

    /// Validate parameters.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.participant_count == 0 {
            return Err(ValidationError::parameter(
                "participant_count",
                "must be >= 1",
            ));
        }
        if self.max_rounds == 0 {
            return Err(ValidationError::parameter("max_rounds", "must be >= 1"));
        }
        Ok(())
    }

    /// Largest reachable sum, `N·K`.
    #[must_use]
    pub fn max_sum(&self) -> i64 {
        i64::from(self.participant_count) * i64::from(self.range_max)
    }

    /// Returns true if some assignment of guesses sums to the target.
    #[must_use]
    pub fn is_target_reachable(&self) -> bool {
        (0..=self.max_sum()).contains(&self.target)
    }

    /// Participant ids in play order (1-based, ascending).
    pub fn participant_ids(&self) -> impl Iterator<Item = u32> {
        1..=self.participant_count
    }
}
