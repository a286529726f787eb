//! Append-only record of played rounds.

use serde::{Deserialize, Serialize};

use crate::extract::{ExtractionStatus, Guess};

/// One participant's contribution to a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantTurn {
    /// 1-based participant id.
    pub participant_id: u32,
    /// Final clamped guess.
    pub guess: u32,
    /// Text returned by the generator (after any retries).
    pub raw_text: String,
    /// How the guess was extracted.
    pub status: ExtractionStatus,
    /// Integer found in `raw_text` before clamping, if any.
    pub parsed: Option<i64>,
    /// Prompt sent to the generator.
    pub prompt: String,
}

impl ParticipantTurn {
    /// Builds a turn from an extracted guess.
    #[must_use]
    pub fn new(participant_id: u32, guess: Guess, raw_text: String, prompt: String) -> Self {
        Self {
            participant_id,
            guess: guess.value,
            raw_text,
            status: guess.status,
            parsed: guess.parsed,
            prompt,
        }
    }
}

/// Snapshot of one completed round.
///
/// Turns are always stored in ascending participant id order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// 1-based round number.
    pub round: u32,
    turns: Vec<ParticipantTurn>,
    total: i64,
    success: bool,
}

impl RoundRecord {
    /// Creates a record, ordering turns by participant id.
    #[must_use]
    pub fn new(round: u32, mut turns: Vec<ParticipantTurn>, target: i64) -> Self {
        turns.sort_by_key(|t| t.participant_id);
        let total = turns.iter().map(|t| i64::from(t.guess)).sum();
        Self {
            round,
            turns,
            total,
            success: total == target,
        }
    }

    /// Turns in ascending participant id order.
    #[must_use]
    pub fn turns(&self) -> &[ParticipantTurn] {
        &self.turns
    }

    /// Sum of all guesses.
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.total
    }

    /// Whether the guesses hit the target.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// Guesses in participant order.
    #[must_use]
    pub fn guesses(&self) -> Vec<u32> {
        self.turns.iter().map(|t| t.guess).collect()
    }

    /// `Agent 1: 3, Agent 2: 4` style summary.
    #[must_use]
    pub fn summary(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("Agent {}: {}", t.participant_id, t.guess))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Chronological list of rounds. Rounds can only be appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameHistory {
    rounds: Vec<RoundRecord>,
}

impl GameHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: RoundRecord) {
        self.rounds.push(record);
    }

    /// All rounds, oldest first.
    #[must_use]
    pub fn rounds(&self) -> &[RoundRecord] {
        &self.rounds
    }

    /// Number of rounds played.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    /// Returns true if no round has been played.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Most recent round.
    #[must_use]
    pub fn last(&self) -> Option<&RoundRecord> {
        self.rounds.last()
    }
}
