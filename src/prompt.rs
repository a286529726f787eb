//! Prompt construction.
//!
//! A prompt depends only on the participant id, the game parameters and the
//! rounds played so far, so identical inputs always produce identical text.

use std::fmt::Write as _;

use crate::extract::AnswerTags;
use crate::history::GameHistory;
use crate::params::GameParameters;

/// Instruction style for the answer format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerFormat {
    /// No format instruction; rely on best-effort extraction.
    #[default]
    Free,
    /// Require the answer wrapped in the configured tags.
    Tagged,
}

/// Renders the prompt for `participant_id`.
#[must_use]
pub fn build_prompt(
    participant_id: u32,
    params: &GameParameters,
    history: &GameHistory,
    format: AnswerFormat,
    tags: &AnswerTags,
) -> String {
    let mut prompt = format!(
        "You are Agent {participant_id}. Choose an integer between 0 and {}. \
         The goal is for all agents' numbers to sum to {}.",
        params.range_max, params.target
    );

    if history.is_empty() {
        prompt.push_str("\nThis is the first round.");
    } else {
        prompt.push_str("\nHistory so far:");
        for record in history.rounds() {
            // Writing to a String cannot fail.
            let _ = write!(prompt, "\nRound {}: {}", record.round, record.summary());
        }
    }

    if format == AnswerFormat::Tagged {
        let _ = write!(
            prompt,
            "\nYou may reason briefly, but finish with your final answer written as {}, \
             where N is a single integer between 0 and {}.",
            tags.wrap("N"),
            params.range_max
        );
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ExtractionStatus, Guess};
    use crate::history::{ParticipantTurn, RoundRecord};

    fn params() -> GameParameters {
        GameParameters::new(2, 5, 7, 3).unwrap()
    }

    fn round(number: u32, guesses: &[u32]) -> RoundRecord {
        let turns = guesses
            .iter()
            .zip(1..)
            .map(|(&g, id)| {
                let guess = Guess::clamped(i64::from(g), ExtractionStatus::UntaggedLastNumber, 5);
                ParticipantTurn::new(id, guess, g.to_string(), String::new())
            })
            .collect();
        RoundRecord::new(number, turns, 7)
    }

    #[test]
    fn first_round_prompt() {
        let prompt = build_prompt(1, &params(), &GameHistory::new(), AnswerFormat::Free, &AnswerTags::default());
        assert_eq!(
            prompt,
            "You are Agent 1. Choose an integer between 0 and 5. \
             The goal is for all agents' numbers to sum to 7.\nThis is the first round."
        );
    }

    #[test]
    fn history_is_replayed_in_order() {
        let mut history = GameHistory::new();
        history.push(round(1, &[2, 2]));
        history.push(round(2, &[4, 1]));
        let prompt = build_prompt(2, &params(), &history, AnswerFormat::Free, &AnswerTags::default());
        assert!(prompt.starts_with("You are Agent 2."));
        assert!(prompt.ends_with(
            "History so far:\nRound 1: Agent 1: 2, Agent 2: 2\nRound 2: Agent 1: 4, Agent 2: 1"
        ));
        assert!(!prompt.contains("<answer>"));
    }

    #[test]
    fn tagged_format_adds_instruction() {
        let prompt = build_prompt(1, &params(), &GameHistory::new(), AnswerFormat::Tagged, &AnswerTags::default());
        assert!(prompt.contains("<answer>N</answer>"));
        assert!(prompt.contains("between 0 and 5."));
    }

    #[test]
    fn prompt_is_deterministic() {
        let mut history = GameHistory::new();
        history.push(round(1, &[0, 5]));
        let a = build_prompt(1, &params(), &history, AnswerFormat::Tagged, &AnswerTags::default());
        let b = build_prompt(1, &params(), &history, AnswerFormat::Tagged, &AnswerTags::default());
        assert_eq!(a, b);
    }
}
