//! Round simulation.
//!
//! A [`Simulator`] owns the game history and moves through
//! `AwaitingRound → RoundInProgress → {AwaitingRound | Succeeded | Exhausted}`
//! once per round. `Succeeded` and `Exhausted` are terminal.
//!
//! Within a round every participant sees the same history: prompts are
//! rendered before any provider is called, and the finished round is appended
//! only after all participants have answered.

use std::fmt;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{DispatchMode, GenerationErrorPolicy, RetryPolicy, SimulatorConfig, Verbosity};
use crate::error::{GameResult, GenerationError, SimulationError, ValidationError};
use crate::extract::{Guess, GuessExtractor};
use crate::history::{GameHistory, ParticipantTurn, RoundRecord};
use crate::log::{LogSink, RunId, RunLog, RunMetadata};
use crate::params::GameParameters;
use crate::prompt::build_prompt;
use crate::provider::{GenerationRequest, GuessProvider};

/// Lifecycle of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    /// Ready to play the next round.
    AwaitingRound,
    /// Collecting answers.
    RoundInProgress,
    /// A round hit the target.
    Succeeded,
    /// All rounds were played without hitting the target.
    Exhausted,
}

impl GameState {
    /// Returns true for `Succeeded` and `Exhausted`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Exhausted)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingRound => write!(f, "awaiting_round"),
            Self::RoundInProgress => write!(f, "round_in_progress"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// Result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    /// Whether the target was hit.
    pub success: bool,
    /// Rounds actually played.
    pub rounds_played: u32,
    /// Round that hit the target.
    pub winning_round: Option<u32>,
    /// Terminal state.
    pub state: GameState,
}

/// Drives a coordination game against a [`GuessProvider`].
pub struct Simulator<P> {
    params: GameParameters,
    config: SimulatorConfig,
    provider: P,
    extractor: GuessExtractor,
    history: GameHistory,
    state: GameState,
    run_id: RunId,
    started_at: DateTime<Utc>,
}

impl<P: GuessProvider> Simulator<P> {
    /// Creates a simulator in the `AwaitingRound` state.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the parameters or configuration are invalid.
    pub fn new(
        params: GameParameters,
        config: SimulatorConfig,
        provider: P,
    ) -> Result<Self, ValidationError> {
        params.validate()?;
        config.validate()?;
        let extractor = GuessExtractor::new(config.tags.clone())?;
        Ok(Self {
            params,
            config,
            provider,
            extractor,
            history: GameHistory::new(),
            state: GameState::AwaitingRound,
            run_id: RunId::new(),
            started_at: Utc::now(),
        })
    }

    /// Game parameters.
    #[must_use]
    pub const fn params(&self) -> &GameParameters {
        &self.params
    }

    /// Simulator configuration.
    #[must_use]
    pub const fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> GameState {
        self.state
    }

    /// Rounds played so far.
    #[must_use]
    pub const fn history(&self) -> &GameHistory {
        &self.history
    }

    /// Identifier of this run.
    #[must_use]
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Number of completed rounds.
    #[must_use]
    pub fn rounds_played(&self) -> u32 {
        u32::try_from(self.history.len()).unwrap_or(u32::MAX)
    }

    /// Prompt the given participant would receive for the next round.
    #[must_use]
    pub fn prompt_for(&self, participant_id: u32) -> String {
        build_prompt(
            participant_id,
            &self.params,
            &self.history,
            self.config.answer_format(),
            &self.config.tags,
        )
    }

    /// Plays one round and returns its record.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::GameFinished` in a terminal state, or
    /// `SimulationError::Generation` when a provider failure is fatal under
    /// the configured policy. A failed round is discarded and the game stays
    /// in `AwaitingRound`.
    pub fn play_round(&mut self) -> GameResult<&RoundRecord> {
        if self.state.is_terminal() {
            return Err(SimulationError::GameFinished {
                rounds_played: self.rounds_played(),
            }
            .into());
        }

        let round = self.rounds_played() + 1;
        self.state = GameState::RoundInProgress;
        let turns = match self.collect_turns(round) {
            Ok(turns) => turns,
            Err(e) => {
                self.state = GameState::AwaitingRound;
                return Err(e.into());
            }
        };

        let record = RoundRecord::new(round, turns, self.params.target);
        self.state = if record.is_success() {
            GameState::Succeeded
        } else if round >= self.params.max_rounds {
            GameState::Exhausted
        } else {
            GameState::AwaitingRound
        };

        tracing::debug!(
            run_id = %self.run_id,
            round,
            total = record.total(),
            target = self.params.target,
            state = %self.state,
            "round complete"
        );
        if self.config.run.verbosity != Verbosity::None {
            tracing::info!("Round {round}: {}", record.summary());
        }

        self.history.push(record);
        let last = self.history.len() - 1;
        Ok(&self.history.rounds()[last])
    }

    /// Plays rounds until the game succeeds or is exhausted.
    pub fn run(&mut self) -> GameResult<GameOutcome> {
        while !self.state.is_terminal() {
            self.play_round()?;
        }
        let outcome = self.outcome();

        if self.config.run.verbosity != Verbosity::None {
            match outcome.winning_round {
                Some(round) => tracing::info!(
                    "Success! Target {} reached in round {round}.",
                    self.params.target
                ),
                None => tracing::info!("Max rounds reached. Target not achieved."),
            }
        }
        Ok(outcome)
    }

    /// Runs the game and hands the log to `sink`, even when the run fails.
    ///
    /// A run error takes precedence over a sink error; the latter is then
    /// only logged.
    pub fn run_and_persist(&mut self, sink: &dyn LogSink) -> GameResult<GameOutcome> {
        let result = self.run();
        let written = sink.write(&self.to_log());
        match (result, written) {
            (result, Ok(())) => result,
            (Ok(_), Err(e)) => Err(e.into()),
            (Err(run_error), Err(e)) => {
                tracing::error!(run_id = %self.run_id, error = %e, "failed to write run log");
                Err(run_error)
            }
        }
    }

    /// Summary of the game so far.
    #[must_use]
    pub fn outcome(&self) -> GameOutcome {
        let winning_round = self
            .history
            .last()
            .filter(|r| r.is_success())
            .map(|r| r.round);
        GameOutcome {
            success: winning_round.is_some(),
            rounds_played: self.rounds_played(),
            winning_round,
            state: self.state,
        }
    }

    /// Snapshot of the run as a persistable log.
    #[must_use]
    pub fn to_log(&self) -> RunLog {
        RunLog {
            metadata: RunMetadata {
                run_id: self.run_id,
                started_at: self.started_at,
                finished_at: Utc::now(),
                parameters: self.params,
                model: self.config.run.model.clone(),
                provider: self.provider.name().to_string(),
                strict_tags: self.config.strict_tags,
            },
            success: self.state == GameState::Succeeded,
            rounds: self.history.rounds().to_vec(),
        }
    }

    /// Consumes the simulator and returns its history.
    #[must_use]
    pub fn into_history(self) -> GameHistory {
        self.history
    }

    fn collect_turns(&self, round: u32) -> Result<Vec<ParticipantTurn>, SimulationError> {
        let prompts: Vec<(u32, String)> = self
            .params
            .participant_ids()
            .map(|id| (id, self.prompt_for(id)))
            .collect();

        match self.config.dispatch {
            // Short-circuits: participants after a fatal failure are never asked.
            DispatchMode::Sequential => prompts
                .into_iter()
                .map(|(participant_id, prompt)| {
                    let result = self.generate(participant_id, round, &prompt);
                    self.record_turn(participant_id, round, prompt, result)
                })
                .collect(),
            DispatchMode::Parallel => {
                let results = self.generate_parallel(round, &prompts);
                prompts
                    .into_iter()
                    .zip(results)
                    .map(|((participant_id, prompt), result)| {
                        self.record_turn(participant_id, round, prompt, result)
                    })
                    .collect()
            }
        }
    }

    fn generate(&self, participant_id: u32, round: u32, prompt: &str) -> Result<String, GenerationError> {
        let request = GenerationRequest {
            participant_id,
            round,
            prompt,
            model: &self.config.run.model,
        };
        generate_with_retry(&self.provider, self.config.retry, &request)
    }

    /// Answers for `prompts`, returned in the same (ascending id) order.
    fn generate_parallel(
        &self,
        round: u32,
        prompts: &[(u32, String)],
    ) -> Vec<Result<String, GenerationError>> {
        let (tx, rx) = crossbeam_channel::bounded(prompts.len());
        thread::scope(|scope| {
            for (index, (id, prompt)) in prompts.iter().enumerate() {
                let tx = tx.clone();
                scope.spawn(move || {
                    let result = self.generate(*id, round, prompt);
                    // The receiver outlives the scope.
                    let _ = tx.send((index, result));
                });
            }
        });
        drop(tx);

        let mut results: Vec<(usize, Result<String, GenerationError>)> = rx.iter().collect();
        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, result)| result).collect()
    }

    fn record_turn(
        &self,
        participant_id: u32,
        round: u32,
        prompt: String,
        result: Result<String, GenerationError>,
    ) -> Result<ParticipantTurn, SimulationError> {
        let (raw_text, guess) = match result {
            Ok(text) => {
                let guess = self.extractor.extract(&text, self.params.range_max);
                (text, guess)
            }
            Err(source) => match self.config.on_generation_error {
                GenerationErrorPolicy::Fail => {
                    return Err(SimulationError::Generation {
                        participant_id,
                        round,
                        source,
                    });
                }
                GenerationErrorPolicy::RecordNoNumber => {
                    tracing::warn!(
                        run_id = %self.run_id,
                        participant_id,
                        round,
                        error = %source,
                        "generation failed; recording no_number_found"
                    );
                    (String::new(), Guess::no_number())
                }
            },
        };

        tracing::debug!(participant_id, round, guess = guess.value, status = %guess.status, "turn extracted");
        if self.config.run.verbosity == Verbosity::Verbose {
            tracing::info!("Agent {participant_id} prompt:\n{prompt}");
            tracing::info!("Agent {participant_id} response:\n{raw_text}");
        }

        Ok(ParticipantTurn::new(participant_id, guess, raw_text, prompt))
    }
}

/// Calls the provider, retrying retryable failures per `retry`.
///
/// Only the final attempt's outcome is returned.
fn generate_with_retry<P: GuessProvider + ?Sized>(
    provider: &P,
    retry: RetryPolicy,
    request: &GenerationRequest<'_>,
) -> Result<String, GenerationError> {
    let mut attempt = 1;
    loop {
        match provider.generate(request) {
            Ok(text) => return Ok(text),
            Err(e) if e.is_retryable() && attempt < retry.max_attempts => {
                tracing::debug!(
                    participant_id = request.participant_id,
                    round = request.round,
                    attempt,
                    error = %e,
                    "retrying generation"
                );
                attempt += 1;
                if retry.backoff_ms > 0 {
                    thread::sleep(Duration::from_millis(retry.backoff_ms));
                }
            }
            Err(e) => return Err(e),
        }
    }
}
