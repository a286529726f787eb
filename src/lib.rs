//! # coordgame - sum-to-target coordination games
//!
//! N participants each privately pick an integer in `[0, K]`; a round
//! succeeds when the picks sum to a target T. This crate provides the exact
//! odds of the uniform-random baseline and a round simulator that asks a
//! pluggable text generator for every participant's answer.
//!
//! ## Core Concepts
//!
//! - **Probability engine**: exact single-round odds by inclusion–exclusion,
//!   multi-round odds and the rounds needed for a given confidence
//! - **Guess extraction**: a priority chain turning free text into a clamped
//!   guess plus the strategy that produced it
//! - **Simulator**: the round state machine with an append-only history
//! - **Run log**: serde-serializable record of a run, handed to a sink
//!
//! ## Usage
//!
//! ```rust
//! use coordgame::{GameParameters, ScriptedProvider, Simulator, SimulatorConfig};
//!
//! let params = GameParameters::new(3, 5, 9, 1)?;
//! let provider = ScriptedProvider::from_rounds([["3", "<answer>3</answer>", "I pick 3"]]);
//! let mut sim = Simulator::new(params, SimulatorConfig::default(), provider)?;
//!
//! let outcome = sim.run()?;
//! assert!(outcome.success);
//!
//! let p = coordgame::single_round_probability(3, 5, 9)?;
//! assert!(p > 0.0);
//! # Ok::<(), coordgame::GameError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod config;
pub mod error;
pub mod extract;
pub mod history;
pub mod log;
pub mod params;
pub mod probability;
pub mod prompt;
pub mod provider;
pub mod simulation;
pub mod telemetry;

// Re-export primary types at crate root for convenience
pub use config::{
    DispatchMode, GenerationErrorPolicy, RetryPolicy, RunConfig, SimulatorConfig, Verbosity,
};
pub use error::{GameError, GameResult, GenerationError, SimulationError, ValidationError};
pub use extract::{AnswerTags, ExtractionStatus, Guess, GuessExtractor};
pub use history::{GameHistory, ParticipantTurn, RoundRecord};
pub use log::{JsonFileSink, LogSink, MemorySink, RunId, RunLog, RunMetadata};
pub use params::GameParameters;
pub use probability::{
    probability_growth, probability_in_x_rounds, rounds_for_target_probability,
    single_round_probability, sum_distribution, GrowthPoint, ProbabilityModel, RoundsNeeded,
};
pub use prompt::{build_prompt, AnswerFormat};
pub use provider::{FnProvider, GenerationRequest, GuessProvider, ScriptedProvider};
pub use simulation::{GameOutcome, GameState, Simulator};
