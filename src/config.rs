//! Simulator configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::extract::AnswerTags;
use crate::prompt::AnswerFormat;

/// How much observational output a run emits.
///
/// Verbosity never changes control flow or recorded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// No per-round output.
    None,
    /// One summary line per round plus the final outcome.
    #[default]
    Simple,
    /// Also echo every prompt and response.
    Verbose,
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Simple => write!(f, "simple"),
            Self::Verbose => write!(f, "verbose"),
        }
    }
}

impl FromStr for Verbosity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "simple" => Ok(Self::Simple),
            "verbose" => Ok(Self::Verbose),
            other => Err(ValidationError::config(format!(
                "unknown verbosity '{other}' (expected none, simple or verbose)"
            ))),
        }
    }
}

/// What to do when the generator fails for a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationErrorPolicy {
    /// Abort the run with the error.
    #[default]
    Fail,
    /// Record a `no_number_found` guess of 0 and continue the round.
    RecordNoNumber,
}

/// How participants within a round are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// One call at a time, ascending participant id.
    #[default]
    Sequential,
    /// All participants of a round concurrently.
    Parallel,
}

/// Retry behaviour toward the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per participant per round, including the first.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff_ms: 0,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Retries retryable failures up to `max_attempts` in total.
    #[must_use]
    pub const fn attempts(max_attempts: u32, backoff_ms: u64) -> Self {
        Self {
            max_attempts,
            backoff_ms,
        }
    }
}

/// Run-level identification and output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Model identifier passed through to the provider.
    pub model: String,
    /// Observational output level.
    pub verbosity: Verbosity,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            verbosity: Verbosity::default(),
        }
    }
}

/// Configuration for a [`crate::simulation::Simulator`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Instruct participants to answer inside the answer tags.
    pub strict_tags: bool,
    /// Answer delimiters used in prompts and extraction.
    pub tags: AnswerTags,
    /// Retry behaviour toward the generator.
    pub retry: RetryPolicy,
    /// Handling of generator failures that survive retries.
    pub on_generation_error: GenerationErrorPolicy,
    /// Participant dispatch within a round.
    pub dispatch: DispatchMode,
    /// Model and verbosity.
    pub run: RunConfig,
}

impl SimulatorConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.retry.max_attempts == 0 {
            return Err(ValidationError::config("retry.max_attempts must be > 0"));
        }
        if self.run.model.trim().is_empty() {
            return Err(ValidationError::config("run.model must not be empty"));
        }
        self.tags.validate()
    }

    /// Prompt format implied by `strict_tags`.
    #[must_use]
    pub const fn answer_format(&self) -> AnswerFormat {
        if self.strict_tags {
            AnswerFormat::Tagged
        } else {
            AnswerFormat::Free
        }
    }
}
