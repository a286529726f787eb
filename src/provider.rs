//! Text-generation collaborators.
//!
//! The simulator never talks to a language model directly. Each participant's
//! answer comes from a [`GuessProvider`], which turns a prompt into free text.
//! Live backends implement the trait outside this crate; the deterministic
//! providers here drive tests and replays.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::GenerationError;

/// Everything a provider needs to answer one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest<'a> {
    /// 1-based participant id.
    pub participant_id: u32,
    /// 1-based round number.
    pub round: u32,
    /// Rendered prompt.
    pub prompt: &'a str,
    /// Model identifier from the run configuration.
    pub model: &'a str,
}

/// Produces a participant's free-form answer for a prompt.
pub trait GuessProvider: Send + Sync {
    /// Name of the provider (for logs).
    fn name(&self) -> &str;

    /// Generates the answer text.
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, GenerationError>;
}

impl<P: GuessProvider + ?Sized> GuessProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, GenerationError> {
        (**self).generate(request)
    }
}

/// Provider backed by a closure.
pub struct FnProvider<F> {
    name: String,
    f: F,
}

impl<F> FnProvider<F>
where
    F: Fn(&GenerationRequest<'_>) -> Result<String, GenerationError> + Send + Sync,
{
    /// Wraps `f` as a provider.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> GuessProvider for FnProvider<F>
where
    F: Fn(&GenerationRequest<'_>) -> Result<String, GenerationError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, GenerationError> {
        (self.f)(request)
    }
}

/// Replays queued responses per participant.
///
/// Each call pops the next response queued for the requesting participant.
/// Queued errors are returned as-is, which makes retry paths testable.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<u32, VecDeque<Result<String, GenerationError>>>>,
}

impl ScriptedProvider {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues responses round by round: `rounds[r][i]` is the answer of
    /// participant `i + 1` in round `r + 1`.
    #[must_use]
    pub fn from_rounds<I, R, S>(rounds: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::new();
        for round in rounds {
            for (participant_id, text) in (1..).zip(round) {
                provider.push(participant_id, text);
            }
        }
        provider
    }

    /// Queues a response for `participant_id`.
    pub fn push(&self, participant_id: u32, text: impl Into<String>) {
        self.push_result(participant_id, Ok(text.into()));
    }

    /// Queues a failure for `participant_id`.
    pub fn push_error(&self, participant_id: u32, error: GenerationError) {
        self.push_result(participant_id, Err(error));
    }

    /// Responses still queued for `participant_id`.
    #[must_use]
    pub fn remaining(&self, participant_id: u32) -> usize {
        let guard = self.scripts.lock().expect("scripted provider lock poisoned");
        guard.get(&participant_id).map_or(0, VecDeque::len)
    }

    fn push_result(&self, participant_id: u32, result: Result<String, GenerationError>) {
        let mut guard = self.scripts.lock().expect("scripted provider lock poisoned");
        guard.entry(participant_id).or_default().push_back(result);
    }
}

impl GuessProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, GenerationError> {
        let mut guard = self.scripts.lock().expect("scripted provider lock poisoned");
        guard
            .get_mut(&request.participant_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Err(GenerationError::Exhausted {
                participant_id: request.participant_id,
            }))
    }
}
