//! Persisted run log.
//!
//! The log is plain structured data. Where it ends up is the job of a
//! [`LogSink`]; the simulator itself never touches the filesystem.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SimulationError;
use crate::history::RoundRecord;
use crate::params::GameParameters;

/// Unique identifier for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Creates a new random run ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Run-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Run identifier.
    pub run_id: RunId,
    /// When the simulator was created.
    pub started_at: DateTime<Utc>,
    /// When the log was produced.
    pub finished_at: DateTime<Utc>,
    /// Game parameters.
    pub parameters: GameParameters,
    /// Model identifier handed to the provider.
    pub model: String,
    /// Provider name.
    pub provider: String,
    /// Whether prompts demanded tagged answers.
    pub strict_tags: bool,
}

/// Everything recorded about one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
    /// Run metadata.
    pub metadata: RunMetadata,
    /// Whether some round hit the target.
    pub success: bool,
    /// Every played round, oldest first.
    pub rounds: Vec<RoundRecord>,
}

impl RunLog {
    /// Serializes the log as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, SimulationError> {
        serde_json::to_string_pretty(self).map_err(|e| SimulationError::Log {
            message: format!("failed to serialize run log: {e}"),
        })
    }

    /// Parses a log previously written with [`RunLog::to_json_pretty`].
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        serde_json::from_str(json).map_err(|e| SimulationError::Log {
            message: format!("failed to parse run log: {e}"),
        })
    }
}

/// Destination for finished run logs.
pub trait LogSink {
    /// Persists `log`.
    fn write(&self, log: &RunLog) -> Result<(), SimulationError>;
}

/// Writes logs as pretty JSON to a file, creating parent directories.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    /// Sink writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for JsonFileSink {
    fn write(&self, log: &RunLog) -> Result<(), SimulationError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SimulationError::Log {
                message: format!("failed to create {}: {e}", parent.display()),
            })?;
        }
        let json = log.to_json_pretty()?;
        fs::write(&self.path, json).map_err(|e| SimulationError::Log {
            message: format!("failed to write {}: {e}", self.path.display()),
        })?;
        tracing::debug!(run_id = %log.metadata.run_id, path = %self.path.display(), "run log written");
        Ok(())
    }
}

/// Keeps logs in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    logs: Mutex<Vec<RunLog>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs written so far.
    #[must_use]
    pub fn logs(&self) -> Vec<RunLog> {
        self.logs.lock().expect("memory sink lock poisoned").clone()
    }
}

impl LogSink for MemorySink {
    fn write(&self, log: &RunLog) -> Result<(), SimulationError> {
        self.logs
            .lock()
            .map_err(|_| SimulationError::Log {
                message: "memory sink lock poisoned".to_string(),
            })?
            .push(log.clone());
        Ok(())
    }
}
