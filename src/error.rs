use std::time::Duration;

use thiserror::Error;

use crate::core::task::TaskId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Circular dependency detected: {task} -> {depends_on}")]
    CyclicDependency { task: TaskId, depends_on: TaskId },

    #[error("Task {task} depends on unknown task {dependency}")]
    UnknownDependency { task: TaskId, dependency: TaskId },

    #[error("Duplicate task id: {0}")]
    DuplicateTask(TaskId),

    #[error("No tasks ready to execute - possible deadlock ({} unscheduled)", remaining.len())]
    Deadlock { remaining: Vec<TaskId> },

    #[error("Cost limit exceeded: ${cost:.2} / ${limit} per hour (retry after {retry_after:?})")]
    CostLimitExceeded {
        cost: f64,
        limit: f64,
        retry_after: Duration,
    },

    #[error("Request limit exceeded: {count} / {limit} per hour (retry after {retry_after:?})")]
    RateLimitExceeded {
        count: usize,
        limit: u32,
        retry_after: Duration,
    },

    #[error("Circuit breaker is OPEN, metered calls are blocked for another {retry_after:?}")]
    CircuitOpen { retry_after: Duration },

    #[error("Wave {wave} failed: {} task(s) did not succeed", failures.len())]
    WaveFailed {
        wave: usize,
        failures: Vec<(TaskId, String)>,
    },
}

impl Error {
    /// Whether the caller may retry once the governor's cooldown has elapsed.
    ///
    /// Planning errors are caller input errors and are never retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::CostLimitExceeded { .. }
                | Error::RateLimitExceeded { .. }
                | Error::CircuitOpen { .. }
        )
    }

    /// How long the caller should back off before retrying, if applicable.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::CostLimitExceeded { retry_after, .. }
            | Error::RateLimitExceeded { retry_after, .. }
            | Error::CircuitOpen { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
