use thiserror::Error;

use crate::models::TaskId;

/// Errors raised by the task store and its collaborators
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Rejected input, e.g. an empty title or a malformed time of day
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("task {0} not found")]
    NotFound(TaskId),

    /// Durable storage holds data that cannot be decoded
    #[error("malformed persisted state under key '{key}': {source}")]
    MalformedPersistedState {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("failed to serialize state: {0}")]
    Serialize(#[source] serde_json::Error),
}

pub type Result<T, E = TrackerError> = std::result::Result<T, E>;
