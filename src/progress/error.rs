//! Error types for progress tracking

use thiserror::Error;

/// Errors raised by a key-value storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend could not be read or written
    #[error("Storage I/O failed for key {key:?}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Backend refuses writes (quota exceeded, storage disabled)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Snapshot could not be serialized
    #[error("Failed to serialize progress: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors reported by progress store mutations
#[derive(Debug, Error)]
pub enum ProgressError {
    /// Topic is not tracked by the store
    #[error("Unknown topic: {0}")]
    TopicNotFound(String),

    /// Subtopic key is not part of the topic
    #[error("Unknown subtopic {subtopic:?} in topic {topic:?}")]
    SubtopicNotFound { topic: String, subtopic: String },

    /// Quiz score outside 0..=100
    #[error("Quiz score {0} is outside 0..=100")]
    InvalidScore(i32),

    /// Mutation was applied in memory but could not be persisted
    #[error("Progress updated but not saved: {0}")]
    Persist(#[from] StorageError),
}

impl ProgressError {
    /// Did the mutation take effect in memory despite the error?
    pub fn is_applied(&self) -> bool {
        matches!(self, ProgressError::Persist(_))
    }
}
