//! Progress tracking
//!
//! Tracks which subtopics a learner has completed, derives per-topic
//! completion, and persists the whole map to local storage.

pub mod calculator;
pub mod error;
pub mod model;
pub mod storage;
pub mod store;

// Re-exports
pub use calculator::{SubtopicMap, is_topic_complete, percentage};
pub use error::{ProgressError, StorageError};
pub use model::{ProgressSnapshot, TopicProgress};
pub use storage::{FileStore, KeyValueStore, MemoryStore, ProgressPersistence};
pub use store::ProgressStore;
