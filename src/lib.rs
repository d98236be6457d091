//! ByteForge - progress tracking for an interactive Java learning platform
//!
//! Learners work through topics made of subtopics. This crate keeps track of
//! which subtopics are complete, derives per-topic completion and quiz
//! results, and persists everything to local storage.

pub mod catalog;
pub mod config;
pub mod progress;

pub use catalog::{Catalog, SubtopicKey, Topic};
pub use config::Config;
pub use progress::{ProgressError, ProgressStore, TopicProgress};
