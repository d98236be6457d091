//! Progress records as they are held in memory and persisted

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::calculator::{self, SubtopicMap};
use crate::catalog::{Catalog, SubtopicKey, Topic};

/// Progress data for a single topic
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicProgress {
    /// Every subtopic is complete (cached, recomputed on each mutation)
    pub completed: bool,

    /// Completion per subtopic key
    pub subtopics: SubtopicMap,

    /// Last quiz score (0-100), if a quiz was taken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_score: Option<u8>,
}

impl TopicProgress {
    /// Fresh progress for a catalog topic: every subtopic incomplete
    pub fn seeded(topic: &Topic) -> Self {
        Self {
            completed: false,
            subtopics: topic.subtopic_keys().into_iter().map(|key| (key, false)).collect(),
            quiz_score: None,
        }
    }

    /// Recompute the cached `completed` flag from the subtopic map
    ///
    /// Returns true if the flag changed.
    pub fn refresh_completed(&mut self) -> bool {
        let completed = calculator::is_topic_complete(&self.subtopics);
        let changed = completed != self.completed;
        self.completed = completed;
        changed
    }

    /// Completion percentage in 0..=100
    pub fn percentage(&self) -> u8 {
        calculator::percentage(&self.subtopics)
    }

    /// Is the given subtopic tracked and complete?
    pub fn is_subtopic_complete(&self, key: &SubtopicKey) -> bool {
        self.subtopics.get(key).copied().unwrap_or(false)
    }
}

/// Full progress map, persisted as one record
pub type ProgressSnapshot = HashMap<String, TopicProgress>;

/// Default progress for every topic in the catalog
pub fn seed_snapshot(catalog: &Catalog) -> ProgressSnapshot {
    catalog.topics.iter().map(|topic| (topic.id.clone(), TopicProgress::seeded(topic))).collect()
}
