//! Completion math over a topic's subtopic map

use std::collections::HashMap;

use crate::catalog::SubtopicKey;

/// Subtopic key to completion flag
pub type SubtopicMap = HashMap<SubtopicKey, bool>;

/// True iff the map is non-empty and every subtopic is complete
pub fn is_topic_complete(subtopics: &SubtopicMap) -> bool {
    !subtopics.is_empty() && subtopics.values().all(|&done| done)
}

/// Number of completed subtopics
pub fn completed_count(subtopics: &SubtopicMap) -> usize {
    subtopics.values().filter(|&&done| done).count()
}

/// Completion percentage in 0..=100
///
/// Rounds half up, except that an incomplete topic never reports 100.
pub fn percentage(subtopics: &SubtopicMap) -> u8 {
    let total = subtopics.len();
    if total == 0 {
        return 0;
    }

    let done = completed_count(subtopics);
    if done == total {
        return 100;
    }

    let rounded = (200 * done + total) / (2 * total);
    rounded.min(99) as u8
}
