//! The progress store
//!
//! Owns the canonical in-memory progress map. Every mutation re-derives the
//! topic's completion flag and flushes the full snapshot before returning.
//! The in-memory map stays authoritative for the session even when a flush
//! fails.

use super::calculator;
use super::error::ProgressError;
use super::model::{ProgressSnapshot, TopicProgress, seed_snapshot};
use super::storage::{KeyValueStore, ProgressPersistence};
use crate::catalog::{Catalog, SubtopicKey};

/// Per-topic progress for one session
#[derive(Debug)]
pub struct ProgressStore<S> {
    catalog: Catalog,
    progress: ProgressSnapshot,
    persistence: ProgressPersistence<S>,
}

impl<S: KeyValueStore> ProgressStore<S> {
    /// Open the store, rehydrating persisted progress or seeding from the catalog
    pub fn open(catalog: Catalog, persistence: ProgressPersistence<S>) -> Self {
        let progress = match persistence.load() {
            Some(snapshot) => {
                tracing::debug!("Loaded progress for {} topics", snapshot.len());
                snapshot
            }
            None => {
                for (topic, key) in catalog.key_collisions() {
                    tracing::warn!("Topic {:?} has duplicate subtopic key {:?}", topic, key);
                }
                tracing::debug!("Seeding progress for {} topics", catalog.topics.len());
                seed_snapshot(&catalog)
            }
        };

        Self { catalog, progress, persistence }
    }

    /// Mark a subtopic complete and recompute the topic's completion
    ///
    /// Marking an already complete subtopic changes nothing. Unknown topics and
    /// subtopics are reported and leave the store untouched.
    pub fn mark_subtopic_complete(
        &mut self,
        topic_id: &str,
        subtopic_label: &str,
    ) -> Result<(), ProgressError> {
        let key = SubtopicKey::from_label(subtopic_label);
        let topic = self
            .progress
            .get_mut(topic_id)
            .ok_or_else(|| ProgressError::TopicNotFound(topic_id.to_string()))?;

        let done = topic.subtopics.get_mut(&key).ok_or_else(|| ProgressError::SubtopicNotFound {
            topic: topic_id.to_string(),
            subtopic: key.to_string(),
        })?;

        *done = true;
        if topic.refresh_completed() {
            tracing::info!("Topic {:?} completed", topic_id);
        }
        tracing::debug!("Marked {:?}/{:?} complete", topic_id, key.as_str());

        self.flush()
    }

    /// Record the latest quiz score for a topic, replacing any previous score
    ///
    /// Scores outside 0..=100 are rejected. Topics without a record get one with
    /// no subtopics.
    pub fn update_quiz_score(&mut self, topic_id: &str, score: i32) -> Result<(), ProgressError> {
        let score = u8::try_from(score)
            .ok()
            .filter(|s| *s <= 100)
            .ok_or(ProgressError::InvalidScore(score))?;

        self.progress.entry(topic_id.to_string()).or_default().quiz_score = Some(score);
        tracing::debug!("Quiz score for {:?} set to {}", topic_id, score);

        self.flush()
    }

    /// Completion percentage for a topic, 0 when unknown or without subtopics
    pub fn completion_percentage(&self, topic_id: &str) -> u8 {
        self.progress.get(topic_id).map_or(0, TopicProgress::percentage)
    }

    /// Erase all progress in memory and in storage
    pub fn reset_progress(&mut self) -> Result<(), ProgressError> {
        self.progress.clear();
        tracing::info!("Progress reset");

        self.persistence.clear().map_err(|e| {
            tracing::warn!("Failed to clear stored progress: {}", e);
            ProgressError::Persist(e)
        })
    }

    /// Is every subtopic of the topic complete?
    pub fn is_topic_complete(&self, topic_id: &str) -> bool {
        self.progress.get(topic_id).is_some_and(|p| calculator::is_topic_complete(&p.subtopics))
    }

    /// Is the subtopic complete? Accepts a display label or a key.
    pub fn is_subtopic_complete(&self, topic_id: &str, subtopic: &str) -> bool {
        self.progress
            .get(topic_id)
            .is_some_and(|p| p.is_subtopic_complete(&SubtopicKey::from_label(subtopic)))
    }

    /// Raw progress record for a topic
    pub fn topic(&self, topic_id: &str) -> Option<&TopicProgress> {
        self.progress.get(topic_id)
    }

    /// Number of completed subtopics in a topic
    pub fn completed_count(&self, topic_id: &str) -> usize {
        self.progress.get(topic_id).map_or(0, |p| calculator::completed_count(&p.subtopics))
    }

    /// Mean completion across catalog topics, rounded half up
    pub fn overall_percentage(&self) -> u8 {
        let topics = &self.catalog.topics;
        if topics.is_empty() {
            return 0;
        }

        let sum: usize = topics.iter().map(|t| self.completion_percentage(&t.id) as usize).sum();
        ((2 * sum + topics.len()) / (2 * topics.len())) as u8
    }

    /// Topics whose last quiz score is below `threshold`, lowest score first
    pub fn weak_topics(&self, threshold: u8) -> Vec<(String, u8)> {
        let mut weak: Vec<(String, u8)> = self
            .progress
            .iter()
            .filter_map(|(id, p)| p.quiz_score.filter(|&s| s < threshold).map(|s| (id.clone(), s)))
            .collect();

        weak.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        weak
    }

    /// Full in-memory progress map
    pub fn snapshot(&self) -> &ProgressSnapshot {
        &self.progress
    }

    /// Catalog the store was opened with
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Persistence adapter backing the store
    pub fn persistence(&self) -> &ProgressPersistence<S> {
        &self.persistence
    }

    /// Mutable access to the persistence adapter
    pub fn persistence_mut(&mut self) -> &mut ProgressPersistence<S> {
        &mut self.persistence
    }

    fn flush(&mut self) -> Result<(), ProgressError> {
        self.persistence.save(&self.progress).map_err(|e| {
            tracing::warn!("Failed to save progress: {}", e);
            ProgressError::Persist(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Topic;
    use crate::progress::storage::MemoryStore;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const KEY: &str = "byteforge_progress";

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Topic::new("java-basics", "Java Basics", ["Variables & Data Types", "Loops", "Arrays"]),
            Topic::new("oop", "Object-Oriented Programming", ["Inheritance", "Polymorphism"]),
            Topic::new("empty", "Coming Soon", Vec::<String>::new()),
        ])
    }

    fn open_with(storage: MemoryStore) -> ProgressStore<MemoryStore> {
        ProgressStore::open(catalog(), ProgressPersistence::new(storage, "byteforge"))
    }

    fn store() -> ProgressStore<MemoryStore> {
        open_with(MemoryStore::new())
    }

    #[test]
    fn fresh_store_is_seeded_from_catalog() {
        let store = store();
        assert_eq!(store.snapshot().len(), 3);
        assert_eq!(store.completion_percentage("java-basics"), 0);
        assert!(!store.is_topic_complete("java-basics"));
        assert_eq!(store.topic("oop").unwrap().quiz_score, None);
    }

    #[test]
    fn percentage_follows_marked_subtopics() {
        let mut store = store();
        assert_eq!(store.completion_percentage("java-basics"), 0);

        store.mark_subtopic_complete("java-basics", "Variables & Data Types").unwrap();
        assert_eq!(store.completion_percentage("java-basics"), 33);

        store.mark_subtopic_complete("java-basics", "Loops").unwrap();
        assert_eq!(store.completion_percentage("java-basics"), 67);
        assert!(!store.is_topic_complete("java-basics"));

        store.mark_subtopic_complete("java-basics", "Arrays").unwrap();
        assert_eq!(store.completion_percentage("java-basics"), 100);
        assert!(store.is_topic_complete("java-basics"));
        assert!(store.topic("java-basics").unwrap().completed);
    }

    #[test]
    fn subtopic_lookup_accepts_label_or_key() {
        let mut store = store();
        store.mark_subtopic_complete("java-basics", "Variables & Data Types").unwrap();

        assert!(store.is_subtopic_complete("java-basics", "Variables & Data Types"));
        assert!(store.is_subtopic_complete("java-basics", "variables-data-types"));
        assert!(!store.is_subtopic_complete("java-basics", "loops"));
        assert!(!store.is_subtopic_complete("nonexistent-topic", "loops"));
    }

    #[test]
    fn marking_twice_equals_marking_once() {
        let mut once = store();
        once.mark_subtopic_complete("oop", "Inheritance").unwrap();

        let mut twice = store();
        twice.mark_subtopic_complete("oop", "Inheritance").unwrap();
        twice.mark_subtopic_complete("oop", "Inheritance").unwrap();

        assert_eq!(once.snapshot(), twice.snapshot());
        assert_eq!(once.persistence().load(), twice.persistence().load());
    }

    #[test]
    fn mutations_are_persisted() {
        let mut store = store();
        store.mark_subtopic_complete("oop", "Inheritance").unwrap();
        store.update_quiz_score("oop", 80).unwrap();

        let reopened = open_with(store.persistence().storage().clone());
        assert_eq!(reopened.snapshot(), store.snapshot());
        assert!(reopened.is_subtopic_complete("oop", "inheritance"));
        assert_eq!(reopened.topic("oop").unwrap().quiz_score, Some(80));
    }

    #[test]
    fn unknown_topic_is_reported_without_change() {
        let mut store = store();
        let before = store.snapshot().clone();

        let err = store.mark_subtopic_complete("nonexistent-topic", "x").unwrap_err();
        assert!(matches!(err, ProgressError::TopicNotFound(ref id) if id == "nonexistent-topic"));
        assert!(!err.is_applied());
        assert_eq!(store.snapshot(), &before);
        assert_eq!(store.completion_percentage("nonexistent-topic"), 0);
        assert!(store.persistence().storage().raw(KEY).is_none());
    }

    #[test]
    fn unknown_subtopic_is_reported_without_change() {
        let mut store = store();
        let err = store.mark_subtopic_complete("oop", "Encapsulation").unwrap_err();

        assert!(matches!(err, ProgressError::SubtopicNotFound { ref subtopic, .. } if subtopic == "encapsulation"));
        assert_eq!(store.topic("oop").unwrap().subtopics.len(), 2);
    }

    #[test]
    fn topic_without_subtopics_is_never_complete() {
        let store = store();
        assert_eq!(store.completion_percentage("empty"), 0);
        assert!(!store.is_topic_complete("empty"));
    }

    #[test]
    fn quiz_score_overwrites_previous_attempt() {
        let mut store = store();
        store.update_quiz_score("java-basics", 40).unwrap();
        store.update_quiz_score("java-basics", 90).unwrap();

        let record = store.topic("java-basics").unwrap();
        assert_eq!(record.quiz_score, Some(90));
        assert!(!record.completed);
    }

    #[test]
    fn quiz_score_bounds_are_inclusive() {
        let mut store = store();
        store.update_quiz_score("oop", 0).unwrap();
        store.update_quiz_score("java-basics", 100).unwrap();
        assert_eq!(store.topic("oop").unwrap().quiz_score, Some(0));
        assert_eq!(store.topic("java-basics").unwrap().quiz_score, Some(100));
    }

    #[test]
    fn out_of_range_quiz_score_is_rejected() {
        let mut store = store();
        store.update_quiz_score("oop", 70).unwrap();

        assert!(matches!(store.update_quiz_score("oop", 101), Err(ProgressError::InvalidScore(101))));
        assert!(matches!(store.update_quiz_score("oop", -1), Err(ProgressError::InvalidScore(-1))));
        assert_eq!(store.topic("oop").unwrap().quiz_score, Some(70));
    }

    #[test]
    fn quiz_score_creates_missing_topic_record() {
        let mut store = store();
        store.update_quiz_score("retired-topic", 55).unwrap();

        let record = store.topic("retired-topic").unwrap();
        assert!(record.subtopics.is_empty());
        assert!(!record.completed);
        assert_eq!(record.quiz_score, Some(55));
        assert_eq!(store.completion_percentage("retired-topic"), 0);
    }

    #[test]
    fn reset_clears_memory_and_storage() {
        let mut store = store();
        store.mark_subtopic_complete("oop", "Inheritance").unwrap();
        store.mark_subtopic_complete("oop", "Polymorphism").unwrap();
        store.update_quiz_score("oop", 100).unwrap();

        store.reset_progress().unwrap();

        for topic in ["java-basics", "oop", "empty"] {
            assert_eq!(store.completion_percentage(topic), 0);
            assert!(!store.is_topic_complete(topic));
        }
        assert!(store.snapshot().is_empty());
        assert!(store.persistence().load().is_none());
    }

    #[test]
    fn reopening_after_reset_reseeds() {
        let mut store = store();
        store.mark_subtopic_complete("oop", "Inheritance").unwrap();
        store.reset_progress().unwrap();

        let reopened = open_with(store.persistence().storage().clone());
        assert_eq!(reopened.snapshot().len(), 3);
        assert!(!reopened.is_subtopic_complete("oop", "inheritance"));
    }

    #[test]
    fn corrupt_storage_falls_back_to_seed() {
        let store = open_with(MemoryStore::with_entry(KEY, "definitely not json"));
        assert_eq!(store.snapshot().len(), 3);
        assert!(store.snapshot().values().all(|p| p.subtopics.values().all(|&d| !d)));
    }

    #[test]
    fn wrong_shape_storage_falls_back_to_seed() {
        let record = r#"{"oop":{"completed":false,"subtopics":"inheritance"}}"#;
        let store = open_with(MemoryStore::with_entry(KEY, record));
        assert_eq!(store.topic("oop").unwrap().subtopics.len(), 2);
    }

    #[test]
    fn persisted_state_is_not_merged_with_catalog() {
        let record = r#"{"oop":{"completed":false,"subtopics":{"inheritance":true}}}"#;
        let store = open_with(MemoryStore::with_entry(KEY, record));

        assert_eq!(store.snapshot().len(), 1);
        assert!(store.topic("java-basics").is_none());
        assert_eq!(store.topic("oop").unwrap().subtopics.len(), 1);
        assert_eq!(store.completion_percentage("oop"), 100);
    }

    #[test]
    fn save_failure_keeps_in_memory_update() {
        let mut store = store();
        store.persistence_mut().storage_mut().set_unavailable(true);

        let err = store.mark_subtopic_complete("oop", "Inheritance").unwrap_err();
        assert!(err.is_applied());
        assert!(store.is_subtopic_complete("oop", "Inheritance"));
        assert_eq!(store.completion_percentage("oop"), 50);
    }

    #[test]
    fn reset_with_unavailable_storage_still_clears_memory() {
        let mut store = store();
        store.mark_subtopic_complete("oop", "Inheritance").unwrap();
        store.persistence_mut().storage_mut().set_unavailable(true);

        assert!(store.reset_progress().is_err());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn overall_percentage_averages_catalog_topics() {
        let mut store = store();
        assert_eq!(store.overall_percentage(), 0);

        store.mark_subtopic_complete("oop", "Inheritance").unwrap();
        store.mark_subtopic_complete("oop", "Polymorphism").unwrap();
        // (0 + 100 + 0) / 3
        assert_eq!(store.overall_percentage(), 33);
    }

    #[test]
    fn weak_topics_sorted_by_score() {
        let mut store = store();
        store.update_quiz_score("java-basics", 65).unwrap();
        store.update_quiz_score("oop", 40).unwrap();
        store.update_quiz_score("empty", 95).unwrap();

        assert_eq!(
            store.weak_topics(70),
            vec![("oop".to_string(), 40), ("java-basics".to_string(), 65)]
        );
    }

    #[test]
    fn completed_count_counts_marked_subtopics() {
        let mut store = store();
        store.mark_subtopic_complete("java-basics", "Loops").unwrap();
        assert_eq!(store.completed_count("java-basics"), 1);
        assert_eq!(store.completed_count("nonexistent-topic"), 0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Mark(usize, usize),
        Quiz(usize, i32),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..4, 0usize..4).prop_map(|(t, s)| Op::Mark(t, s)),
            (0usize..4, -20i32..130).prop_map(|(t, score)| Op::Quiz(t, score)),
        ]
    }

    fn apply(store: &mut ProgressStore<MemoryStore>, op: &Op) {
        let topics = ["java-basics", "oop", "empty", "nonexistent-topic"];
        let labels = ["Variables & Data Types", "Loops", "Inheritance", "Polymorphism"];
        let _ = match *op {
            Op::Mark(t, s) => store.mark_subtopic_complete(topics[t], labels[s]),
            Op::Quiz(t, score) => store.update_quiz_score(topics[t], score),
        };
    }

    proptest! {
        #[test]
        fn completion_never_decreases(ops in proptest::collection::vec(arb_op(), 0..40)) {
            let mut store = store();
            for op in &ops {
                let before: Vec<usize> =
                    ["java-basics", "oop"].iter().map(|t| store.completed_count(t)).collect();
                let was_done: Vec<(String, SubtopicKey)> = store
                    .snapshot()
                    .iter()
                    .flat_map(|(t, p)| {
                        p.subtopics.iter().filter(|(_, d)| **d).map(move |(k, _)| (t.clone(), k.clone()))
                    })
                    .collect();

                apply(&mut store, op);

                for (i, t) in ["java-basics", "oop"].iter().enumerate() {
                    prop_assert!(store.completed_count(t) >= before[i]);
                }
                for (t, k) in &was_done {
                    prop_assert!(store.is_subtopic_complete(t, k.as_str()));
                }
            }
        }

        #[test]
        fn completed_flag_always_matches_subtopics(ops in proptest::collection::vec(arb_op(), 0..40)) {
            let mut store = store();
            for op in &ops {
                apply(&mut store, op);
            }
            for progress in store.snapshot().values() {
                prop_assert_eq!(progress.completed, calculator::is_topic_complete(&progress.subtopics));
                prop_assert_eq!(progress.percentage() == 100, progress.completed);
            }
            if let Some(persisted) = store.persistence().load() {
                prop_assert_eq!(&persisted, store.snapshot());
            }
        }
    }
}
