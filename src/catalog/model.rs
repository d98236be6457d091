//! Catalog data model
//!
//! Topics are read-only reference data. The progress core only needs a topic's
//! identifier and its ordered subtopic labels.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalized identifier of a subtopic within its topic
///
/// Derived from a display label: surrounding whitespace trimmed, lowercased,
/// `" & "` replaced with `"-"`, and whitespace runs collapsed to `"-"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubtopicKey(String);

impl SubtopicKey {
    /// Normalize a display label (or an existing key) into a key
    pub fn from_label(label: &str) -> Self {
        let lowered = label.trim().to_lowercase().replace(" & ", "-");
        Self(WHITESPACE.replace_all(&lowered, "-").into_owned())
    }

    /// The key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubtopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubtopicKey {
    fn from(label: &str) -> Self {
        Self::from_label(label)
    }
}

/// A top-level learning unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Unique identifier (e.g., "java-basics")
    pub id: String,
    /// Display title
    pub title: String,
    /// Subtopic display labels in curriculum order
    pub subtopics: Vec<String>,
}

impl Topic {
    /// Create a new topic
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        subtopics: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subtopics: subtopics.into_iter().map(Into::into).collect(),
        }
    }

    /// Normalized keys for every subtopic, in catalog order
    pub fn subtopic_keys(&self) -> Vec<SubtopicKey> {
        self.subtopics.iter().map(|label| SubtopicKey::from_label(label)).collect()
    }

    /// Does this topic or any of its subtopics match the query? (case-insensitive)
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.id.to_lowercase().contains(&query)
            || self.title.to_lowercase().contains(&query)
            || self.subtopics.iter().any(|s| s.to_lowercase().contains(&query))
    }
}
