//! Topic catalog
//!
//! The catalog is the static list of topics the platform teaches. It seeds
//! default progress the first time the application runs.

pub mod model;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use model::{SubtopicKey, Topic};

/// Errors that can occur when loading a catalog file
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file could not be read
    #[error("Failed to read catalog from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Catalog file is not valid catalog JSON
    #[error("Failed to parse catalog {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Ordered list of topics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Topics in curriculum order
    pub topics: Vec<Topic>,
}

impl Catalog {
    /// Create a catalog from topics
    pub fn new(topics: Vec<Topic>) -> Self {
        Self { topics }
    }

    /// The built-in Java curriculum
    pub fn builtin() -> Self {
        Self::new(vec![
            Topic::new(
                "java-basics",
                "Java Basics",
                [
                    "Introduction to Java",
                    "Variables & Data Types",
                    "Operators",
                    "Control Flow",
                    "Loops",
                    "Arrays",
                    "Methods",
                ],
            ),
            Topic::new(
                "oop",
                "Object-Oriented Programming",
                [
                    "Classes & Objects",
                    "Constructors",
                    "Inheritance",
                    "Polymorphism",
                    "Abstraction",
                    "Encapsulation",
                    "Interfaces",
                ],
            ),
            Topic::new(
                "collections",
                "Collections Framework",
                ["List Interface", "Set Interface", "Map Interface", "Queue & Deque", "Iterators"],
            ),
            Topic::new(
                "exceptions",
                "Exception Handling",
                [
                    "Try & Catch",
                    "Checked vs Unchecked",
                    "Custom Exceptions",
                    "Try With Resources",
                ],
            ),
            Topic::new(
                "generics",
                "Generics",
                ["Generic Classes", "Generic Methods", "Bounded Types", "Wildcards"],
            ),
            Topic::new(
                "streams",
                "Streams & Lambdas",
                [
                    "Lambda Expressions",
                    "Functional Interfaces",
                    "Stream API",
                    "Collectors",
                    "Optional",
                ],
            ),
            Topic::new(
                "concurrency",
                "Multithreading & Concurrency",
                [
                    "Threads & Runnables",
                    "Synchronization",
                    "Executor Service",
                    "Concurrent Collections",
                    "CompletableFuture",
                ],
            ),
            Topic::new(
                "file-io",
                "File I/O",
                ["Reading Files", "Writing Files", "NIO Paths & Files", "Serialization"],
            ),
            Topic::new(
                "jvm",
                "JVM Internals",
                ["Class Loading", "Memory Model", "Garbage Collection", "JIT Compilation"],
            ),
        ])
    }

    /// Load a catalog from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|source| CatalogError::Read { path: path.to_path_buf(), source })?;
        serde_json::from_str(&contents)
            .map_err(|source| CatalogError::Parse { path: path.to_path_buf(), source })
    }

    /// Find a topic by ID
    pub fn find(&self, id: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == id)
    }

    /// Filter topics by a case-insensitive substring query
    ///
    /// An empty query returns every topic.
    pub fn search(&self, query: &str) -> Vec<&Topic> {
        let query = query.trim();
        if query.is_empty() {
            return self.topics.iter().collect();
        }
        self.topics.iter().filter(|t| t.matches(query)).collect()
    }

    /// Subtopic keys that two labels of the same topic normalize to
    pub fn key_collisions(&self) -> Vec<(String, SubtopicKey)> {
        let mut collisions = Vec::new();

        for topic in &self.topics {
            let mut seen = HashSet::new();
            for key in topic.subtopic_keys() {
                if !seen.insert(key.clone()) {
                    collisions.push((topic.id.clone(), key));
                }
            }
        }

        collisions
    }
}
