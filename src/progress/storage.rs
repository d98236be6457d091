//! Progress persistence
//!
//! The whole progress map lives under a single key in a local key-value store.
//! Every save overwrites that record; there are no partial writes.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::error::StorageError;
use super::model::ProgressSnapshot;

/// Local key-value storage holding string records
pub trait KeyValueStore {
    /// Read a record, `None` if the key is not present
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Create or overwrite a record
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a record; deleting a missing key is not an error
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Records stored as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir` (created lazily on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory of the store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.record_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { key: key.to_string(), source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)
            .and_then(|()| fs::write(self.record_path(key), value))
            .map_err(|source| StorageError::Io { key: key.to_string(), source })
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.record_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { key: key.to_string(), source }),
        }
    }
}

/// In-process store, used for ephemeral sessions and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    unavailable: bool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding one pre-existing record
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut store = Self::default();
        store.entries.insert(key.into(), value.into());
        store
    }

    /// Make every write fail, as a full or disabled storage would
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    /// Raw record for a key
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.unavailable {
            return Err(StorageError::Unavailable("quota exceeded".into()));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.unavailable {
            return Err(StorageError::Unavailable("storage disabled".into()));
        }
        self.entries.remove(key);
        Ok(())
    }
}

/// Reads and writes the progress snapshot under `<prefix>_progress`
#[derive(Debug)]
pub struct ProgressPersistence<S> {
    storage: S,
    key: String,
}

impl<S: KeyValueStore> ProgressPersistence<S> {
    /// Wrap a storage backend, namespacing the record with `prefix`
    pub fn new(storage: S, prefix: &str) -> Self {
        Self { storage, key: format!("{prefix}_progress") }
    }

    /// Storage key of the progress record
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Underlying storage backend
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Mutable access to the storage backend
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Load the persisted snapshot
    ///
    /// Missing, unreadable and malformed records all yield `None`.
    pub fn load(&self) -> Option<ProgressSnapshot> {
        let contents = match self.storage.get(&self.key) {
            Ok(Some(contents)) => contents,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read progress record: {}", e);
                return None;
            }
        };

        let mut snapshot: ProgressSnapshot = match serde_json::from_str(&contents) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Ignoring malformed progress record {:?}: {}", self.key, e);
                return None;
            }
        };

        if let Some((topic, score)) = snapshot
            .iter()
            .find_map(|(id, p)| p.quiz_score.filter(|&s| s > 100).map(|s| (id, s)))
        {
            tracing::warn!("Ignoring progress record: topic {:?} has quiz score {}", topic, score);
            return None;
        }

        for (topic, progress) in snapshot.iter_mut() {
            if progress.refresh_completed() {
                tracing::debug!("Corrected stale completion flag for topic {:?}", topic);
            }
        }

        Some(snapshot)
    }

    /// Overwrite the persisted record with `snapshot`
    pub fn save(&mut self, snapshot: &ProgressSnapshot) -> Result<(), StorageError> {
        let contents = serde_json::to_string(snapshot)?;
        self.storage.set(&self.key, &contents)
    }

    /// Remove the persisted record
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.storage.remove(&self.key)
    }
}
