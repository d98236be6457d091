//! Configuration management for ByteForge

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::progress::{FileStore, ProgressPersistence, ProgressStore};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Namespace for storage keys (progress lives under `<prefix>_progress`)
    pub storage_prefix: String,

    /// Override for the data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Catalog JSON file replacing the built-in curriculum
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,

    /// Quiz scores below this are reported as weak topics
    #[serde(default = "default_weak_threshold")]
    pub weak_score_threshold: u8,
}

fn default_weak_threshold() -> u8 {
    70
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_prefix: "byteforge".to_string(),
            data_dir: None,
            catalog_path: None,
            weak_score_threshold: default_weak_threshold(),
        }
    }
}

impl Config {
    /// Load configuration from disk, or create default if not exists
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;
            serde_json::from_str(&contents).with_context(|| "Failed to parse config.json")
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "byteforge").context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Get the data directory path, honoring the override
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let proj_dirs =
            ProjectDirs::from("", "", "byteforge").context("Failed to determine data directory")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// The topic catalog: the configured file, or the built-in one
    pub fn catalog(&self) -> Result<Catalog> {
        match &self.catalog_path {
            Some(path) => Ok(Catalog::from_json_file(path)?),
            None => Ok(Catalog::builtin()),
        }
    }

    /// Open the file-backed progress store for this configuration
    pub fn open_progress_store(&self) -> Result<ProgressStore<FileStore>> {
        let storage = FileStore::new(self.data_dir()?);
        let persistence = ProgressPersistence::new(storage, &self.storage_prefix);
        Ok(ProgressStore::open(self.catalog()?, persistence))
    }
}
