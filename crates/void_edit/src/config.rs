//! Editing engine configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration for a [`World`](crate::World) and its supporting services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditConfig {
    /// Maximum undo entries kept, oldest evicted first
    pub history_capacity: usize,
    /// Bounded size of the authority inbox and of each observer feed
    pub bus_capacity: usize,
    /// Whether non-rollback changes record an undo snapshot
    pub snapshot_on_change: bool,
    /// Directory used by the filesystem world store
    pub store_dir: PathBuf,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            bus_capacity: 1024,
            snapshot_on_change: true,
            store_dir: PathBuf::from("./worlds"),
        }
    }
}

impl EditConfig {
    /// Config for development (smaller history, local store)
    pub fn development() -> Self {
        Self {
            history_capacity: 50,
            bus_capacity: 256,
            snapshot_on_change: true,
            store_dir: PathBuf::from("./dev_worlds"),
        }
    }

    /// Config for testing (temp directory store)
    pub fn testing() -> Self {
        Self {
            history_capacity: 16,
            bus_capacity: 64,
            snapshot_on_change: true,
            store_dir: std::env::temp_dir().join("void_edit_test_worlds"),
        }
    }

    /// Parse from TOML. Missing keys take their default values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded edit config from {}", path.display());
        Ok(config)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EditConfig::from_toml_str("history_capacity = 8\n").unwrap();
        assert_eq!(config.history_capacity, 8);
        assert_eq!(config.bus_capacity, 1024);
        assert!(config.snapshot_on_change);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EditConfig::development();
        let text = config.to_toml_string().unwrap();
        assert_eq!(EditConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml() {
        let err = EditConfig::from_toml_str("history_capacity = \"lots\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = EditConfig::load("/nonexistent/void_edit.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
