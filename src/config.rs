//! Engine configuration
//!
//! Loaded from a JSON file:
//!
//! ```json
//! {
//!   "data_dir": "./reldb-data",
//!   "sync_writes": true,
//!   "log_level": "INFO"
//! }
//! ```
//!
//! Only `data_dir` is required.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{Logger, Severity};
use crate::storage::{StorageManager, StorageResult};

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base directory for table, index, and catalog files (required)
    pub data_dir: PathBuf,

    /// fsync files and directories on every atomic replace (default true)
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,

    /// Minimum log severity (default "INFO")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_sync_writes() -> bool {
    true
}

fn default_log_level() -> String {
    Severity::Info.as_str().to_string()
}

impl EngineConfig {
    /// Configuration with defaults for everything but `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            sync_writes: default_sync_writes(),
            log_level: default_log_level(),
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".into()));
        }
        self.severity()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> ConfigResult<Severity> {
        self.log_level.parse().map_err(ConfigError::Invalid)
    }

    /// Applies `log_level` to the process-wide logger.
    pub fn apply_logging(&self) -> ConfigResult<()> {
        Logger::set_min_severity(self.severity()?);
        Ok(())
    }

    /// Opens storage under `data_dir` with the configured sync mode.
    pub fn open_storage(&self) -> StorageResult<StorageManager> {
        Ok(StorageManager::open(&self.data_dir)?.with_sync_writes(self.sync_writes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_json(r#"{"data_dir": "/tmp/reldb"}"#).unwrap();
        assert_eq!(config, EngineConfig::new("/tmp/reldb"));
        assert!(config.sync_writes);
        assert_eq!(config.severity().unwrap(), Severity::Info);
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let err = EngineConfig::from_json(r#"{"data_dir": "x", "log_level": "LOUD"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_empty_data_dir() {
        let err = EngineConfig::from_json(r#"{"data_dir": ""}"#).unwrap_err();
        assert!(err.to_string().contains("data_dir"));
    }

    #[test]
    fn test_requires_data_dir() {
        let err = EngineConfig::from_json(r#"{"sync_writes": false}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reldb.json");
        let data_dir = dir.path().join("data");
        fs::write(
            &path,
            json!({"data_dir": &data_dir, "sync_writes": false, "log_level": "warn"}).to_string(),
        )
        .unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert!(!config.sync_writes);
        assert_eq!(config.severity().unwrap(), Severity::Warn);

        let storage = config.open_storage().unwrap();
        assert!(!storage.sync_writes());
        assert_eq!(storage.data_dir(), data_dir.as_path());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = EngineConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
