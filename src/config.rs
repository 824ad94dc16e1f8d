// src/config.rs
use crate::clipboard::watcher::WatcherConfig;
use crate::history::activation::FeedbackConfig;
use crate::history::store::HistoryConfig;
use crate::telemetry::TelemetryConfig;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "CLIPKEEP_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "clipkeep.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Every section and field is optional; anything left out keeps its default.
///
/// ```yaml
/// watcher:
///   poll_interval_ms: 500
/// history:
///   dedup: whole_history
///   image_key: content_hash
///   max_entries: 200
/// feedback:
///   dismiss_after_ms: 2000
/// telemetry:
///   refresh_interval_ms: 1000
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub watcher: WatcherConfig,
    pub history: HistoryConfig,
    pub feedback: FeedbackConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// `$CLIPKEEP_CONFIG`, else `./clipkeep.yaml`.
    pub fn config_path() -> PathBuf {
        env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Loads from [`config_path`](Self::config_path), falling back to defaults.
    pub fn load() -> Self {
        Self::load_or_default(&Self::config_path())
    }

    /// Never fails: a missing file means defaults, a broken one is logged and
    /// also means defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::from_path(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes as null, not as an empty map.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::types::ImageKeyPolicy;
    use crate::history::store::DedupPolicy;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.watcher.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.history.dedup, DedupPolicy::MostRecent);
        assert_eq!(config.history.image_key, ImageKeyPolicy::Placeholder);
        assert_eq!(config.history.max_entries, None);
        assert_eq!(config.feedback.dismiss_after(), Duration::from_secs(2));
        assert_eq!(config.telemetry.refresh_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config = AppConfig::from_yaml(
            "history:\n  dedup: whole_history\n  image_key: content_hash\n  max_entries: 50\n",
        )
        .unwrap();

        assert_eq!(config.history.dedup, DedupPolicy::WholeHistory);
        assert_eq!(config.history.image_key, ImageKeyPolicy::ContentHash);
        assert_eq!(config.history.max_entries, Some(50));
        assert_eq!(config.watcher, WatcherConfig::default());
        assert_eq!(config.feedback, FeedbackConfig::default());
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(AppConfig::from_yaml("").unwrap(), AppConfig::default());
        assert_eq!(AppConfig::from_yaml("  \n").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_from_path_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "watcher:\n  poll_interval_ms: 250").unwrap();

        let config = AppConfig::from_path(file.path()).unwrap();
        assert_eq!(config.watcher.poll_interval_ms, 250);
    }

    #[test]
    fn test_from_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(matches!(
            AppConfig::from_path(&missing),
            Err(ConfigError::Io { .. })
        ));

        let broken = dir.path().join("broken.yaml");
        fs::write(&broken, "history:\n  dedup: sometimes\n").unwrap();
        assert!(matches!(
            AppConfig::from_path(&broken),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            AppConfig::load_or_default(&dir.path().join("missing.yaml")),
            AppConfig::default()
        );

        let broken = dir.path().join("broken.yaml");
        fs::write(&broken, "watcher: [1, 2").unwrap();
        assert_eq!(AppConfig::load_or_default(&broken), AppConfig::default());
    }
}
