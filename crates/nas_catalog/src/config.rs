//! Configuration for the catalog scanner

use crate::error::ConfigError;
use nas_catalog_logging::catalog_home;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration, loaded once at process start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the SQLite catalog
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// NAS mount root to scan
    #[serde(default)]
    pub root_path: String,

    /// Seconds between scans; scan once when unset
    #[serde(default)]
    pub rescan_interval_secs: Option<u64>,

    /// Pending images held for the compression worker
    #[serde(default = "default_image_queue_capacity")]
    pub image_queue_capacity: usize,

    /// Log directory override
    #[serde(default)]
    pub log_dir: Option<String>,

    // TOML tables must follow plain values
    /// Inclusion filters and walk tuning
    #[serde(default)]
    pub scan: ScanOptions,

    /// Classification service endpoint
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Inclusion filter lists. Empty lists place no constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Path prefixes, relative to the root (a leading root is stripped)
    #[serde(default)]
    pub paths: Vec<String>,

    /// Regular expressions searched in the absolute path
    #[serde(default)]
    pub regex_paths: Vec<String>,

    /// File suffixes such as `.jpg`
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Paths buffered between the walker thread and the scan loop
    #[serde(default = "default_walk_buffer")]
    pub walk_buffer: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_classifier_url")]
    pub base_url: String,

    /// Upper bound on one classification call
    #[serde(default = "default_classifier_timeout")]
    pub timeout_secs: u64,
}

fn default_database_path() -> String {
    catalog_home()
        .join("catalog.sqlite3")
        .to_string_lossy()
        .into_owned()
}

fn default_image_queue_capacity() -> usize {
    256
}

fn default_walk_buffer() -> usize {
    1024
}

fn default_classifier_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_classifier_timeout() -> u64 {
    30
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            root_path: String::new(),
            scan: ScanOptions::default(),
            classifier: ClassifierConfig::default(),
            rescan_interval_secs: None,
            image_queue_capacity: default_image_queue_capacity(),
            log_dir: None,
        }
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            regex_paths: Vec::new(),
            extensions: Vec::new(),
            walk_buffer: default_walk_buffer(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: default_classifier_url(),
            timeout_secs: default_classifier_timeout(),
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl CatalogConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    /// Checks that need no filesystem access.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_path.trim().is_empty() {
            return Err(ConfigError::Missing("root_path"));
        }
        Ok(())
    }

    pub fn rescan_interval(&self) -> Option<Duration> {
        self.rescan_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
