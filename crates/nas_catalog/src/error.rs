//! Error types for the catalog pipeline

use std::time::Duration;
use thiserror::Error;

/// Startup-time configuration errors. Fatal before any scan runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid path patterns: {}", format_patterns(.0))]
    InvalidPatterns(Vec<PatternError>),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

/// One regex that failed to compile.
#[derive(Debug, Clone)]
pub struct PatternError {
    pub pattern: String,
    pub message: String,
}

fn format_patterns(errors: &[PatternError]) -> String {
    errors
        .iter()
        .map(|e| format!("'{}' ({})", e.pattern, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Classification service failures. Soft per file.
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Classification request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Classification service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Classification timed out after {0:?}")]
    Timeout(Duration),

    #[error("Classification service error: {0}")]
    Service(String),
}

/// Scan-level errors surfaced to the task runner. Startup failures
/// (config, opening the catalog) stay in the binary as `anyhow` errors.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Scan already running for {0}")]
    AlreadyRunning(String),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Task '{task}' failed: {message}")]
    Task { task: String, message: String },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ScanError>;
