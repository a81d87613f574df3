//! Error types for the attribution pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for attribution operations
pub type Result<T> = std::result::Result<T, AttributionError>;

/// Main error type for attribution operations
#[derive(Error, Debug)]
pub enum AttributionError {
    #[error("{0}: unable to locate package.json")]
    ManifestNotFound(String),

    #[error("Invalid manifest at {}: {reason}", .path.display())]
    InvalidManifest { path: PathBuf, reason: String },

    #[error("Error scanning directory \"{}\": {message}", .root.display())]
    Scan { root: PathBuf, message: String },

    #[error("Failed to process overrides at {}: {reason}", .path.display())]
    Override { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl AttributionError {
    /// Create an invalid manifest error
    pub fn invalid_manifest(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::InvalidManifest {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a scan error for a root directory
    pub fn scan(root: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Scan {
            root: root.into(),
            message: message.into(),
        }
    }

    /// Create an override processing error
    pub fn override_file(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Override {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

impl From<tokio::task::JoinError> for AttributionError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}
