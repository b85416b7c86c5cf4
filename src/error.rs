//! Error types for StackTune
//!
//! Only one condition is fatal for a planning run: not enough free disk
//! space. Everything else the planner or evaluator meets (an undetectable
//! fact, a metric that could not be sampled) is returned as data inside
//! the normal result, see [`crate::plan::UnknownFact`] and
//! [`crate::monitor::MetricUnavailable`].

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for StackTune operations
#[derive(Error, Debug)]
pub enum StackTuneError {
    /// Available space is below the absolute floor needed to operate
    #[error("Insufficient resources: {available_gb} GB available, at least {required_gb} GB required")]
    InsufficientResources { available_gb: u64, required_gb: u64 },

    /// I/O error while reading inputs or writing artifacts
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A hardware facts document could not be used
    #[error("Invalid hardware facts: {0}")]
    InvalidFacts(String),

    /// A metric snapshot document could not be used
    #[error("Invalid metric snapshot: {0}")]
    InvalidMetrics(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON encoding/decoding error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Another planning run holds the artifact lock
    #[error("Another planning run is writing artifacts (lock held at '{0}')")]
    PlanLocked(PathBuf),
}

impl StackTuneError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Whether this error must halt the calling setup workflow
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InsufficientResources { .. })
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } | Self::PlanLocked(path) => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for StackTune operations
pub type Result<T> = std::result::Result<T, StackTuneError>;

impl From<std::io::Error> for StackTuneError {
    fn from(err: std::io::Error) -> Self {
        StackTuneError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for StackTuneError {
    fn from(err: serde_json::Error) -> Self {
        StackTuneError::Serialization(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| StackTuneError::io(path, e))
    }
}
