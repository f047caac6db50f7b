//! Error types.
//!
//! Nothing in the store is fatal: validation errors are returned to the caller
//! before any mutation, storage errors on read degrade to empty collections and
//! storage errors on write are logged.

use std::path::PathBuf;

use thiserror::Error;

/// A rejected form submission.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0} is required")]
    EmptyField(&'static str),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("End date must not be before start date")]
    EndBeforeStart,

    #[error("{0} must not be negative")]
    Negative(&'static str),

    #[error("{0} must be a finite number")]
    NotFinite(&'static str),

    #[error("Work hours must satisfy 0 <= start < end <= 24 (got {start}-{end})")]
    InvalidWorkHours { start: u8, end: u8 },
}

/// Failure talking to the persistence collaborator.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
