//! Core error types for rollcall-core.
//!
//! This module defines the error hierarchy using thiserror. Note that an
//! inconsistent window (end_at at or before start_at) is deliberately not
//! an error: the write path corrects it by shifting end_at forward, see
//! [`crate::maintenance::MaintenanceWindow::prepared_for_write`].

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for rollcall-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Settings-store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Timestamp normalization errors
    #[error("Timestamp error: {0}")]
    Timestamp(#[from] TimestampError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Settings-store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the settings database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Store cannot be reached at all
    #[error("Settings store unavailable: {0}")]
    Unavailable(String),

    /// IO errors while locating or creating the data directory
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Timestamp normalization errors.
#[derive(Error, Debug)]
pub enum TimestampError {
    /// Value matched none of the accepted encodings
    #[error("Malformed timestamp: {value:?}")]
    Malformed { value: String },

    /// Naive local time does not exist in the reference zone (DST gap)
    #[error("Local time {value:?} does not exist in zone {zone}")]
    NonexistentLocal { value: String, zone: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
