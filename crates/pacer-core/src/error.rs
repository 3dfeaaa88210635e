//! Core error types for pacer-core.
//!
//! This module defines the error hierarchy using thiserror. Every error
//! here is recoverable: the host can keep interacting with the ledger and
//! the phase clock after any of them.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pacer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Rejected input; ledger state is unchanged
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Operation referenced a routine id that is not in the ledger
    #[error("Routine not found: {id}")]
    NotFound { id: String },

    /// Storage-related errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn not_found(id: impl Into<String>) -> Self {
        CoreError::NotFound { id: id.into() }
    }
}

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Store location could not be resolved
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked by another writer
    #[error("Store is locked")]
    Locked,

    /// The store refused the write (quota exceeded, read-only media)
    #[error("Write rejected for key '{key}': {reason}")]
    WriteRejected { key: String, reason: String },

    /// A record could not be serialized for writing
    #[error("Failed to encode record '{key}': {message}")]
    Encode { key: String, message: String },
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

    /// Unknown dotted key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Title is empty or too long (lengths are in characters)
    #[error("Title must be {min}-{max} characters (got {len})")]
    TitleLength { len: usize, min: usize, max: usize },

    /// Duration outside the configured bounds
    #[error("Duration must be {min}-{max} seconds (got {value})")]
    DurationOutOfRange { value: u32, min: u32, max: u32 },

    /// Breathing pattern could not be used
    #[error("Invalid breathing pattern '{input}': {message}")]
    MalformedPattern { input: String, message: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseBusy
                    || inner.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    PersistenceError::Locked
                } else {
                    PersistenceError::QueryFailed(err.to_string())
                }
            }
            _ => PersistenceError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_converts_into_core_error() {
        let err: CoreError = ValidationError::TitleLength {
            len: 0,
            min: 1,
            max: 40,
        }
        .into();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "Validation error: Title must be 1-40 characters (got 0)"
        );
    }

    #[test]
    fn not_found_names_the_id() {
        let err = CoreError::not_found("abc");
        assert_eq!(err.to_string(), "Routine not found: abc");
    }

    #[test]
    fn sqlite_query_errors_map_to_query_failed() {
        let err: PersistenceError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, PersistenceError::QueryFailed(_)));
    }
}
