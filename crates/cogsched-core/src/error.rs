//! Core error types for cogsched-core.
//!
//! One `CoreError` umbrella with domain-specific sub-enums, all built on
//! thiserror so callers can match on the failure class.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for cogsched-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Scheduling-related errors
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Free-text parsing errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced by the scheduling engine itself.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// The scheduling window is empty or its bounds are malformed
    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    /// Commitments fully cover the window
    #[error("No free time: commitments cover the entire available window")]
    NoFreeTime,

    /// The caller cancelled the run via its token
    #[error("Scheduling cancelled")]
    Cancelled,

    /// A task failed input validation
    #[error("Malformed task '{title}': {message}")]
    MalformedTask { title: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A PUT carried a key the engine does not know
    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    /// A known key carried a value of the wrong type or range
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse a stored configuration document
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
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

    /// No such user
    #[error("User not found: {0}")]
    UserNotFound(String),
}

/// Free-text parser errors.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The message contained nothing that looks like a task
    #[error("No tasks could be extracted from the message")]
    NoTasks,
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::QueryFailed(err.to_string())
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(StorageError::from(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
