//! Core error types for workbackwards-core.
//!
//! This module defines the error hierarchy using thiserror. Most failures in
//! this crate are recoverable: callers log them and fall back to defaults.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for workbackwards-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Notification-related errors
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    /// Session state machine errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Key-value store errors.
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

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// A stored value could not be encoded or decoded
    #[error("Failed to encode value for '{key}': {message}")]
    Encoding { key: String, message: String },

    /// Backend refused the operation (used by in-memory stores)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
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

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Notification port errors.
#[derive(Error, Debug)]
pub enum NotificationError {
    /// The user (or configuration) has not granted notification permission
    #[error("Notification permissions not granted")]
    PermissionDenied,

    /// The backend failed to install a trigger
    #[error("Failed to schedule notification: {0}")]
    ScheduleFailed(String),

    /// The backend failed to cancel pending triggers
    #[error("Failed to cancel notifications: {0}")]
    CancelFailed(String),

    /// Backing store failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Rejected session commands.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// The command is not valid in the current state
    #[error("Cannot {action} while {state}")]
    NotAllowed { action: &'static str, state: String },
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// End time outside 00:00..=23:59
    #[error("Invalid end time {hour:02}:{minute:02}")]
    InvalidEndTime { hour: u32, minute: u32 },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for NotificationError {
    fn from(err: rusqlite::Error) -> Self {
        NotificationError::Storage(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
