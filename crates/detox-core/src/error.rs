//! Core error types for detox-core.
//!
//! Every fallible engine operation reports through [`CoreError`]. The
//! string-facing time helpers in [`crate::window`] never surface errors;
//! they log and fall back instead.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for detox-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Key-value store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

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

/// Errors raised by a [`crate::storage::KeyValueStore`] backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing store
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A read did not complete
    #[error("Failed to read '{key}': {message}")]
    ReadFailed { key: String, message: String },

    /// A write did not complete
    #[error("Failed to write '{key}': {message}")]
    WriteFailed { key: String, message: String },

    /// Store is locked by another connection
    #[error("Store is locked")]
    Locked,
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

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Malformed "HH:MM" string
    #[error("Invalid time '{value}': {reason}")]
    InvalidTime { value: String, reason: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Completion asked for after the window's lock was bypassed
    #[error("Detox window opened on {date} was bypassed and cannot be completed")]
    WindowBypassed { date: chrono::NaiveDate },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
