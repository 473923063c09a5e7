//! Custom error types for the common library
//!
//! This module defines the storage error type shared by every service that
//! persists state through the key-value capability.

use thiserror::Error;

/// Custom error type for persistence operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing storage could not be read or written
    #[error("Storage unavailable for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// A persisted record exists but does not decode
    #[error("Corrupted record under key '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be encoded for storage
    #[error("Failed to encode record for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
