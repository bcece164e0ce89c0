//! Error types for CloudQuest.

use thiserror::Error;

use crate::version::SchemaVersion;

/// Errors raised by progress persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Stored record was written by an unreadable schema version
    #[error("Incompatible schema version: expected {expected}, found {found}")]
    Incompatible {
        /// Version this build reads
        expected: SchemaVersion,
        /// Version found in the record
        found: SchemaVersion,
    },

    /// Invalid save slot name
    #[error("Invalid save slot: {0}")]
    InvalidSlot(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for persistence operations.
pub type StoreResult<T> = Result<T, StoreError>;
