//! Error types for the record store.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can occur in the record store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Identifier rejected (or altered) by the validator.
    #[error("Invalid identifier: {0:?}")]
    InvalidId(String),

    /// No live record under this identifier (absent, expired, or missing file).
    #[error("Record {0:?} not found")]
    NotFound(String),

    /// Filesystem failure with the operation and path that caused it.
    #[error("IO error during {op} of {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Payload could not be encoded or decoded.
    #[error("Serialization error for record {uid:?}: {source}")]
    Serialization {
        uid: String,
        #[source]
        source: serde_json::Error,
    },

    /// The record reached the persistent tier but the memory tier refused it.
    /// It becomes visible after the next reconciliation pass.
    #[error("Record {uid:?} persisted but not cached: {source}")]
    NotCached {
        uid: String,
        #[source]
        source: Box<StoreError>,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn serialization(uid: &str, source: serde_json::Error) -> Self {
        Self::Serialization {
            uid: uid.to_string(),
            source,
        }
    }
}

/// Convenience result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
