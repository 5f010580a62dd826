//! Error types for storage, identifier and quarantine operations.

use std::path::PathBuf;

use thiserror::Error;

use cbh_model::IdKind;
use cbh_validate::ValidationError;

/// Storage collaborator failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O error.
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored line is not valid JSON for its table.
    #[error("corrupt entry in {path} at line {line}: {source}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded for storage.
    #[error("failed to encode entry: {0}")]
    Encode(#[from] serde_json::Error),

    /// The store refused the write.
    #[error("store rejected write: {0}")]
    Rejected(String),
}

/// Identifier minting failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Every counter value of this kind has been issued.
    #[error("{kind} identifier counter is exhausted")]
    Exhausted { kind: IdKind },
}

/// Operator action on the quarantine failed.
#[derive(Debug, Error)]
pub enum QuarantineError {
    #[error("no quarantined record at index {index} ({len} entries)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Re-validation failed; the entry stays quarantined.
    #[error(transparent)]
    StillInvalid(#[from] ValidationError),

    #[error("failed to {operation} quarantine file {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid quarantine file {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
