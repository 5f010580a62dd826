//! Error types for mapping operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from building or loading a column mapping.
#[derive(Debug, Error)]
pub enum MappingError {
    /// Name is not a canonical field.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Column reference matches no input header.
    #[error("column '{column}' not found in input headers")]
    ColumnNotFound { column: String },

    /// Column index is past the last input column.
    #[error("column index {index} out of range ({width} columns)")]
    ColumnOutOfRange { index: usize, width: usize },

    /// Mapping file could not be read or written.
    #[error("mapping file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Mapping file is not valid TOML for a mapping.
    #[error("invalid mapping file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Mapping could not be serialized.
    #[error("failed to serialize mapping: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type for mapping operations.
pub type Result<T> = std::result::Result<T, MappingError>;
