//! Error types for spreadsheet ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a spreadsheet read. No partial matrix is produced.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Input Selection Errors ===
    /// No input file was given.
    #[error("no file selected")]
    NoFileSelected,

    /// File extension is neither `.xlsx` nor `.csv`.
    #[error("file type not supported: {name}; upload data in Excel (.xlsx) or csv format")]
    UnsupportedFormat { name: String },

    // === File System Errors ===
    /// Input file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exceeds the upload size limit.
    #[error("file too large: {path} ({size} bytes, limit {max_size} bytes)")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    // === Parsing Errors ===
    /// Delimited text could not be read.
    #[error("failed to parse delimited text: {message}")]
    CsvParse { message: String },

    /// Workbook could not be opened or a sheet could not be read.
    #[error("failed to read workbook: {message}")]
    Workbook { message: String },

    /// Header row number is not 1-based.
    #[error("header row must be 1 or greater, got {row}")]
    InvalidHeaderRow { row: usize },

    /// No sheet contains the requested header row.
    #[error("header row {row} not found in any sheet")]
    HeaderRowNotFound { row: usize },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
