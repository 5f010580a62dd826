//! Column-to-field mapping.
//!
//! [`FieldMapper`] holds the interactive assignment of input columns to
//! canonical fields; [`MappingFile`] is its TOML form, resolved against the
//! headers of a concrete upload.

pub mod error;
pub mod mapping_file;
pub mod state;

pub use error::{MappingError, Result};
pub use mapping_file::{ColumnRef, MappingFile};
pub use state::{DEFAULT_DELIMITER, FieldMapper, MappingSummary};
