//! Schema validation for candidate sample records.
//!
//! A [`SchemaValidator`] turns a [`cbh_model::CandidateRecord`] into a
//! [`cbh_model::CanonicalRecord`] or reports every field that violates the
//! schema. [`CanonicalSchema`] is the default rule set.

pub mod error;
pub mod schema;

pub use error::{FieldError, ValidationError, Violation};
pub use schema::{CanonicalSchema, MAX_TEXT_LEN, SchemaValidator};
