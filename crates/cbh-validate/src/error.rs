//! Validation issue types.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cbh_model::{FieldKind, IdKind};

/// What is wrong with a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum Violation {
    /// Record id is empty.
    EmptyId,
    /// Identifier is not `<prefix><digits>` for its kind.
    MalformedIdentifier { kind: IdKind, value: String },
    /// Number is NaN or infinite.
    NonFiniteNumber,
    /// Text exceeds the storage column width.
    TextTooLong { length: usize, max: usize },
    /// Date components do not form a calendar date.
    InvalidDate { value: String },
    /// Date year is outside the accepted range.
    YearOutOfRange { year: i32, min: i32, max: i32 },
    /// Value kind does not match the field kind.
    WrongKind { expected: String, found: String },
}

impl Violation {
    pub(crate) fn wrong_kind(expected: FieldKind, found: &str) -> Self {
        Self::WrongKind {
            expected: expected.as_str().to_string(),
            found: found.to_string(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => f.write_str("record id is empty"),
            Self::MalformedIdentifier { kind, value } => {
                write!(f, "'{value}' is not a {kind} identifier ({}<digits>)", kind.prefix())
            }
            Self::NonFiniteNumber => f.write_str("number is not finite"),
            Self::TextTooLong { length, max } => {
                write!(f, "text is {length} characters, limit is {max}")
            }
            Self::InvalidDate { value } => write!(f, "{value} is not a calendar date"),
            Self::YearOutOfRange { year, min, max } => {
                write!(f, "year {year} outside {min}..={max}")
            }
            Self::WrongKind { expected, found } => write!(f, "expected {expected}, found {found}"),
        }
    }
}

/// A violation attached to the field it was found on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Storage name of the field, or `id`.
    pub field: String,
    #[serde(flatten)]
    pub violation: Violation,
}

impl FieldError {
    pub fn new(field: impl Into<String>, violation: Violation) -> Self {
        Self {
            field: field.into(),
            violation,
        }
    }

    pub fn message(&self) -> String {
        self.violation.to_string()
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.violation)
    }
}

/// A candidate record failed schema validation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{} field error(s): {}", .field_errors.len(), join(.field_errors))]
pub struct ValidationError {
    pub field_errors: Vec<FieldError>,
}

impl ValidationError {
    /// Names of the fields that failed.
    pub fn fields(&self) -> Vec<&str> {
        self.field_errors.iter().map(|e| e.field.as_str()).collect()
    }
}

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
