//! The canonical sample schema.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use cbh_model::{
    CandidateRecord, CandidateValue, CanonicalId, CanonicalRecord, FieldKey, FieldKind,
    FieldValue, IdKind, Identifiers,
};

use crate::error::{FieldError, ValidationError, Violation};

/// Checks a candidate record and produces its canonical form.
pub trait SchemaValidator: Send + Sync {
    /// Returns the canonical record, or every field error found.
    fn validate(&self, candidate: &CandidateRecord) -> Result<CanonicalRecord, ValidationError>;
}

/// Storage width of text columns.
pub const MAX_TEXT_LEN: usize = 191;

/// Default schema rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalSchema {
    pub max_text_len: usize,
    pub years: RangeInclusive<i32>,
}

impl Default for CanonicalSchema {
    fn default() -> Self {
        Self {
            max_text_len: MAX_TEXT_LEN,
            years: 1900..=2100,
        }
    }
}

impl CanonicalSchema {
    fn check_identifier(&self, kind: IdKind, value: &str) -> Result<CanonicalId, Violation> {
        match CanonicalId::parse(value) {
            Ok(id) if id.kind() == kind => Ok(id),
            _ => Err(Violation::MalformedIdentifier {
                kind,
                value: value.to_string(),
            }),
        }
    }

    fn check_value(&self, key: FieldKey, value: &CandidateValue) -> Result<FieldValue, Violation> {
        match (key.kind(), value) {
            (FieldKind::Number, CandidateValue::Number(number)) => {
                if number.is_finite() {
                    Ok(FieldValue::Number(*number))
                } else {
                    Err(Violation::NonFiniteNumber)
                }
            }
            (FieldKind::Text, CandidateValue::Text(text)) => {
                let length = text.chars().count();
                if length <= self.max_text_len {
                    Ok(FieldValue::Text(text.clone()))
                } else {
                    Err(Violation::TextTooLong {
                        length,
                        max: self.max_text_len,
                    })
                }
            }
            (FieldKind::Date, CandidateValue::Date(parts)) => {
                let date = parts.to_date().ok_or_else(|| Violation::InvalidDate {
                    value: parts.to_string(),
                })?;
                if self.years.contains(&parts.year) {
                    Ok(FieldValue::Date(date))
                } else {
                    Err(Violation::YearOutOfRange {
                        year: parts.year,
                        min: *self.years.start(),
                        max: *self.years.end(),
                    })
                }
            }
            (expected, found) => Err(Violation::wrong_kind(expected, kind_name(found))),
        }
    }
}

fn kind_name(value: &CandidateValue) -> &'static str {
    match value {
        CandidateValue::Text(_) => "text",
        CandidateValue::Number(_) => "number",
        CandidateValue::Date(_) => "date",
    }
}

impl SchemaValidator for CanonicalSchema {
    fn validate(&self, candidate: &CandidateRecord) -> Result<CanonicalRecord, ValidationError> {
        let mut field_errors = Vec::new();

        if candidate.id.trim().is_empty() {
            field_errors.push(FieldError::new("id", Violation::EmptyId));
        }

        let identifiers =
            IdKind::ALL.map(|kind| self.check_identifier(kind, candidate.identifiers.get(kind)));
        for (kind, result) in IdKind::ALL.iter().zip(&identifiers) {
            if let Err(violation) = result {
                field_errors.push(FieldError::new(kind.field().name(), violation.clone()));
            }
        }

        let mut values = BTreeMap::new();
        for (key, value) in &candidate.values {
            match self.check_value(*key, value) {
                Ok(value) => {
                    values.insert(*key, value);
                }
                Err(violation) => field_errors.push(FieldError::new(key.name(), violation)),
            }
        }

        let [Ok(donor), Ok(master), Ok(sample)] = identifiers else {
            return Err(ValidationError { field_errors });
        };
        if !field_errors.is_empty() {
            return Err(ValidationError { field_errors });
        }
        Ok(CanonicalRecord {
            id: candidate.id.clone(),
            identifiers: Identifiers {
                donor,
                master,
                sample,
            },
            values,
        })
    }
}
