//! Candidate and canonical sample records.
//!
//! A [`CandidateRecord`] is what the normalizer assembles from one raw row:
//! coerced values that have not been checked against the schema yet. Only a
//! record that passes validation becomes a [`CanonicalRecord`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::field::FieldKey;
use crate::ids::{CanonicalId, IdKind};

/// Date components extracted from a cell, not yet checked against the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateParts {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl DateParts {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// The calendar date, or `None` for impossible dates such as 02/30.
    pub fn to_date(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

impl fmt::Display for DateParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl From<NaiveDate> for DateParts {
    fn from(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self::new(date.year(), date.month(), date.day())
    }
}

/// Coerced but unvalidated value of a scalar field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum CandidateValue {
    Text(String),
    Number(f64),
    Date(DateParts),
}

/// Validated value of a scalar field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Number(value) => write!(f, "{value}"),
            FieldValue::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl From<FieldValue> for CandidateValue {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Text(text) => CandidateValue::Text(text),
            FieldValue::Number(number) => CandidateValue::Number(number),
            FieldValue::Date(date) => CandidateValue::Date(date.into()),
        }
    }
}

/// Three identifier strings, one per [`IdKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifiers<T> {
    pub donor: T,
    pub master: T,
    pub sample: T,
}

impl<T> Identifiers<T> {
    pub fn get(&self, kind: IdKind) -> &T {
        match kind {
            IdKind::Donor => &self.donor,
            IdKind::Master => &self.master,
            IdKind::Sample => &self.sample,
        }
    }

    pub fn get_mut(&mut self, kind: IdKind) -> &mut T {
        match kind {
            IdKind::Donor => &mut self.donor,
            IdKind::Master => &mut self.master,
            IdKind::Sample => &mut self.sample,
        }
    }
}

/// A record assembled from one raw row, before schema validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: String,
    pub identifiers: Identifiers<String>,
    /// Scalar fields; an absent key is null.
    #[serde(default)]
    pub values: BTreeMap<FieldKey, CandidateValue>,
}

impl CandidateRecord {
    pub fn new(id: impl Into<String>, identifiers: Identifiers<String>) -> Self {
        Self {
            id: id.into(),
            identifiers,
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: FieldKey) -> Option<&CandidateValue> {
        self.values.get(&key)
    }

    /// Sets a scalar field; `None` clears it.
    pub fn set(&mut self, key: FieldKey, value: Option<CandidateValue>) {
        match value {
            Some(value) => {
                self.values.insert(key, value);
            }
            None => {
                self.values.remove(&key);
            }
        }
    }

    pub fn date_of_collection(&self) -> Option<&CandidateValue> {
        self.get(FieldKey::DateOfCollection)
    }

    /// Nulls the collection date. Returns true if a value was present.
    pub fn clear_date_of_collection(&mut self) -> bool {
        self.values.remove(&FieldKey::DateOfCollection).is_some()
    }
}

/// A validated sample observation ready for storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub id: String,
    pub identifiers: Identifiers<CanonicalId>,
    #[serde(default)]
    pub values: BTreeMap<FieldKey, FieldValue>,
}

impl CanonicalRecord {
    pub fn identifier(&self, kind: IdKind) -> &CanonicalId {
        self.identifiers.get(kind)
    }

    pub fn get(&self, key: FieldKey) -> Option<&FieldValue> {
        self.values.get(&key)
    }

    /// Display text of any canonical field, identifiers included.
    pub fn cell_text(&self, key: FieldKey) -> Option<String> {
        match key.id_kind() {
            Some(kind) => Some(self.identifier(kind).to_string()),
            None => self.get(key).map(ToString::to_string),
        }
    }
}

impl From<CanonicalRecord> for CandidateRecord {
    fn from(record: CanonicalRecord) -> Self {
        let Identifiers {
            donor,
            master,
            sample,
        } = record.identifiers;
        Self {
            id: record.id,
            identifiers: Identifiers {
                donor: donor.into(),
                master: master.into(),
                sample: sample.into(),
            },
            values: record
                .values
                .into_iter()
                .map(|(key, value)| (key, value.into()))
                .collect(),
        }
    }
}
