//! Records awaiting manual repair.
//!
//! A record lands here when it fails validation twice or when storage
//! rejects it. Operators edit fields, re-apply validation, or delete entries.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use cbh_model::{CandidateRecord, CanonicalRecord, FieldKey, FieldKind};
use cbh_transform::coerce_cell;
use cbh_validate::{FieldError, SchemaValidator};

use crate::error::QuarantineError;

/// Why a record was quarantined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuarantineReason {
    Validation { field_errors: Vec<FieldError> },
    Storage { message: String },
}

impl QuarantineReason {
    pub fn summary(&self) -> String {
        match self {
            Self::Validation { field_errors } => field_errors
                .iter()
                .map(|e| e.field.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            Self::Storage { message } => message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarantineEntry {
    pub record: CandidateRecord,
    pub reason: QuarantineReason,
}

/// Ordered list of quarantined records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quarantine {
    entries: Vec<QuarantineEntry>,
}

impl Quarantine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: CandidateRecord, reason: QuarantineReason) {
        self.entries.push(QuarantineEntry { record, reason });
    }

    pub fn extend(&mut self, other: Quarantine) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[QuarantineEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&QuarantineEntry> {
        self.entries.get(index)
    }

    fn entry_mut(&mut self, index: usize) -> Result<&mut QuarantineEntry, QuarantineError> {
        let len = self.entries.len();
        self.entries
            .get_mut(index)
            .ok_or(QuarantineError::IndexOutOfRange { index, len })
    }

    /// Replaces one field of a quarantined record with re-coerced text.
    ///
    /// Blank text clears scalar fields. Identifiers are stored as typed and
    /// checked on [`Self::apply`].
    pub fn edit(&mut self, index: usize, field: FieldKey, raw: &str) -> Result<(), QuarantineError> {
        let record = &mut self.entry_mut(index)?.record;
        match field.kind() {
            FieldKind::Identifier(kind) => {
                *record.identifiers.get_mut(kind) = raw.trim().to_string();
            }
            kind => record.set(field, coerce_cell(kind, raw)),
        }
        Ok(())
    }

    /// Re-validates one entry. On success the entry leaves the quarantine
    /// and its canonical record is returned; on failure the entry stays with
    /// the new field errors as its reason.
    pub fn apply(
        &mut self,
        index: usize,
        validator: &dyn SchemaValidator,
    ) -> Result<CanonicalRecord, QuarantineError> {
        let entry = self.entry_mut(index)?;
        match validator.validate(&entry.record) {
            Ok(record) => {
                self.entries.remove(index);
                Ok(record)
            }
            Err(err) => {
                entry.reason = QuarantineReason::Validation {
                    field_errors: err.field_errors.clone(),
                };
                Err(err.into())
            }
        }
    }

    /// Applies every entry; returns the records that now validate.
    pub fn apply_all(&mut self, validator: &dyn SchemaValidator) -> Vec<CanonicalRecord> {
        let mut accepted = Vec::new();
        let mut index = 0;
        while index < self.entries.len() {
            match self.apply(index, validator) {
                Ok(record) => accepted.push(record),
                Err(_) => index += 1,
            }
        }
        accepted
    }

    pub fn delete(&mut self, index: usize) -> Result<QuarantineEntry, QuarantineError> {
        let len = self.entries.len();
        if index >= len {
            return Err(QuarantineError::IndexOutOfRange { index, len });
        }
        Ok(self.entries.remove(index))
    }

    pub fn load(path: &Path) -> Result<Self, QuarantineError> {
        let text = fs::read_to_string(path).map_err(|source| QuarantineError::Io {
            operation: "read",
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| QuarantineError::Format {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), QuarantineError> {
        let text = serde_json::to_string_pretty(self).map_err(|source| QuarantineError::Format {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, text).map_err(|source| QuarantineError::Io {
            operation: "write",
            path: path.to_path_buf(),
            source,
        })
    }

    /// Adds these entries after those already in the file at `path` and
    /// writes the result back. A missing file starts empty. Returns the
    /// number of entries now in the file.
    pub fn append_to_file(&self, path: &Path) -> Result<usize, QuarantineError> {
        let mut merged = if path.exists() {
            Self::load(path)?
        } else {
            Self::new()
        };
        merged.entries.extend(self.entries.iter().cloned());
        merged.save(path)?;
        Ok(merged.len())
    }
}

impl IntoIterator for Quarantine {
    type Item = QuarantineEntry;
    type IntoIter = std::vec::IntoIter<QuarantineEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbh_model::{CandidateValue, Identifiers};
    use cbh_validate::CanonicalSchema;

    fn broken_record() -> CandidateRecord {
        let mut record = CandidateRecord::new(
            "rec-1",
            Identifiers {
                donor: "CBHD1000000".to_string(),
                master: "CBHM1000000".to_string(),
                sample: "CBHS1000000".to_string(),
            },
        );
        record.set(FieldKey::Matrix, Some(CandidateValue::Text("x".repeat(300))));
        record
    }

    fn quarantine_with_broken_record() -> Quarantine {
        let mut quarantine = Quarantine::new();
        let err = CanonicalSchema::default()
            .validate(&broken_record())
            .unwrap_err();
        quarantine.push(
            broken_record(),
            QuarantineReason::Validation {
                field_errors: err.field_errors,
            },
        );
        quarantine
    }

    #[test]
    fn edit_then_apply_releases_record() {
        let mut quarantine = quarantine_with_broken_record();
        quarantine.edit(0, FieldKey::Matrix, "Serum").unwrap();
        quarantine.edit(0, FieldKey::Age, "41").unwrap();
        let record = quarantine.apply(0, &CanonicalSchema::default()).unwrap();
        assert_eq!(record.cell_text(FieldKey::Matrix).as_deref(), Some("Serum"));
        assert_eq!(record.cell_text(FieldKey::Age).as_deref(), Some("41"));
        assert!(quarantine.is_empty());
    }

    #[test]
    fn failed_apply_keeps_entry_with_new_reason() {
        let mut quarantine = quarantine_with_broken_record();
        quarantine.edit(0, FieldKey::DonorId, "D-1").unwrap();
        let err = quarantine.apply(0, &CanonicalSchema::default()).unwrap_err();
        assert!(matches!(err, QuarantineError::StillInvalid(_)));
        assert_eq!(quarantine.len(), 1);
        assert_eq!(
            quarantine.entries()[0].reason.summary(),
            "CBH_Donor_ID, Matrix"
        );
    }

    #[test]
    fn delete_and_out_of_range() {
        let mut quarantine = quarantine_with_broken_record();
        assert!(matches!(
            quarantine.edit(3, FieldKey::Age, "1"),
            Err(QuarantineError::IndexOutOfRange { index: 3, len: 1 })
        ));
        quarantine.delete(0).unwrap();
        assert!(quarantine.delete(0).is_err());
    }

    #[test]
    fn appending_keeps_entries_already_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quarantine.json");

        let first = quarantine_with_broken_record();
        assert_eq!(first.append_to_file(&path).unwrap(), 1);

        let mut second = quarantine_with_broken_record();
        second.edit(0, FieldKey::Age, "52").unwrap();
        assert_eq!(second.append_to_file(&path).unwrap(), 2);

        let on_disk = Quarantine::load(&path).unwrap();
        assert_eq!(on_disk.len(), 2);
        assert_eq!(on_disk.entries()[0], first.entries()[0]);
        assert_eq!(on_disk.entries()[1], second.entries()[0]);
    }

    #[test]
    fn appending_to_a_corrupt_file_fails_without_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quarantine.json");
        fs::write(&path, "not json").unwrap();

        let err = quarantine_with_broken_record()
            .append_to_file(&path)
            .unwrap_err();
        assert!(matches!(err, QuarantineError::Format { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "not json");
    }

    #[test]
    fn blank_edit_clears_value() {
        let mut quarantine = quarantine_with_broken_record();
        quarantine.edit(0, FieldKey::Matrix, "   ").unwrap();
        assert!(quarantine.entries()[0].record.get(FieldKey::Matrix).is_none());
    }
}
