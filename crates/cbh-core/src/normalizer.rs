//! Row normalization: raw cells to validated records.
//!
//! Every canonical field is resolved by its [`FieldKind`]. The assembled
//! candidate is validated; on failure the collection date is nulled and the
//! candidate validated once more. A second failure quarantines the record.
//! Each row yields exactly one outcome.

use cbh_ingest::CellMatrix;
use cbh_map::FieldMapper;
use cbh_model::{
    CandidateRecord, CandidateValue, CanonicalRecord, FieldKey, FieldKind, IdKind, Identifiers,
};
use cbh_transform::{coerce_number, concat_columns, parse_date};
use cbh_validate::SchemaValidator;
use uuid::Uuid;

use crate::error::RegistryError;
use crate::quarantine::{Quarantine, QuarantineReason};
use crate::registry::IdentifierRegistry;

/// Result of normalizing one row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Accepted {
        record: CanonicalRecord,
        /// The collection date was nulled to pass validation.
        date_cleared: bool,
    },
    Quarantined {
        record: CandidateRecord,
        reason: QuarantineReason,
    },
}

/// Accepted records and quarantine from one pass over a matrix.
#[derive(Debug, Clone, Default)]
pub struct NormalizeReport {
    pub accepted: Vec<CanonicalRecord>,
    pub quarantine: Quarantine,
    /// Accepted records whose date was nulled.
    pub dates_cleared: usize,
}

impl NormalizeReport {
    pub fn rows(&self) -> usize {
        self.accepted.len() + self.quarantine.len()
    }
}

/// Applies a column mapping and a schema to raw rows.
pub struct RowNormalizer<'a> {
    mapper: &'a FieldMapper,
    validator: &'a dyn SchemaValidator,
}

impl<'a> RowNormalizer<'a> {
    pub fn new(mapper: &'a FieldMapper, validator: &'a dyn SchemaValidator) -> Self {
        Self { mapper, validator }
    }

    /// Normalizes every row in order. Rows share `registry`, so row *n* is
    /// fully resolved before row *n + 1* starts.
    ///
    /// # Errors
    ///
    /// Stops at the first row whose identifiers cannot be minted.
    pub fn normalize_matrix(
        &self,
        registry: &mut IdentifierRegistry,
        matrix: &CellMatrix,
    ) -> Result<NormalizeReport, RegistryError> {
        let span = tracing::info_span!("normalize", rows = matrix.height());
        let _enter = span.enter();

        let mut report = NormalizeReport::default();
        for (index, row) in matrix.rows.iter().enumerate() {
            match self.normalize_row(registry, row)? {
                RowOutcome::Accepted {
                    record,
                    date_cleared,
                } => {
                    if date_cleared {
                        report.dates_cleared += 1;
                    }
                    report.accepted.push(record);
                }
                RowOutcome::Quarantined { record, reason } => {
                    tracing::warn!(
                        row = index + 1,
                        record_id = %record.id,
                        fields = %reason.summary(),
                        "record failed validation; quarantined"
                    );
                    report.quarantine.push(record, reason);
                }
            }
        }
        tracing::info!(
            accepted = report.accepted.len(),
            quarantined = report.quarantine.len(),
            dates_cleared = report.dates_cleared,
            "normalized rows"
        );
        Ok(report)
    }

    pub fn normalize_row(
        &self,
        registry: &mut IdentifierRegistry,
        row: &[String],
    ) -> Result<RowOutcome, RegistryError> {
        let mut candidate = self.build_candidate(registry, row)?;
        if let Ok(record) = self.validator.validate(&candidate) {
            return Ok(RowOutcome::Accepted {
                record,
                date_cleared: false,
            });
        }

        let date_cleared = candidate.clear_date_of_collection();
        let outcome = match self.validator.validate(&candidate) {
            Ok(record) => {
                tracing::debug!(record_id = %record.id, "accepted after clearing collection date");
                RowOutcome::Accepted {
                    record,
                    date_cleared,
                }
            }
            Err(err) => RowOutcome::Quarantined {
                record: candidate,
                reason: QuarantineReason::Validation {
                    field_errors: err.field_errors,
                },
            },
        };
        Ok(outcome)
    }

    /// Resolves every field of one row without validating.
    pub fn build_candidate(
        &self,
        registry: &mut IdentifierRegistry,
        row: &[String],
    ) -> Result<CandidateRecord, RegistryError> {
        let [donor, master, sample] = IdKind::ALL.map(|kind| {
            let external = self.first_cell(row, kind.field());
            registry.resolve(kind, external).map(|id| id.to_string())
        });
        let mut candidate = CandidateRecord::new(
            Uuid::new_v4().to_string(),
            Identifiers {
                donor: donor?,
                master: master?,
                sample: sample?,
            },
        );

        for key in FieldKey::all() {
            let value = match key.kind() {
                FieldKind::Identifier(_) => continue,
                FieldKind::Number => self
                    .first_cell(row, key)
                    .and_then(coerce_number)
                    .map(CandidateValue::Number),
                FieldKind::Date => self
                    .first_cell(row, key)
                    .and_then(parse_date)
                    .map(CandidateValue::Date),
                FieldKind::Text => self.joined_cells(row, key).map(CandidateValue::Text),
            };
            candidate.set(key, value);
        }
        Ok(candidate)
    }

    /// The first mapped column's cell, `None` when unmapped or empty.
    fn first_cell<'r>(&self, row: &'r [String], key: FieldKey) -> Option<&'r str> {
        let column = self.mapper.first_column(key)?;
        row.get(column)
            .map(String::as_str)
            .filter(|cell| !cell.is_empty())
    }

    fn joined_cells(&self, row: &[String], key: FieldKey) -> Option<String> {
        concat_columns(self.mapper.columns(key).iter().map(|&column| {
            let cell = row.get(column).map_or("", String::as_str);
            (cell, self.mapper.delimiter(column))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbh_validate::CanonicalSchema;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_string()).collect()
    }

    #[test]
    fn impossible_date_is_cleared_not_quarantined() {
        let mut mapper = FieldMapper::new();
        mapper.assign(FieldKey::Gender, 0);
        mapper.assign(FieldKey::DateOfCollection, 1);
        let schema = CanonicalSchema::default();
        let normalizer = RowNormalizer::new(&mapper, &schema);
        let mut registry = IdentifierRegistry::new();

        let outcome = normalizer
            .normalize_row(&mut registry, &row(&["F", "02/30/2022"]))
            .unwrap();
        match outcome {
            RowOutcome::Accepted {
                record,
                date_cleared,
            } => {
                assert!(date_cleared);
                assert!(record.get(FieldKey::DateOfCollection).is_none());
                assert_eq!(record.cell_text(FieldKey::Gender).as_deref(), Some("F"));
            }
            RowOutcome::Quarantined { .. } => panic!("expected acceptance"),
        }
    }

    #[test]
    fn non_date_failure_is_quarantined() {
        let mut mapper = FieldMapper::new();
        mapper.assign(FieldKey::Matrix, 0);
        let schema = CanonicalSchema::default();
        let normalizer = RowNormalizer::new(&mapper, &schema);
        let mut registry = IdentifierRegistry::new();

        let long = "y".repeat(200);
        let outcome = normalizer
            .normalize_row(&mut registry, &row(&[long.as_str()]))
            .unwrap();
        match outcome {
            RowOutcome::Quarantined { reason, .. } => assert_eq!(reason.summary(), "Matrix"),
            RowOutcome::Accepted { .. } => panic!("expected quarantine"),
        }
    }

    #[test]
    fn text_fields_concatenate_mapped_columns() {
        let mut mapper = FieldMapper::new();
        mapper.assign(FieldKey::Diagnosis, 0);
        mapper.assign(FieldKey::Diagnosis, 2);
        mapper.assign(FieldKey::Diagnosis, 1);
        mapper.set_delimiter(1, " / ");
        let schema = CanonicalSchema::default();
        let normalizer = RowNormalizer::new(&mapper, &schema);
        let mut registry = IdentifierRegistry::new();

        let candidate = normalizer
            .build_candidate(&mut registry, &row(&["A", "B", "C"]))
            .unwrap();
        assert_eq!(
            candidate.get(FieldKey::Diagnosis),
            Some(&CandidateValue::Text("A-C / B".to_string()))
        );
    }

    #[test]
    fn unmapped_fields_are_null_and_ids_are_fresh() {
        let mapper = FieldMapper::new();
        let schema = CanonicalSchema::default();
        let normalizer = RowNormalizer::new(&mapper, &schema);
        let mut registry = IdentifierRegistry::new();

        let a = normalizer.build_candidate(&mut registry, &row(&["x"])).unwrap();
        let b = normalizer.build_candidate(&mut registry, &row(&["x"])).unwrap();
        assert!(a.values.is_empty());
        assert_ne!(a.identifiers.donor, b.identifiers.donor);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn only_first_column_is_read_for_numbers() {
        let mut mapper = FieldMapper::new();
        mapper.assign(FieldKey::Age, 1);
        mapper.assign(FieldKey::Age, 0);
        let schema = CanonicalSchema::default();
        let normalizer = RowNormalizer::new(&mapper, &schema);
        let mut registry = IdentifierRegistry::new();

        let candidate = normalizer
            .build_candidate(&mut registry, &row(&["99", "34"]))
            .unwrap();
        assert_eq!(candidate.get(FieldKey::Age), Some(&CandidateValue::Number(34.0)));
    }
}
