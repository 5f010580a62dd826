//! Column assignment state for one mapping session.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use cbh_model::FieldKey;

/// Delimiter used for a column with none configured.
pub const DEFAULT_DELIMITER: &str = "-";

/// Assignment of input columns to canonical fields.
///
/// A field is either absent (unmapped) or holds a non-empty, ordered list of
/// zero-based column indices. Identifier, number and date fields only ever
/// read the first assigned column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapper {
    #[serde(default)]
    mapping: BTreeMap<FieldKey, Vec<usize>>,
    #[serde(default)]
    delimiters: BTreeMap<usize, String>,
}

impl FieldMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles `column` for `field`: removes it if present, appends it
    /// otherwise. Returns true when the column is assigned afterwards.
    pub fn assign(&mut self, field: FieldKey, column: usize) -> bool {
        let columns = self.mapping.entry(field).or_default();
        let assigned = match columns.iter().position(|&c| c == column) {
            Some(position) => {
                columns.remove(position);
                false
            }
            None => {
                columns.push(column);
                true
            }
        };
        if columns.is_empty() {
            self.mapping.remove(&field);
        }
        assigned
    }

    /// Clears every column of `field`. Returns true if it was mapped.
    pub fn unassign(&mut self, field: FieldKey) -> bool {
        self.mapping.remove(&field).is_some()
    }

    pub fn is_mapped(&self, field: FieldKey) -> bool {
        self.mapping.contains_key(&field)
    }

    /// Assigned columns in assignment order; empty when unmapped.
    pub fn columns(&self, field: FieldKey) -> &[usize] {
        self.mapping.get(&field).map_or(&[], Vec::as_slice)
    }

    pub fn first_column(&self, field: FieldKey) -> Option<usize> {
        self.columns(field).first().copied()
    }

    /// Mapped fields in schema order.
    pub fn mapped_fields(&self) -> impl Iterator<Item = (FieldKey, &[usize])> {
        self.mapping
            .iter()
            .map(|(field, columns)| (*field, columns.as_slice()))
    }

    /// Header names of the mapped columns joined with `", "`.
    pub fn display_value(&self, field: FieldKey, headers: &[String]) -> String {
        self.columns(field)
            .iter()
            .map(|&column| headers.get(column).map_or("?", String::as_str))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Sets the delimiter placed before `column`'s value when it is appended
    /// to a concatenated text field.
    pub fn set_delimiter(&mut self, column: usize, value: impl Into<String>) {
        self.delimiters.insert(column, value.into());
    }

    pub fn delimiter(&self, column: usize) -> &str {
        self.delimiters
            .get(&column)
            .map_or(DEFAULT_DELIMITER, String::as_str)
    }

    pub fn delimiters(&self) -> &BTreeMap<usize, String> {
        &self.delimiters
    }

    /// Assigned columns that single-column fields never read.
    pub fn ignored_columns(&self) -> Vec<(FieldKey, usize)> {
        self.mapping
            .iter()
            .filter(|(field, _)| field.kind().is_single_column())
            .flat_map(|(field, columns)| columns.iter().skip(1).map(|&c| (*field, c)))
            .collect()
    }

    /// Input columns no field reads from.
    pub fn unmapped_columns(&self, width: usize) -> Vec<usize> {
        let used: BTreeSet<usize> = self.mapping.values().flatten().copied().collect();
        (0..width).filter(|c| !used.contains(c)).collect()
    }

    pub fn summary(&self, width: usize) -> MappingSummary {
        MappingSummary {
            total_fields: FieldKey::all().count(),
            mapped_fields: self.mapping.len(),
            input_columns: width,
            unmapped_columns: self.unmapped_columns(width).len(),
        }
    }
}

/// Summary of mapping counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingSummary {
    /// Canonical fields in the schema.
    pub total_fields: usize,
    /// Fields with at least one column.
    pub mapped_fields: usize,
    /// Columns in the input.
    pub input_columns: usize,
    /// Input columns not read by any field.
    pub unmapped_columns: usize,
}

impl fmt::Display for MappingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} fields mapped, {}/{} input columns unused",
            self.mapped_fields, self.total_fields, self.unmapped_columns, self.input_columns
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<String> {
        ["ExtDonor", "Age", "Gender", "Param"]
            .iter()
            .map(|h| (*h).to_string())
            .collect()
    }

    #[test]
    fn assign_toggles_membership() {
        let mut mapper = FieldMapper::new();
        assert!(mapper.assign(FieldKey::Age, 1));
        assert!(mapper.assign(FieldKey::Age, 3));
        assert_eq!(mapper.columns(FieldKey::Age), &[1, 3]);
        assert!(!mapper.assign(FieldKey::Age, 1));
        assert_eq!(mapper.columns(FieldKey::Age), &[3]);
    }

    #[test]
    fn removing_last_column_unmaps_field() {
        let mut mapper = FieldMapper::new();
        mapper.assign(FieldKey::Gender, 2);
        mapper.assign(FieldKey::Gender, 2);
        assert!(!mapper.is_mapped(FieldKey::Gender));
        assert_eq!(mapper.mapped_fields().count(), 0);
    }

    #[test]
    fn unassign_clears_all_columns() {
        let mut mapper = FieldMapper::new();
        mapper.assign(FieldKey::Matrix, 0);
        mapper.assign(FieldKey::Matrix, 1);
        assert!(mapper.unassign(FieldKey::Matrix));
        assert!(!mapper.unassign(FieldKey::Matrix));
        assert_eq!(mapper.first_column(FieldKey::Matrix), None);
    }

    #[test]
    fn display_value_joins_header_names() {
        let mut mapper = FieldMapper::new();
        mapper.assign(FieldKey::LabParameter, 3);
        mapper.assign(FieldKey::LabParameter, 0);
        insta::assert_snapshot!(
            mapper.display_value(FieldKey::LabParameter, &headers()),
            @"Param, ExtDonor"
        );
        assert_eq!(mapper.display_value(FieldKey::Age, &headers()), "");
    }

    #[test]
    fn delimiters_default_to_dash() {
        let mut mapper = FieldMapper::new();
        mapper.set_delimiter(2, "/");
        assert_eq!(mapper.delimiter(2), "/");
        assert_eq!(mapper.delimiter(0), DEFAULT_DELIMITER);
    }

    #[test]
    fn extra_columns_on_single_column_fields_are_reported() {
        let mut mapper = FieldMapper::new();
        mapper.assign(FieldKey::DonorId, 0);
        mapper.assign(FieldKey::DonorId, 1);
        mapper.assign(FieldKey::LabParameter, 2);
        mapper.assign(FieldKey::LabParameter, 3);
        assert_eq!(mapper.ignored_columns(), vec![(FieldKey::DonorId, 1)]);
    }

    #[test]
    fn summary_counts_unused_columns() {
        let mut mapper = FieldMapper::new();
        mapper.assign(FieldKey::DonorId, 0);
        mapper.assign(FieldKey::Age, 1);
        let summary = mapper.summary(4);
        assert_eq!(summary.mapped_fields, 2);
        assert_eq!(summary.unmapped_columns, 2);
        assert_eq!(summary.to_string(), "2/53 fields mapped, 2/4 input columns unused");
    }
}
