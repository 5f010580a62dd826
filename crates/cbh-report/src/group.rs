//! Grouping of stored rows by sample identifier.

use std::collections::{BTreeMap, HashMap};

use cbh_model::{CanonicalId, CanonicalRecord, FieldKey, FieldValue};

/// Separator between list entries in display text.
pub const LIST_SEPARATOR: &str = "; ";

/// Value a column sorts by.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SortKey {
    /// Ordered by counter, so `CBHD999` precedes `CBHD1000000`.
    Identifier(CanonicalId),
    Value(FieldValue),
}

/// One sample: the first stored row plus the per-result values of every row.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    first: CanonicalRecord,
    lists: BTreeMap<FieldKey, Vec<FieldValue>>,
    rows: usize,
}

impl DisplayRow {
    fn new(record: &CanonicalRecord) -> Self {
        let mut row = Self {
            first: record.clone(),
            lists: BTreeMap::new(),
            rows: 0,
        };
        row.absorb(record);
        row
    }

    fn absorb(&mut self, record: &CanonicalRecord) {
        self.rows += 1;
        for key in FieldKey::all().filter(|key| key.spec().per_result) {
            let list = self.lists.entry(key).or_default();
            if let Some(value) = record.get(key) {
                list.push(value.clone());
            }
        }
    }

    pub fn sample_id(&self) -> &CanonicalId {
        &self.first.identifiers.sample
    }

    /// Number of stored rows merged into this one.
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Per-result values of `key`, in row order; empty for other fields.
    pub fn list(&self, key: FieldKey) -> &[FieldValue] {
        self.lists.get(&key).map_or(&[], Vec::as_slice)
    }

    /// Value used for sorting: the first row's value, or the first list
    /// entry for per-result fields.
    pub(crate) fn sort_value(&self, key: FieldKey) -> Option<SortKey> {
        if key.spec().per_result {
            return self.list(key).first().cloned().map(SortKey::Value);
        }
        match key.id_kind() {
            Some(kind) => Some(SortKey::Identifier(self.first.identifier(kind).clone())),
            None => self.first.get(key).cloned().map(SortKey::Value),
        }
    }

    /// Display text of a cell; `None` when empty.
    pub fn text(&self, key: FieldKey) -> Option<String> {
        if key.spec().per_result {
            let list = self.list(key);
            if list.is_empty() {
                return None;
            }
            return Some(
                list.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(LIST_SEPARATOR),
            );
        }
        self.first.cell_text(key)
    }
}

/// Merges records sharing a sample id, in order of first appearance.
pub fn group_by_sample(records: &[CanonicalRecord]) -> Vec<DisplayRow> {
    let mut positions: HashMap<&CanonicalId, usize> = HashMap::new();
    let mut rows: Vec<DisplayRow> = Vec::new();
    for record in records {
        match positions.get(&record.identifiers.sample) {
            Some(&index) => rows[index].absorb(record),
            None => {
                positions.insert(&record.identifiers.sample, rows.len());
                rows.push(DisplayRow::new(record));
            }
        }
    }
    tracing::debug!(records = records.len(), samples = rows.len(), "grouped records by sample");
    rows
}
