//! Search, sort, column selection and pagination.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use cbh_model::{FieldKey, FieldValue};

use crate::group::{DisplayRow, SortKey};

/// Columns shown when none are chosen, in schema order.
pub const DEFAULT_COLUMNS: [FieldKey; 8] = [
    FieldKey::DonorId,
    FieldKey::SampleId,
    FieldKey::Price,
    FieldKey::Quantity,
    FieldKey::Unit,
    FieldKey::Matrix,
    FieldKey::Gender,
    FieldKey::Age,
];

/// Rows per page when none is chosen.
pub const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(format!("unknown sort direction: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: FieldKey,
    pub direction: SortDirection,
}

/// View settings for the sample table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    /// Case-insensitive substring matched against visible cells.
    pub search: Option<String>,
    pub sort: Option<SortSpec>,
    columns: Vec<FieldKey>,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            search: None,
            sort: None,
            columns: DEFAULT_COLUMNS.to_vec(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl TableQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible columns in schema order.
    pub fn columns(&self) -> &[FieldKey] {
        &self.columns
    }

    /// Replaces the visible columns; duplicates are dropped and the result
    /// kept in schema order. An empty selection restores the defaults.
    pub fn set_columns(&mut self, columns: impl IntoIterator<Item = FieldKey>) {
        let mut columns: Vec<FieldKey> = columns.into_iter().collect();
        columns.sort();
        columns.dedup();
        self.columns = if columns.is_empty() {
            DEFAULT_COLUMNS.to_vec()
        } else {
            columns
        };
    }

    /// Shows `column` if hidden, hides it if shown.
    pub fn toggle_column(&mut self, column: FieldKey) {
        match self.columns.iter().position(|&c| c == column) {
            Some(position) => {
                self.columns.remove(position);
            }
            None => {
                self.columns.push(column);
                self.columns.sort();
            }
        }
    }

    /// Runs the query over grouped rows.
    pub fn run<'a>(&self, rows: &'a [DisplayRow]) -> TablePage<'a> {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut matched: Vec<&DisplayRow> = rows
            .iter()
            .filter(|row| match &needle {
                Some(needle) => self.columns.iter().any(|&column| {
                    row.text(column)
                        .is_some_and(|text| text.to_lowercase().contains(needle))
                }),
                None => true,
            })
            .collect();

        if let Some(sort) = self.sort {
            matched.sort_by(|a, b| {
                compare_nulls_last(
                    a.sort_value(sort.field).as_ref(),
                    b.sort_value(sort.field).as_ref(),
                    sort.direction,
                )
            });
        }

        let page_size = self.page_size.max(1);
        let total = matched.len();
        let page = self.page.max(1);
        let rows = matched
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .collect();
        TablePage {
            columns: self.columns.clone(),
            rows,
            page,
            page_count: total.div_ceil(page_size),
            total,
        }
    }
}

fn compare_nulls_last(
    a: Option<&SortKey>,
    b: Option<&SortKey>,
    direction: SortDirection,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ordering = compare_keys(a, b);
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        }
    }
}

fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
    match (a, b) {
        (SortKey::Identifier(a), SortKey::Identifier(b)) => a
            .counter()
            .cmp(&b.counter())
            .then_with(|| a.as_str().cmp(b.as_str())),
        (SortKey::Value(a), SortKey::Value(b)) => compare_values(a, b),
        (SortKey::Identifier(_), SortKey::Value(_)) => Ordering::Less,
        (SortKey::Value(_), SortKey::Identifier(_)) => Ordering::Greater,
    }
}

fn compare_values(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a, b) {
        (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
        (FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
        (FieldValue::Text(a), FieldValue::Text(b)) => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// One page of query results.
#[derive(Debug, Clone)]
pub struct TablePage<'a> {
    pub columns: Vec<FieldKey>,
    pub rows: Vec<&'a DisplayRow>,
    /// 1-based page shown.
    pub page: usize,
    pub page_count: usize,
    /// Rows matching the search, across all pages.
    pub total: usize,
}

impl TablePage<'_> {
    /// Column headings: storage names with underscores as spaces.
    pub fn headers(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| column.name().replace('_', " ").trim().to_string())
            .collect()
    }

    /// Display text of every visible cell, row by row.
    pub fn cells(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|&column| row.text(column).unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}
