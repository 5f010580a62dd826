//! The raw cell matrix handed to the mapper.

use serde::{Deserialize, Serialize};

/// Column headers plus data rows, every row exactly `headers.len()` wide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellMatrix {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CellMatrix {
    /// Builds a rectangular matrix: short rows are padded with empty strings,
    /// cells beyond the header width are dropped, and trailing all-blank rows
    /// are removed.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let mut rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| fit_to_width(row, width))
            .collect();
        while rows.last().is_some_and(|row| is_blank_row(row)) {
            rows.pop();
        }
        Self { headers, rows }
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn header(&self, column: usize) -> Option<&str> {
        self.headers.get(column).map(String::as_str)
    }

    /// Zero-based index of the first header equal to `name` (case-insensitive).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let needle = name.trim();
        self.headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(needle))
    }
}

pub(crate) fn fit_to_width(mut row: Vec<String>, width: usize) -> Vec<String> {
    row.resize(width, String::new());
    row
}

pub(crate) fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

pub(crate) fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut parts = trimmed.split_whitespace();
    let mut normalized = String::new();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized
}

pub(crate) fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_truncated() {
        let matrix = CellMatrix::new(
            strings(&["A", "B", "C"]),
            vec![strings(&["1"]), strings(&["1", "2", "3", "4"])],
        );
        assert_eq!(matrix.rows[0], strings(&["1", "", ""]));
        assert_eq!(matrix.rows[1], strings(&["1", "2", "3"]));
    }

    #[test]
    fn only_trailing_blank_rows_are_dropped() {
        let matrix = CellMatrix::new(
            strings(&["A", "B"]),
            vec![
                strings(&["1", "2"]),
                strings(&["", ""]),
                strings(&["3", "4"]),
                strings(&["", " "]),
                strings(&[]),
            ],
        );
        assert_eq!(matrix.height(), 3);
        assert!(is_blank_row(&matrix.rows[1]));
    }

    #[test]
    fn header_normalization_collapses_whitespace_and_bom() {
        assert_eq!(normalize_header("\u{feff}  Ext   Donor "), "Ext Donor");
        assert_eq!(normalize_cell(" 34 "), "34");
    }

    #[test]
    fn column_index_is_case_insensitive() {
        let matrix = CellMatrix::new(strings(&["ExtDonor", "Age"]), vec![]);
        assert_eq!(matrix.column_index("age"), Some(1));
        assert_eq!(matrix.column_index("Gender"), None);
    }
}
