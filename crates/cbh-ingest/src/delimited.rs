//! Semicolon-delimited text reader.
//!
//! Lines are split on `;` with no quoting. Row 0 is the header row. Blank
//! lines below it stay in the matrix as empty rows; only trailing ones are
//! dropped.

use csv::{Position, ReaderBuilder};

use crate::error::{IngestError, Result};
use crate::matrix::{CellMatrix, normalize_cell, normalize_header};

/// Field separator for delimited uploads.
pub const DELIMITER: u8 = b';';

/// Reads delimited text into a rectangular [`CellMatrix`].
pub fn read_delimited(text: &str) -> Result<CellMatrix> {
    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .quoting(false)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    let mut last_line: Option<u64> = None;
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::CsvParse {
            message: e.to_string(),
        })?;
        // The reader skips empty lines; restore them from the line gap.
        let line = record.position().map_or(0, Position::line);
        if let Some(previous) = last_line {
            for _ in previous.saturating_add(1)..line {
                raw_rows.push(Vec::new());
            }
        }
        last_line = Some(line);
        raw_rows.push(record.iter().map(str::to_string).collect());
    }

    let mut rows = raw_rows.into_iter();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(|h| normalize_header(h)).collect(),
        None => return Ok(CellMatrix::default()),
    };
    let body = rows
        .map(|row| row.iter().map(|cell| normalize_cell(cell)).collect())
        .collect();

    let matrix = CellMatrix::new(headers, body);
    tracing::debug!(
        columns = matrix.width(),
        rows = matrix.height(),
        "read delimited text"
    );
    Ok(matrix)
}
