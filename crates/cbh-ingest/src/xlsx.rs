//! Excel workbook reader.
//!
//! The header row (1-based) is taken from the first sheet that contains it.
//! Data rows are every row strictly below the header row, across all sheets
//! in workbook order.

use std::io::Cursor;

use calamine::{Data, DataType, Range, Reader, Xlsx, open_workbook_from_rs};

use crate::error::{IngestError, Result};
use crate::matrix::{CellMatrix, normalize_cell, normalize_header};

/// Reads an `.xlsx` workbook from memory.
pub fn read_workbook(bytes: &[u8], header_row: usize) -> Result<CellMatrix> {
    if header_row == 0 {
        return Err(IngestError::InvalidHeaderRow { row: header_row });
    }

    let mut workbook = open_workbook_from_rs::<Xlsx<_>, _>(Cursor::new(bytes)).map_err(|e| {
        IngestError::Workbook {
            message: e.to_string(),
        }
    })?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| IngestError::Workbook {
                message: format!("sheet {name}: {e}"),
            })?;
        sheets.push((name, sheet_rows(&range)));
    }

    let headers = sheets
        .iter()
        .find_map(|(_, rows)| {
            rows.iter()
                .find(|(number, _)| *number == header_row)
                .map(|(_, cells)| header_cells(cells))
        })
        .ok_or(IngestError::HeaderRowNotFound { row: header_row })?;

    let mut body = Vec::new();
    for (name, rows) in sheets {
        let before = body.len();
        body.extend(
            rows.into_iter()
                .filter(|(number, _)| *number > header_row)
                .map(|(_, cells)| cells),
        );
        tracing::debug!(sheet = %name, rows = body.len() - before, "read worksheet");
    }

    Ok(CellMatrix::new(headers, body))
}

/// Rows of a sheet as `(1-based row number, cells from column A)`.
fn sheet_rows(range: &Range<Data>) -> Vec<(usize, Vec<String>)> {
    let Some((first_row, first_col)) = range.start() else {
        return Vec::new();
    };
    range
        .rows()
        .enumerate()
        .map(|(offset, cells)| {
            let mut line = vec![String::new(); first_col as usize];
            line.extend(cells.iter().map(cell_text));
            (first_row as usize + offset + 1, line)
        })
        .collect()
}

/// Header cells up to the last non-empty one.
fn header_cells(cells: &[String]) -> Vec<String> {
    let width = cells
        .iter()
        .rposition(|cell| !cell.trim().is_empty())
        .map_or(0, |last| last + 1);
    cells[..width].iter().map(|h| normalize_header(h)).collect()
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => normalize_cell(value),
        Data::Float(value) => format_number(*value),
        Data::Int(value) => value.to_string(),
        Data::DateTime(value) => match value.as_datetime() {
            Some(datetime) => datetime.format("%Y-%m-%dT%H:%M:%S").to_string(),
            None => format_number(value.as_f64()),
        },
        other => match other.as_string() {
            Some(text) => normalize_cell(&text),
            None => other.to_string(),
        },
    }
}

/// Whole floats print without a fractional part, matching spreadsheet display.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_floats_drop_fraction() {
        assert_eq!(format_number(34.0), "34");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(1.5), "1.5");
    }

    #[test]
    fn header_width_ends_at_last_filled_cell() {
        let cells = vec![
            "A".to_string(),
            String::new(),
            "C".to_string(),
            String::new(),
        ];
        assert_eq!(header_cells(&cells), vec!["A", "", "C"]);
    }

    #[test]
    fn zero_header_row_is_rejected() {
        assert!(matches!(
            read_workbook(&[], 0),
            Err(IngestError::InvalidHeaderRow { row: 0 })
        ));
    }

    #[test]
    fn garbage_bytes_are_a_workbook_error() {
        assert!(matches!(
            read_workbook(b"not a zip archive", 1),
            Err(IngestError::Workbook { .. })
        ));
    }
}
