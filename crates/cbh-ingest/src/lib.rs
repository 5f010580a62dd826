//! Reads uploaded spreadsheets into a rectangular matrix of cell strings.
//!
//! Excel workbooks (`.xlsx`) and semicolon-delimited text (`.csv`) are
//! supported. The matrix carries the header row separately from the data
//! rows, and every data row is exactly as wide as the header.

pub mod delimited;
pub mod error;
pub mod matrix;
pub mod reader;
pub mod xlsx;

pub use delimited::read_delimited;
pub use error::{IngestError, Result};
pub use matrix::CellMatrix;
pub use reader::{MAX_FILE_SIZE, SpreadsheetFormat, read_bytes, read_spreadsheet};
pub use xlsx::read_workbook;
