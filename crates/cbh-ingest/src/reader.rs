//! File selection and format dispatch.

use std::fmt;
use std::path::Path;

use crate::delimited::read_delimited;
use crate::error::{IngestError, Result};
use crate::matrix::CellMatrix;
use crate::xlsx::read_workbook;

/// Upload size limit (500 MB).
pub const MAX_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Supported upload formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    Xlsx,
    Csv,
}

impl SpreadsheetFormat {
    /// Detects the format from a file name's extension (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("xlsx") => Ok(Self::Xlsx),
            Some("csv") => Ok(Self::Csv),
            _ => Err(IngestError::UnsupportedFormat {
                name: name.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for SpreadsheetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads an uploaded file into a [`CellMatrix`].
///
/// `header_row` is 1-based and only applies to workbooks; delimited text
/// always uses its first line.
///
/// # Errors
///
/// - [`IngestError::NoFileSelected`] when `path` is `None`
/// - [`IngestError::UnsupportedFormat`] for anything but `.xlsx` or `.csv`
/// - [`IngestError::FileNotFound`] / [`IngestError::FileRead`] on I/O failure
pub fn read_spreadsheet(path: Option<&Path>, header_row: usize) -> Result<CellMatrix> {
    let path = path.ok_or(IngestError::NoFileSelected)?;
    let name = path.to_string_lossy();
    let format = SpreadsheetFormat::from_name(&name)?;

    if !path.exists() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    check_file_size(path)?;

    let bytes = std::fs::read(path).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::info!(path = %path.display(), %format, bytes = bytes.len(), "reading spreadsheet");
    read_bytes(format, &bytes, header_row)
}

/// Reads in-memory file content of a known format.
pub fn read_bytes(format: SpreadsheetFormat, bytes: &[u8], header_row: usize) -> Result<CellMatrix> {
    match format {
        SpreadsheetFormat::Xlsx => read_workbook(bytes, header_row),
        SpreadsheetFormat::Csv => {
            let text = std::str::from_utf8(bytes).map_err(|e| IngestError::CsvParse {
                message: e.to_string(),
            })?;
            read_delimited(text)
        }
    }
}

fn check_file_size(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    if metadata.len() > MAX_FILE_SIZE {
        return Err(IngestError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size: MAX_FILE_SIZE,
        });
    }
    Ok(())
}
