use std::path::PathBuf;

use cbh_core::{FlushReport, Quarantine, UploadReport};
use cbh_map::MappingSummary;

#[derive(Debug)]
pub struct ImportResult {
    pub file: PathBuf,
    pub mapping: MappingSummary,
    pub rows: usize,
    pub accepted: usize,
    pub dates_cleared: usize,
    /// Rows that failed validation twice.
    pub invalid: usize,
    pub flush: FlushReport,
    /// `None` on dry runs.
    pub upload: Option<UploadReport>,
    /// Validation and storage failures together.
    pub quarantine: Quarantine,
    pub quarantine_path: Option<PathBuf>,
    /// Entries in the quarantine file after this import, earlier ones included.
    pub quarantine_file_entries: usize,
}

impl ImportResult {
    pub fn has_errors(&self) -> bool {
        !self.quarantine.is_empty()
    }
}

#[derive(Debug)]
pub struct ResubmitResult {
    pub entries: usize,
    pub upload: UploadReport,
    pub remaining: Quarantine,
    pub quarantine_path: PathBuf,
}

impl ResubmitResult {
    pub fn has_errors(&self) -> bool {
        !self.remaining.is_empty()
    }
}
