//! Staggered batch upload.
//!
//! Records are split into fixed-size chunks. Chunk *i* is submitted no
//! earlier than `start + i * chunk_delay`, and chunks are awaited one after
//! another, so submissions are sequential and rate-limited. Failed records
//! join the quarantine; there is no retry and no abort.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tracing::Instrument;

use cbh_model::{CandidateRecord, CanonicalRecord};

use crate::quarantine::{Quarantine, QuarantineReason};
use crate::store::RecordStore;

/// Records per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 200;

/// Delay added per chunk index.
pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(1000);

/// Lifecycle of one uploaded record.
///
/// `Failed` returns to `Pending` only through operator action on the
/// quarantine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Pending,
    Validated,
    Submitted,
    Stored,
    Failed,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Validated => "validated",
            Self::Submitted => "submitted",
            Self::Stored => "stored",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How records inside a chunk reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitMode {
    /// One `create_many` call per chunk.
    #[default]
    Bulk,
    /// One `create` call per record.
    PerRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    pub chunk_size: usize,
    pub chunk_delay: Duration,
    pub mode: SubmitMode,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay: DEFAULT_CHUNK_DELAY,
            mode: SubmitMode::default(),
        }
    }
}

impl UploadConfig {
    /// Offset of chunk `index` from the start of the upload.
    pub fn offset(&self, index: usize) -> Duration {
        let factor = u32::try_from(index).unwrap_or(u32::MAX);
        self.chunk_delay.saturating_mul(factor)
    }

    fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}

/// Outcome of one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkReport {
    pub index: usize,
    pub records: usize,
    pub stored: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    pub chunks: Vec<ChunkReport>,
    pub quarantine: Quarantine,
    statuses: BTreeMap<String, RecordStatus>,
}

impl UploadReport {
    pub fn stored(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.stored).sum()
    }

    pub fn failed(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.failed).sum()
    }

    /// Final status of a record by id.
    pub fn status(&self, record_id: &str) -> Option<RecordStatus> {
        self.statuses.get(record_id).copied()
    }

    fn mark(&mut self, records: &[CanonicalRecord], status: RecordStatus) {
        for record in records {
            self.statuses.insert(record.id.clone(), status);
        }
    }

    fn fail(&mut self, record: &CanonicalRecord, message: &str) {
        self.statuses.insert(record.id.clone(), RecordStatus::Failed);
        self.quarantine.push(
            CandidateRecord::from(record.clone()),
            QuarantineReason::Storage {
                message: message.to_string(),
            },
        );
    }
}

/// Number of chunks `records` are split into.
pub fn chunk_count(records: usize, chunk_size: usize) -> usize {
    records.div_ceil(chunk_size.max(1))
}

/// Submits validated records to a [`RecordStore`].
pub struct BatchUploader<'a> {
    store: &'a dyn RecordStore,
    config: UploadConfig,
}

impl<'a> BatchUploader<'a> {
    pub fn new(store: &'a dyn RecordStore, config: UploadConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub async fn upload(&self, records: &[CanonicalRecord]) -> UploadReport {
        let span = tracing::info_span!(
            "upload",
            records = records.len(),
            chunks = chunk_count(records.len(), self.config.chunk_size)
        );
        self.submit_chunks(records).instrument(span).await
    }

    async fn submit_chunks(&self, records: &[CanonicalRecord]) -> UploadReport {
        let chunk_size = self.config.effective_chunk_size();
        let mut report = UploadReport::default();
        report.mark(records, RecordStatus::Validated);

        let start = Instant::now();
        for (index, chunk) in records.chunks(chunk_size).enumerate() {
            sleep_until(start + self.config.offset(index)).await;
            report.mark(chunk, RecordStatus::Submitted);
            let failed_before = report.quarantine.len();

            match self.config.mode {
                SubmitMode::Bulk => match self.store.create_many(chunk).await {
                    Ok(()) => report.mark(chunk, RecordStatus::Stored),
                    Err(err) => {
                        tracing::warn!(chunk = index, error = %err, "chunk rejected by store");
                        let message = err.to_string();
                        for record in chunk {
                            report.fail(record, &message);
                        }
                    }
                },
                SubmitMode::PerRecord => {
                    for record in chunk {
                        match self.store.create(record).await {
                            Ok(()) => report.mark(std::slice::from_ref(record), RecordStatus::Stored),
                            Err(err) => {
                                tracing::warn!(record_id = %record.id, error = %err, "record rejected by store");
                                report.fail(record, &err.to_string());
                            }
                        }
                    }
                }
            }

            let failed = report.quarantine.len() - failed_before;
            tracing::info!(chunk = index, records = chunk.len(), failed, "submitted chunk");
            report.chunks.push(ChunkReport {
                index,
                records: chunk.len(),
                stored: chunk.len() - failed,
                failed,
            });
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_count_rounds_up() {
        assert_eq!(chunk_count(0, 200), 0);
        assert_eq!(chunk_count(1, 200), 1);
        assert_eq!(chunk_count(200, 200), 1);
        assert_eq!(chunk_count(401, 200), 3);
        assert_eq!(chunk_count(5, 0), 5);
    }

    #[test]
    fn offsets_grow_linearly() {
        let config = UploadConfig::default();
        assert_eq!(config.offset(0), Duration::ZERO);
        assert_eq!(config.offset(3), Duration::from_secs(3));
    }
}
