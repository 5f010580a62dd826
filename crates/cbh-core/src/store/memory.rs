//! In-memory store for tests and dry runs.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use cbh_model::{CanonicalId, CanonicalRecord, CrossReference, IdKind};

use super::{IdentifierStore, RecordStore, max_identifier_in};
use crate::error::{Result, StoreError};

/// One write call observed by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub at: Instant,
    pub records: usize,
    pub bulk: bool,
}

#[derive(Debug, Default)]
struct State {
    records: Vec<CanonicalRecord>,
    cross_references: Vec<CrossReference>,
    submissions: Vec<Submission>,
    failing_records: HashSet<String>,
    fail_all_records: bool,
    fail_cross_references: bool,
}

/// Both storage traits over in-process vectors.
///
/// Failures can be injected per record id, for every record write, or for
/// every cross-reference write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with sample rows and cross-references.
    pub fn seeded(records: Vec<CanonicalRecord>, cross_references: Vec<CrossReference>) -> Self {
        Self {
            state: Mutex::new(State {
                records,
                cross_references,
                ..State::default()
            }),
        }
    }

    /// Writes of the record with this id fail.
    pub async fn fail_record(&self, id: impl Into<String>) {
        self.state.lock().await.failing_records.insert(id.into());
    }

    pub async fn fail_all_records(&self) {
        self.state.lock().await.fail_all_records = true;
    }

    pub async fn fail_cross_references(&self) {
        self.state.lock().await.fail_cross_references = true;
    }

    pub async fn records(&self) -> Vec<CanonicalRecord> {
        self.state.lock().await.records.clone()
    }

    pub async fn cross_references(&self) -> Vec<CrossReference> {
        self.state.lock().await.cross_references.clone()
    }

    /// Record write calls in the order they arrived.
    pub async fn submissions(&self) -> Vec<Submission> {
        self.state.lock().await.submissions.clone()
    }
}

impl State {
    fn check_record(&self, record: &CanonicalRecord) -> Result<()> {
        if self.fail_all_records || self.failing_records.contains(&record.id) {
            return Err(StoreError::Rejected(format!("record {}", record.id)));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentifierStore for MemoryStore {
    async fn list_all(&self, kind: IdKind) -> Result<Vec<CrossReference>> {
        let state = self.state.lock().await;
        Ok(state
            .cross_references
            .iter()
            .filter(|reference| reference.kind == kind)
            .cloned()
            .collect())
    }

    async fn create(&self, reference: &CrossReference) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.fail_cross_references {
            return Err(StoreError::Rejected(format!(
                "{} cross-reference {}",
                reference.kind, reference.external_id
            )));
        }
        state.cross_references.push(reference.clone());
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create(&self, record: &CanonicalRecord) -> Result<()> {
        let mut state = self.state.lock().await;
        state.submissions.push(Submission {
            at: Instant::now(),
            records: 1,
            bulk: false,
        });
        state.check_record(record)?;
        state.records.push(record.clone());
        Ok(())
    }

    async fn create_many(&self, records: &[CanonicalRecord]) -> Result<()> {
        let mut state = self.state.lock().await;
        state.submissions.push(Submission {
            at: Instant::now(),
            records: records.len(),
            bulk: true,
        });
        for record in records {
            state.check_record(record)?;
        }
        state.records.extend_from_slice(records);
        Ok(())
    }

    async fn max_identifier(&self, kind: IdKind) -> Result<Option<CanonicalId>> {
        let state = self.state.lock().await;
        Ok(max_identifier_in(&state.records, kind))
    }

    async fn list(&self) -> Result<Vec<CanonicalRecord>> {
        Ok(self.state.lock().await.records.clone())
    }
}
