//! Storage collaborators.
//!
//! The core never talks to a database directly. Cross-reference tables and
//! sample rows are reached through [`IdentifierStore`] and [`RecordStore`].

mod json;
mod memory;

use async_trait::async_trait;

use cbh_model::{CanonicalId, CanonicalRecord, CrossReference, IdKind};

use crate::error::Result;

pub use json::JsonStore;
pub use memory::{MemoryStore, Submission};

/// External-to-canonical identifier lookup tables, one per [`IdKind`].
#[async_trait]
pub trait IdentifierStore: Send + Sync {
    /// Every cross-reference of `kind`.
    async fn list_all(&self, kind: IdKind) -> Result<Vec<CrossReference>>;

    /// Persists one cross-reference.
    async fn create(&self, reference: &CrossReference) -> Result<()>;
}

/// Sample record table.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create(&self, record: &CanonicalRecord) -> Result<()>;

    /// Bulk insert; all-or-nothing from the caller's point of view.
    async fn create_many(&self, records: &[CanonicalRecord]) -> Result<()>;

    /// Highest stored identifier of `kind` by numeric suffix.
    async fn max_identifier(&self, kind: IdKind) -> Result<Option<CanonicalId>>;

    /// Every stored record in insertion order.
    async fn list(&self) -> Result<Vec<CanonicalRecord>>;
}

/// Highest identifier of `kind` across `records`.
pub(crate) fn max_identifier_in<'a, I>(records: I, kind: IdKind) -> Option<CanonicalId>
where
    I: IntoIterator<Item = &'a CanonicalRecord>,
{
    records
        .into_iter()
        .map(|record| record.identifier(kind))
        .filter_map(|id| id.counter().map(|counter| (counter, id)))
        .max_by_key(|(counter, _)| *counter)
        .map(|(_, id)| id.clone())
}
