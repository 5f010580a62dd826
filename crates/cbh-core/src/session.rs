//! One operator session, from matrix to stored records.

use std::sync::Arc;

use tracing::Instrument;

use cbh_ingest::CellMatrix;
use cbh_map::FieldMapper;
use cbh_model::{CanonicalRecord, CrossReference, IdKind};
use cbh_validate::SchemaValidator;

use crate::error::{RegistryError, Result};
use crate::normalizer::{NormalizeReport, RowNormalizer};
use crate::quarantine::Quarantine;
use crate::registry::IdentifierRegistry;
use crate::store::{IdentifierStore, RecordStore};
use crate::upload::{BatchUploader, UploadConfig, UploadReport};

/// Outcome of persisting minted cross-references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub persisted: usize,
    pub failed: Vec<CrossReference>,
}

/// Collaborators plus the session-scoped identifier registry.
pub struct MappingSession {
    identifier_store: Arc<dyn IdentifierStore>,
    record_store: Arc<dyn RecordStore>,
    validator: Arc<dyn SchemaValidator>,
    registry: IdentifierRegistry,
}

impl MappingSession {
    /// Seeds the registry from a storage snapshot.
    pub async fn open(
        identifier_store: Arc<dyn IdentifierStore>,
        record_store: Arc<dyn RecordStore>,
        validator: Arc<dyn SchemaValidator>,
    ) -> Result<Self> {
        let mut registry = IdentifierRegistry::new();
        for kind in IdKind::ALL {
            let references = identifier_store.list_all(kind).await?;
            let max_record = record_store.max_identifier(kind).await?;
            registry.seed(kind, references, max_record.as_ref());
        }
        tracing::info!(
            donors = registry.known(IdKind::Donor),
            masters = registry.known(IdKind::Master),
            samples = registry.known(IdKind::Sample),
            "opened mapping session"
        );
        Ok(Self {
            identifier_store,
            record_store,
            validator,
            registry,
        })
    }

    pub fn registry(&self) -> &IdentifierRegistry {
        &self.registry
    }

    pub fn validator(&self) -> &dyn SchemaValidator {
        self.validator.as_ref()
    }

    /// Normalizes every row of `matrix` under `mapper`.
    pub fn apply(
        &mut self,
        matrix: &CellMatrix,
        mapper: &FieldMapper,
    ) -> std::result::Result<NormalizeReport, RegistryError> {
        RowNormalizer::new(mapper, self.validator.as_ref())
            .normalize_matrix(&mut self.registry, matrix)
    }

    /// Persists the cross-references minted since the last flush. Failures
    /// are logged and counted; the registry keeps its mapping either way.
    pub async fn flush_cross_references(&mut self) -> FlushReport {
        let pending = self.registry.take_pending();
        let span = tracing::info_span!("flush_cross_references", pending = pending.len());
        async {
            let mut report = FlushReport::default();
            for reference in pending {
                match self.identifier_store.create(&reference).await {
                    Ok(()) => report.persisted += 1,
                    Err(err) => {
                        tracing::warn!(
                            kind = %reference.kind,
                            canonical_id = %reference.canonical_id,
                            error = %err,
                            "failed to persist cross-reference"
                        );
                        report.failed.push(reference);
                    }
                }
            }
            report
        }
        .instrument(span)
        .await
    }

    /// Uploads accepted records; storage failures land in the report's
    /// quarantine.
    pub async fn submit(&self, records: &[CanonicalRecord], config: UploadConfig) -> UploadReport {
        BatchUploader::new(self.record_store.as_ref(), config)
            .upload(records)
            .await
    }

    /// Re-applies every quarantined entry and uploads the ones that now
    /// validate. Entries that still fail stay in `quarantine`; storage
    /// failures are appended to it.
    pub async fn resubmit(&self, quarantine: &mut Quarantine, config: UploadConfig) -> UploadReport {
        let records = quarantine.apply_all(self.validator.as_ref());
        tracing::info!(
            released = records.len(),
            remaining = quarantine.len(),
            "re-applied quarantine"
        );
        let report = self.submit(&records, config).await;
        quarantine.extend(report.quarantine.clone());
        report
    }
}
