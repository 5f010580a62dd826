//! End-to-end mapping sessions against the in-memory store.

use std::collections::BTreeMap;
use std::sync::Arc;

use cbh_core::{MappingSession, MemoryStore, RecordStatus, RegistryError, UploadConfig};
use cbh_ingest::CellMatrix;
use cbh_map::FieldMapper;
use cbh_model::{CanonicalId, CanonicalRecord, FieldKey, IdKind, Identifiers};
use cbh_validate::CanonicalSchema;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn donor_matrix(rows: &[&[&str]]) -> CellMatrix {
    CellMatrix::new(
        strings(&["ExtDonor", "Age", "Gender"]),
        rows.iter().map(|row| strings(row)).collect(),
    )
}

fn donor_mapper() -> FieldMapper {
    let mut mapper = FieldMapper::new();
    mapper.assign(FieldKey::DonorId, 0);
    mapper.assign(FieldKey::Age, 1);
    mapper.assign(FieldKey::Gender, 2);
    mapper
}

async fn open_session(store: &Arc<MemoryStore>) -> MappingSession {
    MappingSession::open(store.clone(), store.clone(), Arc::new(CanonicalSchema::default()))
        .await
        .expect("open session")
}

#[tokio::test(start_paused = true)]
async fn donor_identifiers_are_minted_once_and_reused() {
    let store = Arc::new(MemoryStore::new());
    let mut session = open_session(&store).await;

    let report = session.apply(
        &donor_matrix(&[&["D-1", "34", "F"], &["D-1", "40", "F"]]),
        &donor_mapper(),
    )
        .expect("normalize rows");
    assert_eq!(report.accepted.len(), 2);
    assert!(report.quarantine.is_empty());

    let first = &report.accepted[0];
    assert_eq!(first.identifiers.donor.as_str(), "CBHD1000000");
    assert_eq!(first.cell_text(FieldKey::Age).as_deref(), Some("34"));
    assert_eq!(first.cell_text(FieldKey::Gender).as_deref(), Some("F"));

    let second = &report.accepted[1];
    assert_eq!(second.identifiers.donor.as_str(), "CBHD1000000");
    assert_eq!(second.cell_text(FieldKey::Age).as_deref(), Some("40"));
    assert_eq!(session.registry().next_counter(IdKind::Donor), Some(1_000_001));

    // Unmapped identifier kinds get a fresh id per row.
    assert_eq!(first.identifiers.master.as_str(), "CBHM1000000");
    assert_eq!(second.identifiers.master.as_str(), "CBHM1000001");

    let flush = session.flush_cross_references().await;
    assert_eq!(flush.persisted, 1);
    let references = store.cross_references().await;
    assert_eq!(references.len(), 1);
    assert_eq!(references[0].external_id, "D-1");
    assert_eq!(references[0].canonical_id.as_str(), "CBHD1000000");

    let upload = session.submit(&report.accepted, UploadConfig::default()).await;
    assert_eq!(upload.stored(), 2);
    assert_eq!(upload.status(&first.id), Some(RecordStatus::Stored));
    assert_eq!(store.records().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn next_session_continues_from_stored_identifiers() {
    let store = Arc::new(MemoryStore::new());
    let mut session = open_session(&store).await;
    let report = session
        .apply(&donor_matrix(&[&["D-1", "34", "F"]]), &donor_mapper())
        .expect("normalize rows");
    session.flush_cross_references().await;
    session.submit(&report.accepted, UploadConfig::default()).await;

    let mut next = open_session(&store).await;
    let report = next.apply(
        &donor_matrix(&[&["D-1", "35", "F"], &["D-2", "50", "M"]]),
        &donor_mapper(),
    )
        .expect("normalize rows");
    assert_eq!(report.accepted[0].identifiers.donor.as_str(), "CBHD1000000");
    assert_eq!(report.accepted[1].identifiers.donor.as_str(), "CBHD1000001");
    assert_eq!(report.accepted[1].identifiers.sample.as_str(), "CBHS1000002");
    assert_eq!(next.registry().pending().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cross_reference_failures_do_not_block_upload() {
    let store = Arc::new(MemoryStore::new());
    store.fail_cross_references().await;
    let mut session = open_session(&store).await;

    let report = session
        .apply(&donor_matrix(&[&["D-7", "61", "M"]]), &donor_mapper())
        .expect("normalize rows");
    let flush = session.flush_cross_references().await;
    assert_eq!(flush.persisted, 0);
    assert_eq!(flush.failed.len(), 1);
    assert_eq!(
        session
            .registry()
            .lookup(IdKind::Donor, "D-7")
            .map(|id| id.as_str()),
        Some("CBHD1000000")
    );

    let upload = session.submit(&report.accepted, UploadConfig::default()).await;
    assert_eq!(upload.stored(), 1);
}

#[tokio::test(start_paused = true)]
async fn every_row_yields_exactly_one_outcome() {
    let store = Arc::new(MemoryStore::new());
    let mut session = open_session(&store).await;
    let mut mapper = donor_mapper();
    mapper.assign(FieldKey::Matrix, 0);

    let long = "z".repeat(250);
    let matrix = donor_matrix(&[
        &["D-1", "34", "F"],
        &[long.as_str(), "x", ""],
        &["", "", ""],
        &["D-2", "$1,000", "F"],
    ]);
    let report = session.apply(&matrix, &mapper).expect("normalize rows");
    assert_eq!(report.rows(), 4);
    assert_eq!(report.accepted.len(), 3);
    assert_eq!(report.quarantine.len(), 1);
    assert_eq!(report.quarantine.entries()[0].reason.summary(), "Matrix");
}

#[tokio::test(start_paused = true)]
async fn storage_failures_are_quarantined_and_resubmittable() {
    let store = Arc::new(MemoryStore::new());
    let mut session = open_session(&store).await;
    let report = session.apply(
        &donor_matrix(&[&["D-1", "34", "F"], &["D-2", "40", "M"]]),
        &donor_mapper(),
    )
        .expect("normalize rows");
    let rejected = report.accepted[1].id.clone();
    store.fail_record(rejected.clone()).await;

    let config = UploadConfig {
        mode: cbh_core::SubmitMode::PerRecord,
        ..UploadConfig::default()
    };
    let upload = session.submit(&report.accepted, config.clone()).await;
    assert_eq!(upload.stored(), 1);
    assert_eq!(upload.status(&rejected), Some(RecordStatus::Failed));
    assert_eq!(upload.quarantine.len(), 1);

    let mut quarantine = upload.quarantine.clone();
    let retry = session.resubmit(&mut quarantine, config).await;
    assert_eq!(retry.failed(), 1);
    assert_eq!(quarantine.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn exhausted_identifier_counter_stops_the_pass() {
    let stored = CanonicalRecord {
        id: "last".to_string(),
        identifiers: Identifiers {
            donor: CanonicalId::mint(IdKind::Donor, u64::MAX),
            master: CanonicalId::mint(IdKind::Master, 1),
            sample: CanonicalId::mint(IdKind::Sample, 1),
        },
        values: BTreeMap::new(),
    };
    let store = Arc::new(MemoryStore::seeded(vec![stored], Vec::new()));
    let mut session = open_session(&store).await;
    assert_eq!(session.registry().next_counter(IdKind::Donor), None);

    let err = session
        .apply(&donor_matrix(&[&["D-9", "34", "F"]]), &donor_mapper())
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::Exhausted {
            kind: IdKind::Donor
        }
    );
    assert!(session.registry().pending().is_empty());
}
