use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::{Instrument, debug, info, info_span, trace, warn};

use cbh_cli::logging::redact_value;
use cbh_core::{
    FlushReport, JsonStore, MappingSession, Quarantine, QuarantineEntry, RecordStore,
};
use cbh_ingest::read_spreadsheet;
use cbh_map::MappingFile;
use cbh_model::{CandidateValue, FieldKey, FieldKind};
use cbh_report::{SortDirection, SortSpec, TableQuery, group_by_sample};
use cbh_validate::CanonicalSchema;

use crate::cli::{BrowseArgs, HeadersArgs, ImportArgs, ResubmitArgs};
use crate::summary::{apply_table_style, print_page};
use crate::types::{ImportResult, ResubmitResult};

/// Default quarantine file inside a store directory.
const QUARANTINE_FILE: &str = "quarantine.json";

pub fn run_fields() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Field", "Label", "Kind", "Per result"]);
    apply_table_style(&mut table);
    for key in FieldKey::all() {
        let kind = match key.kind() {
            FieldKind::Identifier(kind) => format!("identifier ({})", kind.prefix()),
            other => other.as_str().to_string(),
        };
        let per_result = if key.spec().per_result { "yes" } else { "" };
        table.add_row(vec![
            key.name().to_string(),
            key.label().to_string(),
            kind,
            per_result.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_headers(args: &HeadersArgs) -> Result<()> {
    let matrix = read_spreadsheet(Some(&args.file), args.header_row)
        .with_context(|| format!("read {}", args.file.display()))?;
    let mut table = Table::new();
    table.set_header(vec!["Index", "Header"]);
    apply_table_style(&mut table);
    for (index, header) in matrix.headers.iter().enumerate() {
        table.add_row(vec![index.to_string(), header.clone()]);
    }
    println!("{table}");
    println!("{} data row(s)", matrix.height());
    Ok(())
}

pub async fn run_import(args: &ImportArgs) -> Result<ImportResult> {
    let span = info_span!("import", file = %args.file.display(), dry_run = args.dry_run);
    import(args).instrument(span).await
}

async fn import(args: &ImportArgs) -> Result<ImportResult> {
    let matrix = read_spreadsheet(Some(&args.file), args.header_row)
        .with_context(|| format!("read {}", args.file.display()))?;
    let mapper = MappingFile::load(&args.mapping)
        .and_then(|file| file.resolve(&matrix.headers))
        .with_context(|| format!("apply mapping {}", args.mapping.display()))?;
    let mapping = mapper.summary(matrix.width());
    info!(%mapping, "resolved mapping");

    let store = Arc::new(open_store(&args.store).await?);
    let mut session = MappingSession::open(
        store.clone(),
        store.clone(),
        Arc::new(CanonicalSchema::default()),
    )
    .await
    .context("open mapping session")?;

    let normalized = session
        .apply(&matrix, &mapper)
        .context("assign canonical identifiers")?;
    let rows = normalized.rows();
    let accepted = normalized.accepted.len();
    let invalid = normalized.quarantine.len();
    let dates_cleared = normalized.dates_cleared;
    let mut quarantine = normalized.quarantine;

    let (flush, upload) = if args.dry_run {
        info!(
            pending = session.registry().pending().len(),
            "dry run; nothing written"
        );
        (FlushReport::default(), None)
    } else {
        let flush = session.flush_cross_references().await;
        let upload = session
            .submit(&normalized.accepted, args.upload.config())
            .await;
        quarantine.extend(upload.quarantine.clone());
        (flush, Some(upload))
    };
    trace_quarantine(&quarantine);

    let quarantine_path = match (&args.quarantine_out, args.dry_run) {
        (Some(path), _) => Some(path.clone()),
        (None, false) => Some(args.store.join(QUARANTINE_FILE)),
        (None, true) => None,
    }
    .filter(|_| !quarantine.is_empty());
    // Entries left by earlier imports stay until resubmitted or deleted.
    let quarantine_file_entries = match &quarantine_path {
        Some(path) => {
            let total = quarantine
                .append_to_file(path)
                .with_context(|| format!("write quarantine {}", path.display()))?;
            warn!(
                entries = quarantine.len(),
                total,
                path = %path.display(),
                "wrote quarantine"
            );
            total
        }
        None => 0,
    };

    Ok(ImportResult {
        file: args.file.clone(),
        mapping,
        rows,
        accepted,
        dates_cleared,
        invalid,
        flush,
        upload,
        quarantine,
        quarantine_path,
        quarantine_file_entries,
    })
}

pub async fn run_resubmit(args: &ResubmitArgs) -> Result<ResubmitResult> {
    let span = info_span!("resubmit", quarantine = %args.quarantine.display());
    resubmit(args).instrument(span).await
}

async fn resubmit(args: &ResubmitArgs) -> Result<ResubmitResult> {
    let mut quarantine = Quarantine::load(&args.quarantine)
        .with_context(|| format!("read quarantine {}", args.quarantine.display()))?;
    let entries = quarantine.len();

    let store = Arc::new(open_store(&args.store).await?);
    let session = MappingSession::open(
        store.clone(),
        store.clone(),
        Arc::new(CanonicalSchema::default()),
    )
    .await
    .context("open mapping session")?;

    let upload = session.resubmit(&mut quarantine, args.upload.config()).await;
    trace_quarantine(&quarantine);

    let quarantine_path: PathBuf = args.out.clone().unwrap_or_else(|| args.quarantine.clone());
    quarantine
        .save(&quarantine_path)
        .with_context(|| format!("write quarantine {}", quarantine_path.display()))?;
    info!(
        entries,
        stored = upload.stored(),
        remaining = quarantine.len(),
        "resubmitted quarantine"
    );

    Ok(ResubmitResult {
        entries,
        upload,
        remaining: quarantine,
        quarantine_path,
    })
}

pub async fn run_browse(args: &BrowseArgs) -> Result<()> {
    let store = open_store(&args.store).await?;
    let records = store.list().await.context("list stored samples")?;
    let rows = group_by_sample(&records);
    debug!(records = records.len(), samples = rows.len(), "loaded samples");

    let mut query = TableQuery::new();
    query.search = args.search.clone();
    query.sort = args.sort.map(|field| SortSpec {
        field,
        direction: if args.desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        },
    });
    if !args.columns.is_empty() {
        query.set_columns(args.columns.iter().copied());
    }
    query.page = args.page;
    query.page_size = args.page_size;

    print_page(&query.run(&rows));
    Ok(())
}

async fn open_store(dir: &Path) -> Result<JsonStore> {
    JsonStore::open(dir)
        .await
        .with_context(|| format!("open store {}", dir.display()))
}

fn trace_quarantine(quarantine: &Quarantine) {
    for entry in quarantine.entries() {
        trace!(
            record_id = %entry.record.id,
            reason = %entry.reason.summary(),
            values = %redact_value(&describe_values(entry)),
            "quarantined record"
        );
    }
}

fn describe_values(entry: &QuarantineEntry) -> String {
    entry
        .record
        .values
        .iter()
        .map(|(key, value)| {
            let text = match value {
                CandidateValue::Text(text) => text.clone(),
                CandidateValue::Number(number) => number.to_string(),
                CandidateValue::Date(date) => date.to_string(),
            };
            format!("{key}={text}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}
