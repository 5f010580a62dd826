//! JSON-lines store over a directory.
//!
//! Layout:
//!
//! - `samples.jsonl`: one [`CanonicalRecord`] per line
//! - `donor_id_mapping.jsonl`, `master_id_mapping.jsonl`,
//!   `sample_id_mapping.jsonl`: one [`CrossReference`] per line
//!
//! Writes append whole lines. There is no locking across processes.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use cbh_model::{CanonicalId, CanonicalRecord, CrossReference, IdKind};

use super::{IdentifierStore, RecordStore, max_identifier_in};
use crate::error::{Result, StoreError};

pub const SAMPLES_FILE: &str = "samples.jsonl";

/// File-backed implementation of both storage traits.
#[derive(Debug)]
pub struct JsonStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStore {
    /// Opens (creating if needed) a store directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(io_error("create directory", &dir))?;
        tracing::debug!(dir = %dir.display(), "opened json store");
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn samples_path(&self) -> PathBuf {
        self.dir.join(SAMPLES_FILE)
    }

    fn mapping_path(&self, kind: IdKind) -> PathBuf {
        self.dir.join(format!("{}_id_mapping.jsonl", kind.as_str()))
    }

    async fn append<T: Serialize>(&self, path: &Path, items: &[T]) -> Result<()> {
        let mut buffer = Vec::new();
        for item in items {
            serde_json::to_writer(&mut buffer, item)?;
            buffer.push(b'\n');
        }

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(io_error("open", path))?;
        file.write_all(&buffer)
            .await
            .map_err(io_error("write", path))?;
        file.flush().await.map_err(io_error("flush", path))?;
        Ok(())
    }

    async fn read_lines<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        let text = match fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(io_error("read", path)(source)),
        };
        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line).map_err(|source| StoreError::Corrupt {
                    path: path.to_path_buf(),
                    line: index + 1,
                    source,
                })
            })
            .collect()
    }
}

fn io_error(operation: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io {
        operation,
        path,
        source,
    }
}

#[async_trait]
impl IdentifierStore for JsonStore {
    async fn list_all(&self, kind: IdKind) -> Result<Vec<CrossReference>> {
        let references: Vec<CrossReference> = self.read_lines(&self.mapping_path(kind)).await?;
        Ok(references
            .into_iter()
            .filter(|reference| reference.kind == kind)
            .collect())
    }

    async fn create(&self, reference: &CrossReference) -> Result<()> {
        self.append(&self.mapping_path(reference.kind), std::slice::from_ref(reference))
            .await
    }
}

#[async_trait]
impl RecordStore for JsonStore {
    async fn create(&self, record: &CanonicalRecord) -> Result<()> {
        self.append(&self.samples_path(), std::slice::from_ref(record))
            .await
    }

    async fn create_many(&self, records: &[CanonicalRecord]) -> Result<()> {
        self.append(&self.samples_path(), records).await
    }

    async fn max_identifier(&self, kind: IdKind) -> Result<Option<CanonicalId>> {
        let records = self.list().await?;
        Ok(max_identifier_in(&records, kind))
    }

    async fn list(&self) -> Result<Vec<CanonicalRecord>> {
        self.read_lines(&self.samples_path()).await
    }
}
