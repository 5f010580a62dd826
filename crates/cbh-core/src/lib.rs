//! Sample harmonization core.
//!
//! - **registry**: session-scoped external-to-canonical identifier maps
//! - **normalizer**: per-row field resolution, validation and date retry
//! - **quarantine**: records awaiting manual repair
//! - **upload**: chunked, staggered submission to storage
//! - **store**: storage collaborator traits with memory and JSON-lines stores
//! - **session**: binds the above for one operator session

pub mod error;
pub mod normalizer;
pub mod quarantine;
pub mod registry;
pub mod session;
pub mod store;
pub mod upload;

pub use error::{QuarantineError, RegistryError, Result, StoreError};
pub use normalizer::{NormalizeReport, RowNormalizer, RowOutcome};
pub use quarantine::{Quarantine, QuarantineEntry, QuarantineReason};
pub use registry::{FALLBACK_COUNTER, IdentifierRegistry};
pub use session::{FlushReport, MappingSession};
pub use store::{IdentifierStore, JsonStore, MemoryStore, RecordStore, Submission};
pub use upload::{
    BatchUploader, ChunkReport, DEFAULT_CHUNK_DELAY, DEFAULT_CHUNK_SIZE, RecordStatus,
    SubmitMode, UploadConfig, UploadReport, chunk_count,
};
