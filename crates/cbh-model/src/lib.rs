pub mod error;
pub mod field;
pub mod ids;
pub mod record;

pub use error::{ModelError, Result};
pub use field::{FIELDS, FieldKey, FieldKind, FieldSpec};
pub use ids::{CanonicalId, CrossReference, IdKind};
pub use record::{
    CandidateRecord, CandidateValue, CanonicalRecord, DateParts, FieldValue, Identifiers,
};
