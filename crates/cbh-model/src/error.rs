use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid canonical identifier: {0}")]
    InvalidCanonicalId(String),
    #[error("unknown canonical field: {0}")]
    UnknownField(String),
    #[error("unknown identifier kind: {0}")]
    UnknownIdKind(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
