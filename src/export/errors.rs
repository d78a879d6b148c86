use crate::codec::CodecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no {kind} string for id {id}")]
    UnknownTerm { kind: &'static str, id: u64 },

    #[error("triple batch error: {0}")]
    Codec(#[from] CodecError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;
