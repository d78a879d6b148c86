use thiserror::Error;

#[derive(Debug, Error)]
pub enum RankError {
    #[error("rank log line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("no {table} embedding for id {id}")]
    UnknownId { table: &'static str, id: u64 },

    #[error("validation fraction must be within [0, 1), got {0}")]
    InvalidFraction(f64),

    #[error("classifier failed: {0}")]
    Classifier(String),

    #[error("classifier returned {found} predictions for {expected} samples")]
    PredictionCount { expected: usize, found: usize },

    #[error("prediction line {line}: relation {pos} in POS log but {spo} in SPO log")]
    RelationMismatch { line: usize, pos: String, spo: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RankError>;
