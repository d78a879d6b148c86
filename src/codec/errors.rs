//! Decoding error taxonomy for fixed-layout binary records.
//!
//! Clean end-of-stream is *not* an error: readers report it as `Ok(None)`.
//! Everything here aborts processing of the current stream.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    /// Fewer bytes were available than the record declares.
    #[error("truncated stream at offset {offset}: expected {expected} bytes, found {found}")]
    TruncatedStream {
        expected: usize,
        found: usize,
        offset: u64,
    },

    /// A declared count does not match what the stream actually holds.
    #[error(
        "malformed count: declared {declared} records of {record_size} bytes, stream holds {available}"
    )]
    MalformedCount {
        declared: u64,
        record_size: usize,
        available: u64,
    },

    #[error("integer width {width} not supported (1..=8)")]
    UnsupportedWidth { width: usize },

    #[error("id {value} does not fit in 40 bits")]
    IdOutOfRange { value: u64 },

    /// A value exceeds what its on-disk field can hold.
    #[error("{field} of {value} does not fit its on-disk field (max {max})")]
    FieldOverflow {
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("invalid length: expected {expected}, found {found}")]
    InvalidLength { expected: usize, found: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// True for errors caused by running out of bytes, counted or not.
    pub fn is_truncation(&self) -> bool {
        matches!(
            self,
            Self::TruncatedStream { .. } | Self::MalformedCount { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
