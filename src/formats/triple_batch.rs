//! Native triple batch files: back-to-back 15-byte records, no header,
//! terminated by end of file.

use crate::codec::{
    CodecError, FixedRecord, RecordReader, RecordWriter, Result, TripleBatchRecord, UntilEof,
    TRIPLE_RECORD_SIZE,
};
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{info, instrument};

/// Streaming reader; yields records until a clean end of file.
pub struct TripleBatchReader<R: Read> {
    records: UntilEof<TripleBatchRecord, R>,
}

impl<R: Read> TripleBatchReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            records: UntilEof::new(RecordReader::new(source)),
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.records.position()
    }
}

impl TripleBatchReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: Read> Iterator for TripleBatchReader<R> {
    type Item = Result<TripleBatchRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next()
    }
}

/// Decode a whole in-memory batch. A trailing partial record is a truncation.
pub fn decode_triple_batch(bytes: &[u8]) -> Result<Vec<TripleBatchRecord>> {
    let chunks = bytes.chunks_exact(TRIPLE_RECORD_SIZE);
    let tail = chunks.remainder().len();
    let records = chunks
        .map(TripleBatchRecord::decode)
        .collect::<Result<Vec<_>>>()?;
    if tail > 0 {
        return Err(CodecError::TruncatedStream {
            expected: TRIPLE_RECORD_SIZE,
            found: tail,
            offset: (bytes.len() - tail) as u64,
        });
    }
    Ok(records)
}

/// Read every record of a batch file through a buffered stream.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_triple_batch(path: impl AsRef<Path>) -> Result<Vec<TripleBatchRecord>> {
    let records = TripleBatchReader::open(path.as_ref())?.collect::<Result<Vec<_>>>()?;
    info!(records = records.len(), "loaded triple batch");
    Ok(records)
}

/// Same result as `load_triple_batch`, decoding from a read-only memory map.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn map_triple_batch(path: impl AsRef<Path>) -> Result<Vec<TripleBatchRecord>> {
    let file = File::open(path.as_ref())?;
    if file.metadata()?.len() == 0 {
        return Ok(Vec::new());
    }
    // SAFETY: the map is read-only and dropped before returning; the batch
    // file is not expected to change while it is being decoded.
    let mmap = unsafe { Mmap::map(&file)? };
    let records = decode_triple_batch(&mmap)?;
    info!(records = records.len(), "mapped triple batch");
    Ok(records)
}

pub fn write_triple_batch<W: Write>(sink: W, records: &[TripleBatchRecord]) -> Result<()> {
    let mut writer = RecordWriter::new(sink);
    for record in records {
        writer.write_fixed(record)?;
    }
    writer.flush()
}

pub fn store_triple_batch(path: impl AsRef<Path>, records: &[TripleBatchRecord]) -> Result<()> {
    write_triple_batch(BufWriter::new(File::create(path)?), records)
}
