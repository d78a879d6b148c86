//! Stream-level algorithms built on `RecordReader`:
//! counted sequences, until-EOF record streams and length-prefixed blocks.

use crate::codec::errors::{CodecError, Result};
use crate::codec::reader::RecordReader;
use crate::codec::record::FixedRecord;
use crate::codec::types::COUNT_SIZE;
use std::io::Read;
use std::marker::PhantomData;
use tracing::debug;

// Upper bound on speculative allocation when the stream length is unknown.
const MAX_PREALLOC: u64 = 1 << 16;

/// Read exactly `count` records of type `T`.
///
/// `available` is the number of bytes known to remain in the source, when the
/// caller knows it (files, slices). A count that cannot fit is rejected before
/// anything is allocated; otherwise running dry part-way is reported as
/// `MalformedCount` as well.
pub fn read_counted<T, R>(
    reader: &mut RecordReader<R>,
    count: u64,
    available: Option<u64>,
) -> Result<Vec<T>>
where
    T: FixedRecord,
    R: Read,
{
    let record_size = T::SIZE;
    if let Some(available) = available {
        let needed = count.checked_mul(record_size as u64);
        if needed.map_or(true, |needed| needed > available) {
            return Err(CodecError::MalformedCount {
                declared: count,
                record_size,
                available,
            });
        }
    }

    let body_start = reader.position();
    let mut records = Vec::with_capacity(count.min(MAX_PREALLOC) as usize);
    for _ in 0..count {
        match reader.read_fixed::<T>() {
            Ok(record) => records.push(record),
            Err(CodecError::TruncatedStream { .. }) => {
                return Err(CodecError::MalformedCount {
                    declared: count,
                    record_size,
                    available: reader.position() - body_start,
                })
            }
            Err(e) => return Err(e),
        }
    }
    Ok(records)
}

/// Read a `u64 LE` count followed by that many records.
pub fn read_counted_sequence<T, R>(
    reader: &mut RecordReader<R>,
    available: Option<u64>,
) -> Result<Vec<T>>
where
    T: FixedRecord,
    R: Read,
{
    let count = reader.read_u64_le()?;
    let remaining = available.map(|a| a.saturating_sub(COUNT_SIZE as u64));
    debug!(count, record_size = T::SIZE, "reading counted sequence");
    read_counted(reader, count, remaining)
}

/// Iterator over fixed-size records that runs until a clean end of stream.
///
/// A zero-byte read ends iteration; a partial record yields one
/// `TruncatedStream` error and then ends iteration.
pub struct UntilEof<T, R> {
    reader: RecordReader<R>,
    done: bool,
    _record: PhantomData<fn() -> T>,
}

impl<T: FixedRecord, R: Read> UntilEof<T, R> {
    pub fn new(reader: RecordReader<R>) -> Self {
        Self {
            reader,
            done: false,
            _record: PhantomData,
        }
    }

    pub fn position(&self) -> u64 {
        self.reader.position()
    }
}

impl<T: FixedRecord, R: Read> Iterator for UntilEof<T, R> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_fixed_or_eof::<T>() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Read one `u64 LE count + count × T` block, or `None` at a clean end of stream.
pub fn read_block<T, R>(reader: &mut RecordReader<R>) -> Result<Option<Vec<T>>>
where
    T: FixedRecord,
    R: Read,
{
    let mut count_bytes = [0u8; COUNT_SIZE];
    if !reader.read_exact_or_eof(&mut count_bytes)? {
        return Ok(None);
    }
    let count = u64::from_le_bytes(count_bytes);
    read_counted(reader, count, None).map(Some)
}

/// Read length-prefixed blocks until the source is exhausted.
pub fn read_blocks<T, R>(reader: &mut RecordReader<R>) -> Result<Vec<Vec<T>>>
where
    T: FixedRecord,
    R: Read,
{
    let mut blocks = Vec::new();
    while let Some(block) = read_block(reader)? {
        blocks.push(block);
    }
    Ok(blocks)
}
