//! Sequential byte cursor over any `Read` source.
//!
//! Each primitive consumes an exact, statically known number of bytes. The
//! cursor never buffers or looks ahead; wrap the source in a `BufReader`
//! when reading from a file.

use crate::codec::errors::{CodecError, Result};
use crate::codec::record::FixedRecord;
use std::io::{ErrorKind, Read};

#[derive(Debug)]
pub struct RecordReader<R> {
    inner: R,
    position: u64,
    scratch: Vec<u8>,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            position: 0,
            scratch: Vec::new(),
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Fill `buf` as far as the source allows and return how many bytes were read.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.position += filled as u64;
        Ok(filled)
    }

    /// Read exactly `buf.len()` bytes; any shortfall is a truncation.
    pub fn read_exact_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        let start = self.position;
        let found = self.fill(buf)?;
        if found < buf.len() {
            return Err(CodecError::TruncatedStream {
                expected: buf.len(),
                found,
                offset: start,
            });
        }
        Ok(())
    }

    /// Like `read_exact_bytes`, but zero available bytes is a clean end of
    /// stream (`Ok(false)`). A partial read is still a truncation.
    pub fn read_exact_or_eof(&mut self, buf: &mut [u8]) -> Result<bool> {
        let start = self.position;
        match self.fill(buf)? {
            0 if !buf.is_empty() => Ok(false),
            n if n == buf.len() => Ok(true),
            found => Err(CodecError::TruncatedStream {
                expected: buf.len(),
                found,
                offset: start,
            }),
        }
    }

    pub fn read_u64_le(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_exact_bytes(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Little-endian unsigned integer of `width` bytes (1..=8), e.g. 5 for 40-bit ids.
    pub fn read_uint_le(&mut self, width: usize) -> Result<u64> {
        let mut buf = [0u8; 8];
        let bytes = Self::width_slice(&mut buf, width)?;
        self.read_exact_bytes(bytes)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Big-endian unsigned integer of `width` bytes (1..=8).
    pub fn read_uint_be(&mut self, width: usize) -> Result<u64> {
        let mut buf = [0u8; 8];
        let bytes = Self::width_slice(&mut buf, width)?;
        self.read_exact_bytes(bytes)?;
        Ok(buf[..width]
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    }

    /// Packed little-endian doubles.
    pub fn read_f64_array_le(&mut self, count: usize) -> Result<Vec<f64>> {
        let len = count.checked_mul(8).ok_or(CodecError::MalformedCount {
            declared: count as u64,
            record_size: 8,
            available: 0,
        })?;
        let mut raw = vec![0u8; len];
        self.read_exact_bytes(&mut raw)?;
        Ok(raw
            .chunks_exact(8)
            .map(|chunk| {
                let mut b = [0u8; 8];
                b.copy_from_slice(chunk);
                f64::from_le_bytes(b)
            })
            .collect())
    }

    /// Read one fixed-size record; a short read of any length is a truncation.
    pub fn read_fixed<T: FixedRecord>(&mut self) -> Result<T> {
        let mut buf = self.take_scratch(T::SIZE);
        let read = self.read_exact_bytes(&mut buf);
        let record = read.and_then(|()| T::decode(&buf));
        self.scratch = buf;
        record
    }

    /// Read one fixed-size record, or `None` at a clean end of stream.
    pub fn read_fixed_or_eof<T: FixedRecord>(&mut self) -> Result<Option<T>> {
        let mut buf = self.take_scratch(T::SIZE);
        let record = match self.read_exact_or_eof(&mut buf) {
            Ok(true) => T::decode(&buf).map(Some),
            Ok(false) => Ok(None),
            Err(e) => Err(e),
        };
        self.scratch = buf;
        record
    }

    /// Number of bytes left before end of stream, consuming them.
    pub fn drain_remaining(&mut self) -> Result<u64> {
        let drained = std::io::copy(&mut self.inner, &mut std::io::sink())?;
        self.position += drained;
        Ok(drained)
    }

    fn take_scratch(&mut self, len: usize) -> Vec<u8> {
        let mut buf = std::mem::take(&mut self.scratch);
        buf.resize(len, 0);
        buf
    }

    fn width_slice(buf: &mut [u8; 8], width: usize) -> Result<&mut [u8]> {
        if width == 0 || width > 8 {
            return Err(CodecError::UnsupportedWidth { width });
        }
        Ok(&mut buf[..width])
    }
}
