//! Encoders mirroring `RecordReader`: every layout the reader accepts can be
//! produced here byte for byte.

use crate::codec::errors::{CodecError, Result};
use crate::codec::record::FixedRecord;
use std::io::Write;

pub struct RecordWriter<W: Write> {
    inner: W,
    written: u64,
    buf: Vec<u8>,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            written: 0,
            buf: Vec::with_capacity(64),
        }
    }

    /// Bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    pub fn write_u64_le(&mut self, value: u64) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Low `width` bytes of `value`, little-endian. Rejects values that do not fit.
    pub fn write_uint_le(&mut self, value: u64, width: usize) -> Result<()> {
        Self::check_width(value, width)?;
        let bytes = value.to_le_bytes();
        self.write_bytes(&bytes[..width])
    }

    pub fn write_uint_be(&mut self, value: u64, width: usize) -> Result<()> {
        Self::check_width(value, width)?;
        let bytes = value.to_be_bytes();
        self.write_bytes(&bytes[8 - width..])
    }

    pub fn write_f64_array_le(&mut self, values: &[f64]) -> Result<()> {
        self.buf.clear();
        for v in values {
            self.buf.extend_from_slice(&v.to_le_bytes());
        }
        let buf = std::mem::take(&mut self.buf);
        let res = self.write_bytes(&buf);
        self.buf = buf;
        res
    }

    pub fn write_fixed<T: FixedRecord>(&mut self, record: &T) -> Result<()> {
        let mut buf = std::mem::take(&mut self.buf);
        buf.clear();
        record.encode(&mut buf);
        let res = self.write_bytes(&buf);
        self.buf = buf;
        res
    }

    /// `u64 LE` count followed by every record.
    pub fn write_counted<T: FixedRecord>(&mut self, records: &[T]) -> Result<()> {
        self.write_u64_le(records.len() as u64)?;
        for record in records {
            self.write_fixed(record)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn check_width(value: u64, width: usize) -> Result<()> {
        if width == 0 || width > 8 {
            return Err(CodecError::UnsupportedWidth { width });
        }
        if width < 8 && value >> (width * 8) != 0 {
            return Err(CodecError::InvalidLength {
                expected: width,
                found: 8 - (value.leading_zeros() as usize / 8),
            });
        }
        Ok(())
    }
}
