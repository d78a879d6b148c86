//! Embedding tables: a 10-byte meta file plus a row file.
//!
//! Row file layout: `row_count × ([row id: 8 bytes][dim × f64 LE])`.
//! Only the float payload is kept; rows are addressed by position.

use crate::codec::{
    CodecError, EmbeddingTableHeader, RecordReader, RecordWriter, Result, EMBEDDING_ROW_ID_SIZE,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingTable {
    header: EmbeddingTableHeader,
    /// Row-major `row_count × dim`.
    data: Vec<f64>,
}

impl EmbeddingTable {
    /// Build a table from row vectors that all share one dimension.
    pub fn from_rows(batch_size: u32, rows: &[Vec<f64>]) -> Result<Self> {
        let dim = rows.first().map_or(0, Vec::len);
        let dim_u16 = u16::try_from(dim).map_err(|_| CodecError::FieldOverflow {
            field: "dim",
            value: dim as u64,
            max: u64::from(u16::MAX),
        })?;
        let row_count = u32::try_from(rows.len()).map_err(|_| CodecError::FieldOverflow {
            field: "row_count",
            value: rows.len() as u64,
            max: u64::from(u32::MAX),
        })?;

        let mut data = Vec::with_capacity(rows.len() * dim);
        for row in rows {
            if row.len() != dim {
                return Err(CodecError::InvalidLength {
                    expected: dim,
                    found: row.len(),
                });
            }
            data.extend_from_slice(row);
        }

        Ok(Self {
            header: EmbeddingTableHeader {
                batch_size,
                row_count,
                dim: dim_u16,
            },
            data,
        })
    }

    pub fn header(&self) -> &EmbeddingTableHeader {
        &self.header
    }

    pub fn dim(&self) -> usize {
        self.header.dim as usize
    }

    pub fn len(&self) -> usize {
        self.header.row_count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.header.row_count == 0
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.len() {
            return None;
        }
        let dim = self.dim();
        self.data.get(index * dim..(index + 1) * dim)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.len()).filter_map(move |i| self.row(i))
    }

    pub fn read_header<R: Read>(source: R) -> Result<EmbeddingTableHeader> {
        RecordReader::new(source).read_fixed::<EmbeddingTableHeader>()
    }

    /// Decode exactly `header.row_count` rows; a short or overlong row stream is
    /// `MalformedCount`. `len` is the row stream length when known.
    pub fn read_rows<R: Read>(
        header: EmbeddingTableHeader,
        source: R,
        len: Option<u64>,
    ) -> Result<Self> {
        let row_size = header.row_size();
        let count = u64::from(header.row_count);
        if let Some(len) = len {
            if count * row_size as u64 != len {
                return Err(CodecError::MalformedCount {
                    declared: count,
                    record_size: row_size,
                    available: len,
                });
            }
        }

        let mut reader = RecordReader::new(source);
        let dim = header.dim as usize;
        // Only trust the declared size once it has been checked against the stream.
        let mut data = match len {
            Some(_) => Vec::with_capacity(header.row_count as usize * dim),
            None => Vec::new(),
        };
        let mut row_id = [0u8; EMBEDDING_ROW_ID_SIZE];
        for _ in 0..header.row_count {
            let row = reader
                .read_exact_bytes(&mut row_id)
                .and_then(|()| reader.read_f64_array_le(dim));
            match row {
                Ok(values) => data.extend(values),
                Err(e) if e.is_truncation() => {
                    return Err(CodecError::MalformedCount {
                        declared: count,
                        record_size: row_size,
                        available: reader.position(),
                    })
                }
                Err(e) => return Err(e),
            }
        }

        if reader.drain_remaining()? > 0 {
            return Err(CodecError::MalformedCount {
                declared: count,
                record_size: row_size,
                available: reader.position(),
            });
        }
        debug!(rows = count, dim, "decoded embedding rows");
        Ok(Self { header, data })
    }

    #[instrument(skip_all, fields(meta = %meta_path.as_ref().display(), rows = %rows_path.as_ref().display()))]
    pub fn load(meta_path: impl AsRef<Path>, rows_path: impl AsRef<Path>) -> Result<Self> {
        let header = Self::read_header(BufReader::new(File::open(meta_path.as_ref())?))?;
        let file = File::open(rows_path.as_ref())?;
        let len = file.metadata()?.len();
        let table = Self::read_rows(header, BufReader::new(file), Some(len))?;
        info!(
            rows = header.row_count,
            dim = header.dim,
            batch_size = header.batch_size,
            "loaded embedding table"
        );
        Ok(table)
    }

    pub fn write_header<W: Write>(&self, sink: W) -> Result<()> {
        let mut writer = RecordWriter::new(sink);
        writer.write_fixed(&self.header)?;
        writer.flush()
    }

    /// Rows are written with their index as row id.
    pub fn write_rows<W: Write>(&self, sink: W) -> Result<()> {
        let mut writer = RecordWriter::new(sink);
        for (i, row) in self.rows().enumerate() {
            writer.write_u64_le(i as u64)?;
            writer.write_f64_array_le(row)?;
        }
        writer.flush()
    }

    pub fn store(&self, meta_path: impl AsRef<Path>, rows_path: impl AsRef<Path>) -> Result<()> {
        self.write_header(BufWriter::new(File::create(meta_path)?))?;
        self.write_rows(BufWriter::new(File::create(rows_path)?))
    }
}
