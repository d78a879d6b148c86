//! Subgraph dump: subgraph metadata followed by one averaged embedding per subgraph.
//!
//! Layout:
//! `[count: u64 LE][count × SubgraphRecord][SubgraphEmbeddingMeta][count × dim × f64 LE]`

use crate::codec::{
    read_counted_sequence, CodecError, RecordReader, RecordWriter, Result,
    SubgraphEmbeddingMeta, SubgraphKind, SubgraphRecord, COUNT_SIZE, SUBGRAPH_META_SIZE,
    SUBGRAPH_RECORD_SIZE,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info, instrument};

/// A subgraph paired with its averaged embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Subgraph<'a> {
    pub record: &'a SubgraphRecord,
    pub embedding: &'a [f64],
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubgraphDump {
    pub records: Vec<SubgraphRecord>,
    pub meta: SubgraphEmbeddingMeta,
    /// One vector of `meta.dim` values per record, in record order.
    pub embeddings: Vec<Vec<f64>>,
}

impl SubgraphDump {
    pub fn new(meta: SubgraphEmbeddingMeta) -> Self {
        Self {
            records: Vec::new(),
            meta,
            embeddings: Vec::new(),
        }
    }

    /// Append a subgraph; the embedding must have exactly `meta.dim` values.
    pub fn push(&mut self, record: SubgraphRecord, embedding: Vec<f64>) -> Result<()> {
        if embedding.len() != self.dim() {
            return Err(CodecError::InvalidLength {
                expected: self.dim(),
                found: embedding.len(),
            });
        }
        self.records.push(record);
        self.embeddings.push(embedding);
        Ok(())
    }

    pub fn dim(&self) -> usize {
        self.meta.dim as usize
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Subgraph<'_>> {
        Some(Subgraph {
            record: self.records.get(index)?,
            embedding: self.embeddings.get(index)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Subgraph<'_>> {
        self.records
            .iter()
            .zip(&self.embeddings)
            .map(|(record, embedding)| Subgraph { record, embedding })
    }

    /// First subgraph of `kind` built around (`relation_id`, `entity_id`).
    pub fn find(&self, kind: SubgraphKind, relation_id: u64, entity_id: u64) -> Option<Subgraph<'_>> {
        self.iter().find(|sg| {
            sg.record.kind() == Some(kind)
                && sg.record.relation_id == relation_id
                && sg.record.entity_id == entity_id
        })
    }

    /// Decode a dump. `len` is the total stream length when known; with it,
    /// inconsistent counts are rejected before any large allocation.
    pub fn read<R: Read>(source: R, len: Option<u64>) -> Result<Self> {
        let mut reader = RecordReader::new(source);
        let records: Vec<SubgraphRecord> = read_counted_sequence(&mut reader, len)?;
        let meta = reader.read_fixed::<SubgraphEmbeddingMeta>()?;
        let count = records.len() as u64;
        let vector_size = meta.dim as usize * 8;

        let body_start = reader.position();
        if let Some(len) = len {
            let needed = count * vector_size as u64;
            let available = len.saturating_sub(body_start);
            if needed != available {
                return Err(CodecError::MalformedCount {
                    declared: count,
                    record_size: vector_size,
                    available,
                });
            }
        }

        let mut embeddings = Vec::with_capacity(records.len());
        for _ in 0..records.len() {
            match reader.read_f64_array_le(meta.dim as usize) {
                Ok(v) => embeddings.push(v),
                Err(e) if e.is_truncation() => {
                    return Err(CodecError::MalformedCount {
                        declared: count,
                        record_size: vector_size,
                        available: reader.position() - body_start,
                    })
                }
                Err(e) => return Err(e),
            }
        }

        let trailing = reader.drain_remaining()?;
        if trailing > 0 {
            return Err(CodecError::MalformedCount {
                declared: count,
                record_size: vector_size,
                available: reader.position() - body_start,
            });
        }

        debug!(count, dim = meta.dim, "decoded subgraph dump");
        Ok(Self {
            records,
            meta,
            embeddings,
        })
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let len = file.metadata()?.len();
        let dump = Self::read(BufReader::new(file), Some(len))?;
        info!(
            subgraphs = dump.len(),
            dim = dump.meta.dim,
            min_cardinality = dump.meta.min_cardinality,
            "loaded subgraph dump"
        );
        Ok(dump)
    }

    pub fn write<W: Write>(&self, sink: W) -> Result<()> {
        if self.records.len() != self.embeddings.len() {
            return Err(CodecError::InvalidLength {
                expected: self.records.len(),
                found: self.embeddings.len(),
            });
        }
        let mut writer = RecordWriter::new(sink);
        writer.write_counted(&self.records)?;
        writer.write_fixed(&self.meta)?;
        for embedding in &self.embeddings {
            if embedding.len() != self.dim() {
                return Err(CodecError::InvalidLength {
                    expected: self.dim(),
                    found: embedding.len(),
                });
            }
            writer.write_f64_array_le(embedding)?;
        }
        writer.flush()
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn store(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.write(BufWriter::new(file))?;
        info!(subgraphs = self.len(), "stored subgraph dump");
        Ok(())
    }

    /// Encoded size in bytes.
    pub fn encoded_len(&self) -> u64 {
        (COUNT_SIZE + self.len() * SUBGRAPH_RECORD_SIZE + SUBGRAPH_META_SIZE) as u64
            + (self.len() * self.dim() * 8) as u64
    }
}
