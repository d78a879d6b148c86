//! Record schemas for subgraph dumps, embedding tables and batch files.
//!
//! Every struct carries its on-disk width in its field types: the
//! embedding-table `dim` is a `u16` because the header stores it in two
//! bytes, and triple ids are `Id40` because they occupy five.

use crate::codec::errors::{CodecError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `[tag: u8][relation: u64 LE][entity: u64 LE][size: u64 LE]`
pub const SUBGRAPH_RECORD_SIZE: usize = 25;
/// `[dim: u16 BE][min_cardinality: u64 BE]`
pub const SUBGRAPH_META_SIZE: usize = 10;
/// `[batch_size: u32 LE][row_count: u32 LE][dim: u16 LE]`
pub const EMBEDDING_HEADER_SIZE: usize = 10;
/// Row id prefix in front of every embedding-table row.
pub const EMBEDDING_ROW_ID_SIZE: usize = 8;
/// Width of one triple-batch id.
pub const ID40_SIZE: usize = 5;
/// Three 40-bit ids.
pub const TRIPLE_RECORD_SIZE: usize = 3 * ID40_SIZE;
/// Five `u64 LE` fields.
pub const DEBUG_RECORD_SIZE: usize = 40;
/// Leading `u64 LE` count of counted streams and debug blocks.
pub const COUNT_SIZE: usize = 8;

/// Which side of the triple a subgraph groups on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubgraphKind {
    /// Subjects sharing a (predicate, object) pair.
    Po,
    /// Objects sharing a (subject, predicate) pair.
    Sp,
}

impl SubgraphKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Po),
            1 => Some(Self::Sp),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            Self::Po => 0,
            Self::Sp => 1,
        }
    }
}

/// Metadata of one precomputed subgraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubgraphRecord {
    /// Raw type tag; kept as a byte so unknown tags survive a round trip.
    pub typ: u8,
    pub relation_id: u64,
    pub entity_id: u64,
    pub size: u64,
}

impl SubgraphRecord {
    pub fn new(kind: SubgraphKind, relation_id: u64, entity_id: u64, size: u64) -> Self {
        Self {
            typ: kind.tag(),
            relation_id,
            entity_id,
            size,
        }
    }

    pub fn kind(&self) -> Option<SubgraphKind> {
        SubgraphKind::from_tag(self.typ)
    }
}

/// Header sitting between the subgraph records and their averaged embeddings.
/// Both fields are big-endian on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubgraphEmbeddingMeta {
    pub dim: u16,
    pub min_cardinality: u64,
}

/// Header of an embedding table meta file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingTableHeader {
    pub batch_size: u32,
    pub row_count: u32,
    pub dim: u16,
}

impl EmbeddingTableHeader {
    /// Bytes per row in the data file, row id included.
    pub fn row_size(&self) -> usize {
        EMBEDDING_ROW_ID_SIZE + self.dim as usize * 8
    }
}

/// Unsigned 40-bit identifier as stored in triple batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Id40(u64);

impl Id40 {
    pub const MAX: u64 = (1 << 40) - 1;

    pub fn new(value: u64) -> Result<Self> {
        if value > Self::MAX {
            return Err(CodecError::IdOutOfRange { value });
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Only for values already known to fit, e.g. read from five bytes.
    pub(crate) fn from_u40(value: u64) -> Self {
        debug_assert!(value <= Self::MAX);
        Self(value & Self::MAX)
    }
}

impl TryFrom<u64> for Id40 {
    type Error = CodecError;

    fn try_from(value: u64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Id40> for u64 {
    fn from(id: Id40) -> u64 {
        id.0
    }
}

impl fmt::Display for Id40 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One triple of a native batch file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TripleBatchRecord {
    pub subject_id: Id40,
    pub predicate_id: Id40,
    /// Decoded for completeness; the query-stub export never reads it.
    pub object_id: Id40,
}

/// One row of a negative-sampling debug block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DebugBatchRecord {
    pub s: u64,
    pub p: u64,
    pub o: u64,
    pub s_negative: u64,
    pub o_negative: u64,
}

impl DebugBatchRecord {
    pub fn triple(&self) -> Triple {
        Triple::new(self.s, self.p, self.o)
    }

    /// The triple with its subject replaced by the sampled negative.
    pub fn subject_corrupted(&self) -> Triple {
        Triple::new(self.s_negative, self.p, self.o)
    }

    pub fn object_corrupted(&self) -> Triple {
        Triple::new(self.s, self.p, self.o_negative)
    }
}

/// Plain (subject, predicate, object) id triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub s: u64,
    pub p: u64,
    pub o: u64,
}

impl Triple {
    pub fn new(s: u64, p: u64, o: u64) -> Self {
        Self { s, p, o }
    }
}
