//! Fixed-size record layouts: slice decoders and their exact inverse encoders.

use crate::codec::errors::{CodecError, Result};
use crate::codec::types::*;
use bytes::{Buf, BufMut};

/// A record with a statically known on-disk width.
pub trait FixedRecord: Sized {
    const SIZE: usize;

    /// Decode from a buffer of exactly `SIZE` bytes. The caller checks the length.
    fn decode_exact(buf: &mut &[u8]) -> Self;

    fn encode<B: BufMut>(&self, out: &mut B);

    /// Decode from a slice, rejecting any length other than `SIZE`.
    fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SIZE {
            return Err(CodecError::InvalidLength {
                expected: Self::SIZE,
                found: bytes.len(),
            });
        }
        let mut buf = bytes;
        Ok(Self::decode_exact(&mut buf))
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE);
        self.encode(&mut out);
        out
    }
}

impl FixedRecord for SubgraphRecord {
    const SIZE: usize = SUBGRAPH_RECORD_SIZE;

    fn decode_exact(buf: &mut &[u8]) -> Self {
        Self {
            typ: buf.get_u8(),
            relation_id: buf.get_u64_le(),
            entity_id: buf.get_u64_le(),
            size: buf.get_u64_le(),
        }
    }

    fn encode<B: BufMut>(&self, out: &mut B) {
        out.put_u8(self.typ);
        out.put_u64_le(self.relation_id);
        out.put_u64_le(self.entity_id);
        out.put_u64_le(self.size);
    }
}

impl FixedRecord for SubgraphEmbeddingMeta {
    const SIZE: usize = SUBGRAPH_META_SIZE;

    fn decode_exact(buf: &mut &[u8]) -> Self {
        Self {
            dim: buf.get_u16(),
            min_cardinality: buf.get_u64(),
        }
    }

    fn encode<B: BufMut>(&self, out: &mut B) {
        out.put_u16(self.dim);
        out.put_u64(self.min_cardinality);
    }
}

impl FixedRecord for EmbeddingTableHeader {
    const SIZE: usize = EMBEDDING_HEADER_SIZE;

    fn decode_exact(buf: &mut &[u8]) -> Self {
        Self {
            batch_size: buf.get_u32_le(),
            row_count: buf.get_u32_le(),
            dim: buf.get_u16_le(),
        }
    }

    fn encode<B: BufMut>(&self, out: &mut B) {
        out.put_u32_le(self.batch_size);
        out.put_u32_le(self.row_count);
        out.put_u16_le(self.dim);
    }
}

impl FixedRecord for TripleBatchRecord {
    const SIZE: usize = TRIPLE_RECORD_SIZE;

    fn decode_exact(buf: &mut &[u8]) -> Self {
        Self {
            subject_id: Id40::from_u40(buf.get_uint_le(ID40_SIZE)),
            predicate_id: Id40::from_u40(buf.get_uint_le(ID40_SIZE)),
            object_id: Id40::from_u40(buf.get_uint_le(ID40_SIZE)),
        }
    }

    fn encode<B: BufMut>(&self, out: &mut B) {
        out.put_uint_le(self.subject_id.get(), ID40_SIZE);
        out.put_uint_le(self.predicate_id.get(), ID40_SIZE);
        out.put_uint_le(self.object_id.get(), ID40_SIZE);
    }
}

impl FixedRecord for DebugBatchRecord {
    const SIZE: usize = DEBUG_RECORD_SIZE;

    fn decode_exact(buf: &mut &[u8]) -> Self {
        Self {
            s: buf.get_u64_le(),
            p: buf.get_u64_le(),
            o: buf.get_u64_le(),
            s_negative: buf.get_u64_le(),
            o_negative: buf.get_u64_le(),
        }
    }

    fn encode<B: BufMut>(&self, out: &mut B) {
        out.put_u64_le(self.s);
        out.put_u64_le(self.p);
        out.put_u64_le(self.o);
        out.put_u64_le(self.s_negative);
        out.put_u64_le(self.o_negative);
    }
}

/// `{typ=byte[0], relation=LE[1..9], entity=LE[9..17], size=LE[17..25]}`
pub fn decode_subgraph_record(bytes: &[u8; SUBGRAPH_RECORD_SIZE]) -> SubgraphRecord {
    SubgraphRecord::decode_exact(&mut &bytes[..])
}

/// Three consecutive 5-byte little-endian ids.
pub fn decode_triple_record(bytes: &[u8; TRIPLE_RECORD_SIZE]) -> TripleBatchRecord {
    TripleBatchRecord::decode_exact(&mut &bytes[..])
}

/// `batch_size=LE[0..4]`, `row_count=LE[4..8]`, `dim=LE[8..10]`.
pub fn decode_embedding_header(bytes: &[u8; EMBEDDING_HEADER_SIZE]) -> EmbeddingTableHeader {
    EmbeddingTableHeader::decode_exact(&mut &bytes[..])
}

/// `dim=BE[0..2]`, `min_cardinality=BE[2..10]`.
pub fn decode_subgraph_meta(bytes: &[u8; SUBGRAPH_META_SIZE]) -> SubgraphEmbeddingMeta {
    SubgraphEmbeddingMeta::decode_exact(&mut &bytes[..])
}

pub fn decode_debug_record(bytes: &[u8; DEBUG_RECORD_SIZE]) -> DebugBatchRecord {
    DebugBatchRecord::decode_exact(&mut &bytes[..])
}
