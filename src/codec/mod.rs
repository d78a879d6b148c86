//! Binary record codec for fixed-layout dumps.
//! Every read consumes an exact, statically known number of bytes; any
//! misalignment stops processing instead of guessing a resync point.

pub mod errors;
pub mod reader;
pub mod record;
pub mod stream;
pub mod types;
pub mod writer;

pub use errors::{CodecError, Result};
pub use reader::RecordReader;
pub use record::{
    decode_debug_record, decode_embedding_header, decode_subgraph_meta, decode_subgraph_record,
    decode_triple_record, FixedRecord,
};
pub use stream::{read_block, read_blocks, read_counted, read_counted_sequence, UntilEof};
pub use types::*;
pub use writer::RecordWriter;
