//! Readers and writers for the binary dumps of a knowledge-graph store
//! (subgraph embeddings, embedding tables, triple batches, debug shards),
//! plus rank-log processing and text exports built on them.

pub mod codec;
pub mod config;
pub mod export;
pub mod formats;
pub mod ranks;

pub use codec::{CodecError, RecordReader, RecordWriter};
pub use config::{ConfigError, KgDumpConfig};
pub use export::ExportError;
pub use ranks::RankError;
