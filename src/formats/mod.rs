//! File-level loaders and writers built on the record codec.

pub mod debug_batch;
pub mod embedding_table;
pub mod subgraph;
pub mod triple_batch;

pub use debug_batch::{
    parse_shard_name, read_debug_shard, store_debug_shard, DebugShard, DebugShardIndex,
    EpochComparison, ShardName,
};
pub use embedding_table::EmbeddingTable;
pub use subgraph::{Subgraph, SubgraphDump};
pub use triple_batch::{
    decode_triple_batch, load_triple_batch, map_triple_batch, store_triple_batch,
    write_triple_batch, TripleBatchReader,
};
