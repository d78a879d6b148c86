//! Text and JSON exports derived from dumps.

pub mod dataset_text;
pub mod errors;
pub mod query_stubs;

pub use dataset_text::{
    write_dictionary, write_triple_lines, ExportSummary, TripleDataset, DICT_FILE, TRIPLES_FILE,
    VALID_FILE,
};
pub use errors::{ExportError, Result};
pub use query_stubs::{
    export_query_stubs, stub_path, write_query_stubs, QueryStub, TermLookup, TermTable,
};

#[cfg(test)]
mod tests;
