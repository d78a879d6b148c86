//! One JSON query stub per run of (subject, predicate) in a triple batch,
//! grouped under a directory per predicate id.

use crate::codec::{self, TripleBatchRecord};
use crate::export::errors::{ExportError, Result};
use crate::formats::TripleBatchReader;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Id to string resolution for entities and relations.
pub trait TermLookup {
    fn entity(&self, id: u64) -> Option<String>;
    fn relation(&self, id: u64) -> Option<String>;
}

/// In-memory dictionary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermTable {
    pub entities: HashMap<u64, String>,
    pub relations: HashMap<u64, String>,
}

impl TermLookup for TermTable {
    fn entity(&self, id: u64) -> Option<String> {
        self.entities.get(&id).cloned()
    }

    fn relation(&self, id: u64) -> Option<String> {
        self.relations.get(&id).cloned()
    }
}

/// `{"subject": ..., "predicate": ..., "object": "?"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryStub {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl QueryStub {
    pub const OPEN_OBJECT: &'static str = "?";

    pub fn resolve<L: TermLookup + ?Sized>(lookup: &L, record: &TripleBatchRecord) -> Result<Self> {
        let subject = record.subject_id.get();
        let predicate = record.predicate_id.get();
        Ok(Self {
            subject: lookup.entity(subject).ok_or(ExportError::UnknownTerm {
                kind: "entity",
                id: subject,
            })?,
            predicate: lookup.relation(predicate).ok_or(ExportError::UnknownTerm {
                kind: "relation",
                id: predicate,
            })?,
            object: Self::OPEN_OBJECT.to_string(),
        })
    }
}

/// `<out_dir>/<predicate>/query-<counter>.json`
pub fn stub_path(out_dir: &Path, predicate: u64, counter: usize) -> PathBuf {
    out_dir
        .join(predicate.to_string())
        .join(format!("query-{}.json", counter))
}

/// Write a stub each time (subject, predicate) differs from the previous
/// record. Counters are global across predicates and start at 0.
pub fn write_query_stubs<I, L>(records: I, lookup: &L, out_dir: &Path) -> Result<usize>
where
    I: IntoIterator<Item = codec::Result<TripleBatchRecord>>,
    L: TermLookup + ?Sized,
{
    let mut written = 0;
    let mut previous: Option<(u64, u64)> = None;
    for record in records {
        let record = record?;
        let key = (record.subject_id.get(), record.predicate_id.get());
        if previous == Some(key) {
            continue;
        }
        if previous.map(|(_, p)| p) != Some(key.1) {
            fs::create_dir_all(out_dir.join(key.1.to_string()))?;
        }
        previous = Some(key);

        let stub = QueryStub::resolve(lookup, &record)?;
        let path = stub_path(out_dir, key.1, written);
        let mut sink = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(&mut sink, &stub)?;
        sink.flush()?;
        debug!(path = %path.display(), "wrote query stub");
        written += 1;
    }
    Ok(written)
}

#[instrument(skip_all, fields(batch = %batch.as_ref().display()))]
pub fn export_query_stubs<L: TermLookup + ?Sized>(
    batch: impl AsRef<Path>,
    lookup: &L,
    out_dir: impl AsRef<Path>,
) -> Result<usize> {
    let written = write_query_stubs(TripleBatchReader::open(batch)?, lookup, out_dir.as_ref())?;
    info!(stubs = written, "exported query stubs");
    Ok(written)
}
