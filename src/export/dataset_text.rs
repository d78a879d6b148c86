//! Plain-text export of a split triple dataset:
//! `valid_data`, `triples.gz` and `dict.gz` in one directory.

use crate::export::errors::Result;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, instrument};

pub const VALID_FILE: &str = "valid_data";
pub const TRIPLES_FILE: &str = "triples.gz";
pub const DICT_FILE: &str = "dict.gz";

/// Triples are stored as `(subject, object, predicate)`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TripleDataset {
    pub train: Vec<(u64, u64, u64)>,
    pub valid: Vec<(u64, u64, u64)>,
    pub entities: BTreeMap<u64, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportSummary {
    pub valid: usize,
    pub train: usize,
    pub entities: usize,
}

/// `s p o` per line.
pub fn write_triple_lines<W: Write>(sink: &mut W, triples: &[(u64, u64, u64)]) -> Result<()> {
    for &(s, o, p) in triples {
        writeln!(sink, "{} {} {}", s, p, o)?;
    }
    Ok(())
}

/// `id length text` per line, length counted in characters.
pub fn write_dictionary<W: Write>(sink: &mut W, entities: &BTreeMap<u64, String>) -> Result<()> {
    for (id, text) in entities {
        writeln!(sink, "{} {} {}", id, text.chars().count(), text)?;
    }
    Ok(())
}

fn gzip_file(path: &Path) -> Result<GzEncoder<BufWriter<File>>> {
    Ok(GzEncoder::new(
        BufWriter::new(File::create(path)?),
        Compression::default(),
    ))
}

impl TripleDataset {
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn export(&self, dir: impl AsRef<Path>) -> Result<ExportSummary> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let mut valid = BufWriter::new(File::create(dir.join(VALID_FILE))?);
        write_triple_lines(&mut valid, &self.valid)?;
        valid.flush()?;

        let mut triples = gzip_file(&dir.join(TRIPLES_FILE))?;
        write_triple_lines(&mut triples, &self.train)?;
        triples.finish()?.flush()?;

        let mut dict = gzip_file(&dir.join(DICT_FILE))?;
        write_dictionary(&mut dict, &self.entities)?;
        dict.finish()?.flush()?;

        let summary = ExportSummary {
            valid: self.valid.len(),
            train: self.train.len(),
            entities: self.entities.len(),
        };
        info!(
            valid = summary.valid,
            train = summary.train,
            entities = summary.entities,
            "exported triple dataset"
        );
        Ok(summary)
    }
}
