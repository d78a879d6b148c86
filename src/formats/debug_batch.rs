//! Negative-sampling debug shards.
//!
//! Each shard file is named `batch-<epoch>-<shard>[...]` and holds
//! length-prefixed blocks: `[count: u64 LE][count × 40-byte rows]`, repeated
//! until end of file.

use crate::codec::{read_blocks, DebugBatchRecord, RecordReader, RecordWriter, Result, Triple};
use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

const SHARD_PREFIX: &str = "batch-";
/// How many object negatives a comparison keeps for inspection.
pub const NEGATIVE_SAMPLE_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShardName {
    pub epoch: u32,
    pub shard: u32,
}

impl ShardName {
    pub fn file_name(&self) -> String {
        format!("{}{}-{}", SHARD_PREFIX, self.epoch, self.shard)
    }
}

/// Parse `batch-<epoch>-<shard>`; anything after the shard digits is ignored.
pub fn parse_shard_name(name: &str) -> Option<ShardName> {
    let rest = name.strip_prefix(SHARD_PREFIX)?;
    let (epoch, rest) = rest.split_once('-')?;
    let digits = rest
        .find(|c: char| !c.is_ascii_digit())
        .map_or(rest, |end| &rest[..end]);
    Some(ShardName {
        epoch: epoch.parse().ok()?,
        shard: digits.parse().ok()?,
    })
}

/// Every row of every block in one shard, in file order.
pub fn read_debug_shard<R: Read>(source: R) -> Result<Vec<DebugBatchRecord>> {
    let mut reader = RecordReader::new(source);
    let blocks: Vec<Vec<DebugBatchRecord>> = read_blocks(&mut reader)?;
    Ok(blocks.into_iter().flatten().collect())
}

pub fn write_debug_block<W: Write>(sink: W, rows: &[DebugBatchRecord]) -> Result<()> {
    let mut writer = RecordWriter::new(sink);
    writer.write_counted(rows)?;
    writer.flush()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugShard {
    pub name: ShardName,
    pub path: PathBuf,
}

impl DebugShard {
    pub fn load(&self) -> Result<Vec<DebugBatchRecord>> {
        read_debug_shard(BufReader::new(File::open(&self.path)?))
    }
}

/// Shards of a debug directory grouped by epoch, each group sorted by shard.
#[derive(Debug, Clone, Default)]
pub struct DebugShardIndex {
    epochs: BTreeMap<u32, Vec<DebugShard>>,
}

impl DebugShardIndex {
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn scan(dir: impl AsRef<Path>) -> Result<Self> {
        let mut index = Self::default();
        for entry in fs::read_dir(dir.as_ref())? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str().and_then(parse_shard_name) else {
                debug!(file = ?file_name, "skipping non-shard file");
                continue;
            };
            index.insert(DebugShard {
                name,
                path: entry.path(),
            });
        }
        info!(
            epochs = index.epochs.len(),
            shards = index.shard_count(),
            "indexed debug shards"
        );
        Ok(index)
    }

    pub fn insert(&mut self, shard: DebugShard) {
        let group = self.epochs.entry(shard.name.epoch).or_default();
        let at = group.partition_point(|s| s.name <= shard.name);
        group.insert(at, shard);
    }

    pub fn epochs(&self) -> impl Iterator<Item = u32> + '_ {
        self.epochs.keys().copied()
    }

    pub fn shards(&self, epoch: u32) -> &[DebugShard] {
        self.epochs.get(&epoch).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn shard_count(&self) -> usize {
        self.epochs.values().map(Vec::len).sum()
    }

    pub fn load_epoch(&self, epoch: u32) -> Result<Vec<DebugBatchRecord>> {
        let mut rows = Vec::new();
        for shard in self.shards(epoch) {
            rows.extend(shard.load()?);
        }
        Ok(rows)
    }

    pub fn compare_epoch(&self, epoch: u32, reference: &HashSet<Triple>) -> Result<EpochComparison> {
        let rows = self.load_epoch(epoch)?;
        if rows.is_empty() {
            warn!(epoch, "no debug rows for epoch");
        }
        Ok(EpochComparison::compute(epoch, &rows, reference))
    }
}

/// How one epoch's sampled batches relate to the reference training triples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochComparison {
    pub epoch: u32,
    pub rows: usize,
    /// Distinct positive triples seen across the epoch.
    pub distinct_triples: usize,
    /// Subject-corrupted negatives that are actually true triples.
    pub negatives_in_reference: usize,
    /// True when the epoch visited exactly the reference set.
    pub matches_reference: bool,
    /// First object negatives, in file order.
    pub object_negatives: Vec<u64>,
}

impl EpochComparison {
    pub fn compute(epoch: u32, rows: &[DebugBatchRecord], reference: &HashSet<Triple>) -> Self {
        let mut seen = HashSet::with_capacity(rows.len());
        let mut negatives_in_reference = 0;
        for row in rows {
            seen.insert(row.triple());
            if reference.contains(&row.subject_corrupted()) {
                negatives_in_reference += 1;
            }
        }
        Self {
            epoch,
            rows: rows.len(),
            distinct_triples: seen.len(),
            negatives_in_reference,
            matches_reference: &seen == reference,
            object_negatives: rows
                .iter()
                .take(NEGATIVE_SAMPLE_LEN)
                .map(|r| r.o_negative)
                .collect(),
        }
    }
}

/// Write `rows` as a single-block shard named after `name` inside `dir`.
pub fn store_debug_shard(
    dir: impl AsRef<Path>,
    name: ShardName,
    rows: &[DebugBatchRecord],
) -> Result<PathBuf> {
    let path = dir.as_ref().join(name.file_name());
    write_debug_block(BufWriter::new(File::create(&path)?), rows)?;
    Ok(path)
}
