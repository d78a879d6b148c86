//! Per-relation "average top-K": how deep, on average, the correct answer
//! sits for queries over a relation, counting only queries where it was found.

use crate::ranks::dataset::Sample;
use crate::ranks::errors::Result;
use std::collections::HashMap;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelationStats {
    pub queries: u64,
    pub hits: u64,
    pub sum_k: u64,
}

impl RelationStats {
    /// `round(sum_k / hits)` with ties to even, or -1 without any hit.
    pub fn average_k(&self) -> i64 {
        if self.hits == 0 {
            return -1;
        }
        (self.sum_k as f64 / self.hits as f64).round_ties_even() as i64
    }
}

/// Stats keyed by relation, remembering first-seen order.
#[derive(Debug, Clone, Default)]
pub struct RelationStatsTable {
    order: Vec<u64>,
    stats: HashMap<u64, RelationStats>,
}

impl RelationStatsTable {
    /// Aggregate raw samples, whose label is the rank plus one (0 = not found).
    pub fn from_raw(samples: &[Sample]) -> Self {
        let mut table = Self::default();
        for sample in samples {
            let entry = table.stats.entry(sample.relation).or_insert_with(|| {
                table.order.push(sample.relation);
                RelationStats::default()
            });
            entry.queries += 1;
            if sample.label != 0 {
                entry.hits += 1;
                entry.sum_k += sample.label;
            }
        }
        table
    }

    pub fn get(&self, relation: u64) -> Option<&RelationStats> {
        self.stats.get(&relation)
    }

    pub fn average_k(&self, relation: u64) -> Option<i64> {
        self.get(relation).map(RelationStats::average_k)
    }

    /// Relations in first-seen order.
    pub fn relations(&self) -> &[u64] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// One report row: relation, POS average K, SPO average K (-1 when absent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationK {
    pub relation: u64,
    pub pos: i64,
    pub spo: i64,
}

/// POS relations first, then relations only seen in SPO.
pub fn relation_k_report(pos: &RelationStatsTable, spo: &RelationStatsTable) -> Vec<RelationK> {
    let mut rows: Vec<RelationK> = pos
        .relations()
        .iter()
        .map(|&relation| RelationK {
            relation,
            pos: pos.average_k(relation).unwrap_or(-1),
            spo: spo.average_k(relation).unwrap_or(-1),
        })
        .collect();
    rows.extend(
        spo.relations()
            .iter()
            .filter(|&&relation| pos.get(relation).is_none())
            .map(|&relation| RelationK {
                relation,
                pos: -1,
                spo: spo.average_k(relation).unwrap_or(-1),
            }),
    );
    rows
}

/// Lines of `<relation> <pos> <spo>`.
pub fn write_relation_k_report<W: Write>(mut sink: W, rows: &[RelationK]) -> Result<()> {
    for row in rows {
        writeln!(sink, "{} {} {}", row.relation, row.pos, row.spo)?;
    }
    sink.flush()?;
    Ok(())
}
