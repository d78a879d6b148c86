//! Turning rank logs into labelled (relation, entity) samples.
//!
//! POS samples pair a query's relation with its tail and are labelled from
//! the head rank; SPO samples pair the relation with the head and use the
//! tail rank. Raw samples carry `rank + 1` instead of a class.

use crate::formats::EmbeddingTable;
use crate::ranks::errors::{RankError, Result};
use crate::ranks::log::RankResult;
use rand::seq::index;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const NUM_CLASSES: usize = 5;

/// Upper bounds (exclusive) of classes 1, 2 and 3; anything larger is class 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankBuckets {
    pub thresholds: [u64; NUM_CLASSES - 2],
}

impl Default for RankBuckets {
    fn default() -> Self {
        Self {
            thresholds: [3, 5, 10],
        }
    }
}

impl RankBuckets {
    /// Class of a rank; 0 is reserved for "not found".
    pub fn class(&self, rank: u64) -> u8 {
        if rank == 0 {
            return 0;
        }
        self.thresholds
            .iter()
            .position(|&bound| rank < bound)
            .map_or(NUM_CLASSES as u8 - 1, |i| i as u8 + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// (relation, tail) → head rank class.
    Pos,
    /// (relation, head) → tail rank class.
    Spo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sample {
    pub relation: u64,
    pub entity: u64,
    pub label: u64,
}

impl Sample {
    fn classed(result: &RankResult, direction: Direction, buckets: &RankBuckets) -> Self {
        let (entity, rank) = Self::side(result, direction);
        Self {
            relation: result.query.relation,
            entity,
            label: u64::from(buckets.class(rank)),
        }
    }

    fn raw(result: &RankResult, direction: Direction) -> Self {
        let (entity, rank) = Self::side(result, direction);
        Self {
            relation: result.query.relation,
            entity,
            label: rank + 1,
        }
    }

    fn side(result: &RankResult, direction: Direction) -> (u64, u64) {
        match direction {
            Direction::Pos => (result.query.tail, result.rank_head),
            Direction::Spo => (result.query.head, result.rank_tail),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Split<T> {
    pub train: Vec<T>,
    pub valid: Vec<T>,
}

impl<T: Clone> Split<T> {
    /// Rows at the (sorted) `valid` indices go to validation, the rest to training.
    pub fn by_indices(rows: &[T], valid: &[usize]) -> Self {
        let mut split = Split {
            train: Vec::with_capacity(rows.len() - valid.len().min(rows.len())),
            valid: Vec::with_capacity(valid.len()),
        };
        let mut held_out = valid.iter().peekable();
        for (i, row) in rows.iter().enumerate() {
            if held_out.next_if(|&&v| v == i).is_some() {
                split.valid.push(row.clone());
            } else {
                split.train.push(row.clone());
            }
        }
        split
    }
}

/// `floor(n * fraction)` distinct indices in `0..n`, sorted, drawn without replacement.
pub fn choose_validation<G: RngCore + ?Sized>(
    n: usize,
    fraction: f64,
    rng: &mut G,
) -> Result<Vec<usize>> {
    if !(0.0..1.0).contains(&fraction) {
        return Err(RankError::InvalidFraction(fraction));
    }
    let k = (n as f64 * fraction).floor() as usize;
    let mut picked = index::sample(rng, n, k).into_vec();
    picked.sort_unstable();
    Ok(picked)
}

/// Train/validation views of one rank log, split on the same indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankDataset {
    pub pos: Split<Sample>,
    pub spo: Split<Sample>,
    pub raw_pos: Split<Sample>,
    pub raw_spo: Split<Sample>,
}

impl RankDataset {
    pub fn build<G: RngCore>(
        results: &[RankResult],
        buckets: &RankBuckets,
        validation_fraction: f64,
        rng: &mut G,
    ) -> Result<Self> {
        let valid = choose_validation(results.len(), validation_fraction, rng)?;
        let split = |samples: Vec<Sample>| Split::by_indices(&samples, &valid);
        let classed = |direction| {
            split(
                results
                    .iter()
                    .map(|r| Sample::classed(r, direction, buckets))
                    .collect(),
            )
        };
        let raw = |direction| split(results.iter().map(|r| Sample::raw(r, direction)).collect());
        let dataset = Self {
            pos: classed(Direction::Pos),
            spo: classed(Direction::Spo),
            raw_pos: raw(Direction::Pos),
            raw_spo: raw(Direction::Spo),
        };
        debug!(
            train = dataset.pos.train.len(),
            valid = dataset.pos.valid.len(),
            "built rank dataset"
        );
        Ok(dataset)
    }

    pub fn classed(&self, direction: Direction) -> &Split<Sample> {
        match direction {
            Direction::Pos => &self.pos,
            Direction::Spo => &self.spo,
        }
    }

    pub fn raw(&self, direction: Direction) -> &Split<Sample> {
        match direction {
            Direction::Pos => &self.raw_pos,
            Direction::Spo => &self.raw_spo,
        }
    }
}

/// Label counts over classed samples. Labels past the last class are ignored.
pub fn class_histogram(samples: &[Sample]) -> [usize; NUM_CLASSES] {
    let mut classes = [0usize; NUM_CLASSES];
    for sample in samples {
        if let Some(slot) = classes.get_mut(sample.label as usize) {
            *slot += 1;
        }
    }
    classes
}

/// Dense inputs for an external classifier: relation embedding then entity embedding.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureSet {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<u64>,
}

impl FeatureSet {
    pub fn from_samples(
        samples: &[Sample],
        relations: &EmbeddingTable,
        entities: &EmbeddingTable,
    ) -> Result<Self> {
        let mut set = FeatureSet {
            features: Vec::with_capacity(samples.len()),
            labels: Vec::with_capacity(samples.len()),
        };
        for sample in samples {
            let rel = lookup(relations, "relation", sample.relation)?;
            let ent = lookup(entities, "entity", sample.entity)?;
            let mut row = Vec::with_capacity(rel.len() + ent.len());
            row.extend_from_slice(rel);
            row.extend_from_slice(ent);
            set.features.push(row);
            set.labels.push(sample.label);
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn lookup<'a>(table: &'a EmbeddingTable, name: &'static str, id: u64) -> Result<&'a [f64]> {
    usize::try_from(id)
        .ok()
        .and_then(|i| table.row(i))
        .ok_or(RankError::UnknownId { table: name, id })
}
