//! Prediction logs: producing them from a classifier, sorting them by
//! relation, and merging the POS and SPO views into a dynamic-K log.

use crate::formats::EmbeddingTable;
use crate::ranks::dataset::{FeatureSet, Sample, Split};
use crate::ranks::errors::{RankError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{info, instrument};

/// Something that learns from labelled features and predicts classes for others.
pub trait Classifier {
    fn train_and_predict(&mut self, train: &FeatureSet, predict: &FeatureSet) -> Result<Vec<u64>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prediction {
    pub relation: u64,
    pub entity: u64,
    pub class: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PredictionRun {
    pub predictions: Vec<Prediction>,
    /// Predictions equal to the validation label.
    pub correct: usize,
}

impl PredictionRun {
    pub fn accuracy(&self) -> f64 {
        if self.predictions.is_empty() {
            return 0.0;
        }
        self.correct as f64 / self.predictions.len() as f64
    }
}

/// Train on `split.train` and predict a class for every `split.valid` sample.
pub fn predict_validation<C: Classifier + ?Sized>(
    classifier: &mut C,
    split: &Split<Sample>,
    relations: &EmbeddingTable,
    entities: &EmbeddingTable,
) -> Result<PredictionRun> {
    let train = FeatureSet::from_samples(&split.train, relations, entities)?;
    let valid = FeatureSet::from_samples(&split.valid, relations, entities)?;
    let classes = classifier.train_and_predict(&train, &valid)?;
    if classes.len() != split.valid.len() {
        return Err(RankError::PredictionCount {
            expected: split.valid.len(),
            found: classes.len(),
        });
    }

    let mut run = PredictionRun::default();
    for (sample, class) in split.valid.iter().zip(classes) {
        if sample.label == class {
            run.correct += 1;
        }
        run.predictions.push(Prediction {
            relation: sample.relation,
            entity: sample.entity,
            class,
        });
    }
    info!(
        predictions = run.predictions.len(),
        correct = run.correct,
        "validation predictions"
    );
    Ok(run)
}

/// Lines of `<relation> <entity> <class>`.
pub fn write_predictions<W: Write>(mut sink: W, predictions: &[Prediction]) -> Result<()> {
    for p in predictions {
        writeln!(sink, "{} {} {}", p.relation, p.entity, p.class)?;
    }
    sink.flush()?;
    Ok(())
}

fn first_token(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or("")
}

/// Stable sort on the first token, compared as a string ("10" sorts before "9").
pub fn sort_prediction_lines(lines: &mut [String]) {
    lines.sort_by(|a, b| first_token(a).cmp(first_token(b)));
}

/// Sort a prediction log file into `output`; returns the number of lines.
#[instrument(skip_all, fields(input = %input.as_ref().display()))]
pub fn sort_prediction_log(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<usize> {
    let mut lines = BufReader::new(File::open(input.as_ref())?)
        .lines()
        .collect::<std::io::Result<Vec<_>>>()?;
    sort_prediction_lines(&mut lines);

    let mut sink = BufWriter::new(File::create(output.as_ref())?);
    for line in &lines {
        writeln!(sink, "{}", line)?;
    }
    sink.flush()?;
    info!(lines = lines.len(), "sorted prediction log");
    Ok(lines.len())
}

fn parse_prediction(text: &str, line: usize) -> Result<[&str; 3]> {
    let mut tokens = text.split_whitespace();
    let mut next = |name: &str| {
        tokens.next().ok_or_else(|| RankError::Malformed {
            line,
            reason: format!("prediction {:?} has no {}", text, name),
        })
    };
    Ok([next("relation")?, next("entity")?, next("class")?])
}

/// Pair sorted POS and SPO prediction logs line by line into
/// `<spo entity> <relation> <pos entity> <pos class> <spo class>`.
///
/// Stops at the end of the shorter log; both lines of a pair must name the
/// same relation.
pub fn merge_dynamic_k<P: BufRead, S: BufRead, W: Write>(
    pos: P,
    spo: S,
    mut sink: W,
) -> Result<usize> {
    let mut merged = 0;
    for (i, (pos_line, spo_line)) in pos.lines().zip(spo.lines()).enumerate() {
        let (pos_line, spo_line) = (pos_line?, spo_line?);
        let [rel_pos, ent_pos, k_pos] = parse_prediction(&pos_line, i + 1)?;
        let [rel_spo, ent_spo, k_spo] = parse_prediction(&spo_line, i + 1)?;
        if rel_pos != rel_spo {
            return Err(RankError::RelationMismatch {
                line: i + 1,
                pos: rel_pos.to_string(),
                spo: rel_spo.to_string(),
            });
        }
        writeln!(sink, "{} {} {} {} {}", ent_spo, rel_spo, ent_pos, k_pos, k_spo)?;
        merged += 1;
    }
    sink.flush()?;
    Ok(merged)
}
