use super::*;
use crate::formats::EmbeddingTable;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use tempfile::tempdir;

const LOG: &str = "query\trank_head\trank_tail\n\
                   1 7 2\t0\t4\n\
                   3 7 4\t2\t11\n\
                   \n\
                   5 8 6\t9\t0\n\
                   2 8 1\t3\t1\n";

fn results() -> Vec<RankResult> {
    parse_rank_log(LOG.as_bytes()).unwrap()
}

fn raw(relation: u64, label: u64) -> Sample {
    Sample {
        relation,
        entity: 0,
        label,
    }
}

/// Predicts the true label everywhere except the first sample.
struct OffByOne;

impl Classifier for OffByOne {
    fn train_and_predict(&mut self, train: &FeatureSet, predict: &FeatureSet) -> Result<Vec<u64>> {
        assert!(!train.is_empty());
        let mut out = predict.labels.clone();
        if let Some(first) = out.first_mut() {
            *first += 1;
        }
        Ok(out)
    }
}

struct Silent;

impl Classifier for Silent {
    fn train_and_predict(&mut self, _: &FeatureSet, _: &FeatureSet) -> Result<Vec<u64>> {
        Ok(Vec::new())
    }
}

/// An engine that cannot train on fewer than `min_train` samples.
struct NeedsData {
    min_train: usize,
}

impl Classifier for NeedsData {
    fn train_and_predict(&mut self, train: &FeatureSet, predict: &FeatureSet) -> Result<Vec<u64>> {
        if train.len() < self.min_train {
            return Err(RankError::Classifier(format!(
                "{} training samples, need {}",
                train.len(),
                self.min_train
            )));
        }
        Ok(vec![0; predict.len()])
    }
}

#[test]
fn parses_rank_log_skipping_header_and_blank_lines() {
    let results = results();
    assert_eq!(results.len(), 4);
    assert_eq!(
        results[1],
        RankResult {
            query: Query {
                head: 3,
                relation: 7,
                tail: 4,
            },
            rank_head: 2,
            rank_tail: 11,
        }
    );
}

#[test]
fn malformed_rank_lines_report_their_line() {
    let err = parse_rank_log("header\n1 2 3\t1\t1\n1 2\t1\t1\n".as_bytes()).unwrap_err();
    assert!(matches!(err, RankError::Malformed { line: 3, .. }));

    let err = parse_rank_line("1 2 3\tx\t1", 9).unwrap_err();
    assert!(matches!(err, RankError::Malformed { line: 9, .. }));

    let err = parse_rank_line("1 2 3\t4", 2).unwrap_err();
    assert!(matches!(err, RankError::Malformed { line: 2, .. }));
}

#[test]
fn rank_log_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ranks.log");
    fs::write(&path, LOG).unwrap();
    assert_eq!(load_rank_log(&path).unwrap(), results());
}

#[test]
fn rank_buckets() {
    let buckets = RankBuckets::default();
    let classes: Vec<u8> = [0, 1, 2, 3, 4, 5, 9, 10, 1000]
        .iter()
        .map(|&r| buckets.class(r))
        .collect();
    assert_eq!(classes, vec![0, 1, 1, 2, 2, 3, 3, 4, 4]);
}

#[test]
fn validation_indices_are_sorted_and_distinct() {
    let mut rng = StdRng::seed_from_u64(7);
    let picked = choose_validation(100, 0.1, &mut rng).unwrap();
    assert_eq!(picked.len(), 10);
    assert!(picked.windows(2).all(|w| w[0] < w[1]));
    assert!(picked.iter().all(|&i| i < 100));

    assert!(choose_validation(9, 0.1, &mut rng).unwrap().is_empty());
    assert!(choose_validation(0, 0.5, &mut rng).unwrap().is_empty());
    assert!(matches!(
        choose_validation(10, 1.0, &mut rng),
        Err(RankError::InvalidFraction(_))
    ));
    assert!(matches!(
        choose_validation(10, -0.1, &mut rng),
        Err(RankError::InvalidFraction(_))
    ));
}

#[test]
fn validation_draw_is_reproducible_per_seed() {
    let draw = |seed| choose_validation(1000, 0.25, &mut StdRng::seed_from_u64(seed)).unwrap();
    assert_eq!(draw(3), draw(3));
    assert_ne!(draw(3), draw(4));

    let nearly_all = choose_validation(100, 0.99, &mut StdRng::seed_from_u64(9)).unwrap();
    assert_eq!(nearly_all.len(), 99);
    assert!(nearly_all.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn split_by_indices_keeps_order() {
    let split = Split::by_indices(&[10, 11, 12, 13, 14], &[1, 3]);
    assert_eq!(split.train, vec![10, 12, 14]);
    assert_eq!(split.valid, vec![11, 13]);
}

#[test]
fn dataset_views_share_the_split() {
    let mut rng = StdRng::seed_from_u64(42);
    let results = results();
    let dataset = RankDataset::build(&results, &RankBuckets::default(), 0.5, &mut rng).unwrap();

    assert_eq!(dataset.pos.valid.len(), 2);
    assert_eq!(dataset.pos.train.len(), 2);
    for direction in [Direction::Pos, Direction::Spo] {
        let classed = dataset.classed(direction);
        let raw = dataset.raw(direction);
        let keys = |s: &[Sample]| s.iter().map(|x| (x.relation, x.entity)).collect::<Vec<_>>();
        assert_eq!(keys(&classed.valid), keys(&raw.valid));
        assert_eq!(keys(&classed.train), keys(&raw.train));
    }
    let rels = |s: &[Sample]| s.iter().map(|x| x.relation).collect::<Vec<_>>();
    assert_eq!(rels(&dataset.pos.valid), rels(&dataset.spo.valid));
}

#[test]
fn samples_pick_the_right_side() {
    let mut rng = StdRng::seed_from_u64(1);
    let results = results();
    let dataset = RankDataset::build(&results, &RankBuckets::default(), 0.0, &mut rng).unwrap();
    assert!(dataset.pos.valid.is_empty());

    // 3 7 4, rank_head 2, rank_tail 11
    assert_eq!(
        dataset.pos.train[1],
        Sample {
            relation: 7,
            entity: 4,
            label: 1,
        }
    );
    assert_eq!(
        dataset.spo.train[1],
        Sample {
            relation: 7,
            entity: 3,
            label: 4,
        }
    );
    assert_eq!(dataset.raw_pos.train[1].label, 3);
    assert_eq!(dataset.raw_spo.train[1].label, 12);
    assert_eq!(dataset.raw_pos.train[0].label, 1);

    assert_eq!(class_histogram(&dataset.pos.train), [1, 1, 1, 1, 0]);
}

#[test]
fn relation_stats_round_half_to_even() {
    let table = RelationStatsTable::from_raw(&[raw(4, 2), raw(4, 3), raw(4, 0), raw(6, 0)]);
    assert_eq!(table.relations(), &[4, 6]);
    assert_eq!(
        *table.get(4).unwrap(),
        RelationStats {
            queries: 3,
            hits: 2,
            sum_k: 5,
        }
    );
    assert_eq!(table.average_k(4), Some(2));
    assert_eq!(table.average_k(6), Some(-1));
    assert_eq!(table.average_k(9), None);

    let table = RelationStatsTable::from_raw(&[raw(1, 3), raw(1, 4)]);
    assert_eq!(table.average_k(1), Some(4));
}

#[test]
fn relation_k_report_orders_pos_then_spo_only() {
    let pos = RelationStatsTable::from_raw(&[raw(5, 2), raw(3, 0)]);
    let spo = RelationStatsTable::from_raw(&[raw(9, 7), raw(5, 4)]);
    let rows = relation_k_report(&pos, &spo);

    let mut out = Vec::new();
    write_relation_k_report(&mut out, &rows).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "5 2 4\n3 -1 -1\n9 -1 7\n");
}

#[test]
fn prediction_lines_sort_as_strings_and_stably() {
    let mut lines: Vec<String> = ["9 1 0", "10 2 1", "9 0 3", "100 5 2"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    sort_prediction_lines(&mut lines);
    assert_eq!(lines, vec!["10 2 1", "100 5 2", "9 1 0", "9 0 3"]);
}

#[test]
fn prediction_log_sorted_on_disk() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("predictions.pos.log");
    let output = dir.path().join("sorted_pos.txt");

    let predictions = [
        Prediction {
            relation: 2,
            entity: 8,
            class: 1,
        },
        Prediction {
            relation: 11,
            entity: 3,
            class: 4,
        },
    ];
    write_predictions(fs::File::create(&input).unwrap(), &predictions).unwrap();

    assert_eq!(sort_prediction_log(&input, &output).unwrap(), 2);
    assert_eq!(fs::read_to_string(&output).unwrap(), "11 3 4\n2 8 1\n");
}

#[test]
fn dynamic_k_merge() {
    let pos = "1 10 2\n3 11 0\n";
    let spo = "1 20 4\n3 21 1\n4 22 2\n";
    let mut out = Vec::new();
    assert_eq!(merge_dynamic_k(pos.as_bytes(), spo.as_bytes(), &mut out).unwrap(), 2);
    assert_eq!(String::from_utf8(out).unwrap(), "20 1 10 2 4\n21 3 11 0 1\n");

    let err = merge_dynamic_k("1 10 2\n".as_bytes(), "2 20 4\n".as_bytes(), Vec::new()).unwrap_err();
    assert!(matches!(err, RankError::RelationMismatch { line: 1, .. }));
}

#[test]
fn validation_predictions_are_counted() {
    let relations = EmbeddingTable::from_rows(1, &[vec![0.0], vec![1.0]]).unwrap();
    let entities = EmbeddingTable::from_rows(1, &[vec![0.5, 0.5], vec![2.0, 3.0]]).unwrap();
    let split = Split {
        train: vec![Sample {
            relation: 0,
            entity: 0,
            label: 1,
        }],
        valid: vec![
            Sample {
                relation: 1,
                entity: 1,
                label: 2,
            },
            Sample {
                relation: 0,
                entity: 1,
                label: 4,
            },
        ],
    };

    let features = FeatureSet::from_samples(&split.valid, &relations, &entities).unwrap();
    assert_eq!(features.features[0], vec![1.0, 2.0, 3.0]);
    assert_eq!(features.labels, vec![2, 4]);

    let run = predict_validation(&mut OffByOne, &split, &relations, &entities).unwrap();
    assert_eq!(run.correct, 1);
    assert_eq!(run.predictions[0].class, 3);
    assert_eq!(run.accuracy(), 0.5);

    let err = predict_validation(&mut NeedsData { min_train: 5 }, &split, &relations, &entities)
        .unwrap_err();
    assert!(matches!(err, RankError::Classifier(ref msg) if msg.contains("need 5")));
    let run = predict_validation(&mut NeedsData { min_train: 1 }, &split, &relations, &entities)
        .unwrap();
    assert_eq!(run.correct, 0);

    let err = predict_validation(&mut Silent, &split, &relations, &entities).unwrap_err();
    assert!(matches!(
        err,
        RankError::PredictionCount {
            expected: 2,
            found: 0,
        }
    ));
}

#[test]
fn features_reject_unknown_ids() {
    let table = EmbeddingTable::from_rows(1, &[vec![0.0]]).unwrap();
    let err = FeatureSet::from_samples(
        &[Sample {
            relation: 0,
            entity: 3,
            label: 0,
        }],
        &table,
        &table,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RankError::UnknownId {
            table: "entity",
            id: 3,
        }
    ));
}
