pub mod dataset;
pub mod errors;
pub mod log;
pub mod predictions;
pub mod relstats;

pub use dataset::{
    choose_validation, class_histogram, Direction, FeatureSet, RankBuckets, RankDataset, Sample,
    Split, NUM_CLASSES,
};
pub use errors::{RankError, Result};
pub use log::{load_rank_log, parse_rank_line, parse_rank_log, Query, RankResult};
pub use predictions::{
    merge_dynamic_k, predict_validation, sort_prediction_lines, sort_prediction_log,
    write_predictions, Classifier, Prediction, PredictionRun,
};
pub use relstats::{
    relation_k_report, write_relation_k_report, RelationK, RelationStats, RelationStatsTable,
};

#[cfg(test)]
mod tests;
