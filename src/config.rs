//! TOML configuration for the dump loaders, rank processing and exports.
//!
//! ```toml
//! [inputs]
//! subgraphs = "avgsubgraphs.bin"
//! rank_log = "fb15k-ranks.log"
//!
//! [rank]
//! validation_fraction = 0.1
//!
//! [rank.buckets]
//! thresholds = [3, 5, 10]
//!
//! [export]
//! out_dir = "out"
//! ```

use crate::ranks::RankBuckets;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Input files. Anything left out is simply not loaded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    pub subgraphs: Option<PathBuf>,
    pub entity_meta: Option<PathBuf>,
    pub entity_rows: Option<PathBuf>,
    pub relation_meta: Option<PathBuf>,
    pub relation_rows: Option<PathBuf>,
    pub rank_log: Option<PathBuf>,
    pub triple_batch: Option<PathBuf>,
    /// Directory holding `batch-<epoch>-<shard>` files.
    pub debug_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    /// Share of rank-log rows held out for validation, in `[0, 1)`.
    pub validation_fraction: f64,
    pub buckets: RankBuckets,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            validation_fraction: 0.10,
            buckets: RankBuckets::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub out_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("out"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KgDumpConfig {
    pub inputs: InputPaths,
    pub rank: RankConfig,
    pub export: ExportConfig,
}

impl KgDumpConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::from_toml_str(&fs::read_to_string(path.as_ref())?)?;
        info!("loaded configuration");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let fraction = self.rank.validation_fraction;
        if !(0.0..1.0).contains(&fraction) {
            return Err(ConfigError::Invalid(format!(
                "rank.validation_fraction must be within [0, 1), got {}",
                fraction
            )));
        }

        let thresholds = &self.rank.buckets.thresholds;
        if thresholds[0] == 0 || thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::Invalid(format!(
                "rank.buckets.thresholds must be positive and strictly increasing, got {:?}",
                thresholds
            )));
        }

        if self.export.out_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("export.out_dir is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_are_valid() {
        let config = KgDumpConfig::default();
        config.validate().unwrap();
        assert_eq!(config.rank.validation_fraction, 0.10);
        assert_eq!(config.rank.buckets.thresholds, [3, 5, 10]);
        assert_eq!(config.export.out_dir, PathBuf::from("out"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = KgDumpConfig::from_toml_str(
            r#"
            [inputs]
            rank_log = "fb15k-ranks.log"

            [rank.buckets]
            thresholds = [2, 4, 8]
            "#,
        )
        .unwrap();
        assert_eq!(config.inputs.rank_log, Some(PathBuf::from("fb15k-ranks.log")));
        assert_eq!(config.inputs.subgraphs, None);
        assert_eq!(config.rank.buckets.thresholds, [2, 4, 8]);
        assert_eq!(config.rank.validation_fraction, 0.10);
    }

    #[test]
    fn rejects_bad_values() {
        let err = KgDumpConfig::from_toml_str("[rank]\nvalidation_fraction = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = KgDumpConfig::from_toml_str("[rank.buckets]\nthresholds = [5, 5, 10]\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = KgDumpConfig::from_toml_str("[rank]\nvalidation_fraction = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kgdump.toml");

        let mut config = KgDumpConfig::default();
        config.inputs.debug_dir = Some(PathBuf::from("debug"));
        config.rank.validation_fraction = 0.25;
        fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        assert_eq!(KgDumpConfig::load(&path).unwrap(), config);
    }
}
