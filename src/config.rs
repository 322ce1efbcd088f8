use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::loader::{
    DEFAULT_BATCH_SIZE, DEFAULT_DATA_DIR, DEFAULT_EVAL_BATCH_SIZE, DEFAULT_NEGATIVE_RATIO,
};
use crate::errors::DatasetError;

/// How evaluation candidates are enumerated for each entity slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateMode {
    /// Every substitution `1..n-1` is kept.
    Raw,
    /// Substitutions that are already known facts are dropped.
    #[default]
    Filtered,
}

impl CandidateMode {
    /// Short name used on the command line and in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            CandidateMode::Raw => "raw",
            CandidateMode::Filtered => "fil",
        }
    }
}

impl fmt::Display for CandidateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandidateMode {
    type Err = DatasetError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "raw" => Ok(CandidateMode::Raw),
            "fil" | "filtered" => Ok(CandidateMode::Filtered),
            other => Err(DatasetError::Configuration(format!(
                "unknown candidate mode '{other}' (expected 'raw' or 'fil')"
            ))),
        }
    }
}

/// Settings the surrounding training program supplies to the data pipeline.
#[derive(Clone, Debug)]
pub struct LoaderConfig {
    /// Directory holding `train.txt`, `valid.txt`, and `test.txt`.
    pub data_dir: PathBuf,
    /// Training facts per batch (each expands to `1 + r * arity` rows).
    pub batch_size: usize,
    /// Evaluation facts per batch (each expands to one candidate group per slot).
    pub eval_batch_size: usize,
    /// Corrupted rows generated per entity slot of a training fact.
    pub negative_ratio: usize,
    /// Parallel data-loading workers; `0` builds examples on the calling thread.
    pub workers: usize,
    /// Global seed for corruption draws and shuffling.
    ///
    /// `None` draws fresh OS entropy per example, so batches are not reproducible.
    pub seed: Option<u64>,
    /// Shuffle training examples each epoch.
    pub shuffle: bool,
    /// Candidate enumeration used for the validation and test loaders.
    pub eval_mode: CandidateMode,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            batch_size: DEFAULT_BATCH_SIZE,
            eval_batch_size: DEFAULT_EVAL_BATCH_SIZE,
            negative_ratio: DEFAULT_NEGATIVE_RATIO,
            workers: 0,
            seed: None,
            shuffle: false,
            eval_mode: CandidateMode::default(),
        }
    }
}

impl LoaderConfig {
    /// Reject settings that cannot produce batches.
    pub fn validate(&self) -> Result<(), DatasetError> {
        if self.batch_size == 0 {
            return Err(DatasetError::Configuration(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        if self.eval_batch_size == 0 {
            return Err(DatasetError::Configuration(
                "eval_batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = LoaderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.eval_mode, CandidateMode::Filtered);
    }

    #[test]
    fn zero_batch_sizes_are_rejected() {
        let config = LoaderConfig {
            batch_size: 0,
            ..LoaderConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DatasetError::Configuration(msg)) if msg.contains("batch_size")
        ));

        let config = LoaderConfig {
            eval_batch_size: 0,
            ..LoaderConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DatasetError::Configuration(msg)) if msg.contains("eval_batch_size")
        ));
    }

    #[test]
    fn candidate_modes_parse_from_short_names() {
        assert_eq!("raw".parse::<CandidateMode>().unwrap(), CandidateMode::Raw);
        assert_eq!(
            "fil".parse::<CandidateMode>().unwrap(),
            CandidateMode::Filtered
        );
        assert!("rank".parse::<CandidateMode>().is_err());
        assert_eq!(CandidateMode::Filtered.to_string(), "fil");
    }
}
