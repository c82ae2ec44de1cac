//! Engine configuration

use crate::regressor::{ForestParams, TrainingConfig};
use crate::synthetic::{GeneratorConfig, DEFAULT_SAMPLES, DEFAULT_SEED};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Training and persistence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding the persisted model
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Rows in the synthetic training table
    #[serde(default = "default_training_samples")]
    pub training_samples: usize,

    /// Seed for synthetic data generation
    #[serde(default = "default_seed")]
    pub data_seed: u64,

    /// Seed for the train/test shuffle
    #[serde(default = "default_seed")]
    pub split_seed: u64,

    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,

    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,

    /// `None` grows trees until the leaf constraints stop them
    #[serde(default = "default_max_depth")]
    pub max_depth: Option<usize>,

    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,

    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,

    /// Base seed for per-tree bootstrap samples
    #[serde(default = "default_seed")]
    pub forest_seed: u64,
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_training_samples() -> usize {
    DEFAULT_SAMPLES
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_n_estimators() -> usize {
    100
}

fn default_max_depth() -> Option<usize> {
    Some(10)
}

fn default_min_samples_split() -> usize {
    5
}

fn default_min_samples_leaf() -> usize {
    2
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            training_samples: default_training_samples(),
            data_seed: default_seed(),
            split_seed: default_seed(),
            test_fraction: default_test_fraction(),
            n_estimators: default_n_estimators(),
            max_depth: default_max_depth(),
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            forest_seed: default_seed(),
        }
    }
}

impl EngineConfig {
    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = dir.into();
        self
    }

    pub fn generator(&self) -> GeneratorConfig {
        GeneratorConfig {
            seed: self.data_seed,
        }
    }

    pub fn training(&self) -> TrainingConfig {
        TrainingConfig {
            split_seed: self.split_seed,
            test_fraction: self.test_fraction,
        }
    }

    pub fn forest(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            random_state: self.forest_seed,
        }
    }
}
