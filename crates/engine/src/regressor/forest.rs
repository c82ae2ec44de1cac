//! Random forest surge regressor
//!
//! Wraps smartcore's bagged CART forest. Every split considers all features,
//! so the forest behaves like a plain bootstrap ensemble of regression trees.

use super::{to_matrix, Regressor};
use crate::error::{Result, SurgeError};
use crate::models::FeatureRow;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor as SmartcoreForest, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fmt;

type Forest = SmartcoreForest<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub random_state: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: Some(10),
            min_samples_split: 5,
            min_samples_leaf: 2,
            random_state: 42,
        }
    }
}

impl ForestParams {
    fn to_parameters(&self, n_features: usize) -> RandomForestRegressorParameters {
        let parameters = RandomForestRegressorParameters::default()
            .with_n_trees(self.n_estimators)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_m(n_features)
            .with_seed(self.random_state);

        match self.max_depth {
            Some(depth) => parameters.with_max_depth(depth.min(u16::MAX as usize) as u16),
            None => parameters,
        }
    }
}

/// Bootstrap-aggregated regression trees
#[derive(Serialize, Deserialize)]
pub struct RandomForestRegressor {
    params: ForestParams,
    forest: Option<Forest>,
}

impl RandomForestRegressor {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            forest: None,
        }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn is_fitted(&self) -> bool {
        self.forest.is_some()
    }
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self::new(ForestParams::default())
    }
}

impl fmt::Debug for RandomForestRegressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomForestRegressor")
            .field("params", &self.params)
            .field("fitted", &self.is_fitted())
            .finish()
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, x: &[FeatureRow], y: &[f64]) -> Result<()> {
        if x.len() != y.len() {
            return Err(SurgeError::Training(format!(
                "feature rows ({}) and targets ({}) differ in length",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(SurgeError::Training("cannot fit with zero samples".into()));
        }
        if self.params.n_estimators == 0 {
            return Err(SurgeError::Training("n_estimators must be positive".into()));
        }

        let parameters = self.params.to_parameters(x[0].len());
        let forest = Forest::fit(&to_matrix(x), &y.to_vec(), parameters)
            .map_err(|e| SurgeError::Training(e.to_string()))?;
        self.forest = Some(forest);
        Ok(())
    }

    fn predict(&self, x: &[FeatureRow]) -> Result<Vec<f64>> {
        let forest = self.forest.as_ref().ok_or(SurgeError::UntrainedModel)?;
        if x.is_empty() {
            return Ok(Vec::new());
        }
        forest
            .predict(&to_matrix(x))
            .map_err(|e| SurgeError::Inference(e.to_string()))
    }

    fn describe(&self) -> String {
        format!(
            "Random Forest ({} estimators, max depth {})",
            self.params.n_estimators,
            self.params
                .max_depth
                .map_or_else(|| "unbounded".to_string(), |d| d.to_string())
        )
    }
}
