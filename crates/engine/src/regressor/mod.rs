//! Surge regression model
//!
//! A [`TrainedModel`] pairs a fitted [`Regressor`] with the
//! [`StandardScaler`] fit in the same training run. The pair shares a single
//! `model_version` digest so it can only be persisted and restored as a unit.

mod forest;
mod importance;
mod scaler;

pub use forest::{ForestParams, RandomForestRegressor};
pub use importance::permutation_importances;
pub use scaler::StandardScaler;

use crate::error::{PersistenceError, Result, SurgeError};
use crate::models::{FeatureRow, FeatureVector, TrainingRow, FEATURE_NAMES};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::metrics::{mean_absolute_error, r2};
use std::cmp::Ordering;
use std::fmt;
use tracing::{debug, info};

/// Fewest rows accepted for training
pub const MIN_TRAINING_ROWS: usize = 10;

/// Length of the hex digest used as the model version
const VERSION_LEN: usize = 12;

/// Trait for regression implementations
pub trait Regressor: Serialize + DeserializeOwned + Send + Sync {
    /// Fit on scaled feature rows against targets
    fn fit(&mut self, x: &[FeatureRow], y: &[f64]) -> Result<()>;

    /// Predict a batch of scaled rows; fails before `fit`
    fn predict(&self, x: &[FeatureRow]) -> Result<Vec<f64>>;

    /// Human-readable description of the model
    fn describe(&self) -> String;
}

pub(crate) fn to_matrix(rows: &[FeatureRow]) -> DenseMatrix<f64> {
    let values: Vec<Vec<f64>> = rows.iter().map(|row| row.to_vec()).collect();
    DenseMatrix::from_2d_vec(&values)
}

/// Held-out split configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub split_seed: u64,
    pub test_fraction: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            split_seed: 42,
            test_fraction: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Evaluation of a training run on the held-out split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub regressor: String,
    pub mae: f64,
    pub r2: f64,
    pub train_size: usize,
    pub test_size: usize,
    /// Sorted by descending importance
    pub feature_importances: Vec<FeatureImportance>,
}

impl TrainingReport {
    pub fn top_features(&self, n: usize) -> &[FeatureImportance] {
        &self.feature_importances[..n.min(self.feature_importances.len())]
    }
}

/// Fitted regressor and scaler from one training run
pub struct TrainedModel<R = RandomForestRegressor> {
    regressor: R,
    scaler: StandardScaler,
    model_version: String,
    trained_at: DateTime<Utc>,
    report: TrainingReport,
}

impl<R: Regressor> TrainedModel<R> {
    /// Split, scale, fit and evaluate.
    pub fn fit(rows: &[TrainingRow], mut regressor: R, config: &TrainingConfig) -> Result<Self> {
        validate(rows, config)?;

        let mut indices: Vec<usize> = (0..rows.len()).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(config.split_seed));

        let n_test = ((rows.len() as f64) * config.test_fraction).ceil() as usize;
        let n_train = rows.len() - n_test;
        if n_test == 0 || n_train == 0 {
            return Err(SurgeError::Training(format!(
                "test fraction {} leaves an empty split for {} rows",
                config.test_fraction,
                rows.len()
            )));
        }
        let (test_idx, train_idx) = indices.split_at(n_test);

        let gather = |idx: &[usize]| -> (Vec<FeatureRow>, Vec<f64>) {
            idx.iter()
                .map(|&i| (rows[i].features.to_row(), rows[i].surge_percentage))
                .unzip()
        };
        let (x_train, y_train) = gather(train_idx);
        let (x_test, y_test) = gather(test_idx);

        let scaler = StandardScaler::fit(&x_train)?;
        let x_train = scaler.transform_all(&x_train)?;
        let x_test = scaler.transform_all(&x_test)?;

        debug!(
            train_size = n_train,
            test_size = n_test,
            regressor = %regressor.describe(),
            "Fitting regressor"
        );
        regressor.fit(&x_train, &y_train)?;

        let y_pred = regressor.predict(&x_test)?;
        let importances =
            permutation_importances(&regressor, &x_test, &y_test, config.split_seed)?;

        let report = TrainingReport {
            regressor: regressor.describe(),
            mae: mean_absolute_error(&y_test, &y_pred),
            r2: finite_or_zero(r2(&y_test, &y_pred)),
            train_size: n_train,
            test_size: n_test,
            feature_importances: rank_importances(importances),
        };

        info!(
            mae = report.mae,
            r2 = report.r2,
            train_size = n_train,
            test_size = n_test,
            "Regressor trained"
        );

        Self::from_parts(regressor, scaler, Utc::now(), report)
    }

    /// Reassemble a model from persisted parts, recomputing its version
    pub fn from_parts(
        regressor: R,
        scaler: StandardScaler,
        trained_at: DateTime<Utc>,
        report: TrainingReport,
    ) -> Result<Self> {
        let model_version = compute_version(&regressor, &scaler)?;
        Ok(Self {
            regressor,
            scaler,
            model_version,
            trained_at,
            report,
        })
    }

    /// Scale with the fitted scaler, then predict
    pub fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let scaled = self.scaler.transform(&features.to_row())?;
        self.regressor
            .predict(&[scaled])?
            .pop()
            .ok_or_else(|| SurgeError::Inference("regressor returned no prediction".into()))
    }

    pub fn regressor(&self) -> &R {
        &self.regressor
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn report(&self) -> &TrainingReport {
        &self.report
    }
}

impl<R: Regressor> fmt::Debug for TrainedModel<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainedModel")
            .field("regressor", &self.report.regressor)
            .field("model_version", &self.model_version)
            .field("trained_at", &self.trained_at)
            .finish_non_exhaustive()
    }
}

/// R² is undefined for constant targets; report 0 there
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn validate(rows: &[TrainingRow], config: &TrainingConfig) -> Result<()> {
    if rows.len() < MIN_TRAINING_ROWS {
        return Err(SurgeError::Training(format!(
            "need at least {} rows, got {}",
            MIN_TRAINING_ROWS,
            rows.len()
        )));
    }
    if !(config.test_fraction > 0.0 && config.test_fraction < 1.0) {
        return Err(SurgeError::Training(format!(
            "test fraction must be in (0, 1), got {}",
            config.test_fraction
        )));
    }
    if let Some(pos) = rows
        .iter()
        .position(|r| !r.features.is_finite() || !r.surge_percentage.is_finite())
    {
        return Err(SurgeError::Training(format!(
            "row {} contains non-finite values",
            pos
        )));
    }
    Ok(())
}

fn rank_importances(importances: Vec<f64>) -> Vec<FeatureImportance> {
    let mut ranked: Vec<FeatureImportance> = FEATURE_NAMES
        .iter()
        .zip(importances)
        .map(|(name, importance)| FeatureImportance {
            feature: (*name).to_string(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(Ordering::Equal)
    });
    ranked
}

/// Short SHA-256 digest over both encoded artifacts
pub fn compute_version<R: Serialize>(regressor: &R, scaler: &StandardScaler) -> Result<String> {
    let regressor_bytes = bincode::serialize(regressor).map_err(|source| {
        PersistenceError::Codec {
            artifact: "regressor",
            source,
        }
    })?;
    let scaler_bytes = bincode::serialize(scaler).map_err(|source| PersistenceError::Codec {
        artifact: "scaler",
        source,
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&regressor_bytes);
    hasher.update(&scaler_bytes);
    let digest = hex::encode(hasher.finalize());
    Ok(digest[..VERSION_LEN].to_string())
}
