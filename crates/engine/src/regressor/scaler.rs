//! Feature standardization backed by smartcore

use super::to_matrix;
use crate::error::{Result, SurgeError};
use crate::models::{FeatureRow, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use smartcore::api::{Transformer, UnsupervisedEstimator};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::preprocessing::numerical::{
    StandardScaler as SmartcoreScaler, StandardScalerParameters,
};
use std::fmt;

/// Zero-mean, unit-variance scaler fit on the training split
#[derive(Serialize, Deserialize)]
pub struct StandardScaler {
    inner: SmartcoreScaler<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[FeatureRow]) -> Result<Self> {
        if rows.is_empty() {
            return Err(SurgeError::Training("cannot fit scaler on zero rows".into()));
        }
        let inner: SmartcoreScaler<f64> =
            UnsupervisedEstimator::fit(&to_matrix(rows), StandardScalerParameters::default())
                .map_err(|e| SurgeError::Training(format!("scaler: {}", e)))?;
        Ok(Self { inner })
    }

    pub fn transform(&self, row: &FeatureRow) -> Result<FeatureRow> {
        let mut scaled = self.transform_all(std::slice::from_ref(row))?;
        scaled
            .pop()
            .ok_or_else(|| SurgeError::Inference("scaler returned no rows".into()))
    }

    pub fn transform_all(&self, rows: &[FeatureRow]) -> Result<Vec<FeatureRow>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let scaled: DenseMatrix<f64> = self
            .inner
            .transform(&to_matrix(rows))
            .map_err(|e| SurgeError::Inference(format!("scaler: {}", e)))?;

        Ok((0..rows.len())
            .map(|i| {
                let mut row = [0.0; FEATURE_COUNT];
                for (j, value) in row.iter_mut().enumerate() {
                    *value = *scaled.get((i, j));
                }
                row
            })
            .collect())
    }
}

impl fmt::Debug for StandardScaler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardScaler").finish_non_exhaustive()
    }
}
