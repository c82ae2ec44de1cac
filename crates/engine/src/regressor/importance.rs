//! Permutation feature importance
//!
//! Each feature column of the held-out rows is shuffled in turn and the rise
//! in mean squared error is recorded. Rises are floored at zero and
//! normalized to sum to one.

use super::Regressor;
use crate::error::Result;
use crate::models::{FeatureRow, FEATURE_COUNT};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

fn mse(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let total: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    total / y_true.len().max(1) as f64
}

/// Importance per feature, in feature order
pub fn permutation_importances<R: Regressor>(
    regressor: &R,
    x: &[FeatureRow],
    y: &[f64],
    seed: u64,
) -> Result<Vec<f64>> {
    let baseline = mse(y, &regressor.predict(x)?);

    let mut rises = (0..FEATURE_COUNT)
        .into_par_iter()
        .map(|feature| -> Result<f64> {
            let mut column: Vec<f64> = x.iter().map(|row| row[feature]).collect();
            column.shuffle(&mut StdRng::seed_from_u64(seed.wrapping_add(feature as u64)));

            let permuted: Vec<FeatureRow> = x
                .iter()
                .zip(column)
                .map(|(row, value)| {
                    let mut row = *row;
                    row[feature] = value;
                    row
                })
                .collect();

            let score = mse(y, &regressor.predict(&permuted)?);
            Ok((score - baseline).max(0.0))
        })
        .collect::<Result<Vec<f64>>>()?;

    let total: f64 = rises.iter().sum();
    if total > 0.0 {
        for rise in &mut rises {
            *rise /= total;
        }
    }
    Ok(rises)
}
