//! Feature standardization shared by the distance- and margin-based
//! families (logistic regression, RBF SVM, k-NN).

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Per-column standardization to zero mean and unit variance.
///
/// Fitted statistics are part of the artifact, so serving applies exactly
/// the transform the model was trained with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl StandardScaler {
    /// Fit column statistics. Constant columns keep a unit divisor so they
    /// pass through unchanged instead of producing NaN.
    #[must_use]
    pub fn fit(features: ArrayView2<'_, f64>) -> Self {
        let rows = features.nrows().max(1) as f64;
        let mean: Vec<f64> = features
            .mean_axis(Axis(0))
            .map_or_else(|| vec![0.0; features.ncols()], |m| m.to_vec());
        let std: Vec<f64> = (0..features.ncols())
            .map(|c| {
                let variance = features
                    .column(c)
                    .iter()
                    .map(|v| (v - mean[c]).powi(2))
                    .sum::<f64>()
                    / rows;
                let std = variance.sqrt();
                if std > 0.0 {
                    std
                } else {
                    1.0
                }
            })
            .collect();
        Self { mean, std }
    }

    /// Standardize one encoded feature vector.
    #[must_use]
    pub fn transform_row(&self, row: ArrayView1<'_, f64>) -> Array1<f64> {
        Array1::from_iter(
            row.iter()
                .zip(self.mean.iter().zip(&self.std))
                .map(|(v, (mean, std))| (v - mean) / std),
        )
    }

    /// Standardize a whole matrix.
    #[must_use]
    pub fn transform(&self, features: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut out = features.to_owned();
        for mut row in out.rows_mut() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = (*value - self.mean[c]) / self.std[c];
            }
        }
        out
    }
}
