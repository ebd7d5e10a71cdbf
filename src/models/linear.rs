//! L2-regularized logistic regression over standardized features.

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::ports::{check_fit_input, BinaryClassifier, TrainError};

use super::scaler::StandardScaler;

const MAX_EPOCHS: usize = 500;
const LEARNING_RATE: f64 = 0.5;
const REGULARIZATION_C: f64 = 1.0;
const GRADIENT_TOLERANCE: f64 = 1e-6;

/// Logistic regression, the `logistic_regression` roster variant.
///
/// Batch gradient descent from a zero start; fully deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegressionClassifier {
    scaler: StandardScaler,
    weights: Vec<f64>,
    intercept: f64,
}

impl LogisticRegressionClassifier {
    fn decision(&self, features: ArrayView1<'_, f64>) -> f64 {
        let scaled = self.scaler.transform_row(features);
        let dot: f64 = scaled
            .iter()
            .zip(&self.weights)
            .map(|(x, w)| x * w)
            .sum();
        dot + self.intercept
    }
}

impl BinaryClassifier for LogisticRegressionClassifier {
    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[u8]) -> Result<(), TrainError> {
        check_fit_input(features.nrows(), labels)?;
        let rows = features.nrows() as f64;
        let cols = features.ncols();

        self.scaler = StandardScaler::fit(features);
        let scaled = self.scaler.transform(features);

        let mut weights = Array1::<f64>::zeros(cols);
        let mut intercept = 0.0;
        let l2 = 1.0 / REGULARIZATION_C;

        for _ in 0..MAX_EPOCHS {
            let mut weight_gradient = Array1::<f64>::zeros(cols);
            let mut intercept_gradient = 0.0;
            for (row, &label) in scaled.rows().into_iter().zip(labels) {
                let z = row.dot(&weights) + intercept;
                let error = sigmoid(z) - f64::from(label);
                weight_gradient.scaled_add(error, &row);
                intercept_gradient += error;
            }
            weight_gradient.mapv_inplace(|g| g / rows);
            weight_gradient.scaled_add(l2 / rows, &weights);
            intercept_gradient /= rows;

            weights.scaled_add(-LEARNING_RATE, &weight_gradient);
            intercept -= LEARNING_RATE * intercept_gradient;

            let largest = weight_gradient
                .iter()
                .chain(std::iter::once(&intercept_gradient))
                .fold(0.0_f64, |acc, g| acc.max(g.abs()));
            if largest < GRADIENT_TOLERANCE {
                break;
            }
        }

        self.weights = weights.to_vec();
        self.intercept = intercept;
        Ok(())
    }

    fn predict(&self, features: ArrayView1<'_, f64>) -> u8 {
        u8::from(self.predict_probability(features) >= 0.5)
    }

    fn predict_probability(&self, features: ArrayView1<'_, f64>) -> f64 {
        sigmoid(self.decision(features))
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
