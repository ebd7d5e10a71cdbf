//! RBF-kernel support vector machine with Platt-scaled probabilities.
//!
//! Trained with the simplified SMO procedure over standardized features.
//! Probability output comes from a sigmoid fitted on the training decision
//! values, so `predict_probability` is available like on every other family.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::ports::{check_fit_input, BinaryClassifier, TrainError};

use super::scaler::StandardScaler;

const PENALTY_C: f64 = 1.0;
const KKT_TOLERANCE: f64 = 1e-3;
const ALPHA_EPSILON: f64 = 1e-8;
const MAX_QUIET_PASSES: usize = 5;
const MAX_TOTAL_PASSES: usize = 200;
const PLATT_ITERATIONS: usize = 300;
const PLATT_LEARNING_RATE: f64 = 0.05;

/// RBF SVM, the `svc_rbf` roster variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SvcRbfClassifier {
    seed: u64,
    scaler: StandardScaler,
    gamma: f64,
    bias: f64,
    /// Support vectors in standardized space.
    support_vectors: Vec<Vec<f64>>,
    /// Per support vector: alpha_i * y_i with y in {-1, +1}.
    dual_coefficients: Vec<f64>,
    /// Platt sigmoid slope.
    platt_a: f64,
    /// Platt sigmoid offset.
    platt_b: f64,
}

impl SvcRbfClassifier {
    /// SVM with the given seed for SMO partner selection.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    fn decision_scaled(&self, scaled: &Array1<f64>) -> f64 {
        let mut sum = self.bias;
        for (vector, coefficient) in self.support_vectors.iter().zip(&self.dual_coefficients) {
            sum += coefficient * rbf(vector, scaled.as_slice().unwrap_or(&[]), self.gamma);
        }
        sum
    }

    /// Signed distance to the separating surface.
    #[must_use]
    pub fn decision(&self, features: ArrayView1<'_, f64>) -> f64 {
        let scaled = self.scaler.transform_row(features);
        self.decision_scaled(&scaled)
    }
}

impl BinaryClassifier for SvcRbfClassifier {
    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[u8]) -> Result<(), TrainError> {
        check_fit_input(features.nrows(), labels)?;
        let positives = labels.iter().filter(|&&l| l == 1).count();
        if positives == 0 || positives == labels.len() {
            return Err(TrainError::SingleClass);
        }

        self.scaler = StandardScaler::fit(features);
        let scaled = self.scaler.transform(features);
        let rows = scaled.nrows();

        // sklearn's gamma="scale": 1 / (n_features * Var(X)).
        let variance = matrix_variance(&scaled);
        self.gamma = 1.0 / (scaled.ncols() as f64 * variance.max(f64::EPSILON));

        let signs: Vec<f64> = labels
            .iter()
            .map(|&l| if l == 1 { 1.0 } else { -1.0 })
            .collect();
        let kernel = gram_matrix(&scaled, self.gamma);

        let (alphas, bias) = self.smo(&kernel, &signs, rows);
        self.bias = bias;
        self.support_vectors = Vec::new();
        self.dual_coefficients = Vec::new();
        for i in 0..rows {
            if alphas[i] > ALPHA_EPSILON {
                self.support_vectors.push(scaled.row(i).to_vec());
                self.dual_coefficients.push(alphas[i] * signs[i]);
            }
        }

        // Platt scaling on the training decision values.
        let decisions: Vec<f64> = (0..rows)
            .map(|i| {
                let mut sum = self.bias;
                for j in 0..rows {
                    if alphas[j] > ALPHA_EPSILON {
                        sum += alphas[j] * signs[j] * kernel[(j, i)];
                    }
                }
                sum
            })
            .collect();
        let (platt_a, platt_b) = fit_platt(&decisions, labels);
        self.platt_a = platt_a;
        self.platt_b = platt_b;
        Ok(())
    }

    fn predict(&self, features: ArrayView1<'_, f64>) -> u8 {
        u8::from(self.decision(features) >= 0.0)
    }

    fn predict_probability(&self, features: ArrayView1<'_, f64>) -> f64 {
        let decision = self.decision(features);
        1.0 / (1.0 + (self.platt_a * decision + self.platt_b).exp())
    }
}

impl SvcRbfClassifier {
    /// Simplified SMO: pick a KKT violator, pair it with a random partner,
    /// solve the two-variable subproblem analytically.
    fn smo(&self, kernel: &Array2<f64>, signs: &[f64], rows: usize) -> (Vec<f64>, f64) {
        let mut rng = ChaCha20Rng::seed_from_u64(self.seed);
        let mut alphas = vec![0.0_f64; rows];
        let mut bias = 0.0_f64;

        let decision = |alphas: &[f64], bias: f64, i: usize| -> f64 {
            let mut sum = bias;
            for j in 0..rows {
                if alphas[j] > 0.0 {
                    sum += alphas[j] * signs[j] * kernel[(j, i)];
                }
            }
            sum
        };

        let mut quiet_passes = 0;
        let mut total_passes = 0;
        while quiet_passes < MAX_QUIET_PASSES && total_passes < MAX_TOTAL_PASSES {
            let mut changed = 0;
            for i in 0..rows {
                let error_i = decision(&alphas, bias, i) - signs[i];
                let violates = (signs[i] * error_i < -KKT_TOLERANCE && alphas[i] < PENALTY_C)
                    || (signs[i] * error_i > KKT_TOLERANCE && alphas[i] > 0.0);
                if !violates {
                    continue;
                }

                let mut j = rng.gen_range(0..rows - 1);
                if j >= i {
                    j += 1;
                }
                let error_j = decision(&alphas, bias, j) - signs[j];

                let (alpha_i_old, alpha_j_old) = (alphas[i], alphas[j]);
                let (low, high) = if (signs[i] - signs[j]).abs() < f64::EPSILON {
                    (
                        (alpha_i_old + alpha_j_old - PENALTY_C).max(0.0),
                        (alpha_i_old + alpha_j_old).min(PENALTY_C),
                    )
                } else {
                    (
                        (alpha_j_old - alpha_i_old).max(0.0),
                        (PENALTY_C + alpha_j_old - alpha_i_old).min(PENALTY_C),
                    )
                };
                if (high - low).abs() < f64::EPSILON {
                    continue;
                }

                let eta = 2.0 * kernel[(i, j)] - kernel[(i, i)] - kernel[(j, j)];
                if eta >= 0.0 {
                    continue;
                }

                let mut alpha_j = alpha_j_old - signs[j] * (error_i - error_j) / eta;
                alpha_j = alpha_j.clamp(low, high);
                if (alpha_j - alpha_j_old).abs() < 1e-5 {
                    continue;
                }
                let alpha_i = alpha_i_old + signs[i] * signs[j] * (alpha_j_old - alpha_j);

                let b1 = bias
                    - error_i
                    - signs[i] * (alpha_i - alpha_i_old) * kernel[(i, i)]
                    - signs[j] * (alpha_j - alpha_j_old) * kernel[(i, j)];
                let b2 = bias
                    - error_j
                    - signs[i] * (alpha_i - alpha_i_old) * kernel[(i, j)]
                    - signs[j] * (alpha_j - alpha_j_old) * kernel[(j, j)];
                bias = if alpha_i > 0.0 && alpha_i < PENALTY_C {
                    b1
                } else if alpha_j > 0.0 && alpha_j < PENALTY_C {
                    b2
                } else {
                    (b1 + b2) / 2.0
                };

                alphas[i] = alpha_i;
                alphas[j] = alpha_j;
                changed += 1;
            }
            if changed == 0 {
                quiet_passes += 1;
            } else {
                quiet_passes = 0;
            }
            total_passes += 1;
        }
        (alphas, bias)
    }
}

fn rbf(a: &[f64], b: &[f64], gamma: f64) -> f64 {
    let squared: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    (-gamma * squared).exp()
}

fn gram_matrix(scaled: &Array2<f64>, gamma: f64) -> Array2<f64> {
    let rows = scaled.nrows();
    let mut kernel = Array2::zeros((rows, rows));
    for i in 0..rows {
        for j in i..rows {
            let value = rbf(
                scaled.row(i).to_slice().unwrap_or(&[]),
                scaled.row(j).to_slice().unwrap_or(&[]),
                gamma,
            );
            kernel[(i, j)] = value;
            kernel[(j, i)] = value;
        }
    }
    kernel
}

fn matrix_variance(scaled: &Array2<f64>) -> f64 {
    let count = (scaled.nrows() * scaled.ncols()) as f64;
    if count == 0.0 {
        return 0.0;
    }
    let mean: f64 = scaled.iter().sum::<f64>() / count;
    scaled.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / count
}

/// Fit Platt's sigmoid `1 / (1 + exp(a*f + b))` by gradient descent on the
/// regularized log-loss with Platt's soft targets.
fn fit_platt(decisions: &[f64], labels: &[u8]) -> (f64, f64) {
    let n_pos = labels.iter().filter(|&&l| l == 1).count() as f64;
    let n_neg = labels.len() as f64 - n_pos;
    let target_pos = (n_pos + 1.0) / (n_pos + 2.0);
    let target_neg = 1.0 / (n_neg + 2.0);

    let mut a = -1.0_f64;
    let mut b = 0.0_f64;
    for _ in 0..PLATT_ITERATIONS {
        let mut grad_a = 0.0;
        let mut grad_b = 0.0;
        for (&f, &label) in decisions.iter().zip(labels) {
            let target = if label == 1 { target_pos } else { target_neg };
            let p = 1.0 / (1.0 + (a * f + b).exp());
            let diff = p - target;
            // d p / d a = -p(1-p) f ; d p / d b = -p(1-p)
            grad_a += diff * -p * (1.0 - p) * f;
            grad_b += diff * -p * (1.0 - p);
        }
        a -= PLATT_LEARNING_RATE * grad_a / decisions.len() as f64;
        b -= PLATT_LEARNING_RATE * grad_b / decisions.len() as f64;
    }
    (a, b)
}
