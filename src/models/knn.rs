//! Distance-weighted k-nearest-neighbors over standardized features.

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::ports::{check_fit_input, BinaryClassifier, TrainError};

use super::scaler::StandardScaler;

const DEFAULT_NEIGHBORS: usize = 5;
const EXACT_MATCH_DISTANCE: f64 = 1e-12;

/// k-NN, the `knn` roster variant. "Fitting" memorizes the standardized
/// training set; all work happens at query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnClassifier {
    neighbors: usize,
    scaler: StandardScaler,
    points: Vec<Vec<f64>>,
    labels: Vec<u8>,
}

impl KnnClassifier {
    /// k-NN with the roster's neighbor count.
    #[must_use]
    pub fn new() -> Self {
        Self::with_neighbors(DEFAULT_NEIGHBORS)
    }

    /// k-NN with an explicit neighbor count.
    #[must_use]
    pub fn with_neighbors(neighbors: usize) -> Self {
        Self {
            neighbors,
            scaler: StandardScaler::default(),
            points: Vec::new(),
            labels: Vec::new(),
        }
    }
}

impl Default for KnnClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryClassifier for KnnClassifier {
    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[u8]) -> Result<(), TrainError> {
        check_fit_input(features.nrows(), labels)?;
        self.scaler = StandardScaler::fit(features);
        let scaled = self.scaler.transform(features);
        self.points = scaled.rows().into_iter().map(|r| r.to_vec()).collect();
        self.labels = labels.to_vec();
        Ok(())
    }

    fn predict(&self, features: ArrayView1<'_, f64>) -> u8 {
        u8::from(self.predict_probability(features) >= 0.5)
    }

    fn predict_probability(&self, features: ArrayView1<'_, f64>) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        let query = self.scaler.transform_row(features);
        let query = query.as_slice().unwrap_or(&[]);

        let mut distances: Vec<(f64, u8)> = self
            .points
            .iter()
            .zip(&self.labels)
            .map(|(point, &label)| (euclidean(point, query), label))
            .collect();
        distances
            .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        distances.truncate(self.neighbors.min(distances.len()));

        // An exact match dominates: its inverse-distance weight is unbounded.
        if let Some(&(_, label)) = distances
            .iter()
            .find(|(d, _)| *d < EXACT_MATCH_DISTANCE)
        {
            return f64::from(label);
        }

        let mut weight_sum = 0.0;
        let mut positive_weight = 0.0;
        for (distance, label) in distances {
            let weight = 1.0 / distance;
            weight_sum += weight;
            if label == 1 {
                positive_weight += weight;
            }
        }
        positive_weight / weight_sum
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
