//! Random forest: bootstrap-aggregated gini trees with per-node feature
//! subsampling.

use ndarray::{ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::ports::{check_fit_input, BinaryClassifier, TrainError};

use super::tree::{grow_tree, tree_probability, Node, TreeConfig};

const DEFAULT_TREES: usize = 300;

/// Random forest, the `random_forest` roster variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    n_trees: usize,
    seed: u64,
    trees: Vec<Vec<Node>>,
}

impl RandomForestClassifier {
    /// Forest with the roster's tree count and the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_trees(DEFAULT_TREES, seed)
    }

    /// Forest with an explicit tree count (tests use small forests).
    #[must_use]
    pub fn with_trees(n_trees: usize, seed: u64) -> Self {
        Self {
            n_trees,
            seed,
            trees: Vec::new(),
        }
    }
}

impl BinaryClassifier for RandomForestClassifier {
    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[u8]) -> Result<(), TrainError> {
        check_fit_input(features.nrows(), labels)?;
        let rows = features.nrows();
        // sqrt of the feature count, the usual classification default.
        let max_features = ((features.ncols() as f64).sqrt().round() as usize).max(1);
        let config = TreeConfig {
            max_depth: None,
            min_samples_split: 2,
            max_features: Some(max_features),
        };

        let mut rng = ChaCha20Rng::seed_from_u64(self.seed);
        self.trees = (0..self.n_trees)
            .map(|_| {
                let bootstrap: Vec<usize> = (0..rows).map(|_| rng.gen_range(0..rows)).collect();
                grow_tree(features, labels, &bootstrap, &config, &mut rng)
            })
            .collect();
        Ok(())
    }

    fn predict(&self, features: ArrayView1<'_, f64>) -> u8 {
        u8::from(self.predict_probability(features) >= 0.5)
    }

    fn predict_probability(&self, features: ArrayView1<'_, f64>) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .trees
            .iter()
            .map(|tree| tree_probability(tree, features))
            .sum();
        sum / self.trees.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn blob_data() -> (Array2<f64>, Vec<u8>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let jitter = (i % 5) as f64 * 0.1;
            rows.extend_from_slice(&[1.0 + jitter, 2.0 - jitter]);
            labels.push(0);
            rows.extend_from_slice(&[6.0 + jitter, 7.0 - jitter]);
            labels.push(1);
        }
        (Array2::from_shape_vec((40, 2), rows).unwrap(), labels)
    }

    #[test]
    fn test_separates_blobs() {
        let (x, y) = blob_data();
        let mut forest = RandomForestClassifier::with_trees(25, 42);
        forest.fit(x.view(), &y).expect("fit succeeds");

        assert_eq!(forest.predict(array![1.2, 1.9].view()), 0);
        assert_eq!(forest.predict(array![6.2, 6.9].view()), 1);
        let p = forest.predict_probability(array![6.2, 6.9].view());
        assert!(p > 0.9, "expected confident positive, got {p}");
    }

    #[test]
    fn test_seeded_refit_reproduces_forest() {
        let (x, y) = blob_data();
        let mut a = RandomForestClassifier::with_trees(10, 7);
        let mut b = RandomForestClassifier::with_trees(10, 7);
        a.fit(x.view(), &y).expect("fit succeeds");
        b.fit(x.view(), &y).expect("fit succeeds");
        assert_eq!(a, b);

        let mut c = RandomForestClassifier::with_trees(10, 8);
        c.fit(x.view(), &y).expect("fit succeeds");
        assert_ne!(a, c);
    }

    #[test]
    fn test_probability_is_tree_average() {
        let (x, y) = blob_data();
        let mut forest = RandomForestClassifier::with_trees(5, 1);
        forest.fit(x.view(), &y).expect("fit succeeds");
        let point = array![3.5, 4.5];
        let mean: f64 = forest
            .trees
            .iter()
            .map(|t| tree_probability(t, point.view()))
            .sum::<f64>()
            / 5.0;
        assert!((forest.predict_probability(point.view()) - mean).abs() < 1e-12);
    }
}
