//! CART classification tree (gini impurity).
//!
//! The growing routine is shared: the standalone decision-tree variant grows
//! to purity over all features, while the forest grows bootstrap trees with
//! per-node feature subsampling through the same code path.

use ndarray::{ArrayView1, ArrayView2};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::ports::{check_fit_input, BinaryClassifier, TrainError};

/// Growth limits for one tree.
#[derive(Debug, Clone)]
pub(crate) struct TreeConfig {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features considered per split; `None` means all.
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        probability: f64,
    },
}

/// Grow a tree over the given row indices. Deterministic for a fixed rng
/// state and input.
pub(crate) fn grow_tree(
    features: ArrayView2<'_, f64>,
    labels: &[u8],
    indices: &[usize],
    config: &TreeConfig,
    rng: &mut ChaCha20Rng,
) -> Vec<Node> {
    let mut nodes = Vec::new();
    build_node(&mut nodes, features, labels, indices, 0, config, rng);
    nodes
}

/// Class-1 probability by walking from the root (node 0).
pub(crate) fn tree_probability(nodes: &[Node], row: ArrayView1<'_, f64>) -> f64 {
    let mut current = 0;
    loop {
        match &nodes[current] {
            Node::Leaf { probability } => return *probability,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                current = if row[*feature] <= *threshold {
                    *left
                } else {
                    *right
                };
            }
        }
    }
}

fn build_node(
    nodes: &mut Vec<Node>,
    features: ArrayView2<'_, f64>,
    labels: &[u8],
    indices: &[usize],
    depth: usize,
    config: &TreeConfig,
    rng: &mut ChaCha20Rng,
) -> usize {
    let positives = indices.iter().filter(|&&i| labels[i] == 1).count();
    let probability = positives as f64 / indices.len() as f64;

    let depth_reached = config.max_depth.is_some_and(|d| depth >= d);
    let pure = positives == 0 || positives == indices.len();
    if pure || depth_reached || indices.len() < config.min_samples_split {
        nodes.push(Node::Leaf { probability });
        return nodes.len() - 1;
    }

    let candidates = candidate_features(features.ncols(), config.max_features, rng);
    let Some((feature, threshold)) = best_split(features, labels, indices, &candidates) else {
        nodes.push(Node::Leaf { probability });
        return nodes.len() - 1;
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| features[(i, feature)] <= threshold);

    // Reserve the split slot before recursing so the root stays at index 0.
    nodes.push(Node::Leaf { probability });
    let slot = nodes.len() - 1;
    let left = build_node(nodes, features, labels, &left_idx, depth + 1, config, rng);
    let right = build_node(nodes, features, labels, &right_idx, depth + 1, config, rng);
    nodes[slot] = Node::Split {
        feature,
        threshold,
        left,
        right,
    };
    slot
}

fn candidate_features(
    total: usize,
    max_features: Option<usize>,
    rng: &mut ChaCha20Rng,
) -> Vec<usize> {
    match max_features {
        Some(k) if k < total => {
            let mut picked = rand::seq::index::sample(rng, total, k).into_vec();
            picked.sort_unstable();
            picked
        }
        _ => (0..total).collect(),
    }
}

/// Exhaustive gini scan over midpoint thresholds of each candidate feature.
fn best_split(
    features: ArrayView2<'_, f64>,
    labels: &[u8],
    indices: &[usize],
    candidates: &[usize],
) -> Option<(usize, f64)> {
    let total = indices.len() as f64;
    let total_pos = indices.iter().filter(|&&i| labels[i] == 1).count() as f64;

    let mut best: Option<(usize, f64, f64)> = None;
    for &feature in candidates {
        let mut column: Vec<(f64, u8)> = indices
            .iter()
            .map(|&i| (features[(i, feature)], labels[i]))
            .collect();
        column.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut left_n = 0.0;
        let mut left_pos = 0.0;
        for i in 0..column.len() - 1 {
            left_n += 1.0;
            left_pos += f64::from(column[i].1);
            if column[i].0 == column[i + 1].0 {
                continue;
            }
            let right_n = total - left_n;
            let right_pos = total_pos - left_pos;
            let impurity =
                (left_n * gini(left_pos, left_n) + right_n * gini(right_pos, right_n)) / total;
            if best.map_or(true, |(_, _, current)| impurity < current) {
                let threshold = (column[i].0 + column[i + 1].0) / 2.0;
                best = Some((feature, threshold, impurity));
            }
        }
    }
    best.map(|(feature, threshold, _)| (feature, threshold))
}

fn gini(positives: f64, count: f64) -> f64 {
    if count == 0.0 {
        return 0.0;
    }
    let p = positives / count;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}

/// CART decision tree grown to purity, the `decision_tree` roster variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    nodes: Vec<Node>,
}

impl BinaryClassifier for DecisionTreeClassifier {
    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[u8]) -> Result<(), TrainError> {
        check_fit_input(features.nrows(), labels)?;
        let indices: Vec<usize> = (0..features.nrows()).collect();
        // No feature subsampling, so the rng never draws.
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        self.nodes = grow_tree(features, labels, &indices, &TreeConfig::default(), &mut rng);
        Ok(())
    }

    fn predict(&self, features: ArrayView1<'_, f64>) -> u8 {
        u8::from(self.predict_probability(features) >= 0.5)
    }

    fn predict_probability(&self, features: ArrayView1<'_, f64>) -> f64 {
        tree_probability(&self.nodes, features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fits_separable_data() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [8.0, 1.0], [9.0, 1.0]];
        let y = [0, 0, 1, 1];
        let mut tree = DecisionTreeClassifier::default();
        tree.fit(x.view(), &y).expect("fit succeeds");

        for (row, label) in x.rows().into_iter().zip(y) {
            assert_eq!(tree.predict(row), label);
        }
        assert!(tree.predict_probability(array![1.5, 0.0].view()) < 0.5);
        assert!(tree.predict_probability(array![8.5, 1.0].view()) > 0.5);
    }

    #[test]
    fn test_pure_node_short_circuits() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = [1, 1, 1];
        let mut tree = DecisionTreeClassifier::default();
        tree.fit(x.view(), &y).expect("fit succeeds");
        assert_eq!(tree.nodes.len(), 1);
        assert!((tree.predict_probability(array![5.0].view()) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_refit_is_deterministic() {
        let x = array![
            [1.0, 3.0],
            [2.0, 1.0],
            [3.0, 9.0],
            [4.0, 2.0],
            [5.0, 8.0],
            [6.0, 7.0]
        ];
        let y = [0, 0, 1, 0, 1, 1];
        let mut a = DecisionTreeClassifier::default();
        let mut b = DecisionTreeClassifier::default();
        a.fit(x.view(), &y).expect("fit succeeds");
        b.fit(x.view(), &y).expect("fit succeeds");
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_bad_input() {
        let x = array![[1.0], [2.0]];
        let mut tree = DecisionTreeClassifier::default();
        assert!(matches!(
            tree.fit(x.view(), &[0]),
            Err(TrainError::ShapeMismatch { .. })
        ));
    }
}
