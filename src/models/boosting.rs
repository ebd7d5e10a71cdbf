//! Gradient-boosted trees with logistic loss.
//!
//! Depth-limited regression trees are fitted to the loss gradient, with a
//! Newton step per leaf. The ensemble accumulates in log-odds space.

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::ports::{check_fit_input, BinaryClassifier, TrainError};

const DEFAULT_STAGES: usize = 100;
const LEARNING_RATE: f64 = 0.1;
const STAGE_DEPTH: usize = 3;
const PROBABILITY_FLOOR: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum RegNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Gradient boosting, the `gradient_boosting` roster variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    stages: usize,
    learning_rate: f64,
    base_score: f64,
    trees: Vec<Vec<RegNode>>,
}

impl GradientBoostingClassifier {
    /// Ensemble with the roster's stage count.
    #[must_use]
    pub fn new() -> Self {
        Self::with_stages(DEFAULT_STAGES)
    }

    /// Ensemble with an explicit stage count (tests boost fewer rounds).
    #[must_use]
    pub fn with_stages(stages: usize) -> Self {
        Self {
            stages,
            learning_rate: LEARNING_RATE,
            base_score: 0.0,
            trees: Vec::new(),
        }
    }

    fn decision(&self, features: ArrayView1<'_, f64>) -> f64 {
        let boost: f64 = self
            .trees
            .iter()
            .map(|tree| reg_tree_value(tree, features))
            .sum();
        self.base_score + self.learning_rate * boost
    }
}

impl Default for GradientBoostingClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryClassifier for GradientBoostingClassifier {
    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[u8]) -> Result<(), TrainError> {
        check_fit_input(features.nrows(), labels)?;
        let rows = features.nrows();

        let positives = labels.iter().filter(|&&l| l == 1).count() as f64;
        let prior = (positives / rows as f64).clamp(PROBABILITY_FLOOR, 1.0 - PROBABILITY_FLOOR);
        self.base_score = (prior / (1.0 - prior)).ln();
        self.trees = Vec::with_capacity(self.stages);

        let mut scores = vec![self.base_score; rows];
        let indices: Vec<usize> = (0..rows).collect();
        for _ in 0..self.stages {
            let mut gradients = Vec::with_capacity(rows);
            let mut hessians = Vec::with_capacity(rows);
            for (i, &label) in labels.iter().enumerate() {
                let p = sigmoid(scores[i]);
                gradients.push(f64::from(label) - p);
                hessians.push((p * (1.0 - p)).max(PROBABILITY_FLOOR));
            }

            let mut nodes = Vec::new();
            grow_reg_node(
                &mut nodes, features, &gradients, &hessians, &indices, 0,
            );
            for (i, score) in scores.iter_mut().enumerate() {
                *score += self.learning_rate * reg_tree_value(&nodes, features.row(i));
            }
            self.trees.push(nodes);
        }
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

fn reg_tree_value(nodes: &[RegNode], row: ArrayView1<'_, f64>) -> f64 {
    let mut current = 0;
    loop {
        match &nodes[current] {
            RegNode::Leaf { value } => return *value,
            RegNode::Split {
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

fn grow_reg_node(
    nodes: &mut Vec<RegNode>,
    features: ArrayView2<'_, f64>,
    gradients: &[f64],
    hessians: &[f64],
    indices: &[usize],
    depth: usize,
) -> usize {
    let leaf_value = newton_leaf(gradients, hessians, indices);
    if depth >= STAGE_DEPTH || indices.len() < 2 {
        nodes.push(RegNode::Leaf { value: leaf_value });
        return nodes.len() - 1;
    }

    let Some((feature, threshold)) = best_reg_split(features, gradients, indices) else {
        nodes.push(RegNode::Leaf { value: leaf_value });
        return nodes.len() - 1;
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| features[(i, feature)] <= threshold);

    nodes.push(RegNode::Leaf { value: leaf_value });
    let slot = nodes.len() - 1;
    let left = grow_reg_node(nodes, features, gradients, hessians, &left_idx, depth + 1);
    let right = grow_reg_node(nodes, features, gradients, hessians, &right_idx, depth + 1);
    nodes[slot] = RegNode::Split {
        feature,
        threshold,
        left,
        right,
    };
    slot
}

/// Newton step: gradient sum over hessian sum.
fn newton_leaf(gradients: &[f64], hessians: &[f64], indices: &[usize]) -> f64 {
    let gradient_sum: f64 = indices.iter().map(|&i| gradients[i]).sum();
    let hessian_sum: f64 = indices.iter().map(|&i| hessians[i]).sum();
    gradient_sum / hessian_sum.max(PROBABILITY_FLOOR)
}

/// Squared-error split: maximize sum²/count over both sides.
fn best_reg_split(
    features: ArrayView2<'_, f64>,
    gradients: &[f64],
    indices: &[usize],
) -> Option<(usize, f64)> {
    let total: f64 = indices.iter().map(|&i| gradients[i]).sum();
    let count = indices.len() as f64;

    let mut best: Option<(usize, f64, f64)> = None;
    for feature in 0..features.ncols() {
        let mut column: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| (features[(i, feature)], gradients[i]))
            .collect();
        column.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut left_sum = 0.0;
        let mut left_n = 0.0;
        for i in 0..column.len() - 1 {
            left_sum += column[i].1;
            left_n += 1.0;
            if column[i].0 == column[i + 1].0 {
                continue;
            }
            let right_sum = total - left_sum;
            let right_n = count - left_n;
            let gain = left_sum * left_sum / left_n + right_sum * right_sum / right_n;
            if best.map_or(true, |(_, _, current)| gain > current) {
                let threshold = (column[i].0 + column[i + 1].0) / 2.0;
                best = Some((feature, threshold, gain));
            }
        }
    }
    best.map(|(feature, threshold, _)| (feature, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn ring_data() -> (Array2<f64>, Vec<u8>) {
        // Label 1 inside |x| < 2 on the first axis, not linearly separable
        // with the second noise axis alone.
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..30 {
            let offset = (i % 6) as f64 * 0.2;
            rows.extend_from_slice(&[offset - 0.5, (i % 4) as f64]);
            labels.push(1);
            rows.extend_from_slice(&[4.0 + offset, (i % 4) as f64]);
            labels.push(0);
        }
        (Array2::from_shape_vec((60, 2), rows).unwrap(), labels)
    }

    #[test]
    fn test_boosting_learns_split() {
        let (x, y) = ring_data();
        let mut model = GradientBoostingClassifier::with_stages(20);
        model.fit(x.view(), &y).expect("fit succeeds");

        assert_eq!(model.predict(array![0.0, 1.0].view()), 1);
        assert_eq!(model.predict(array![4.5, 1.0].view()), 0);
        assert!(model.predict_probability(array![0.0, 1.0].view()) > 0.8);
    }

    #[test]
    fn test_probability_tightens_with_stages() {
        let (x, y) = ring_data();
        let mut shallow = GradientBoostingClassifier::with_stages(1);
        let mut deep = GradientBoostingClassifier::with_stages(25);
        shallow.fit(x.view(), &y).expect("fit succeeds");
        deep.fit(x.view(), &y).expect("fit succeeds");

        let point = array![0.0, 1.0];
        assert!(
            deep.predict_probability(point.view()) > shallow.predict_probability(point.view())
        );
    }

    #[test]
    fn test_refit_is_deterministic() {
        let (x, y) = ring_data();
        let mut a = GradientBoostingClassifier::with_stages(10);
        let mut b = GradientBoostingClassifier::with_stages(10);
        a.fit(x.view(), &y).expect("fit succeeds");
        b.fit(x.view(), &y).expect("fit succeeds");
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_input_rejected() {
        let x = Array2::<f64>::zeros((0, 2));
        let mut model = GradientBoostingClassifier::with_stages(5);
        assert!(matches!(
            model.fit(x.view(), &[]),
            Err(TrainError::EmptyTrainingSet)
        ));
    }
}
