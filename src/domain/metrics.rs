//! Binary classification metrics.
//!
//! Full floating-point precision throughout; rounding happens only at
//! reporting boundaries outside the core. Degenerate denominators (a class
//! absent from predictions or labels) yield 0 rather than an error.

use serde::{Deserialize, Serialize};

/// Confusion-matrix counts for one prediction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    /// Label 1 predicted as 1
    pub true_positive: u64,
    /// Label 0 predicted as 1
    pub false_positive: u64,
    /// Label 0 predicted as 0
    pub true_negative: u64,
    /// Label 1 predicted as 0
    pub false_negative: u64,
}

impl ConfusionCounts {
    /// Tally predictions against ground truth.
    ///
    /// # Panics
    /// Panics if the slices differ in length; callers always score the rows
    /// they just predicted.
    #[must_use]
    pub fn tally(truth: &[u8], predicted: &[u8]) -> Self {
        assert_eq!(truth.len(), predicted.len());
        let mut counts = Self::default();
        for (&t, &p) in truth.iter().zip(predicted) {
            match (t, p) {
                (1, 1) => counts.true_positive += 1,
                (0, 1) => counts.false_positive += 1,
                (0, 0) => counts.true_negative += 1,
                _ => counts.false_negative += 1,
            }
        }
        counts
    }

    /// Total number of scored samples.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }
}

/// Accuracy, precision, recall and F1 for the positive class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    /// Fraction of correct predictions
    pub accuracy: f64,
    /// TP / (TP + FP), 0 when nothing was predicted positive
    pub precision: f64,
    /// TP / (TP + FN), 0 when no positives exist
    pub recall: f64,
    /// Harmonic mean of precision and recall, 0 when both are 0
    pub f1: f64,
}

impl ClassificationMetrics {
    /// Derive metrics from confusion counts, zero-division treated as 0.
    #[must_use]
    pub fn from_counts(counts: &ConfusionCounts) -> Self {
        let total = counts.total();
        let accuracy = if total == 0 {
            0.0
        } else {
            (counts.true_positive + counts.true_negative) as f64 / total as f64
        };
        let precision = ratio(
            counts.true_positive,
            counts.true_positive + counts.false_positive,
        );
        let recall = ratio(
            counts.true_positive,
            counts.true_positive + counts.false_negative,
        );
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        Self {
            accuracy,
            precision,
            recall,
            f1,
        }
    }

    /// Score a prediction run directly.
    #[must_use]
    pub fn score(truth: &[u8], predicted: &[u8]) -> Self {
        Self::from_counts(&ConfusionCounts::tally(truth, predicted))
    }

    /// Arithmetic mean of several metric sets, e.g. across CV folds.
    /// No intermediate rounding.
    #[must_use]
    pub fn mean(folds: &[Self]) -> Self {
        if folds.is_empty() {
            return Self {
                accuracy: 0.0,
                precision: 0.0,
                recall: 0.0,
                f1: 0.0,
            };
        }
        let n = folds.len() as f64;
        Self {
            accuracy: folds.iter().map(|m| m.accuracy).sum::<f64>() / n,
            precision: folds.iter().map(|m| m.precision).sum::<f64>() / n,
            recall: folds.iter().map(|m| m.recall).sum::<f64>() / n,
            f1: folds.iter().map(|m| m.f1).sum::<f64>() / n,
        }
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// One operating point on a ROC curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    /// Score threshold producing this point
    pub threshold: f64,
    /// False positive rate
    pub fpr: f64,
    /// True positive rate
    pub tpr: f64,
}

/// ROC curve with trapezoidal AUC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    /// Operating points from the most to the least conservative threshold
    pub points: Vec<RocPoint>,
    /// Area under the curve
    pub auc: f64,
}

/// Sweep score thresholds over a ranking to produce the ROC curve.
///
/// Ties in score move together, so equal scores never produce an
/// order-dependent curve.
///
/// # Panics
/// Panics if the slices differ in length.
#[must_use]
pub fn roc_curve(truth: &[u8], scores: &[f64]) -> RocCurve {
    assert_eq!(truth.len(), scores.len());
    let positives = truth.iter().filter(|&&t| t == 1).count() as f64;
    let negatives = truth.len() as f64 - positives;

    let mut order: Vec<usize> = (0..truth.len()).collect();
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(std::cmp::Ordering::Equal));

    let mut points = vec![RocPoint {
        threshold: f64::INFINITY,
        fpr: 0.0,
        tpr: 0.0,
    }];
    let mut tp = 0.0;
    let mut fp = 0.0;
    let mut i = 0;
    while i < order.len() {
        let threshold = scores[order[i]];
        // Consume the whole tie group before emitting a point.
        while i < order.len() && scores[order[i]] == threshold {
            if truth[order[i]] == 1 {
                tp += 1.0;
            } else {
                fp += 1.0;
            }
            i += 1;
        }
        points.push(RocPoint {
            threshold,
            fpr: if negatives == 0.0 { 0.0 } else { fp / negatives },
            tpr: if positives == 0.0 { 0.0 } else { tp / positives },
        });
    }

    let mut auc = 0.0;
    for pair in points.windows(2) {
        auc += (pair[1].fpr - pair[0].fpr) * (pair[0].tpr + pair[1].tpr) / 2.0;
    }
    RocCurve { points, auc }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_checked_counts() {
        let truth = [1, 1, 0, 0, 1, 0];
        let predicted = [1, 0, 0, 1, 1, 0];
        let counts = ConfusionCounts::tally(&truth, &predicted);
        assert_eq!(counts.true_positive, 2);
        assert_eq!(counts.false_negative, 1);
        assert_eq!(counts.false_positive, 1);
        assert_eq!(counts.true_negative, 2);

        let m = ClassificationMetrics::from_counts(&counts);
        assert!((m.accuracy - 4.0 / 6.0).abs() < 1e-12);
        assert!((m.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.f1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_division_yields_zero() {
        // No positive predictions at all.
        let m = ClassificationMetrics::score(&[1, 1, 0], &[0, 0, 0]);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.f1, 0.0);

        // No positive labels at all.
        let m = ClassificationMetrics::score(&[0, 0, 0], &[0, 1, 0]);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1, 0.0);
    }

    #[test]
    fn test_fold_mean_keeps_precision() {
        let folds = [
            ClassificationMetrics {
                accuracy: 0.9,
                precision: 0.8,
                recall: 0.7,
                f1: 0.746_666_666_666_666_7,
            },
            ClassificationMetrics {
                accuracy: 1.0,
                precision: 1.0,
                recall: 1.0,
                f1: 1.0,
            },
        ];
        let mean = ClassificationMetrics::mean(&folds);
        assert!((mean.accuracy - 0.95).abs() < 1e-15);
        assert!((mean.f1 - 0.873_333_333_333_333_4).abs() < 1e-15);
    }

    #[test]
    fn test_roc_perfect_ranking() {
        let truth = [1, 1, 0, 0];
        let scores = [0.9, 0.8, 0.2, 0.1];
        let roc = roc_curve(&truth, &scores);
        assert!((roc.auc - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_roc_constant_score() {
        let truth = [1, 0, 1, 0];
        let scores = [0.5, 0.5, 0.5, 0.5];
        let roc = roc_curve(&truth, &scores);
        assert!((roc.auc - 0.5).abs() < 1e-12);
    }
}
