//! Partition-tagged datasets and reproducible stratified sampling.
//!
//! The holdout partition is isolated by construction: every consumer checks
//! the tag of the dataset it receives, so training-side code can never be
//! handed holdout rows without an explicit error.

use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use super::sample::{ClinicalSample, FEATURE_COUNT};

/// Which side of the 90/10 split a dataset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    /// The 90% used for cross-validation and final refits.
    Train,
    /// The untouched 10% reserved for final evaluation.
    Holdout,
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Train => write!(f, "train"),
            Self::Holdout => write!(f, "holdout"),
        }
    }
}

/// An ordered, immutable sequence of labeled samples with a partition tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    partition: Partition,
    samples: Vec<ClinicalSample>,
}

impl Dataset {
    /// Wrap samples under a partition tag.
    #[must_use]
    pub fn new(partition: Partition, samples: Vec<ClinicalSample>) -> Self {
        Self { partition, samples }
    }

    /// Partition tag.
    #[must_use]
    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the dataset holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The samples in their stored order.
    #[must_use]
    pub fn samples(&self) -> &[ClinicalSample] {
        &self.samples
    }

    /// Encode every sample into the shared feature layout.
    #[must_use]
    pub fn feature_matrix(&self) -> Array2<f64> {
        let mut flat = Vec::with_capacity(self.samples.len() * FEATURE_COUNT);
        for sample in &self.samples {
            flat.extend_from_slice(&sample.features().to_vector());
        }
        Array2::from_shape_vec((self.samples.len(), FEATURE_COUNT), flat)
            .unwrap_or_else(|_| Array2::zeros((0, FEATURE_COUNT)))
    }

    /// Binary labels in sample order.
    #[must_use]
    pub fn labels(&self) -> Vec<u8> {
        self.samples.iter().map(ClinicalSample::label).collect()
    }

    /// Fraction of positive labels.
    #[must_use]
    pub fn positive_ratio(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let positives = self.samples.iter().filter(|s| s.label() == 1).count();
        positives as f64 / self.samples.len() as f64
    }
}

/// Stratified split into train and holdout partitions.
///
/// Per class, a seeded shuffle selects `round(n_class * holdout_fraction)`
/// rows for the holdout; both partitions keep the input ordering of the rows
/// they retain. Identical input and seed reproduce identical partitions, so
/// the holdout stays frozen across runs.
#[must_use]
pub fn stratified_split(
    samples: Vec<ClinicalSample>,
    holdout_fraction: f64,
    seed: u64,
) -> (Dataset, Dataset) {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut holdout_picks: Vec<usize> = Vec::new();

    for class in [0u8, 1u8] {
        let mut indices: Vec<usize> = samples
            .iter()
            .enumerate()
            .filter(|(_, s)| s.label() == class)
            .map(|(i, _)| i)
            .collect();
        indices.shuffle(&mut rng);
        let take = (indices.len() as f64 * holdout_fraction).round() as usize;
        holdout_picks.extend(indices.into_iter().take(take));
    }
    holdout_picks.sort_unstable();

    let mut train = Vec::with_capacity(samples.len() - holdout_picks.len());
    let mut holdout = Vec::with_capacity(holdout_picks.len());
    let mut picks = holdout_picks.iter().peekable();
    for (i, sample) in samples.into_iter().enumerate() {
        if picks.peek() == Some(&&i) {
            picks.next();
            holdout.push(sample);
        } else {
            train.push(sample);
        }
    }

    (
        Dataset::new(Partition::Train, train),
        Dataset::new(Partition::Holdout, holdout),
    )
}

/// Stratified k-fold assignment over a label sequence.
///
/// Returns `k` disjoint validation index sets covering every index exactly
/// once. Per class, indices are shuffled with the seed and dealt round-robin,
/// so class proportions differ between folds by at most one sample. The same
/// labels and seed always produce the same folds, which is what lets every
/// model variant see identical fold membership.
#[must_use]
pub fn stratified_folds(labels: &[u8], k: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let mut folds: Vec<Vec<usize>> = vec![Vec::new(); k];

    for class in [0u8, 1u8] {
        let mut indices: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == class)
            .map(|(i, _)| i)
            .collect();
        indices.shuffle(&mut rng);
        for (position, index) in indices.into_iter().enumerate() {
            folds[position % k].push(index);
        }
    }

    for fold in &mut folds {
        fold.sort_unstable();
    }
    folds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::{ClinicalFeatures, Gender};

    fn synthetic_samples(n: usize, positive_every: usize) -> Vec<ClinicalSample> {
        (0..n)
            .map(|i| {
                let label = u8::from(i % positive_every == 0);
                ClinicalSample::new(
                    ClinicalFeatures {
                        gender: if i % 2 == 0 { Gender::Male } else { Gender::Female },
                        hemoglobin: 10.0 + (i % 7) as f64,
                        mch: 25.0 + (i % 5) as f64,
                        mchc: 31.0 + (i % 3) as f64,
                        mcv: 80.0 + (i % 11) as f64,
                    },
                    label,
                )
            })
            .collect()
    }

    #[test]
    fn test_split_preserves_class_ratio() {
        let samples = synthetic_samples(200, 4);
        let full_ratio = 0.25;
        let (train, holdout) = stratified_split(samples, 0.10, 42);

        assert_eq!(train.len() + holdout.len(), 200);
        assert_eq!(train.partition(), Partition::Train);
        assert_eq!(holdout.partition(), Partition::Holdout);

        // Each partition's ratio stays within one sample's weight of the
        // full ratio.
        let train_tolerance = 1.0 / train.len() as f64;
        let holdout_tolerance = 1.0 / holdout.len() as f64;
        assert!((train.positive_ratio() - full_ratio).abs() <= train_tolerance);
        assert!((holdout.positive_ratio() - full_ratio).abs() <= holdout_tolerance);
    }

    #[test]
    fn test_split_is_reproducible() {
        let (train_a, holdout_a) = stratified_split(synthetic_samples(150, 3), 0.10, 42);
        let (train_b, holdout_b) = stratified_split(synthetic_samples(150, 3), 0.10, 42);
        assert_eq!(train_a, train_b);
        assert_eq!(holdout_a, holdout_b);

        // A different seed selects different rows.
        let (train_c, _) = stratified_split(synthetic_samples(150, 3), 0.10, 7);
        assert_ne!(train_a, train_c);
    }

    #[test]
    fn test_partitions_are_disjoint_and_exhaustive() {
        let samples = synthetic_samples(100, 5);
        let (train, holdout) = stratified_split(samples.clone(), 0.10, 42);

        let mut seen = Vec::new();
        seen.extend(train.samples().iter().cloned());
        seen.extend(holdout.samples().iter().cloned());
        assert_eq!(seen.len(), samples.len());
        // Every original sample appears exactly once across both partitions.
        for sample in &samples {
            let occurrences = seen.iter().filter(|s| *s == sample).count();
            assert_eq!(occurrences, 1);
        }
    }

    #[test]
    fn test_folds_cover_every_index_once() {
        let labels: Vec<u8> = (0..103).map(|i| u8::from(i % 3 == 0)).collect();
        let folds = stratified_folds(&labels, 5, 42);
        assert_eq!(folds.len(), 5);

        let mut all: Vec<usize> = folds.iter().flatten().copied().collect();
        all.sort_unstable();
        let expected: Vec<usize> = (0..labels.len()).collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_folds_are_stratified_and_reproducible() {
        let labels: Vec<u8> = (0..100).map(|i| u8::from(i % 4 == 0)).collect();
        let folds = stratified_folds(&labels, 5, 42);

        for fold in &folds {
            let positives = fold.iter().filter(|&&i| labels[i] == 1).count();
            // 25 positives dealt into 5 folds: exactly 5 each.
            assert_eq!(positives, 5);
        }

        assert_eq!(folds, stratified_folds(&labels, 5, 42));
        assert_ne!(folds, stratified_folds(&labels, 5, 43));
    }
}
