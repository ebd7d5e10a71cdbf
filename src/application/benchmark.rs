//! Benchmark harness: repeated stratified cross-validation over the fixed
//! variant roster.
//!
//! Only the train partition ever enters this module; a holdout handle is
//! rejected up front. The fold assignment is generated once per run, so
//! every variant competes on identical fold membership.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::domain::{stratified_folds, ClassificationMetrics, Dataset, Partition};
use crate::models::ModelVariant;
use crate::HemoscreenError;

/// Cross-validation settings.
#[derive(Debug, Clone, Copy)]
pub struct BenchmarkConfig {
    /// Number of stratified folds
    pub folds: usize,
    /// Seed for fold shuffling and stochastic variants
    pub seed: u64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self { folds: 5, seed: 42 }
    }
}

/// Metrics for one validation fold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoldMetrics {
    /// Fold index, 0-based
    pub fold: usize,
    /// Metrics on this fold's validation rows
    pub metrics: ClassificationMetrics,
}

/// One leaderboard entry: per-fold metrics and their arithmetic mean.
/// Full floating-point precision; rounding is a reporting concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    /// Roster name of the variant
    pub variant: String,
    /// Per-fold validation metrics
    pub folds: Vec<FoldMetrics>,
    /// Mean across folds
    pub mean: ClassificationMetrics,
}

/// Cross-validated comparison of every roster variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct BenchmarkHarness {
    config: BenchmarkConfig,
}

impl BenchmarkHarness {
    /// Harness with explicit settings.
    #[must_use]
    pub fn new(config: BenchmarkConfig) -> Self {
        Self { config }
    }

    /// Run k-fold cross-validation for all variants on the train partition.
    ///
    /// Variants are mutually independent and run on their own worker
    /// threads over the same read-only data view. The returned rows are in
    /// roster order; sorting (F1 ascending for ranked reports) is the
    /// caller's choice.
    ///
    /// # Errors
    /// Rejects non-train datasets; propagates fit failures.
    pub fn run(&self, train: &Dataset) -> Result<Vec<LeaderboardRow>, HemoscreenError> {
        if train.partition() != Partition::Train {
            return Err(HemoscreenError::WrongPartition {
                expected: Partition::Train,
                found: train.partition(),
            });
        }

        let features = train.feature_matrix();
        let labels = train.labels();
        let folds = stratified_folds(&labels, self.config.folds, self.config.seed);
        let seed = self.config.seed;

        tracing::info!(
            rows = labels.len(),
            folds = self.config.folds,
            "starting cross-validated comparison"
        );

        let outcomes: Vec<Result<LeaderboardRow, HemoscreenError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = ModelVariant::ROSTER
                .iter()
                .map(|&variant| {
                    let features = &features;
                    let labels = &labels;
                    let folds = &folds;
                    scope.spawn(move || cross_validate(variant, features, labels, folds, seed))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle.join().map_err(|_| {
                        HemoscreenError::Worker("benchmark worker terminated abnormally".into())
                    })?
                })
                .collect()
        });

        let mut rows = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            let row = outcome?;
            tracing::info!(variant = %row.variant, f1 = row.mean.f1, "cross-validation complete");
            rows.push(row);
        }
        Ok(rows)
    }
}

fn cross_validate(
    variant: ModelVariant,
    features: &Array2<f64>,
    labels: &[u8],
    folds: &[Vec<usize>],
    seed: u64,
) -> Result<LeaderboardRow, HemoscreenError> {
    let mut fold_metrics = Vec::with_capacity(folds.len());
    for (fold_index, validation) in folds.iter().enumerate() {
        let training: Vec<usize> = folds
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != fold_index)
            .flat_map(|(_, indices)| indices.iter().copied())
            .collect();

        let fold_features = features.select(Axis(0), &training);
        let fold_labels: Vec<u8> = training.iter().map(|&i| labels[i]).collect();
        let model = variant.fit(fold_features.view(), &fold_labels, seed)?;

        let truth: Vec<u8> = validation.iter().map(|&i| labels[i]).collect();
        let predicted: Vec<u8> = validation
            .iter()
            .map(|&i| model.predict(features.row(i)))
            .collect();
        fold_metrics.push(FoldMetrics {
            fold: fold_index,
            metrics: ClassificationMetrics::score(&truth, &predicted),
        });
    }

    let mean =
        ClassificationMetrics::mean(&fold_metrics.iter().map(|f| f.metrics).collect::<Vec<_>>());
    Ok(LeaderboardRow {
        variant: variant.name().to_string(),
        folds: fold_metrics,
        mean,
    })
}
