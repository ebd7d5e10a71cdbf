//! Holdout evaluator: the single place holdout rows may be read.
//!
//! Applies persisted artifacts to the untouched 10% partition and produces
//! one final record per variant. A variant whose artifact is absent or
//! unreadable is skipped with a warning so the rest of the sweep survives.

use serde::{Deserialize, Serialize};

use crate::adapters::StoreError;
use crate::application::decision::AnalysisError;
use crate::domain::{
    roc_curve, ClassificationMetrics, ConfusionCounts, Dataset, Partition, RocCurve,
    FEATURE_NAMES,
};
use crate::models::{ModelArtifact, ModelVariant};
use crate::ports::ModelStore;
use crate::HemoscreenError;

/// Final holdout metrics for one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Roster name of the variant
    pub variant: String,
    /// Metrics on the holdout partition, zero-division scored as 0
    pub metrics: ClassificationMetrics,
    /// Raw confusion counts behind the metrics
    pub confusion: ConfusionCounts,
}

/// Single-pass evaluation of persisted artifacts on the holdout partition.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoldoutEvaluator;

impl HoldoutEvaluator {
    /// Evaluate every roster variant with a stored artifact, ranked by F1
    /// descending.
    ///
    /// # Errors
    /// Rejects non-holdout datasets; a feature-contract mismatch aborts the
    /// sweep because it signals a deployment inconsistency.
    pub fn evaluate_all<S>(
        &self,
        store: &S,
        holdout: &Dataset,
    ) -> Result<Vec<EvaluationRecord>, HemoscreenError>
    where
        S: ModelStore,
        S::Error: Into<StoreError>,
    {
        check_holdout(holdout)?;
        let features = holdout.feature_matrix();
        let labels = holdout.labels();

        let mut records = Vec::new();
        for variant in ModelVariant::ROSTER {
            let artifact = match self.load_artifact(store, variant.name())? {
                Some(artifact) => artifact,
                None => continue,
            };

            let predicted: Vec<u8> = features
                .rows()
                .into_iter()
                .map(|row| artifact.model.predict(row))
                .collect();
            let confusion = ConfusionCounts::tally(&labels, &predicted);
            let metrics = ClassificationMetrics::from_counts(&confusion);
            tracing::info!(variant = %variant, f1 = metrics.f1, "holdout evaluation complete");
            records.push(EvaluationRecord {
                variant: variant.name().to_string(),
                metrics,
                confusion,
            });
        }

        records.sort_by(|a, b| {
            b.metrics
                .f1
                .partial_cmp(&a.metrics.f1)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(records)
    }

    /// ROC curve of one stored artifact's probability scores on the holdout.
    ///
    /// # Errors
    /// Unlike the sweep, a missing artifact is an error here: the caller
    /// asked for this variant specifically.
    pub fn roc<S>(
        &self,
        store: &S,
        holdout: &Dataset,
        variant: &str,
    ) -> Result<RocCurve, HemoscreenError>
    where
        S: ModelStore,
        S::Error: Into<StoreError>,
    {
        check_holdout(holdout)?;
        let artifact = store.load(variant).map_err(Into::into)?;
        check_contract(&artifact)?;

        let features = holdout.feature_matrix();
        let labels = holdout.labels();
        let scores: Vec<f64> = features
            .rows()
            .into_iter()
            .map(|row| artifact.model.predict_probability(row))
            .collect();
        Ok(roc_curve(&labels, &scores))
    }

    fn load_artifact<S>(
        &self,
        store: &S,
        variant: &str,
    ) -> Result<Option<ModelArtifact>, HemoscreenError>
    where
        S: ModelStore,
        S::Error: Into<StoreError>,
    {
        match store.load(variant) {
            Ok(artifact) => {
                check_contract(&artifact)?;
                Ok(Some(artifact))
            }
            Err(e) => match e.into() {
                StoreError::MissingArtifact(name) => {
                    tracing::warn!(variant = %name, "artifact missing, skipping");
                    Ok(None)
                }
                StoreError::Corrupt { name, source } => {
                    tracing::warn!(variant = %name, error = %source, "artifact unreadable, skipping");
                    Ok(None)
                }
                fatal => Err(fatal.into()),
            },
        }
    }
}

fn check_holdout(holdout: &Dataset) -> Result<(), HemoscreenError> {
    if holdout.partition() != Partition::Holdout {
        return Err(HemoscreenError::WrongPartition {
            expected: Partition::Holdout,
            found: holdout.partition(),
        });
    }
    Ok(())
}

fn check_contract(artifact: &ModelArtifact) -> Result<(), HemoscreenError> {
    if artifact.matches_feature_layout() {
        Ok(())
    } else {
        Err(AnalysisError::FeatureMismatch {
            expected: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
            found: artifact.feature_names.clone(),
        }
        .into())
    }
}
