//! Final refit: fit every roster variant on the whole train partition and
//! persist the artifacts.

use crate::adapters::StoreError;
use crate::domain::{Dataset, Partition};
use crate::models::{ModelArtifact, ModelVariant};
use crate::ports::ModelStore;
use crate::HemoscreenError;

/// Refits the roster on the full train partition and writes artifacts.
#[derive(Debug, Clone, Copy)]
pub struct Trainer {
    seed: u64,
}

impl Trainer {
    /// Trainer with the pipeline seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Fit each variant on the entire train partition (not per-fold) and
    /// save one artifact per variant, replacing any previous one.
    ///
    /// Returns the stored variant names.
    ///
    /// # Errors
    /// Rejects non-train datasets; propagates fit and store failures.
    pub fn train_and_store<S>(
        &self,
        store: &S,
        train: &Dataset,
    ) -> Result<Vec<String>, HemoscreenError>
    where
        S: ModelStore,
        S::Error: Into<StoreError>,
    {
        if train.partition() != Partition::Train {
            return Err(HemoscreenError::WrongPartition {
                expected: Partition::Train,
                found: train.partition(),
            });
        }

        let features = train.feature_matrix();
        let labels = train.labels();

        let mut stored = Vec::with_capacity(ModelVariant::ROSTER.len());
        for variant in ModelVariant::ROSTER {
            let model = variant.fit(features.view(), &labels, self.seed)?;
            let artifact = ModelArtifact::new(variant, model, labels.len());
            store.save(&artifact).map_err(Into::into)?;
            tracing::info!(variant = %variant, trained_on = labels.len(), "artifact stored");
            stored.push(variant.name().to_string());
        }
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FsModelStore;
    use crate::domain::{ClinicalFeatures, ClinicalSample, Gender};

    fn training_dataset() -> Dataset {
        let samples = (0..40)
            .map(|i| {
                let anemic = i % 2 == 0;
                let jitter = (i % 5) as f64 * 0.11;
                ClinicalSample::new(
                    ClinicalFeatures {
                        gender: if i % 4 < 2 { Gender::Male } else { Gender::Female },
                        hemoglobin: if anemic { 8.2 + jitter } else { 14.1 + jitter },
                        mch: if anemic { 21.5 } else { 28.5 },
                        mchc: 31.0 + jitter,
                        mcv: if anemic { 73.0 } else { 89.0 },
                    },
                    u8::from(anemic),
                )
            })
            .collect();
        Dataset::new(Partition::Train, samples)
    }

    #[test]
    fn test_refit_persists_every_variant() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsModelStore::open(dir.path()).expect("open");
        let trainer = Trainer::new(42);

        let stored = trainer
            .train_and_store(&store, &training_dataset())
            .expect("training runs");
        assert_eq!(stored.len(), ModelVariant::ROSTER.len());

        for variant in ModelVariant::ROSTER {
            let artifact = store.load(variant.name()).expect("artifact exists");
            assert_eq!(artifact.trained_on, 40);
            assert!(artifact.matches_feature_layout());
        }
    }

    #[test]
    fn test_retraining_replaces_artifacts() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsModelStore::open(dir.path()).expect("open");
        let trainer = Trainer::new(42);
        let train = training_dataset();

        trainer.train_and_store(&store, &train).expect("first run");
        let first = store.load("random_forest").expect("load");
        trainer.train_and_store(&store, &train).expect("second run");
        let second = store.load("random_forest").expect("load");

        // Same data and seed: identical model, fresh timestamp.
        assert_eq!(first.model, second.model);
        assert!(second.trained_at >= first.trained_at);
    }

    #[test]
    fn test_holdout_dataset_is_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsModelStore::open(dir.path()).expect("open");
        let holdout = Dataset::new(
            Partition::Holdout,
            training_dataset().samples().to_vec(),
        );
        let err = Trainer::new(42)
            .train_and_store(&store, &holdout)
            .unwrap_err();
        assert!(matches!(err, HemoscreenError::WrongPartition { .. }));
    }
}
