//! Decision service: the per-request inference pipeline.
//!
//! Composes input validation, the shared feature encoder, one loaded model
//! artifact and the severity rule engine into a single verdict. The
//! artifact is loaded exactly once at startup and shared immutably; requests
//! are stateless and never touch each other.

use std::sync::Arc;

use ndarray::Array1;

use crate::adapters::StoreError;
use crate::domain::{AnalysisRequest, Verdict, FEATURE_NAMES};
use crate::models::ModelArtifact;
use crate::ports::ModelStore;
use crate::HemoscreenError;

/// Error type for per-request analysis.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Malformed request, rejected before any feature encoding. The caller
    /// receives every issue found.
    #[error("Invalid request: {0:?}")]
    Validation(Vec<String>),

    /// The loaded artifact was trained against a different feature order
    /// than this build encodes; a deployment inconsistency, not bad input.
    #[error("Artifact feature order {found:?} does not match encoder order {expected:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// The model produced an unusable score.
    #[error("Prediction failed: {0}")]
    Prediction(String),
}

/// Request-driven inference service over one immutable model artifact.
///
/// Cloning is cheap and shares the same artifact, so one loaded service can
/// fan out across worker threads.
#[derive(Clone, Debug)]
pub struct DecisionService {
    artifact: Arc<ModelArtifact>,
}

impl DecisionService {
    /// Load the artifact for `variant` and verify its feature contract.
    ///
    /// This must run before the service accepts any request: a load failure
    /// here is fatal, leaving no partially-available service behind.
    ///
    /// # Errors
    /// Returns error if the artifact is absent, unreadable, or was trained
    /// against a different feature order.
    pub fn start<S>(store: &S, variant: &str) -> Result<Self, HemoscreenError>
    where
        S: ModelStore,
        S::Error: Into<StoreError>,
    {
        let artifact = store.load(variant).map_err(Into::into)?;
        if !artifact.matches_feature_layout() {
            return Err(AnalysisError::FeatureMismatch {
                expected: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
                found: artifact.feature_names.clone(),
            }
            .into());
        }
        tracing::info!(
            variant = %artifact.variant,
            trained_on = artifact.trained_on,
            "decision service ready"
        );
        Ok(Self {
            artifact: Arc::new(artifact),
        })
    }

    /// The loaded artifact.
    #[must_use]
    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    /// Run the full decision pipeline for one request.
    ///
    /// # Errors
    /// `Validation` for malformed input (never reaches the model),
    /// `FeatureMismatch` if the artifact contract drifted after startup,
    /// `Prediction` if the model yields an unusable score.
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<Verdict, AnalysisError> {
        let features = request.validate().map_err(AnalysisError::Validation)?;

        if !self.artifact.matches_feature_layout() {
            return Err(AnalysisError::FeatureMismatch {
                expected: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
                found: self.artifact.feature_names.clone(),
            });
        }

        let vector = Array1::from(features.to_vector().to_vec());
        let label = self.artifact.model.predict(vector.view());
        let probability = self.artifact.model.predict_probability(vector.view());
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(AnalysisError::Prediction(format!(
                "model returned probability {probability}"
            )));
        }

        tracing::debug!(
            label,
            probability,
            hemoglobin = features.hemoglobin,
            "request scored"
        );
        Ok(Verdict::compose(features, label, probability))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FsModelStore;
    use crate::domain::{Severity, BASE_RECOMMENDATIONS};
    use crate::models::{ModelArtifact, ModelVariant};
    use ndarray::Array2;

    fn store_with_artifact(variant: ModelVariant) -> (tempfile::TempDir, FsModelStore) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..15 {
            let jitter = (i % 5) as f64 * 0.1;
            rows.extend_from_slice(&[f64::from(i % 2), 8.5 + jitter, 21.0, 30.0, 74.0]);
            labels.push(1);
            rows.extend_from_slice(&[f64::from(i % 2), 14.5 + jitter, 29.0, 33.5, 90.0]);
            labels.push(0);
        }
        let x = Array2::from_shape_vec((30, 5), rows).unwrap();
        let model = variant.fit(x.view(), &labels, 42).expect("fit succeeds");
        let artifact = ModelArtifact::new(variant, model, labels.len());

        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsModelStore::open(dir.path()).expect("open");
        store.save(&artifact).expect("save");
        (dir, store)
    }

    fn request(gender: &str, hemoglobin: f64) -> AnalysisRequest {
        AnalysisRequest {
            gender: gender.to_string(),
            hemoglobin,
            mch: 20.0,
            mchc: 30.0,
            mcv: 80.0,
        }
    }

    #[test]
    fn test_startup_fails_without_artifact() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsModelStore::open(dir.path()).expect("open");
        let err = DecisionService::start(&store, "random_forest").unwrap_err();
        assert!(matches!(
            err,
            HemoscreenError::Store(StoreError::MissingArtifact(_))
        ));
    }

    #[test]
    fn test_startup_fails_on_feature_drift() {
        let (_dir, store) = store_with_artifact(ModelVariant::DecisionTree);
        let mut artifact = store.load("decision_tree").expect("load");
        artifact.feature_names.rotate_left(1);
        store.save(&artifact).expect("resave");

        let err = DecisionService::start(&store, "decision_tree").unwrap_err();
        assert!(matches!(
            err,
            HemoscreenError::Analysis(AnalysisError::FeatureMismatch { .. })
        ));
    }

    #[test]
    fn test_severe_case_end_to_end() {
        let (_dir, store) = store_with_artifact(ModelVariant::RandomForest);
        let service = DecisionService::start(&store, "random_forest").expect("start");

        let verdict = service
            .analyze(&request("female", 7.0))
            .expect("analysis succeeds");
        assert_eq!(verdict.severity_tier, Severity::Severa);
        assert!(verdict
            .recommendations
            .iter()
            .any(|r| r == "Seek urgent medical care."));
        for base in BASE_RECOMMENDATIONS {
            assert!(verdict.recommendations.iter().any(|r| r == base));
        }
        assert_eq!(verdict.recommendations.len(), 4);
    }

    #[test]
    fn test_healthy_male_end_to_end() {
        let (_dir, store) = store_with_artifact(ModelVariant::RandomForest);
        let service = DecisionService::start(&store, "random_forest").expect("start");

        let verdict = service
            .analyze(&AnalysisRequest {
                gender: "male".to_string(),
                hemoglobin: 14.0,
                mch: 28.0,
                mchc: 33.0,
                mcv: 88.0,
            })
            .expect("analysis succeeds");
        assert_eq!(verdict.severity_tier, Severity::SinAnemia);
        assert_eq!(verdict.recommendations.len(), 3);
    }

    #[test]
    fn test_invalid_gender_never_reaches_model() {
        let (_dir, store) = store_with_artifact(ModelVariant::Knn);
        let service = DecisionService::start(&store, "knn").expect("start");

        let err = service.analyze(&request("other", 12.0)).unwrap_err();
        match err {
            AnalysisError::Validation(issues) => {
                assert!(issues.iter().any(|i| i.contains("other")));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_probability_is_rounded_at_boundary() {
        let (_dir, store) = store_with_artifact(ModelVariant::LogisticRegression);
        let service = DecisionService::start(&store, "logistic_regression").expect("start");

        let verdict = service
            .analyze(&request("female", 9.0))
            .expect("analysis succeeds");
        let scaled = verdict.anemia_probability * 10_000.0;
        assert!((scaled - scaled.round()).abs() < 1e-9);
    }

    #[test]
    fn test_concurrent_requests_share_one_artifact() {
        let (_dir, store) = store_with_artifact(ModelVariant::RandomForest);
        let service = DecisionService::start(&store, "random_forest").expect("start");

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let service = service.clone();
                    scope.spawn(move || {
                        let hb = 6.0 + f64::from(i);
                        service.analyze(&request("female", hb)).expect("analyzes")
                    })
                })
                .collect();
            for handle in handles {
                let verdict = handle.join().expect("no panic");
                assert!((0.0..=1.0).contains(&verdict.anemia_probability));
            }
        });
    }
}
