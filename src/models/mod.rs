//! Classifier families and the artifacts their fitting produces.
//!
//! Six families compete in the benchmark; all of them implement the
//! [`BinaryClassifier`] port so the harness, trainer and decision service
//! treat them interchangeably. Fitted state serializes into a
//! [`ModelArtifact`] together with the feature-order contract it was
//! trained against.

mod boosting;
mod forest;
mod knn;
mod linear;
mod scaler;
mod svm;
mod tree;

use chrono::{DateTime, Utc};
use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::domain::FEATURE_NAMES;
use crate::ports::{BinaryClassifier, TrainError};

pub use boosting::GradientBoostingClassifier;
pub use forest::RandomForestClassifier;
pub use knn::KnnClassifier;
pub use linear::LogisticRegressionClassifier;
pub use scaler::StandardScaler;
pub use svm::SvcRbfClassifier;
pub use tree::DecisionTreeClassifier;

/// The fixed roster of competing model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    /// Gradient-boosted trees with logistic loss.
    GradientBoosting,
    /// Bootstrap-aggregated gini trees.
    RandomForest,
    /// Single CART tree grown to purity.
    DecisionTree,
    /// Standardized L2 logistic regression.
    LogisticRegression,
    /// Standardized RBF SVM with Platt probabilities.
    SvcRbf,
    /// Standardized distance-weighted k-NN.
    Knn,
}

impl ModelVariant {
    /// Every variant, in benchmark order.
    pub const ROSTER: [Self; 6] = [
        Self::GradientBoosting,
        Self::RandomForest,
        Self::DecisionTree,
        Self::LogisticRegression,
        Self::SvcRbf,
        Self::Knn,
    ];

    /// Stable name used as the artifact key.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::GradientBoosting => "gradient_boosting",
            Self::RandomForest => "random_forest",
            Self::DecisionTree => "decision_tree",
            Self::LogisticRegression => "logistic_regression",
            Self::SvcRbf => "svc_rbf",
            Self::Knn => "knn",
        }
    }

    /// Reverse of [`Self::name`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ROSTER.into_iter().find(|v| v.name() == name)
    }

    /// Fit this family on a feature matrix.
    ///
    /// Stochastic families derive all randomness from `seed`, so refitting
    /// on identical data reproduces the identical model.
    ///
    /// # Errors
    /// Returns `TrainError` if the family cannot be fitted on this input.
    pub fn fit(
        self,
        features: ArrayView2<'_, f64>,
        labels: &[u8],
        seed: u64,
    ) -> Result<FittedModel, TrainError> {
        match self {
            Self::GradientBoosting => {
                let mut model = GradientBoostingClassifier::new();
                model.fit(features, labels)?;
                Ok(FittedModel::GradientBoosting(model))
            }
            Self::RandomForest => {
                let mut model = RandomForestClassifier::new(seed);
                model.fit(features, labels)?;
                Ok(FittedModel::RandomForest(model))
            }
            Self::DecisionTree => {
                let mut model = DecisionTreeClassifier::default();
                model.fit(features, labels)?;
                Ok(FittedModel::DecisionTree(model))
            }
            Self::LogisticRegression => {
                let mut model = LogisticRegressionClassifier::default();
                model.fit(features, labels)?;
                Ok(FittedModel::LogisticRegression(model))
            }
            Self::SvcRbf => {
                let mut model = SvcRbfClassifier::new(seed);
                model.fit(features, labels)?;
                Ok(FittedModel::SvcRbf(model))
            }
            Self::Knn => {
                let mut model = KnnClassifier::new();
                model.fit(features, labels)?;
                Ok(FittedModel::Knn(model))
            }
        }
    }
}

impl std::fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The fitted state of one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", content = "parameters", rename_all = "snake_case")]
pub enum FittedModel {
    GradientBoosting(GradientBoostingClassifier),
    RandomForest(RandomForestClassifier),
    DecisionTree(DecisionTreeClassifier),
    LogisticRegression(LogisticRegressionClassifier),
    SvcRbf(SvcRbfClassifier),
    Knn(KnnClassifier),
}

impl FittedModel {
    /// Hard 0/1 prediction.
    #[must_use]
    pub fn predict(&self, features: ArrayView1<'_, f64>) -> u8 {
        match self {
            Self::GradientBoosting(m) => m.predict(features),
            Self::RandomForest(m) => m.predict(features),
            Self::DecisionTree(m) => m.predict(features),
            Self::LogisticRegression(m) => m.predict(features),
            Self::SvcRbf(m) => m.predict(features),
            Self::Knn(m) => m.predict(features),
        }
    }

    /// Class-1 probability.
    #[must_use]
    pub fn predict_probability(&self, features: ArrayView1<'_, f64>) -> f64 {
        match self {
            Self::GradientBoosting(m) => m.predict_probability(features),
            Self::RandomForest(m) => m.predict_probability(features),
            Self::DecisionTree(m) => m.predict_probability(features),
            Self::LogisticRegression(m) => m.predict_probability(features),
            Self::SvcRbf(m) => m.predict_probability(features),
            Self::Knn(m) => m.predict_probability(features),
        }
    }
}

/// A persisted model: fitted state plus the contract it was trained under.
///
/// Owned by the artifact store; serving processes hold a shared read-only
/// reference after loading. Replaced wholesale on retraining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Roster name this artifact was fitted from
    pub variant: String,
    /// Feature order the model was trained against
    pub feature_names: Vec<String>,
    /// Number of training samples used for the final refit
    pub trained_on: usize,
    /// When the refit happened
    pub trained_at: DateTime<Utc>,
    /// The fitted model itself
    pub model: FittedModel,
}

impl ModelArtifact {
    /// Wrap a freshly fitted model with the current encoder contract.
    #[must_use]
    pub fn new(variant: ModelVariant, model: FittedModel, trained_on: usize) -> Self {
        Self {
            variant: variant.name().to_string(),
            feature_names: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
            trained_on,
            trained_at: Utc::now(),
            model,
        }
    }

    /// Whether the recorded feature order matches the running encoder.
    /// A mismatch means training and serving builds have drifted apart.
    #[must_use]
    pub fn matches_feature_layout(&self) -> bool {
        self.feature_names.len() == FEATURE_NAMES.len()
            && self
                .feature_names
                .iter()
                .zip(FEATURE_NAMES.iter())
                .all(|(stored, current)| stored == current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn training_data() -> (Array2<f64>, Vec<u8>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..30 {
            let jitter = (i % 5) as f64 * 0.05;
            // Anemic: low hemoglobin, smaller cells.
            rows.extend_from_slice(&[f64::from(i % 2), 8.0 + jitter, 22.0, 29.0, 72.0 + jitter]);
            labels.push(1);
            // Healthy: normal hemoglobin.
            rows.extend_from_slice(&[f64::from(i % 2), 14.5 + jitter, 29.0, 33.5, 90.0 - jitter]);
            labels.push(0);
        }
        (Array2::from_shape_vec((60, 5), rows).unwrap(), labels)
    }

    #[test]
    fn test_roster_names_round_trip() {
        for variant in ModelVariant::ROSTER {
            assert_eq!(ModelVariant::from_name(variant.name()), Some(variant));
        }
        assert_eq!(ModelVariant::from_name("bogus"), None);
    }

    #[test]
    fn test_every_variant_fits_and_scores() {
        let (x, y) = training_data();
        for variant in ModelVariant::ROSTER {
            let model = variant.fit(x.view(), &y, 42).expect("fit succeeds");
            let anemic = x.row(0);
            let healthy = x.row(1);
            let p_anemic = model.predict_probability(anemic);
            let p_healthy = model.predict_probability(healthy);
            assert!(
                (0.0..=1.0).contains(&p_anemic) && (0.0..=1.0).contains(&p_healthy),
                "{variant}: probabilities out of range"
            );
            assert!(
                p_anemic > p_healthy,
                "{variant}: anemic row should score higher ({p_anemic} vs {p_healthy})"
            );
            assert_eq!(model.predict(anemic), 1, "{variant}");
            assert_eq!(model.predict(healthy), 0, "{variant}");
        }
    }

    #[test]
    fn test_artifact_records_feature_contract() {
        let (x, y) = training_data();
        let model = ModelVariant::DecisionTree
            .fit(x.view(), &y, 42)
            .expect("fit succeeds");
        let artifact = ModelArtifact::new(ModelVariant::DecisionTree, model, y.len());

        assert_eq!(artifact.variant, "decision_tree");
        assert_eq!(artifact.trained_on, 60);
        assert!(artifact.matches_feature_layout());

        let mut drifted = artifact.clone();
        drifted.feature_names.swap(1, 2);
        assert!(!drifted.matches_feature_layout());
    }

    #[test]
    fn test_artifact_json_round_trip_preserves_predictions() {
        let (x, y) = training_data();
        for variant in [ModelVariant::RandomForest, ModelVariant::SvcRbf] {
            let model = variant.fit(x.view(), &y, 42).expect("fit succeeds");
            let artifact = ModelArtifact::new(variant, model, y.len());

            let json = serde_json::to_string(&artifact).expect("serializes");
            let restored: ModelArtifact = serde_json::from_str(&json).expect("deserializes");

            for row in x.rows() {
                assert_eq!(artifact.model.predict(row), restored.model.predict(row));
                let a = artifact.model.predict_probability(row);
                let b = restored.model.predict_probability(row);
                assert!((a - b).abs() < 1e-15, "{variant}: {a} vs {b}");
            }
        }
    }
}
