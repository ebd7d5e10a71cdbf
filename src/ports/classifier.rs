//! Classifier port: the capability every model family implements.
//!
//! Exactly three operations, so the benchmark harness, the trainer and the
//! decision service can treat all families interchangeably.

use ndarray::{ArrayView1, ArrayView2};

/// Error type for model fitting.
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error("Cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("Feature matrix has {rows} rows but {labels} labels")]
    ShapeMismatch { rows: usize, labels: usize },

    #[error("Training labels contain a single class; a binary classifier needs both")]
    SingleClass,
}

/// A binary classifier over the fixed clinical feature layout.
///
/// Fitting is deterministic: any internal randomness is derived from a seed
/// the variant carries, so refitting on identical data reproduces the same
/// artifact.
pub trait BinaryClassifier {
    /// Fit on a feature matrix and binary labels.
    ///
    /// # Errors
    /// Returns `TrainError` on empty, mismatched or single-class input.
    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[u8]) -> Result<(), TrainError>;

    /// Hard 0/1 prediction for one encoded feature vector.
    fn predict(&self, features: ArrayView1<'_, f64>) -> u8;

    /// Class-1 probability for one encoded feature vector.
    fn predict_probability(&self, features: ArrayView1<'_, f64>) -> f64;
}

/// Validate the common fit preconditions shared by every family.
pub(crate) fn check_fit_input(rows: usize, labels: &[u8]) -> Result<(), TrainError> {
    if rows == 0 {
        return Err(TrainError::EmptyTrainingSet);
    }
    if rows != labels.len() {
        return Err(TrainError::ShapeMismatch {
            rows,
            labels: labels.len(),
        });
    }
    Ok(())
}
