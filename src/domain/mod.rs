//! Domain layer: core screening types and logic.
//!
//! Pure types and deterministic rules only. Everything here is shared
//! verbatim between the offline training pipeline and the online decision
//! service, so the two sides can never drift apart.

mod dataset;
mod metrics;
mod sample;
mod severity;
mod verdict;

pub use dataset::{stratified_folds, stratified_split, Dataset, Partition};
pub use metrics::{roc_curve, ClassificationMetrics, ConfusionCounts, RocCurve, RocPoint};
pub use sample::{ClinicalFeatures, ClinicalSample, Gender, FEATURE_COUNT, FEATURE_NAMES};
pub use severity::{Severity, BASE_RECOMMENDATIONS};
pub use verdict::{AnalysisRequest, Verdict};
