//! # Hemoscreen
//!
//! Anemia screening from five clinical measurements, combining a
//! deterministic guideline-based severity grading with a learned
//! probabilistic classifier.
//!
//! This crate provides:
//! - The offline harness that ingests the dataset, benchmarks six
//!   classifier families under repeated stratified cross-validation,
//!   refits them on the full train partition and evaluates the persisted
//!   artifacts on an untouched holdout
//! - The per-request decision pipeline a serving layer invokes: input
//!   validation, feature encoding, model inference, severity grading and
//!   recommendation selection composed into one verdict
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core screening types (samples, severity rules, datasets,
//!   metrics, verdicts)
//! - `ports`: Trait definitions (classifier capability, artifact store)
//! - `models`: The six classifier families and their artifacts
//! - `adapters`: Concrete integrations (CSV ingestion, filesystem store)
//! - `application`: Use cases orchestrating domain and ports

pub mod adapters;
pub mod application;
pub mod domain;
pub mod models;
pub mod ports;

pub use application::{AnalysisError, DecisionService};
pub use domain::{AnalysisRequest, Gender, Severity, Verdict};

/// Result type for hemoscreen operations
pub type Result<T> = std::result::Result<T, HemoscreenError>;

/// Main error type for hemoscreen
#[derive(Debug, thiserror::Error)]
pub enum HemoscreenError {
    #[error("Dataset error: {0}")]
    Dataset(#[from] adapters::DatasetError),

    #[error("Artifact store error: {0}")]
    Store(#[from] adapters::StoreError),

    #[error("Training failed: {0}")]
    Training(#[from] ports::TrainError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] application::AnalysisError),

    #[error("Expected a {expected} dataset, got {found}")]
    WrongPartition {
        expected: domain::Partition,
        found: domain::Partition,
    },

    #[error("Worker failure: {0}")]
    Worker(String),
}
