//! Application layer: use cases orchestrating domain, models and ports.

mod benchmark;
mod decision;
mod evaluation;
mod training;

pub use benchmark::{BenchmarkConfig, BenchmarkHarness, FoldMetrics, LeaderboardRow};
pub use decision::{AnalysisError, DecisionService};
pub use evaluation::{EvaluationRecord, HoldoutEvaluator};
pub use training::Trainer;
