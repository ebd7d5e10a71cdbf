//! Hemoscreen offline pipeline.
//!
//! Ingests the screening dataset, freezes a stratified 90/10 split,
//! benchmarks the variant roster under 5-fold cross-validation, refits and
//! persists every variant, then evaluates the artifacts on the holdout and
//! writes the delimited report tables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hemoscreen::adapters::dataset::{load_clinical_csv, write_partition_csv};
use hemoscreen::adapters::FsModelStore;
use hemoscreen::application::{
    BenchmarkConfig, BenchmarkHarness, EvaluationRecord, HoldoutEvaluator, LeaderboardRow,
    Trainer,
};
use hemoscreen::domain::{stratified_split, RocCurve};

const HOLDOUT_FRACTION: f64 = 0.10;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let dataset_path = env_path("HEMOSCREEN_DATASET", "data/anemia.csv");
    let model_dir = env_path("HEMOSCREEN_MODEL_DIR", "artifacts");
    let report_dir = env_path("HEMOSCREEN_REPORT_DIR", "reports");
    let seed: u64 = std::env::var("HEMOSCREEN_SEED")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(42);

    tracing::info!(dataset = %dataset_path.display(), seed, "starting offline pipeline");
    std::fs::create_dir_all(&report_dir)
        .with_context(|| format!("creating {}", report_dir.display()))?;

    // Ingest and freeze the split.
    let samples = load_clinical_csv(&dataset_path)
        .with_context(|| format!("loading {}", dataset_path.display()))?;
    let (train, holdout) = stratified_split(samples, HOLDOUT_FRACTION, seed);
    tracing::info!(
        train = train.len(),
        holdout = holdout.len(),
        train_ratio = train.positive_ratio(),
        holdout_ratio = holdout.positive_ratio(),
        "stratified split complete"
    );
    write_partition_csv(&report_dir.join("train_90.csv"), &train)?;
    write_partition_csv(&report_dir.join("holdout_10.csv"), &holdout)?;

    // Cross-validated comparison on the train partition only.
    let harness = BenchmarkHarness::new(BenchmarkConfig { folds: 5, seed });
    let mut leaderboard = harness.run(&train)?;
    // Reporting convention: F1 ascending, strongest model last.
    leaderboard.sort_by(|a, b| {
        a.mean
            .f1
            .partial_cmp(&b.mean.f1)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    write_leaderboard(&report_dir.join("leaderboard_cv_train90.csv"), &leaderboard)?;

    // Final refit on the whole train partition.
    let store = FsModelStore::open(&model_dir)?;
    let stored = Trainer::new(seed).train_and_store(&store, &train)?;
    tracing::info!(artifacts = stored.len(), dir = %model_dir.display(), "refit complete");

    // Single-pass holdout evaluation, ranked by F1.
    let evaluator = HoldoutEvaluator;
    let records = evaluator.evaluate_all(&store, &holdout)?;
    write_evaluation(&report_dir.join("evaluation_holdout10.csv"), &records)?;

    if let Some(best) = records.first() {
        let roc = evaluator.roc(&store, &holdout, &best.variant)?;
        write_roc(&report_dir.join(format!("roc_{}_holdout10.csv", best.variant)), &roc)?;
        tracing::info!(variant = %best.variant, auc = roc.auc, "holdout ROC written");
    }

    tracing::info!("offline pipeline finished");
    Ok(())
}

fn env_path(name: &str, default: &str) -> PathBuf {
    std::env::var(name).unwrap_or_else(|_| default.to_string()).into()
}

fn write_leaderboard(path: &Path, rows: &[LeaderboardRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["model", "accuracy", "precision", "recall", "f1"])?;
    for row in rows {
        writer.write_record(&[
            row.variant.clone(),
            row.mean.accuracy.to_string(),
            row.mean.precision.to_string(),
            row.mean.recall.to_string(),
            row.mean.f1.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_evaluation(path: &Path, records: &[EvaluationRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "model", "accuracy", "precision", "recall", "f1", "tp", "fp", "tn", "fn",
    ])?;
    for record in records {
        writer.write_record(&[
            record.variant.clone(),
            record.metrics.accuracy.to_string(),
            record.metrics.precision.to_string(),
            record.metrics.recall.to_string(),
            record.metrics.f1.to_string(),
            record.confusion.true_positive.to_string(),
            record.confusion.false_positive.to_string(),
            record.confusion.true_negative.to_string(),
            record.confusion.false_negative.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_roc(path: &Path, roc: &RocCurve) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["threshold", "fpr", "tpr"])?;
    for point in &roc.points {
        writer.write_record(&[
            point.threshold.to_string(),
            point.fpr.to_string(),
            point.tpr.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
