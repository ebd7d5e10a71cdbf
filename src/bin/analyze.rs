//! One-shot analysis tool: load a stored artifact and score a single
//! request.
//!
//! The request arrives as JSON, either as the first argument or on stdin:
//!
//! ```text
//! analyze '{"gender":"female","hemoglobin":7.0,"mch":20,"mchc":30,"mcv":80}'
//! ```
//!
//! The verdict is printed as JSON. A validation failure prints a structured
//! rejection and exits with status 2; everything else is fatal.

use std::io::Read;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hemoscreen::adapters::FsModelStore;
use hemoscreen::application::{AnalysisError, DecisionService};
use hemoscreen::domain::AnalysisRequest;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let model_dir =
        std::env::var("HEMOSCREEN_MODEL_DIR").unwrap_or_else(|_| "artifacts".to_string());
    let variant =
        std::env::var("HEMOSCREEN_SERVE_VARIANT").unwrap_or_else(|_| "random_forest".to_string());

    let raw = match std::env::args().nth(1) {
        Some(arg) => arg,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("reading request from stdin")?;
            buffer
        }
    };
    let request: AnalysisRequest =
        serde_json::from_str(&raw).context("request is not valid JSON")?;

    // The artifact must load before any request is considered.
    let store = FsModelStore::open(&model_dir)?;
    let service = DecisionService::start(&store, &variant)
        .with_context(|| format!("loading artifact '{variant}' from {model_dir}"))?;

    match service.analyze(&request) {
        Ok(verdict) => {
            println!("{}", serde_json::to_string_pretty(&verdict)?);
            Ok(())
        }
        Err(AnalysisError::Validation(issues)) => {
            let rejection = serde_json::json!({
                "error": "validation",
                "issues": issues,
            });
            println!("{}", serde_json::to_string_pretty(&rejection)?);
            std::process::exit(2);
        }
        Err(other) => Err(other.into()),
    }
}
