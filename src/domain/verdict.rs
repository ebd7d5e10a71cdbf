//! Serving boundary types: the analysis request and the composed verdict.

use serde::{Deserialize, Serialize};

use super::sample::{ClinicalFeatures, Gender};
use super::severity::Severity;

/// Raw inference request as received from the transport layer.
///
/// Nothing here is trusted: `validate` runs before the request reaches
/// feature encoding or the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// "male" or "female"
    pub gender: String,
    /// Hemoglobin in g/dL
    pub hemoglobin: f64,
    /// Mean corpuscular hemoglobin in pg
    pub mch: f64,
    /// Mean corpuscular hemoglobin concentration in g/dL
    pub mchc: f64,
    /// Mean corpuscular volume in fL
    pub mcv: f64,
}

impl AnalysisRequest {
    /// Validate the request into typed clinical features.
    ///
    /// # Errors
    /// Returns every issue found, not just the first, so a caller can fix
    /// the whole request in one round trip.
    pub fn validate(&self) -> Result<ClinicalFeatures, Vec<String>> {
        let mut issues = Vec::new();

        let gender = Gender::parse(&self.gender);
        if gender.is_none() {
            issues.push(format!(
                "gender '{}' must be one of 'male' or 'female'",
                self.gender
            ));
        }
        for (name, value) in [
            ("hemoglobin", self.hemoglobin),
            ("mch", self.mch),
            ("mchc", self.mchc),
            ("mcv", self.mcv),
        ] {
            if !value.is_finite() {
                issues.push(format!("{name} must be a finite number, got {value}"));
            }
        }

        match gender {
            Some(gender) if issues.is_empty() => Ok(ClinicalFeatures {
                gender,
                hemoglobin: self.hemoglobin,
                mch: self.mch,
                mchc: self.mchc,
                mcv: self.mcv,
            }),
            _ => Err(issues),
        }
    }
}

/// The structured verdict returned for one analysis request.
///
/// Created per request and discarded; the core never persists verdicts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// Model's hard prediction
    pub has_anemia: bool,
    /// Deterministic severity tier from gender + hemoglobin
    pub severity_tier: Severity,
    /// Class-1 probability, rounded to 4 decimals at this boundary only
    pub anemia_probability: f64,
    /// Human-readable summary of the model prediction
    pub message: String,
    /// Base dietary guidance plus the tier's care escalation
    pub recommendations: Vec<String>,
    /// Echo of the validated input
    pub input_echo: ClinicalFeatures,
}

impl Verdict {
    /// Compose a verdict from the model output and the severity grading.
    #[must_use]
    pub fn compose(features: ClinicalFeatures, predicted_label: u8, probability: f64) -> Self {
        let has_anemia = predicted_label == 1;
        let severity_tier = Severity::grade(features.gender, features.hemoglobin);
        Self {
            has_anemia,
            severity_tier,
            anemia_probability: round_probability(probability),
            message: if has_anemia {
                "model suggests anemia present".to_string()
            } else {
                "no indication of anemia".to_string()
            },
            recommendations: severity_tier.recommendations(),
            input_echo: features,
        }
    }
}

/// Round to 4 decimal places. Applied exactly once, at the serving boundary.
fn round_probability(probability: f64) -> f64 {
    (probability * 10_000.0).round() / 10_000.0
}
