//! Deterministic hemoglobin severity grading.
//!
//! WHO-style simplified thresholds. Only the no-anemia boundary is
//! gender-conditioned; the lower tier boundaries are shared across genders,
//! matching the clinical encoding this system was built against.

use serde::{Deserialize, Serialize};

use super::sample::Gender;

/// Severity tier derived from gender and hemoglobin alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Hemoglobin at or above the gender-specific healthy threshold.
    #[serde(rename = "sin_anemia")]
    SinAnemia,
    /// Mild anemia.
    #[serde(rename = "leve")]
    Leve,
    /// Moderate anemia.
    #[serde(rename = "moderada")]
    Moderada,
    /// Severe anemia.
    #[serde(rename = "severa")]
    Severa,
}

impl Severity {
    /// Grade a hemoglobin level (g/dL).
    ///
    /// Thresholds: male ≥ 13 / female ≥ 12 is healthy; ≥ 11 mild; ≥ 8
    /// moderate; below 8 severe. The lower boundaries are intentionally
    /// identical for both genders.
    #[must_use]
    pub fn grade(gender: Gender, hemoglobin: f64) -> Self {
        let healthy_threshold = match gender {
            Gender::Male => 13.0,
            Gender::Female => 12.0,
        };
        if hemoglobin >= healthy_threshold {
            Self::SinAnemia
        } else if hemoglobin >= 11.0 {
            Self::Leve
        } else if hemoglobin >= 8.0 {
            Self::Moderada
        } else {
            Self::Severa
        }
    }

    /// Dietary and care recommendations for this tier.
    ///
    /// The three base dietary items are always present; anemic tiers append
    /// one escalating care item.
    #[must_use]
    pub fn recommendations(&self) -> Vec<String> {
        let mut items: Vec<String> = BASE_RECOMMENDATIONS
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        match self {
            Self::SinAnemia => {}
            Self::Leve => items.push("Routine medical checkup recommended.".to_string()),
            Self::Moderada => {
                items.push("Consult a health professional soon.".to_string());
            }
            Self::Severa => items.push("Seek urgent medical care.".to_string()),
        }
        items
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SinAnemia => write!(f, "sin_anemia"),
            Self::Leve => write!(f, "leve"),
            Self::Moderada => write!(f, "moderada"),
            Self::Severa => write!(f, "severa"),
        }
    }
}

/// Dietary guidance included with every verdict regardless of tier.
pub const BASE_RECOMMENDATIONS: [&str; 3] = [
    "Maintain an iron-rich diet (red meat, spinach, lentils).",
    "Pair iron-rich meals with vitamin C to aid absorption (orange, kiwi).",
    "Avoid tea or coffee together with iron-rich meals.",
];
