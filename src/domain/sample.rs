//! Clinical sample types for anemia screening.
//!
//! The five-field feature layout defined here is the single encoding used by
//! both the offline training pipeline and the online decision service.

use serde::{Deserialize, Serialize};

/// Patient gender, the only categorical input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Encoded as 1.0 in the feature vector.
    Male,
    /// Encoded as 0.0 in the feature vector.
    Female,
}

impl Gender {
    /// Numeric encoding consumed by every classifier.
    #[must_use]
    pub fn encoded(self) -> f64 {
        match self {
            Self::Male => 1.0,
            Self::Female => 0.0,
        }
    }

    /// Parse a gender cell or request field.
    ///
    /// Accepts `male`/`female` (case-insensitive) and the numeric `1`/`0`
    /// encoding used by the raw dataset.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "male" | "m" | "1" => Some(Self::Male),
            "female" | "f" | "0" => Some(Self::Female),
            _ => None,
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Male => write!(f, "male"),
            Self::Female => write!(f, "female"),
        }
    }
}

/// The five clinical measurements a screening request carries.
///
/// Feature order matches [`FEATURE_NAMES`]: gender, hemoglobin, MCH, MCHC,
/// MCV. Artifacts record this order at training time and refuse to score
/// vectors produced by a different layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalFeatures {
    /// Patient gender
    pub gender: Gender,

    /// Hemoglobin in g/dL
    pub hemoglobin: f64,

    /// Mean corpuscular hemoglobin in pg
    pub mch: f64,

    /// Mean corpuscular hemoglobin concentration in g/dL
    pub mchc: f64,

    /// Mean corpuscular volume in fL
    pub mcv: f64,
}

impl ClinicalFeatures {
    /// Encode into the fixed-order vector consumed by every classifier.
    ///
    /// This is the only place raw fields become a feature vector; training
    /// and serving both go through it.
    #[must_use]
    pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.gender.encoded(),
            self.hemoglobin,
            self.mch,
            self.mchc,
            self.mcv,
        ]
    }
}

/// A labeled observation from the screening dataset.
///
/// Immutable once constructed; the label is binary (1 = anemia present).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalSample {
    features: ClinicalFeatures,
    label: u8,
}

impl ClinicalSample {
    /// Create a labeled sample. The label must already be normalized to 0/1.
    #[must_use]
    pub fn new(features: ClinicalFeatures, label: u8) -> Self {
        debug_assert!(label <= 1, "labels are binary after normalization");
        Self { features, label }
    }

    /// The clinical measurements.
    #[must_use]
    pub fn features(&self) -> &ClinicalFeatures {
        &self.features
    }

    /// Binary anemia label.
    #[must_use]
    pub fn label(&self) -> u8 {
        self.label
    }
}

/// Number of features in the encoded vector.
pub const FEATURE_COUNT: usize = 5;

/// Feature names in encoding order. Persisted into every artifact as the
/// contract a serving process verifies before scoring.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["gender", "hemoglobin", "mch", "mchc", "mcv"];

#[cfg(test)]
mod tests {
    use super::*;

    fn features(gender: Gender) -> ClinicalFeatures {
        ClinicalFeatures {
            gender,
            hemoglobin: 13.2,
            mch: 27.5,
            mchc: 33.1,
            mcv: 88.0,
        }
    }

    #[test]
    fn test_gender_encoding() {
        assert!((Gender::Male.encoded() - 1.0).abs() < f64::EPSILON);
        assert!(Gender::Female.encoded().abs() < f64::EPSILON);
    }

    #[test]
    fn test_gender_parse() {
        assert_eq!(Gender::parse("male"), Some(Gender::Male));
        assert_eq!(Gender::parse(" FEMALE "), Some(Gender::Female));
        assert_eq!(Gender::parse("1"), Some(Gender::Male));
        assert_eq!(Gender::parse("0"), Some(Gender::Female));
        assert_eq!(Gender::parse("other"), None);
    }

    #[test]
    fn test_encoding_is_deterministic_and_ordered() {
        let f = features(Gender::Male);
        let a = f.to_vector();
        let b = f.to_vector();
        assert_eq!(a, b);
        assert_eq!(a, [1.0, 13.2, 27.5, 33.1, 88.0]);

        let f = features(Gender::Female);
        assert!(f.to_vector()[0].abs() < f64::EPSILON);
    }

    #[test]
    fn test_feature_names_match_vector_length() {
        assert_eq!(FEATURE_NAMES.len(), features(Gender::Male).to_vector().len());
    }
}
