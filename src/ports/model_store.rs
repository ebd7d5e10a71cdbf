//! Model store port: persistence seam for fitted artifacts.
//!
//! Artifacts are replaced wholesale on retraining; there is no in-place
//! patching. The serving side's loader is the read path of this same store.

use crate::models::ModelArtifact;

/// Trait for artifact persistence keyed by model variant name.
pub trait ModelStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist an artifact under its variant name, overwriting any previous
    /// artifact of that name.
    ///
    /// # Errors
    /// Returns error if the artifact cannot be written.
    fn save(&self, artifact: &ModelArtifact) -> Result<(), Self::Error>;

    /// Load the artifact stored under a variant name.
    ///
    /// # Errors
    /// Returns error if the artifact is absent or unreadable.
    fn load(&self, variant: &str) -> Result<ModelArtifact, Self::Error>;

    /// Whether an artifact exists under a variant name.
    ///
    /// # Errors
    /// Returns error if the store cannot be inspected.
    fn contains(&self, variant: &str) -> Result<bool, Self::Error>;

    /// Names of all stored artifacts.
    ///
    /// # Errors
    /// Returns error if the store cannot be enumerated.
    fn list(&self) -> Result<Vec<String>, Self::Error>;
}
