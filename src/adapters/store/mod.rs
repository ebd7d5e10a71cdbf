//! Filesystem artifact store: one JSON document per model variant.
//!
//! `save` replaces the document wholesale; there is no in-place mutation of
//! a persisted model. The serving process loads through the same adapter.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::ModelArtifact;
use crate::ports::ModelStore;

/// Error type for artifact store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No artifact stored under '{0}'")]
    MissingArtifact(String),

    #[error("Artifact '{name}' is unreadable: {source}")]
    Corrupt {
        name: String,
        source: serde_json::Error,
    },

    #[error("Failed to serialize artifact '{name}': {source}")]
    Serialization {
        name: String,
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Artifact store backed by a directory of `<variant>.json` files.
pub struct FsModelStore {
    directory: PathBuf,
}

impl FsModelStore {
    /// Open (creating if needed) a store at the given directory.
    ///
    /// # Errors
    /// Returns error if the directory cannot be created.
    pub fn open<P: AsRef<Path>>(directory: P) -> Result<Self, StoreError> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)?;
        Ok(Self { directory })
    }

    fn artifact_path(&self, variant: &str) -> PathBuf {
        self.directory.join(format!("{variant}.json"))
    }
}

impl ModelStore for FsModelStore {
    type Error = StoreError;

    fn save(&self, artifact: &ModelArtifact) -> Result<(), Self::Error> {
        let json =
            serde_json::to_vec(artifact).map_err(|source| StoreError::Serialization {
                name: artifact.variant.clone(),
                source,
            })?;
        let path = self.artifact_path(&artifact.variant);
        fs::write(&path, json)?;
        tracing::debug!(variant = %artifact.variant, path = %path.display(), "artifact saved");
        Ok(())
    }

    fn load(&self, variant: &str) -> Result<ModelArtifact, Self::Error> {
        let path = self.artifact_path(variant);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::MissingArtifact(variant.to_string()));
            }
            Err(e) => return Err(StoreError::Io(e)),
        };
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            name: variant.to_string(),
            source,
        })
    }

    fn contains(&self, variant: &str) -> Result<bool, Self::Error> {
        Ok(self.artifact_path(variant).exists())
    }

    fn list(&self) -> Result<Vec<String>, Self::Error> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelVariant;
    use ndarray::Array2;

    fn fitted_artifact(variant: ModelVariant) -> ModelArtifact {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..10 {
            rows.extend_from_slice(&[f64::from(i % 2), 9.0, 22.0, 30.0, 78.0]);
            labels.push(1);
            rows.extend_from_slice(&[f64::from(i % 2), 14.0, 28.0, 33.0, 90.0]);
            labels.push(0);
        }
        let x = Array2::from_shape_vec((20, 5), rows).unwrap();
        let model = variant.fit(x.view(), &labels, 42).expect("fit succeeds");
        ModelArtifact::new(variant, model, labels.len())
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsModelStore::open(dir.path()).expect("open");

        let artifact = fitted_artifact(ModelVariant::DecisionTree);
        store.save(&artifact).expect("save");

        let loaded = store.load("decision_tree").expect("load");
        assert_eq!(loaded, artifact);
        assert!(store.contains("decision_tree").expect("contains"));
    }

    #[test]
    fn test_missing_artifact_is_distinguished() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsModelStore::open(dir.path()).expect("open");

        let err = store.load("random_forest").unwrap_err();
        assert!(matches!(err, StoreError::MissingArtifact(name) if name == "random_forest"));
        assert!(!store.contains("random_forest").expect("contains"));
    }

    #[test]
    fn test_corrupt_artifact_is_distinguished() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsModelStore::open(dir.path()).expect("open");
        std::fs::write(dir.path().join("knn.json"), b"not json at all").expect("write");

        let err = store.load("knn").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { name, .. } if name == "knn"));
    }

    #[test]
    fn test_save_overwrites_previous_artifact() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FsModelStore::open(dir.path()).expect("open");

        let first = fitted_artifact(ModelVariant::Knn);
        store.save(&first).expect("save");
        let second = fitted_artifact(ModelVariant::Knn);
        store.save(&second).expect("save again");

        let loaded = store.load("knn").expect("load");
        assert_eq!(loaded.trained_at, second.trained_at);
        assert_eq!(store.list().expect("list"), vec!["knn"]);
    }
}
