//! Application layer: Use cases and services.
//!
//! This module orchestrates the pipeline stages with the artifact store to
//! implement the two use cases: batch training and single-record inference.

mod inference;
mod manifest;
mod training;

pub use inference::InferenceService;
pub use manifest::ArtifactManifest;
pub use training::{PipelineStage, TrainingOutcome, TrainingPipeline};

use std::path::Path;

use crate::adapters::{FsArtifactStore, StorageError};
use crate::ports::{names, ArtifactStore};
use crate::{PipelineError, Result};

/// Open a trained artifact directory for reading.
///
/// # Errors
/// Returns `MissingArtifact` if the directory does not exist, meaning
/// training has not run there.
pub fn open_artifact_dir(dir: &Path) -> Result<FsArtifactStore> {
    FsArtifactStore::open_existing(dir).map_err(|e| match e {
        StorageError::NotFound(_) => {
            tracing::warn!("Artifact directory {} does not exist", dir.display());
            PipelineError::MissingArtifact(names::IMPUTER.to_string())
        }
        other => PipelineError::Storage(other),
    })
}

/// Check the stored artifacts against the training manifest.
///
/// # Errors
/// Returns `MissingArtifact` if there is no manifest or an artifact is
/// absent, `ArtifactCorrupted` on a hash mismatch.
pub fn verify_artifacts<S: ArtifactStore + ?Sized>(store: &S) -> Result<ArtifactManifest> {
    let manifest = ArtifactManifest::load(store)?
        .ok_or_else(|| PipelineError::MissingArtifact(names::MANIFEST.to_string()))?;
    manifest.verify_store(store)?;
    tracing::info!(
        "Verified {} artifacts from training run at {}",
        manifest.files.len(),
        manifest.created_at
    );
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_artifact_dir_is_missing_artifact() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let err = open_artifact_dir(&dir.path().join("artifacts")).expect_err("Should fail");
        assert!(matches!(&err, PipelineError::MissingArtifact(name) if name == names::IMPUTER));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_existing_artifact_dir_opens() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let store = open_artifact_dir(dir.path()).expect("Should open");
        assert!(store.list().expect("Should list").is_empty());
    }

    #[test]
    fn test_verify_without_manifest_is_missing_artifact() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let store = open_artifact_dir(dir.path()).expect("Should open");
        assert!(matches!(
            verify_artifacts(&store),
            Err(PipelineError::MissingArtifact(name)) if name == names::MANIFEST
        ));
    }
}
