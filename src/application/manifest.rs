//! Artifact integrity manifest.
//!
//! Written last by a successful training run. Binds each of the four
//! inference artifacts to its SHA-256 so inference can refuse a mixed or
//! tampered artifact set.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ports::{names, ArtifactStore};
use crate::stages::{load_artifact, load_blob, save_artifact};
use crate::{PipelineError, Result};

const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    /// Artifact name -> lowercase hex SHA-256 of its stored bytes.
    pub files: BTreeMap<String, String>,
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

impl ArtifactManifest {
    /// Hash the required artifacts currently in `store`.
    ///
    /// # Errors
    /// Returns `MissingArtifact` if any required artifact is absent.
    pub fn from_store<S: ArtifactStore + ?Sized>(store: &S) -> Result<Self> {
        let mut files = BTreeMap::new();
        for name in names::REQUIRED {
            let bytes = load_blob(store, name)?;
            files.insert(name.to_string(), sha256_hex(&bytes));
        }
        Ok(Self {
            version: MANIFEST_VERSION,
            created_at: Utc::now(),
            files,
        })
    }

    /// # Errors
    /// Returns a storage or serialization error.
    pub fn save<S: ArtifactStore + ?Sized>(&self, store: &S) -> Result<()> {
        save_artifact(store, names::MANIFEST, self)
    }

    /// Load the manifest if one was written.
    ///
    /// # Errors
    /// Returns a storage or serialization error for an unreadable manifest.
    pub fn load<S: ArtifactStore + ?Sized>(store: &S) -> Result<Option<Self>> {
        if !store.exists(names::MANIFEST)? {
            return Ok(None);
        }
        load_artifact(store, names::MANIFEST).map(Some)
    }

    /// Check `bytes` against the recorded hash for `name`.
    ///
    /// # Errors
    /// Returns `ArtifactCorrupted` if `name` is unlisted or its hash differs.
    pub fn verify(&self, name: &str, bytes: &[u8]) -> Result<()> {
        match self.files.get(name) {
            Some(expected) if *expected == sha256_hex(bytes) => Ok(()),
            _ => Err(PipelineError::ArtifactCorrupted(name.to_string())),
        }
    }

    /// Verify every listed artifact currently in `store`.
    ///
    /// # Errors
    /// Returns `MissingArtifact` or `ArtifactCorrupted` for the first failure.
    pub fn verify_store<S: ArtifactStore + ?Sized>(&self, store: &S) -> Result<()> {
        for name in names::REQUIRED {
            let bytes = load_blob(store, name)?;
            self.verify(name, &bytes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryArtifactStore;

    fn populated() -> MemoryArtifactStore {
        let store = MemoryArtifactStore::new();
        for name in names::REQUIRED {
            store.save(name, name.as_bytes()).expect("Should save");
        }
        store
    }

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_manifest_verifies_untouched_store() {
        let store = populated();
        let manifest = ArtifactManifest::from_store(&store).expect("Should build");
        manifest.save(&store).expect("Should save");

        let loaded = ArtifactManifest::load(&store)
            .expect("Should load")
            .expect("Should exist");
        assert_eq!(loaded, manifest);
        loaded.verify_store(&store).expect("Should verify");
    }

    #[test]
    fn test_tampered_artifact_detected() {
        let store = populated();
        let manifest = ArtifactManifest::from_store(&store).expect("Should build");
        store.save(names::SCALER, b"tampered").expect("Should save");
        let result = manifest.verify_store(&store);
        assert!(matches!(result, Err(PipelineError::ArtifactCorrupted(name)) if name == names::SCALER));
    }

    #[test]
    fn test_missing_artifact_and_manifest() {
        let store = MemoryArtifactStore::new();
        assert!(ArtifactManifest::load(&store).expect("Should load").is_none());
        assert!(matches!(
            ArtifactManifest::from_store(&store),
            Err(PipelineError::MissingArtifact(_))
        ));
    }
}
