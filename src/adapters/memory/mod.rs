//! In-memory adapter: Implementation of ArtifactStore for tests and
//! embedding, where no filesystem access is wanted.
//!
//! # Lock Behavior
//!
//! The map is protected by `RwLock`. A poisoned lock (from a panic in another
//! thread) causes a panic here as well.

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::fs::check_name;
use super::StorageError;
use crate::ports::ArtifactStore;

/// Artifact store holding blobs in a map.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    blobs: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryArtifactStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        check_name(name)?;
        let mut blobs = self.blobs.write().expect("Lock failed");
        blobs.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let blobs = self.blobs.read().expect("Lock failed");
        blobs
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    fn exists(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.blobs.read().expect("Lock failed").contains_key(name))
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.blobs.write().expect("Lock failed").clear();
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.blobs.read().expect("Lock failed").keys().cloned().collect())
    }
}
