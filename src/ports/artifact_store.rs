//! Artifact store port: Trait for persisting fitted pipeline state.
//!
//! This trait abstracts where fitted artifacts live (a directory, memory)
//! from the stages that write and read them. Each artifact is an opaque blob
//! addressed by name.

use crate::adapters::StorageError;

/// Artifact names written by the training pipeline.
pub mod names {
    pub const IMPUTER: &str = "mice_imputer";
    pub const SCALER: &str = "scaler";
    pub const COLUMNS: &str = "columns";
    pub const MODEL: &str = "model";
    pub const MANIFEST: &str = "manifest";

    /// The four artifacts inference needs, in the order they are written.
    pub const REQUIRED: [&str; 4] = [IMPUTER, SCALER, COLUMNS, MODEL];
}

/// Trait for named blob persistence.
///
/// A training run is the only writer; inference only reads. Implementations
/// replace whole blobs, so a reader never observes a partial write of the
/// same store after training completes.
pub trait ArtifactStore: Send + Sync {
    /// Save (or replace) the blob stored under `name`.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn save(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Load the blob stored under `name`.
    ///
    /// # Errors
    /// Returns `StorageError::NotFound` if nothing is stored under `name`.
    fn load(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Check if an artifact exists.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn exists(&self, name: &str) -> Result<bool, StorageError>;

    /// Remove every artifact, leaving an empty, usable store.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn clear(&self) -> Result<(), StorageError>;

    /// List stored artifact names.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn list(&self) -> Result<Vec<String>, StorageError>;
}
