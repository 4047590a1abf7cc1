//! # glucorisk
//!
//! Batch training and inference pipeline for diabetes risk classification
//! from eight routine patient measurements.
//!
//! This crate provides:
//! - Iterative (MICE-style) imputation of zero-coded missing measurements
//! - Deterministic clinical feature derivation
//! - Canonical column alignment and standardization
//! - SMOTE-balanced random forest training with held-out evaluation
//! - Artifact-backed single-record inference
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (patient records, feature frames, predictions, validation)
//! - `ports`: Trait definitions for external operations (artifact persistence)
//! - `adapters`: Concrete implementations (filesystem and in-memory stores, CSV loading)
//! - `ml`: Learning algorithms with no I/O
//! - `stages`: Pipeline stages binding algorithms to persisted artifacts
//! - `application`: Use cases (training pipeline, inference service)

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ml;
pub mod ports;
pub mod stages;

pub use application::{InferenceService, PipelineStage, TrainingOutcome, TrainingPipeline};
pub use config::PipelineConfig;
pub use domain::{FeatureFrame, PatientRecord, Prediction};

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for the pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Data file not found: {}", .0.display())]
    DataNotFound(std::path::PathBuf),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Missing artifact '{0}': run the training pipeline first")]
    MissingArtifact(String),

    #[error("Artifact '{0}' does not match the training manifest")]
    ArtifactCorrupted(String),

    #[error("Inference failed: {0}")]
    InferenceRuntime(String),

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl PipelineError {
    /// Whether a serving boundary should report this as a client (4xx) failure
    /// rather than an internal one.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::InferenceRuntime(_) | Self::MissingArtifact(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifact_message_mentions_training() {
        let err = PipelineError::MissingArtifact("mice_imputer".to_string());
        let msg = err.to_string();
        assert!(msg.contains("mice_imputer"));
        assert!(msg.contains("training"));
    }

    #[test]
    fn test_client_error_classification() {
        assert!(PipelineError::InferenceRuntime("boom".into()).is_client_error());
        assert!(PipelineError::Validation("bad".into()).is_client_error());
        assert!(!PipelineError::Training("bad".into()).is_client_error());
        assert!(!PipelineError::DataNotFound("x.csv".into()).is_client_error());
    }

    #[test]
    fn test_storage_error_converts() {
        let err: PipelineError = adapters::StorageError::NotFound("model".into()).into();
        assert!(matches!(err, PipelineError::Storage(_)));
    }
}
