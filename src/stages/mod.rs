//! Pipeline stages.
//!
//! Each stage owns one step of feature preparation or training and, where it
//! is stateful, the artifact that step persists. Training calls the fitting
//! entry point (`fit_transform` / `fit` / `train`); inference calls
//! `transform`, which only reads.

mod aligner;
mod features;
mod imputer;
mod trainer;

pub use aligner::{align_and_scale, FeatureAligner};
pub use features::{FeatureDeriver, DERIVED_FEATURES};
pub use imputer::{Imputer, ImputerArtifact};
pub use trainer::ModelTrainer;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::adapters::StorageError;
use crate::domain::{FeatureFrame, LABEL};
use crate::ports::ArtifactStore;
use crate::{PipelineError, Result};

/// Serialize `value` as JSON and store it under `name`.
pub(crate) fn save_artifact<S, T>(store: &S, name: &str, value: &T) -> Result<()>
where
    S: ArtifactStore + ?Sized,
    T: Serialize,
{
    let bytes = serde_json::to_vec(value)?;
    store.save(name, &bytes)?;
    tracing::debug!("Saved artifact '{name}' ({} bytes)", bytes.len());
    Ok(())
}

/// Load and deserialize the artifact stored under `name`.
///
/// An absent artifact becomes `MissingArtifact`.
pub(crate) fn load_artifact<S, T>(store: &S, name: &str) -> Result<T>
where
    S: ArtifactStore + ?Sized,
    T: DeserializeOwned,
{
    let bytes = load_blob(store, name)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Raw artifact bytes; absence becomes `MissingArtifact`.
pub(crate) fn load_blob<S>(store: &S, name: &str) -> Result<Vec<u8>>
where
    S: ArtifactStore + ?Sized,
{
    store.load(name).map_err(|e| match e {
        StorageError::NotFound(name) => PipelineError::MissingArtifact(name),
        other => PipelineError::Storage(other),
    })
}

/// Leakage guard: drop the label column if a stage was handed one.
pub(crate) fn drop_label(frame: &mut FeatureFrame, stage: &str) {
    if frame.drop_column(LABEL) {
        tracing::warn!("{stage}: dropped '{LABEL}' column from features to prevent label leakage");
    }
}
