//! Inference service: Scores single patient records with trained artifacts.
//!
//! This service coordinates:
//! - Artifact loading and manifest verification
//! - Request validation
//! - Imputation, feature derivation and alignment (transform mode only)
//! - Thresholded prediction

use crate::config::PipelineConfig;
use crate::domain::{FeatureFrame, PatientRecord, Prediction};
use crate::ml::{RandomForest, StandardScaler};
use crate::ports::{names, ArtifactStore};
use crate::stages::{align_and_scale, load_blob, FeatureDeriver, ImputerArtifact};
use crate::{PipelineError, Result};

use super::manifest::ArtifactManifest;

/// Service for scoring patient records against a trained artifact set.
///
/// # Artifact Lifetime
///
/// The four artifacts are read once in [`InferenceService::load`] and held
/// read-only and the store is not kept. Retraining does not affect a loaded
/// service; load a new one.
pub struct InferenceService {
    imputer: ImputerArtifact,
    min_insulin: f64,
    deriver: FeatureDeriver,
    columns: Vec<String>,
    scaler: StandardScaler,
    model: RandomForest,
    threshold: f64,
}

fn decode<S, T>(
    store: &S,
    manifest: Option<&ArtifactManifest>,
    name: &str,
) -> Result<T>
where
    S: ArtifactStore + ?Sized,
    T: serde::de::DeserializeOwned,
{
    let bytes = load_blob(store, name)?;
    if let Some(manifest) = manifest {
        manifest.verify(name, &bytes)?;
    }
    Ok(serde_json::from_slice(&bytes)?)
}

impl InferenceService {
    /// Load and verify the trained artifacts.
    ///
    /// # Errors
    /// Returns `MissingArtifact` if training has not run, `ArtifactCorrupted`
    /// if an artifact does not match the manifest or the artifacts disagree
    /// on feature width.
    pub fn load<S: ArtifactStore + ?Sized>(store: &S, config: &PipelineConfig) -> Result<Self> {
        tracing::info!("Loading inference artifacts...");

        let manifest = ArtifactManifest::load(store)?;
        match &manifest {
            Some(m) => tracing::info!("Verifying artifacts against manifest from {}", m.created_at),
            None => tracing::warn!("No artifact manifest found, skipping integrity check"),
        }
        let manifest = manifest.as_ref();

        let imputer: ImputerArtifact = decode(store, manifest, names::IMPUTER)?;
        let scaler: StandardScaler = decode(store, manifest, names::SCALER)?;
        let columns: Vec<String> = decode(store, manifest, names::COLUMNS)?;
        let model: RandomForest = decode(store, manifest, names::MODEL)?;

        if scaler.n_features() != columns.len() {
            return Err(PipelineError::ArtifactCorrupted(names::SCALER.to_string()));
        }
        if model.n_features() != columns.len() {
            return Err(PipelineError::ArtifactCorrupted(names::MODEL.to_string()));
        }

        tracing::info!(
            "Inference ready: {} features, {} trees, threshold {:.2}",
            columns.len(),
            model.n_trees(),
            config.classification_threshold
        );

        Ok(Self {
            imputer,
            min_insulin: config.imputer.min_insulin,
            deriver: FeatureDeriver::new(config.features.clone()),
            columns,
            scaler,
            model,
            threshold: config.classification_threshold,
        })
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Canonical feature columns the model was trained on.
    #[must_use]
    pub fn feature_columns(&self) -> &[String] {
        &self.columns
    }

    /// Run the transform-mode feature path: impute, derive, align and scale.
    ///
    /// # Errors
    /// Returns an error if the raw table lacks a feature field.
    pub fn prepare_features(&self, raw: &FeatureFrame) -> Result<FeatureFrame> {
        let clean = self.imputer.transform(raw, self.min_insulin)?;
        let engineered = self.deriver.derive(&clean)?;
        align_and_scale(&engineered, &self.columns, &self.scaler)
    }

    /// Positive-class probabilities for a raw table.
    ///
    /// # Errors
    /// Same as [`prepare_features`](Self::prepare_features).
    pub fn predict_proba(&self, raw: &FeatureFrame) -> Result<Vec<f64>> {
        let features = self.prepare_features(raw)?;
        self.model.predict_proba(features.values())
    }

    /// Score one record.
    ///
    /// # Errors
    /// Returns `Validation` for an out-of-range record and
    /// `InferenceRuntime` for any failure while scoring it.
    pub fn predict(&self, record: &PatientRecord) -> Result<Prediction> {
        record
            .validate()
            .map_err(|errors| PipelineError::Validation(errors.join("; ")))?;

        let raw = FeatureFrame::from_records(std::slice::from_ref(record));
        let probability = self
            .predict_proba(&raw)
            .map_err(|e| PipelineError::InferenceRuntime(e.to_string()))?
            .first()
            .copied()
            .ok_or_else(|| PipelineError::InferenceRuntime("Model returned no score".into()))?;

        let prediction = Prediction::from_probability(probability, self.threshold);
        tracing::info!(
            "Inference complete: prediction={}, probability={:.4}",
            prediction.prediction,
            prediction.probability
        );
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryArtifactStore;

    #[test]
    fn test_load_without_training_is_missing_artifact() {
        let store = MemoryArtifactStore::new();
        let result = InferenceService::load(&store, &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::MissingArtifact(_))));
    }
}
