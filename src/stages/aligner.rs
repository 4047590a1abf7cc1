//! Canonical column alignment and standardization.
//!
//! Training fixes the canonical column list (the deriver's output order) and
//! fits a standard scaler over it. Inference conforms any engineered table to
//! that list, filling absent columns with 0 and discarding unknown ones,
//! before applying the same scaler.

use std::sync::Arc;

use super::{drop_label, load_artifact, save_artifact};
use crate::domain::FeatureFrame;
use crate::ml::StandardScaler;
use crate::ports::{names, ArtifactStore};
use crate::{PipelineError, Result};

/// Alignment and scaling stage bound to an artifact store.
pub struct FeatureAligner<S: ArtifactStore> {
    store: Arc<S>,
}

impl<S: ArtifactStore> FeatureAligner<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Persist the canonical columns and a fitted scaler; return scaled features.
    ///
    /// # Errors
    /// Returns `Numerical` if the table is empty or holds non-finite values,
    /// or a storage error from persisting.
    pub fn fit(&self, engineered: &FeatureFrame) -> Result<FeatureFrame> {
        let mut engineered = engineered.clone();
        drop_label(&mut engineered, "FeatureAligner");

        if engineered.values().iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::Numerical(
                "Engineered features contain non-finite values".into(),
            ));
        }

        let columns = engineered.columns().to_vec();
        let scaler = StandardScaler::fit(engineered.values())?;
        save_artifact(self.store.as_ref(), names::COLUMNS, &columns)?;
        save_artifact(self.store.as_ref(), names::SCALER, &scaler)?;
        tracing::info!("Canonical feature set fixed at {} columns", columns.len());

        let scaled = scaler.transform(engineered.values())?;
        FeatureFrame::new(columns, scaled)
    }

    /// Conform to the canonical columns and apply the persisted scaler.
    ///
    /// # Errors
    /// Returns `MissingArtifact` if the column list or scaler was never saved.
    pub fn transform(&self, engineered: &FeatureFrame) -> Result<FeatureFrame> {
        let columns: Vec<String> = load_artifact(self.store.as_ref(), names::COLUMNS)?;
        let scaler: StandardScaler = load_artifact(self.store.as_ref(), names::SCALER)?;
        if scaler.n_features() != columns.len() {
            return Err(PipelineError::ArtifactCorrupted(names::SCALER.to_string()));
        }
        align_and_scale(engineered, &columns, &scaler)
    }
}

/// Reindex to `columns` (missing -> 0) and scale.
///
/// # Errors
/// Returns `Numerical` if the scaler width does not match `columns`.
pub fn align_and_scale(
    engineered: &FeatureFrame,
    columns: &[String],
    scaler: &StandardScaler,
) -> Result<FeatureFrame> {
    let aligned = engineered.reindex(columns, 0.0);
    let dropped: Vec<&String> = engineered
        .columns()
        .iter()
        .filter(|c| !columns.contains(*c))
        .collect();
    if !dropped.is_empty() {
        tracing::debug!("Discarding {} non-canonical column(s): {dropped:?}", dropped.len());
    }
    let scaled = scaler.transform(aligned.values())?;
    FeatureFrame::new(columns.to_vec(), scaled)
}
