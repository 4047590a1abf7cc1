//! Missing-value imputation stage.
//!
//! A recorded zero in Glucose, BloodPressure, SkinThickness, Insulin or BMI
//! means "not measured". For each of those fields an `Is_<Field>_Missing`
//! indicator is taken from the raw value first; the zeros are then treated
//! as gaps and filled by the fitted iterative imputer. The indicators stay in
//! the output and act as always-observed predictors for the imputer.

use std::sync::Arc;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::{drop_label, load_artifact, save_artifact};
use crate::config::ImputerConfig;
use crate::domain::patient::{missing_indicator_name, INSULIN};
use crate::domain::{FeatureFrame, FEATURE_NAMES, ZERO_INVALID_FIELDS};
use crate::ml::{FittedIterativeImputer, IterativeImputer};
use crate::ports::{names, ArtifactStore};
use crate::{PipelineError, Result};

/// Persisted imputer: the fitted rounds plus the column layout they expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputerArtifact {
    pub columns: Vec<String>,
    pub model: FittedIterativeImputer,
}

impl ImputerArtifact {
    /// Apply the fitted imputer to a raw table, then floor Insulin at
    /// `min_insulin`.
    ///
    /// # Errors
    /// Returns `ArtifactCorrupted` if the artifact expects another column
    /// layout, or `Validation` if a raw field is absent.
    pub fn transform(&self, raw: &FeatureFrame, min_insulin: f64) -> Result<FeatureFrame> {
        let prepared = prepare(raw)?;
        if self.columns != prepared.columns() {
            return Err(PipelineError::ArtifactCorrupted(names::IMPUTER.to_string()));
        }
        apply(self, prepared, min_insulin)
    }
}

/// Imputation stage bound to an artifact store.
pub struct Imputer<S: ArtifactStore> {
    config: ImputerConfig,
    store: Arc<S>,
}

impl<S: ArtifactStore> Imputer<S> {
    pub fn new(config: ImputerConfig, store: Arc<S>) -> Self {
        Self { config, store }
    }

    /// Fit on training features, persist the imputer and return the clean table.
    ///
    /// Output columns are the eight raw fields followed by the five
    /// missingness indicators.
    ///
    /// # Errors
    /// Returns `Validation` if a raw field is absent, or a numerical or
    /// storage error from fitting and persisting.
    pub fn fit_transform(&self, raw: &FeatureFrame) -> Result<FeatureFrame> {
        let prepared = prepare(raw)?;
        tracing::info!(
            "Fitting iterative imputer on {} rows (max_iter={}, seed={})",
            prepared.n_rows(),
            self.config.max_iter,
            self.config.seed
        );

        let estimator = IterativeImputer {
            max_iter: self.config.max_iter,
            tol: self.config.tol,
            alpha: self.config.ridge_alpha,
            seed: self.config.seed,
        };
        let model = estimator.fit(prepared.values())?;
        let artifact = ImputerArtifact {
            columns: prepared.columns().to_vec(),
            model,
        };
        save_artifact(self.store.as_ref(), names::IMPUTER, &artifact)?;
        tracing::info!(
            "Imputer fitted with {} round(s), converged={}",
            artifact.model.rounds.len(),
            artifact.model.converged
        );

        apply(&artifact, prepared, self.config.min_insulin)
    }

    /// Apply the persisted imputer.
    ///
    /// # Errors
    /// Returns `MissingArtifact` if no imputer has been trained, or
    /// `Validation` if a raw field is absent.
    pub fn transform(&self, raw: &FeatureFrame) -> Result<FeatureFrame> {
        self.load()?.transform(raw, self.config.min_insulin)
    }

    /// Load the persisted imputer.
    ///
    /// # Errors
    /// Returns `MissingArtifact` if no imputer has been trained.
    pub fn load(&self) -> Result<ImputerArtifact> {
        load_artifact(self.store.as_ref(), names::IMPUTER)
    }
}

/// Select the raw fields, add indicators, then mark zeros as gaps.
fn prepare(raw: &FeatureFrame) -> Result<FeatureFrame> {
    let mut raw = raw.clone();
    drop_label(&mut raw, "Imputer");
    let mut frame = raw.select(&FEATURE_NAMES)?;

    for field in ZERO_INVALID_FIELDS {
        let indicator: Array1<f64> = frame
            .require_column(field)?
            .mapv(|v| if v == 0.0 { 1.0 } else { 0.0 });
        frame.push_column(missing_indicator_name(field), indicator)?;
    }

    let columns = frame.columns().to_vec();
    let mut values = frame.into_values();
    for field in ZERO_INVALID_FIELDS {
        if let Some(j) = columns.iter().position(|c| c == field) {
            values
                .column_mut(j)
                .mapv_inplace(|v| if v == 0.0 { f64::NAN } else { v });
        }
    }
    FeatureFrame::new(columns, values)
}

fn apply(artifact: &ImputerArtifact, prepared: FeatureFrame, min_insulin: f64) -> Result<FeatureFrame> {
    let mut values = artifact.model.transform(prepared.values())?;
    if let Some(j) = prepared.column_index(INSULIN) {
        values.column_mut(j).mapv_inplace(|v| v.max(min_insulin));
    }
    FeatureFrame::new(prepared.columns().to_vec(), values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryArtifactStore;
    use crate::domain::patient::{GLUCOSE, LABEL, SKIN_THICKNESS};
    use ndarray::Array2;

    fn raw_frame(rows: usize) -> FeatureFrame {
        let values = Array2::from_shape_fn((rows, 8), |(i, j)| {
            let i = i as f64;
            match j {
                0 => i % 5.0,
                1 => 85.0 + 2.0 * i,
                2 => 60.0 + i,
                3 => if i as usize % 3 == 0 { 0.0 } else { 15.0 + i / 2.0 },
                4 => if i as usize % 2 == 0 { 0.0 } else { 40.0 + 3.0 * i },
                5 => 22.0 + i / 3.0,
                6 => 0.2 + i / 100.0,
                _ => 21.0 + i,
            }
        });
        let columns = FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect();
        FeatureFrame::new(columns, values).expect("Should build")
    }

    fn stage(store: Arc<MemoryArtifactStore>) -> Imputer<MemoryArtifactStore> {
        Imputer::new(ImputerConfig::default(), store)
    }

    #[test]
    fn test_indicators_follow_raw_zeros() {
        let raw = raw_frame(30);
        let out = stage(Arc::new(MemoryArtifactStore::new()))
            .fit_transform(&raw)
            .expect("Should impute");

        assert_eq!(out.n_cols(), 13);
        for field in ZERO_INVALID_FIELDS {
            let before = raw.column(field).expect("Should have field");
            let flag = out
                .column(&missing_indicator_name(field))
                .expect("Should have indicator");
            for (v, f) in before.iter().zip(flag.iter()) {
                assert_eq!(*f == 1.0, *v == 0.0);
            }
        }
    }

    #[test]
    fn test_no_gaps_or_zeros_remain() {
        let out = stage(Arc::new(MemoryArtifactStore::new()))
            .fit_transform(&raw_frame(30))
            .expect("Should impute");
        for field in ZERO_INVALID_FIELDS {
            let col = out.column(field).expect("Should have field");
            assert!(col.iter().all(|v| v.is_finite()));
        }
        assert!(out
            .column(SKIN_THICKNESS)
            .expect("Should have field")
            .iter()
            .all(|&v| v != 0.0));
    }

    #[test]
    fn test_insulin_floor() {
        let mut raw = raw_frame(30);
        // Push insulin to a tiny value so a fit can land below the floor.
        let insulin = raw.column_index(INSULIN).expect("Should have insulin");
        let mut values = raw.values().clone();
        values[[1, insulin]] = 0.01;
        raw = FeatureFrame::new(raw.columns().to_vec(), values).expect("Should build");

        let out = stage(Arc::new(MemoryArtifactStore::new()))
            .fit_transform(&raw)
            .expect("Should impute");
        assert!(out
            .column(INSULIN)
            .expect("Should have insulin")
            .iter()
            .all(|&v| v >= 1.0));
    }

    #[test]
    fn test_transform_requires_trained_imputer() {
        let result = stage(Arc::new(MemoryArtifactStore::new())).transform(&raw_frame(3));
        assert!(matches!(result, Err(PipelineError::MissingArtifact(name)) if name == names::IMPUTER));
    }

    #[test]
    fn test_transform_replays_fit() {
        let store = Arc::new(MemoryArtifactStore::new());
        let imputer = stage(Arc::clone(&store));
        let raw = raw_frame(30);
        let fitted = imputer.fit_transform(&raw).expect("Should impute");
        let replayed = imputer.transform(&raw).expect("Should impute");
        assert_eq!(fitted, replayed);
        assert!(store.exists(names::IMPUTER).expect("Should check"));
    }

    #[test]
    fn test_loaded_artifact_applies_without_store() {
        let imputer = stage(Arc::new(MemoryArtifactStore::new()));
        let raw = raw_frame(30);
        let fitted = imputer.fit_transform(&raw).expect("Should impute");
        let artifact = imputer.load().expect("Should load");
        let replayed = artifact
            .transform(&raw, ImputerConfig::default().min_insulin)
            .expect("Should impute");
        assert_eq!(fitted, replayed);

        let mut narrow = raw.clone();
        narrow.drop_column(INSULIN);
        assert!(artifact.transform(&narrow, 1.0).is_err());
    }

    #[test]
    fn test_label_is_dropped() {
        let mut raw = raw_frame(30);
        raw.push_column(LABEL, Array1::zeros(30)).expect("Should push");
        let out = stage(Arc::new(MemoryArtifactStore::new()))
            .fit_transform(&raw)
            .expect("Should impute");
        assert!(!out.has_column(LABEL));
    }

    #[test]
    fn test_missing_field_is_validation_error() {
        let mut raw = raw_frame(10);
        raw.drop_column(GLUCOSE);
        let result = stage(Arc::new(MemoryArtifactStore::new())).fit_transform(&raw);
        assert!(matches!(result, Err(PipelineError::Validation(_))));
    }
}
