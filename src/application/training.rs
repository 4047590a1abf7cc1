//! Training pipeline: the end-to-end batch run.
//!
//! Stages run in a fixed order:
//! ```text
//! CleanArtifacts -> Load -> Validate -> SplitTarget -> Impute
//!     -> DeriveFeatures -> AlignScale -> Train -> Done
//! ```
//! Any failure moves the run to `Aborted`. The label is split off right after
//! validation, before any feature-producing stage sees the table.

use std::fmt;
use std::sync::Arc;

use crate::adapters::dataset::load_data;
use crate::config::PipelineConfig;
use crate::domain::{FeatureFrame, Validator, LABEL};
use crate::ml::ClassificationReport;
use crate::ports::ArtifactStore;
use crate::stages::{FeatureAligner, FeatureDeriver, Imputer, ModelTrainer};
use crate::{PipelineError, Result};

use super::manifest::ArtifactManifest;

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    CleanArtifacts,
    Load,
    Validate,
    SplitTarget,
    Impute,
    DeriveFeatures,
    AlignScale,
    Train,
    Done,
    Aborted,
}

impl PipelineStage {
    /// The stage after `self` on the success path.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::CleanArtifacts => Some(Self::Load),
            Self::Load => Some(Self::Validate),
            Self::Validate => Some(Self::SplitTarget),
            Self::SplitTarget => Some(Self::Impute),
            Self::Impute => Some(Self::DeriveFeatures),
            Self::DeriveFeatures => Some(Self::AlignScale),
            Self::AlignScale => Some(Self::Train),
            Self::Train => Some(Self::Done),
            Self::Done | Self::Aborted => None,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CleanArtifacts => "clean-artifacts",
            Self::Load => "load",
            Self::Validate => "validate",
            Self::SplitTarget => "split-target",
            Self::Impute => "impute",
            Self::DeriveFeatures => "derive-features",
            Self::AlignScale => "align-scale",
            Self::Train => "train",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Result of a completed training run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub report: ClassificationReport,
    /// Every stage entered, in order, ending with `Done`.
    pub stages: Vec<PipelineStage>,
    pub n_rows: usize,
    pub n_features: usize,
    pub manifest: ArtifactManifest,
}

/// Tracks the current stage and the path taken.
struct StageTracker {
    current: PipelineStage,
    visited: Vec<PipelineStage>,
}

impl StageTracker {
    fn start() -> Self {
        tracing::info!("Pipeline stage: {}", PipelineStage::CleanArtifacts);
        Self {
            current: PipelineStage::CleanArtifacts,
            visited: vec![PipelineStage::CleanArtifacts],
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.current.next() {
            tracing::info!("Pipeline stage: {next}");
            self.current = next;
            self.visited.push(next);
        }
    }

    fn abort(&mut self) {
        tracing::info!("Pipeline stage: {}", PipelineStage::Aborted);
        self.current = PipelineStage::Aborted;
        self.visited.push(PipelineStage::Aborted);
    }
}

/// Batch training orchestrator.
pub struct TrainingPipeline<S: ArtifactStore> {
    config: PipelineConfig,
    store: Arc<S>,
    validator: Validator,
}

impl<S: ArtifactStore> TrainingPipeline<S> {
    /// Build the pipeline. The validation suite is chosen here, once.
    pub fn new(config: PipelineConfig, store: Arc<S>) -> Self {
        let validator = Validator::new(config.validation);
        Self {
            config,
            store,
            validator,
        }
    }

    /// Run end to end on the dataset at `config.data_path`.
    ///
    /// # Errors
    /// Returns the first stage failure; the artifact store is left empty.
    pub fn run(&self) -> Result<TrainingOutcome> {
        let path = self.config.data_path.clone();
        self.execute(move || load_data(&path))
    }

    /// Run end to end on an already loaded labelled table.
    ///
    /// # Errors
    /// Same as [`run`](Self::run).
    pub fn run_on(&self, table: FeatureFrame) -> Result<TrainingOutcome> {
        self.execute(move || Ok(table))
    }

    fn execute<F>(&self, load: F) -> Result<TrainingOutcome>
    where
        F: FnOnce() -> Result<FeatureFrame>,
    {
        tracing::info!("Training pipeline started");
        let mut tracker = StageTracker::start();

        match self.stages(&mut tracker, load) {
            Ok(mut outcome) => {
                tracker.advance();
                outcome.stages = tracker.visited;
                tracing::info!("Training pipeline finished successfully");
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!("Pipeline aborted during {}: {e}", tracker.current);
                tracker.abort();
                if let Err(clear_err) = self.store.clear() {
                    tracing::warn!("Failed to clear partial artifacts: {clear_err}");
                }
                Err(e)
            }
        }
    }

    fn stages<F>(&self, tracker: &mut StageTracker, load: F) -> Result<TrainingOutcome>
    where
        F: FnOnce() -> Result<FeatureFrame>,
    {
        self.store.clear()?;
        tracing::info!("Artifact store is ready for new files");

        tracker.advance();
        let table = load()?;

        tracker.advance();
        self.validator.validate(&table)?;

        tracker.advance();
        let (raw, labels) = split_target(table)?;
        let n_rows = raw.n_rows();

        tracker.advance();
        let imputer = Imputer::new(self.config.imputer.clone(), Arc::clone(&self.store));
        let clean = imputer.fit_transform(&raw)?;

        tracker.advance();
        let engineered = FeatureDeriver::new(self.config.features.clone()).derive(&clean)?;

        tracker.advance();
        let aligner = FeatureAligner::new(Arc::clone(&self.store));
        let scaled = aligner.fit(&engineered)?;
        let n_features = scaled.n_cols();

        tracker.advance();
        let trainer = ModelTrainer::new(self.config.trainer.clone(), Arc::clone(&self.store));
        let report = trainer.train(&scaled, &labels)?;
        let manifest = ArtifactManifest::from_store(self.store.as_ref())?;
        manifest.save(self.store.as_ref())?;

        Ok(TrainingOutcome {
            report,
            stages: Vec::new(),
            n_rows,
            n_features,
            manifest,
        })
    }
}

/// Separate the label from the features. Labels must be exactly 0 or 1.
fn split_target(mut table: FeatureFrame) -> Result<(FeatureFrame, Vec<u8>)> {
    tracing::info!("Separating target variable ({LABEL}) from features");
    let labels = table
        .require_column(LABEL)?
        .iter()
        .map(|&v| {
            if v == 0.0 {
                Ok(0u8)
            } else if v == 1.0 {
                Ok(1u8)
            } else {
                Err(PipelineError::Validation(format!(
                    "'{LABEL}' value {v} is not 0 or 1"
                )))
            }
        })
        .collect::<Result<Vec<u8>>>()?;
    table.drop_column(LABEL);
    Ok((table, labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let mut stage = PipelineStage::CleanArtifacts;
        let mut path = vec![stage];
        while let Some(next) = stage.next() {
            path.push(next);
            stage = next;
        }
        assert_eq!(
            path,
            vec![
                PipelineStage::CleanArtifacts,
                PipelineStage::Load,
                PipelineStage::Validate,
                PipelineStage::SplitTarget,
                PipelineStage::Impute,
                PipelineStage::DeriveFeatures,
                PipelineStage::AlignScale,
                PipelineStage::Train,
                PipelineStage::Done,
            ]
        );
        assert!(stage.is_terminal());
        assert!(PipelineStage::Aborted.next().is_none());
    }

    #[test]
    fn test_split_target_removes_label() {
        let table = FeatureFrame::new(
            vec!["Glucose".into(), LABEL.into()],
            ndarray::array![[100.0, 1.0], [90.0, 0.0]],
        )
        .expect("Should build");
        let (features, labels) = split_target(table).expect("Should split");
        assert!(!features.has_column(LABEL));
        assert_eq!(labels, vec![1, 0]);
    }

    #[test]
    fn test_split_target_rejects_non_binary() {
        let table = FeatureFrame::new(vec![LABEL.into()], ndarray::array![[0.5]])
            .expect("Should build");
        assert!(matches!(split_target(table), Err(PipelineError::Validation(_))));
    }
}
