//! Pipeline configuration.
//!
//! Every component receives its section of [`PipelineConfig`] at construction;
//! there are no module-level thresholds or paths. Values come from (lowest to
//! highest precedence) the defaults below, an optional JSON file, and
//! `GLUCORISK_*` environment variables. The binary applies CLI flags last.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{PipelineError, Result};

const ARTIFACTS_DIR_ENV: &str = "GLUCORISK_ARTIFACTS_DIR";
const DATA_PATH_ENV: &str = "GLUCORISK_DATA_PATH";
const THRESHOLD_ENV: &str = "GLUCORISK_THRESHOLD";
const VALIDATION_ENV: &str = "GLUCORISK_VALIDATION";

/// Which dataset validation suite runs before feature work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Full rule suite: columns, numeric types and domain ranges.
    #[default]
    Expectations,
    /// Minimal structural checks only.
    Basic,
}

impl std::str::FromStr for ValidationMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expectations" | "full" => Ok(Self::Expectations),
            "basic" => Ok(Self::Basic),
            other => Err(PipelineError::Validation(format!(
                "Unknown validation mode '{other}' (expected 'expectations' or 'basic')"
            ))),
        }
    }
}

/// Iterative imputation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputerConfig {
    /// Maximum number of imputation rounds.
    pub max_iter: usize,
    /// Seed recorded with the fitted imputer.
    pub seed: u64,
    /// Relative convergence tolerance for early stopping.
    pub tol: f64,
    /// L2 penalty of the per-feature ridge estimators.
    pub ridge_alpha: f64,
    /// Physiological floor applied to imputed insulin.
    pub min_insulin: f64,
}

impl Default for ImputerConfig {
    fn default() -> Self {
        Self {
            max_iter: 10,
            seed: 42,
            tol: 1e-3,
            ridge_alpha: 1.0,
            min_insulin: 1.0,
        }
    }
}

/// Feature derivation constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Guard added to denominators and log arguments.
    pub epsilon: f64,
    /// Fasting glucose (mg/dL) at or above which a reading is flagged critical.
    pub glucose_critical_cutoff: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            glucose_critical_cutoff: 126.0,
        }
    }
}

/// Random forest hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered per split (sqrt of total if None)
    pub max_features: Option<usize>,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// Split, rebalancing and model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Fraction of rows held out for evaluation.
    pub test_size: f64,
    /// Seed for the stratified split and SMOTE.
    pub seed: u64,
    /// Neighbours considered when synthesizing minority samples.
    pub smote_k_neighbors: usize,
    pub forest: ForestConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            smote_k_neighbors: 5,
            forest: ForestConfig::default(),
        }
    }
}

/// Top-level configuration passed into every pipeline component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub artifacts_dir: PathBuf,
    pub data_path: PathBuf,
    /// Probability at or above which inference reports the positive class.
    pub classification_threshold: f64,
    pub validation: ValidationMode,
    pub imputer: ImputerConfig,
    pub features: FeatureConfig,
    pub trainer: TrainerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from("artifacts"),
            data_path: PathBuf::from("data/diabetes.csv"),
            classification_threshold: 0.40,
            validation: ValidationMode::default(),
            imputer: ImputerConfig::default(),
            features: FeatureConfig::default(),
            trainer: TrainerConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file; absent keys keep their defaults.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    /// Defaults, optionally overlaid with a JSON file, then environment.
    ///
    /// # Errors
    /// Returns error if the file is unreadable or a variable is malformed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        base.with_env_overrides()
    }

    /// Apply `GLUCORISK_*` environment variable overrides.
    ///
    /// # Errors
    /// Returns `Validation` if a variable cannot be parsed.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(dir) = std::env::var(ARTIFACTS_DIR_ENV) {
            self.artifacts_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var(DATA_PATH_ENV) {
            self.data_path = PathBuf::from(path);
        }
        if let Ok(raw) = std::env::var(THRESHOLD_ENV) {
            self.classification_threshold = raw.trim().parse().map_err(|_| {
                PipelineError::Validation(format!("{THRESHOLD_ENV} must be a number, got '{raw}'"))
            })?;
        }
        if let Ok(raw) = std::env::var(VALIDATION_ENV) {
            self.validation = raw.parse()?;
        }
        self.check()?;
        Ok(self)
    }

    /// Reject settings no component can honour.
    ///
    /// # Errors
    /// Returns `Validation` describing the first offending setting.
    pub fn check(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.classification_threshold) {
            return Err(PipelineError::Validation(format!(
                "classification_threshold {} out of range [0, 1]",
                self.classification_threshold
            )));
        }
        if !(self.trainer.test_size > 0.0 && self.trainer.test_size < 1.0) {
            return Err(PipelineError::Validation(format!(
                "test_size {} must lie strictly between 0 and 1",
                self.trainer.test_size
            )));
        }
        if self.trainer.forest.n_trees == 0 {
            return Err(PipelineError::Validation("n_trees must be positive".into()));
        }
        if self.trainer.smote_k_neighbors == 0 {
            return Err(PipelineError::Validation(
                "smote_k_neighbors must be positive".into(),
            ));
        }
        if self.imputer.max_iter == 0 {
            return Err(PipelineError::Validation("max_iter must be positive".into()));
        }
        Ok(())
    }
}
