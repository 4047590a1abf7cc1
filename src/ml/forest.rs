//! Random forest classifier.
//!
//! Trees are grown in parallel with rayon. Tree `i` draws its bootstrap
//! sample and its split features from a ChaCha8 stream seeded with
//! `seed + i`, so the fitted forest does not depend on thread scheduling.

use ndarray::{Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, TreeParams};
use crate::config::ForestConfig;
use crate::{PipelineError, Result};

/// Fitted random forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    /// Train a forest on `x` with binary labels `y`.
    ///
    /// # Errors
    /// Returns `Training` on empty input, a label/row mismatch, labels other
    /// than 0/1, or a zero-tree configuration.
    pub fn fit(x: &Array2<f64>, y: &[u8], config: &ForestConfig) -> Result<Self> {
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 || n_features == 0 {
            return Err(PipelineError::Training("Cannot fit forest on empty data".into()));
        }
        if y.len() != n_samples {
            return Err(PipelineError::Training(format!(
                "{} labels for {n_samples} rows",
                y.len()
            )));
        }
        if y.iter().any(|&label| label > 1) {
            return Err(PipelineError::Training("Labels must be 0 or 1".into()));
        }
        if config.n_trees == 0 {
            return Err(PipelineError::Training("n_trees must be positive".into()));
        }

        let max_features = config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt() as usize)
            .clamp(1, n_features);
        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            max_features,
        };

        tracing::debug!(
            "Growing {} trees (max_depth={}, max_features={max_features})",
            config.n_trees,
            config.max_depth
        );

        let trees: Vec<DecisionTree> = (0..config.n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(i as u64));
                let samples: Vec<usize> = if config.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                DecisionTree::fit(x, y, samples, &params, &mut rng)
            })
            .collect();

        let mut feature_importances = vec![0.0; n_features];
        for tree in &trees {
            let total: f64 = tree.importances().iter().sum();
            if total > 0.0 {
                for (acc, imp) in feature_importances.iter_mut().zip(tree.importances()) {
                    *acc += imp / total;
                }
            }
        }
        let sum: f64 = feature_importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut feature_importances {
                *imp /= sum;
            }
        }

        Ok(Self {
            trees,
            n_features,
            feature_importances,
        })
    }

    /// Mean positive-class probability across trees, per row.
    ///
    /// # Errors
    /// Returns `Numerical` if the column count differs from training.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        if x.ncols() != self.n_features {
            return Err(PipelineError::Numerical(format!(
                "Model fitted on {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        let n_trees = self.trees.len() as f64;
        Ok(x.axis_iter(Axis(0))
            .map(|row| {
                self.trees
                    .iter()
                    .map(|t| t.predict_proba_row(row))
                    .sum::<f64>()
                    / n_trees
            })
            .collect())
    }

    /// Class labels using the majority-vote cut of 0.5.
    ///
    /// # Errors
    /// Same as [`predict_proba`](Self::predict_proba).
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect())
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Normalized mean Gini importance per feature (sums to 1 when any split exists).
    #[must_use]
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }
}
