//! Model training and evaluation stage.

use std::sync::Arc;

use crate::config::TrainerConfig;
use crate::domain::FeatureFrame;
use crate::ml::{stratified_split, ClassificationReport, RandomForest, Smote};
use crate::ports::{names, ArtifactStore};
use crate::{PipelineError, Result};

use super::save_artifact;

/// How many feature importances to log after training.
const TOP_IMPORTANCES: usize = 5;

/// Split, rebalance, fit, evaluate and persist the classifier.
pub struct ModelTrainer<S: ArtifactStore> {
    config: TrainerConfig,
    store: Arc<S>,
}

impl<S: ArtifactStore> ModelTrainer<S> {
    pub fn new(config: TrainerConfig, store: Arc<S>) -> Self {
        Self { config, store }
    }

    /// Train on scaled features and 0/1 labels; persist the model.
    ///
    /// Only the training partition is oversampled. The report is computed on
    /// the untouched held-out partition.
    ///
    /// # Errors
    /// Returns `Training` for a row/label mismatch, a split that leaves an
    /// empty partition or too few minority samples, and propagates any fit or
    /// storage failure.
    pub fn train(&self, features: &FeatureFrame, labels: &[u8]) -> Result<ClassificationReport> {
        if features.n_rows() != labels.len() {
            return Err(PipelineError::Training(format!(
                "{} labels for {} feature rows",
                labels.len(),
                features.n_rows()
            )));
        }

        let split = stratified_split(labels, self.config.test_size, self.config.seed)?;
        let x_train = features.take_rows(&split.train).into_values();
        let x_test = features.take_rows(&split.test).into_values();
        let y_train: Vec<u8> = split.train.iter().map(|&i| labels[i]).collect();
        let y_test: Vec<u8> = split.test.iter().map(|&i| labels[i]).collect();
        tracing::info!(
            "Stratified split: {} train / {} test rows",
            y_train.len(),
            y_test.len()
        );

        let smote = Smote {
            k_neighbors: self.config.smote_k_neighbors,
            seed: self.config.seed,
        };
        let (x_res, y_res) = smote.fit_resample(&x_train, &y_train)?;
        tracing::info!(
            "Rebalanced training partition: {} -> {} rows",
            y_train.len(),
            y_res.len()
        );

        let forest_config = &self.config.forest;
        tracing::info!(
            "Training random forest ({} trees, max_depth={}, seed={})",
            forest_config.n_trees,
            forest_config.max_depth,
            forest_config.seed
        );
        let model = RandomForest::fit(&x_res, &y_res, forest_config)?;

        let predictions = model.predict(&x_test)?;
        let report = ClassificationReport::compute(&predictions, &y_test);
        tracing::info!("Held-out accuracy: {:.4}", report.accuracy);
        log_importances(features.columns(), model.feature_importances());

        save_artifact(self.store.as_ref(), names::MODEL, &model)?;
        Ok(report)
    }
}

fn log_importances(columns: &[String], importances: &[f64]) {
    let mut ranked: Vec<(&String, f64)> = columns.iter().zip(importances.iter().copied()).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    for (name, importance) in ranked.into_iter().take(TOP_IMPORTANCES) {
        tracing::info!("  feature importance {name}: {importance:.4}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryArtifactStore;
    use crate::config::ForestConfig;
    use crate::stages::load_artifact;
    use ndarray::Array2;

    fn config() -> TrainerConfig {
        TrainerConfig {
            forest: ForestConfig {
                n_trees: 10,
                max_depth: 4,
                ..ForestConfig::default()
            },
            ..TrainerConfig::default()
        }
    }

    /// 70 negatives, 30 positives separated on the first column.
    fn data() -> (FeatureFrame, Vec<u8>) {
        let labels: Vec<u8> = (0..100).map(|i| u8::from(i % 10 < 3)).collect();
        let values = Array2::from_shape_fn((100, 3), |(i, j)| {
            let y = f64::from(labels[i]);
            match j {
                0 => y * 4.0 + (i % 7) as f64 * 0.2,
                1 => (i % 4) as f64,
                _ => ((i * 7) % 13) as f64 * 0.1,
            }
        });
        let frame = FeatureFrame::new(vec!["x0".into(), "x1".into(), "x2".into()], values)
            .expect("Should build");
        (frame, labels)
    }

    #[test]
    fn test_trains_evaluates_and_persists() {
        let store = Arc::new(MemoryArtifactStore::new());
        let trainer = ModelTrainer::new(config(), Arc::clone(&store));
        let (features, labels) = data();

        let report = trainer.train(&features, &labels).expect("Should train");
        // held-out partition keeps the original ratio: 14 negatives, 6 positives
        assert_eq!(report.classes[0].support, 14);
        assert_eq!(report.classes[1].support, 6);
        assert!(report.accuracy > 0.8);

        let model: RandomForest = load_artifact(store.as_ref(), names::MODEL).expect("Should load");
        assert_eq!(model.n_trees(), 10);
        assert_eq!(model.n_features(), 3);
    }

    #[test]
    fn test_label_mismatch_rejected() {
        let trainer = ModelTrainer::new(config(), Arc::new(MemoryArtifactStore::new()));
        let (features, labels) = data();
        assert!(matches!(
            trainer.train(&features, &labels[..50]),
            Err(PipelineError::Training(_))
        ));
    }

    #[test]
    fn test_single_class_rejected() {
        let trainer = ModelTrainer::new(config(), Arc::new(MemoryArtifactStore::new()));
        let (features, _) = data();
        assert!(trainer.train(&features, &[0u8; 100]).is_err());
    }
}
