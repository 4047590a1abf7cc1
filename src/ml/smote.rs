//! SMOTE: synthetic minority oversampling.
//!
//! New minority rows are placed on the segment between a random minority
//! sample and one of its `k` nearest minority neighbours (Euclidean), at a
//! uniform random position. Synthesis continues until both classes have the
//! same count. Original rows are kept first and in order.

use ndarray::{concatenate, Array1, Array2, ArrayView1, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{PipelineError, Result};

/// Oversampler settings.
#[derive(Debug, Clone, Copy)]
pub struct Smote {
    pub k_neighbors: usize,
    pub seed: u64,
}

fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

impl Smote {
    /// Balance binary labels by synthesizing minority rows.
    ///
    /// # Errors
    /// Returns `Training` on a shape mismatch, a single-class input, or fewer
    /// than two minority samples.
    pub fn fit_resample(&self, x: &Array2<f64>, y: &[u8]) -> Result<(Array2<f64>, Vec<u8>)> {
        if x.nrows() != y.len() {
            return Err(PipelineError::Training(format!(
                "{} labels for {} rows",
                y.len(),
                x.nrows()
            )));
        }

        let positives = y.iter().filter(|&&l| l == 1).count();
        let negatives = y.len() - positives;
        if positives == 0 || negatives == 0 {
            return Err(PipelineError::Training(
                "Oversampling needs both classes present".into(),
            ));
        }
        if positives == negatives {
            return Ok((x.clone(), y.to_vec()));
        }

        let (minority_label, n_needed) = if positives < negatives {
            (1u8, negatives - positives)
        } else {
            (0u8, positives - negatives)
        };
        let minority: Vec<usize> = (0..y.len()).filter(|&i| y[i] == minority_label).collect();
        if minority.len() < 2 {
            return Err(PipelineError::Training(format!(
                "Oversampling needs at least 2 minority samples, found {}",
                minority.len()
            )));
        }

        let k = self.k_neighbors.clamp(1, minority.len() - 1);
        if k < self.k_neighbors {
            tracing::warn!(
                "Reducing SMOTE k_neighbors from {} to {k} for {} minority samples",
                self.k_neighbors,
                minority.len()
            );
        }

        let neighbours: Vec<Vec<usize>> = minority
            .iter()
            .map(|&i| {
                let mut by_distance: Vec<(f64, usize)> = minority
                    .iter()
                    .filter(|&&j| j != i)
                    .map(|&j| (squared_distance(x.row(i), x.row(j)), j))
                    .collect();
                by_distance.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                by_distance.into_iter().take(k).map(|(_, j)| j).collect()
            })
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut synthetic = Array2::<f64>::zeros((n_needed, x.ncols()));
        for mut row in synthetic.axis_iter_mut(Axis(0)) {
            let pick = rng.gen_range(0..minority.len());
            let neighbour = neighbours[pick][rng.gen_range(0..k)];
            let gap: f64 = rng.gen();
            let base = x.row(minority[pick]);
            let toward = x.row(neighbour);
            let sample: Array1<f64> = &base + &((&toward - &base) * gap);
            row.assign(&sample);
        }

        tracing::debug!(
            "SMOTE added {n_needed} synthetic samples of class {minority_label} (k={k})"
        );

        let resampled = concatenate(Axis(0), &[x.view(), synthetic.view()])
            .map_err(|e| PipelineError::Numerical(e.to_string()))?;
        let mut labels = y.to_vec();
        labels.extend(std::iter::repeat(minority_label).take(n_needed));
        Ok((resampled, labels))
    }
}
