//! Iterative (MICE-style) imputation.
//!
//! Every column with gaps is modelled as a ridge regression on all the other
//! columns. Gaps start at the column mean and are refined round by round, each
//! round visiting the incomplete columns in ascending order of missing count.
//!
//! Fitting records every per-column estimator of every round. Transform
//! replays those rounds over new data, so applying the fitted imputer to the
//! training matrix reproduces the fit-time result exactly.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use super::ridge::RidgeRegression;
use crate::{PipelineError, Result};

/// Hyperparameters for [`IterativeImputer::fit`].
#[derive(Debug, Clone)]
pub struct IterativeImputer {
    pub max_iter: usize,
    pub tol: f64,
    pub alpha: f64,
    pub seed: u64,
}

/// One column's regression within a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnEstimator {
    pub target: usize,
    pub predictors: Vec<usize>,
    pub model: RidgeRegression,
}

/// Learned imputation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedIterativeImputer {
    /// Observed-value mean per column, used as the initial fill.
    pub initial_fill: Vec<f64>,
    pub rounds: Vec<Vec<ColumnEstimator>>,
    pub converged: bool,
    pub seed: u64,
}

impl IterativeImputer {
    /// Learn the imputation rounds from `x`, where `NaN` marks a gap.
    ///
    /// # Errors
    /// Returns `Numerical` if `x` has no rows or a regression cannot be solved.
    pub fn fit(&self, x: &Array2<f64>) -> Result<FittedIterativeImputer> {
        let (n_rows, n_cols) = x.dim();
        if n_rows == 0 {
            return Err(PipelineError::Numerical(
                "Cannot fit imputer on an empty matrix".into(),
            ));
        }

        let initial_fill: Vec<f64> = x
            .axis_iter(Axis(1))
            .map(|col| {
                let (sum, count) = col
                    .iter()
                    .filter(|v| !v.is_nan())
                    .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
                if count == 0 {
                    0.0
                } else {
                    sum / count as f64
                }
            })
            .collect();

        let missing_counts: Vec<usize> = x
            .axis_iter(Axis(1))
            .map(|col| col.iter().filter(|v| v.is_nan()).count())
            .collect();

        // Columns with no observed values stay at their fill; a regression
        // needs at least two observed rows.
        let mut order: Vec<usize> = (0..n_cols)
            .filter(|&j| missing_counts[j] > 0 && n_rows - missing_counts[j] >= 2)
            .collect();
        order.sort_by_key(|&j| missing_counts[j]);

        let mut current = fill_initial(x, &initial_fill);
        let mut rounds = Vec::new();
        let mut converged = false;

        if order.is_empty() || self.max_iter == 0 {
            tracing::debug!("No incomplete columns to model, imputer uses mean fill only");
            return Ok(FittedIterativeImputer {
                initial_fill,
                rounds,
                converged: true,
                seed: self.seed,
            });
        }

        let max_observed = x
            .iter()
            .filter(|v| !v.is_nan())
            .fold(0.0_f64, |m, v| m.max(v.abs()));
        let threshold = self.tol * max_observed;

        for round in 0..self.max_iter {
            let previous = current.clone();
            let mut estimators = Vec::with_capacity(order.len());

            for &target in &order {
                let predictors: Vec<usize> = (0..n_cols).filter(|&j| j != target).collect();
                let observed_rows: Vec<usize> =
                    (0..n_rows).filter(|&i| !x[[i, target]].is_nan()).collect();

                let design = current
                    .select(Axis(0), &observed_rows)
                    .select(Axis(1), &predictors);
                let response = current.column(target).select(Axis(0), &observed_rows);
                let model = RidgeRegression::fit(design.view(), response.view(), self.alpha)?;

                let estimator = ColumnEstimator {
                    target,
                    predictors,
                    model,
                };
                apply_estimator(&mut current, x, &estimator);
                estimators.push(estimator);
            }
            rounds.push(estimators);

            let delta = row_sum_norm(&(&current - &previous));
            tracing::debug!("Imputation round {}: change {:.6}", round + 1, delta);
            if delta < threshold {
                converged = true;
                tracing::debug!("Imputation converged after {} round(s)", round + 1);
                break;
            }
        }

        if !converged {
            tracing::info!(
                "Imputation reached max_iter={} without early stop",
                self.max_iter
            );
        }

        Ok(FittedIterativeImputer {
            initial_fill,
            rounds,
            converged,
            seed: self.seed,
        })
    }
}

/// Infinity norm: the largest row sum of absolute values.
fn row_sum_norm(delta: &Array2<f64>) -> f64 {
    delta
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0_f64, f64::max)
}

impl FittedIterativeImputer {
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.initial_fill.len()
    }

    /// Fill every `NaN` in `x` by replaying the fitted rounds.
    ///
    /// # Errors
    /// Returns `Numerical` if the column count differs from the fitted one.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(PipelineError::Numerical(format!(
                "Imputer fitted on {} columns, got {}",
                self.n_features(),
                x.ncols()
            )));
        }

        let mut current = fill_initial(x, &self.initial_fill);
        for round in &self.rounds {
            for estimator in round {
                apply_estimator(&mut current, x, estimator);
            }
        }
        Ok(current)
    }
}

fn fill_initial(x: &Array2<f64>, fill: &[f64]) -> Array2<f64> {
    let mut out = x.clone();
    for (mut col, &value) in out.axis_iter_mut(Axis(1)).zip(fill) {
        col.mapv_inplace(|v| if v.is_nan() { value } else { v });
    }
    out
}

/// Overwrite the originally missing cells of `estimator.target` with predictions.
fn apply_estimator(current: &mut Array2<f64>, original: &Array2<f64>, estimator: &ColumnEstimator) {
    let target = estimator.target;
    for i in 0..current.nrows() {
        if !original[[i, target]].is_nan() {
            continue;
        }
        let row = current.row(i).select(Axis(0), &estimator.predictors);
        current[[i, target]] = estimator.model.predict_row(row.view());
    }
}
