//! Ridge regression (L2-penalized least squares).
//!
//! Solved in closed form on centered data:
//! ```text
//! (Xcᵀ Xc + αI) w = Xcᵀ yc,    b = ȳ - x̄·w
//! ```
//! The system is small (one row/column per predictor) and symmetric positive
//! definite for `α > 0`, so a Cholesky factorization is used.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::{PipelineError, Result};

/// Fitted ridge regression model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeRegression {
    pub coef: Vec<f64>,
    pub intercept: f64,
}

impl RidgeRegression {
    /// Fit on `x` (n_samples × n_features) and targets `y`.
    ///
    /// # Errors
    /// Returns `Numerical` if there are no samples, shapes disagree, or the
    /// normal equations are not positive definite.
    pub fn fit(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, alpha: f64) -> Result<Self> {
        let (n, p) = x.dim();
        if n == 0 {
            return Err(PipelineError::Numerical("Cannot fit ridge on zero samples".into()));
        }
        if y.len() != n {
            return Err(PipelineError::Numerical(format!(
                "Ridge target has {} rows, design has {n}",
                y.len()
            )));
        }

        let x_mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(p));
        let y_mean = y.sum() / n as f64;
        let xc = &x - &x_mean;
        let yc = y.mapv(|v| v - y_mean);

        let mut gram = xc.t().dot(&xc);
        for i in 0..p {
            gram[[i, i]] += alpha;
        }
        let rhs = xc.t().dot(&yc);
        let coef = cholesky_solve(&gram, &rhs)?;
        let intercept = y_mean - x_mean.dot(&coef);

        Ok(Self {
            coef: coef.to_vec(),
            intercept,
        })
    }

    /// Predict a single row of predictors.
    #[must_use]
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.intercept
            + self
                .coef
                .iter()
                .zip(row.iter())
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}

/// Solve `a · x = b` for symmetric positive definite `a`.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return Err(PipelineError::Numerical(
                        "Normal equations are not positive definite".into(),
                    ));
                }
                l[[i, i]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }

    // Forward substitution: L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * z[k];
        }
        z[i] = sum / l[[i, i]];
    }

    // Back substitution: Lᵀ x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = z[i];
        for k in (i + 1)..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_recovers_linear_relationship() {
        // y = 2*x0 - x1 + 3
        let x = array![[0.0, 1.0], [1.0, 0.0], [2.0, 2.0], [3.0, 1.0], [4.0, 5.0], [5.0, 3.0]];
        let y: Array1<f64> = x.rows().into_iter().map(|r| 2.0 * r[0] - r[1] + 3.0).collect();

        let model = RidgeRegression::fit(x.view(), y.view(), 1e-9).expect("Should fit");
        assert!((model.coef[0] - 2.0).abs() < 1e-6);
        assert!((model.coef[1] + 1.0).abs() < 1e-6);
        assert!((model.intercept - 3.0).abs() < 1e-6);
        assert!((model.predict_row(array![10.0, 4.0].view()) - 19.0).abs() < 1e-5);
    }

    #[test]
    fn test_penalty_shrinks_coefficients() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];
        let loose = RidgeRegression::fit(x.view(), y.view(), 1e-9).expect("Should fit");
        let tight = RidgeRegression::fit(x.view(), y.view(), 100.0).expect("Should fit");
        assert!(tight.coef[0].abs() < loose.coef[0].abs());
    }

    #[test]
    fn test_constant_predictor_is_handled_by_penalty() {
        let x = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0]];
        let y = array![1.0, 2.0, 3.0];
        let model = RidgeRegression::fit(x.view(), y.view(), 1.0).expect("Should fit");
        assert!(model.coef[1].abs() < 1e-12);
    }

    #[test]
    fn test_singular_without_penalty_fails() {
        let x = array![[1.0, 5.0], [2.0, 5.0]];
        let y = array![1.0, 2.0];
        assert!(RidgeRegression::fit(x.view(), y.view(), 0.0).is_err());
    }

    #[test]
    fn test_empty_input_fails() {
        let x = Array2::<f64>::zeros((0, 2));
        let y = Array1::<f64>::zeros(0);
        assert!(RidgeRegression::fit(x.view(), y.view(), 1.0).is_err());
    }
}
