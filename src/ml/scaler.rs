//! Standard scaler (z-score normalization).
//!
//! ```text
//! z = (x - u) / s
//! ```
//! where `u` is the training mean and `s` the population standard deviation
//! (ddof = 0). Constant columns keep `s = 1` so they map to zero.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::{PipelineError, Result};

/// Fitted per-column mean and standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl StandardScaler {
    /// # Errors
    /// Returns `Numerical` on an empty matrix.
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(PipelineError::Numerical(
                "Cannot fit scaler on empty data".into(),
            ));
        }
        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| PipelineError::Numerical("Cannot compute column means".into()))?;
        let std: Array1<f64> = x.std_axis(Axis(0), 0.0);
        let std = std.mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s });

        Ok(Self {
            mean: mean.to_vec(),
            std: std.to_vec(),
        })
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// # Errors
    /// Returns `Numerical` if the column count differs from the fitted one.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(PipelineError::Numerical(format!(
                "Scaler fitted on {} columns, got {}",
                self.n_features(),
                x.ncols()
            )));
        }
        let mean = Array1::from(self.mean.clone());
        let std = Array1::from(self.std.clone());
        Ok((x - &mean) / &std)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_zero_mean_unit_variance() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0]];
        let scaler = StandardScaler::fit(&x).expect("Should fit");
        let z = scaler.transform(&x).expect("Should transform");

        for col in z.axis_iter(Axis(1)) {
            let mean = col.mean().expect("Should have mean");
            let var = col.mapv(|v| (v - mean).powi(2)).mean().expect("Should have var");
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_population_std() {
        let scaler = StandardScaler::fit(&array![[0.0], [2.0]]).expect("Should fit");
        assert!((scaler.std[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let x = array![[5.0, 1.0], [5.0, 2.0]];
        let scaler = StandardScaler::fit(&x).expect("Should fit");
        assert!((scaler.std[0] - 1.0).abs() < f64::EPSILON);
        let z = scaler.transform(&x).expect("Should transform");
        assert!(z.column(0).iter().all(|v| v.abs() < f64::EPSILON));
    }

    #[test]
    fn test_rejects_wrong_width_and_empty() {
        let scaler = StandardScaler::fit(&array![[1.0, 2.0]]).expect("Should fit");
        assert!(scaler.transform(&array![[1.0]]).is_err());
        assert!(StandardScaler::fit(&Array2::zeros((0, 2))).is_err());
    }
}
