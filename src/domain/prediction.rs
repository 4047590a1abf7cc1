//! Prediction result types.
//!
//! Represents the output of the diabetes risk classifier for one record.

use serde::{Deserialize, Serialize};

/// Outcome status reported alongside a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionStatus {
    Success,
}

impl std::fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "Success"),
        }
    }
}

/// Response for a single inference request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Binary prediction (0 = non-diabetic, 1 = diabetic)
    pub prediction: u8,

    /// Positive-class probability, rounded to four decimals (0.0 to 1.0)
    pub probability: f64,

    pub status: PredictionStatus,
}

impl Prediction {
    /// Apply the decision threshold to a positive-class probability.
    ///
    /// The comparison is made on the rounded probability that is reported, so
    /// `prediction == 1` exactly when the reported `probability >= threshold`.
    #[must_use]
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        let probability = ((probability.clamp(0.0, 1.0)) * 10_000.0).round() / 10_000.0;
        let prediction = u8::from(probability >= threshold);
        Self {
            prediction,
            probability,
            status: PredictionStatus::Success,
        }
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.prediction == 1
    }
}
