//! WHO body-mass-index categories.

use serde::{Deserialize, Serialize};

/// BMI category, in breakpoint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    ObeseClassI,
    ObeseClassII,
    ObeseClassIII,
}

impl BmiCategory {
    /// Every category in breakpoint order.
    pub const ALL: [Self; 6] = [
        Self::Underweight,
        Self::Normal,
        Self::Overweight,
        Self::ObeseClassI,
        Self::ObeseClassII,
        Self::ObeseClassIII,
    ];

    /// Categories that get an indicator column. The first category is the
    /// reference level and is encoded as all indicators zero.
    #[must_use]
    pub fn encoded() -> &'static [Self] {
        &Self::ALL[1..]
    }

    /// Classify a BMI value. Lower bounds are inclusive; anything that is not
    /// below 40 (including a non-finite value) falls in the last class.
    #[must_use]
    pub fn classify(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else if bmi < 35.0 {
            Self::ObeseClassI
        } else if bmi < 40.0 {
            Self::ObeseClassII
        } else {
            Self::ObeseClassIII
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Underweight => "Underweight",
            Self::Normal => "Normal",
            Self::Overweight => "Overweight",
            Self::ObeseClassI => "Obese_Class_I",
            Self::ObeseClassII => "Obese_Class_II",
            Self::ObeseClassIII => "Obese_Class_III",
        }
    }

    /// Name of this category's one-hot column.
    #[must_use]
    pub fn column_name(&self) -> String {
        format!("BMI_Category_{}", self.as_str())
    }
}

impl std::fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
