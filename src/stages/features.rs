//! Clinical feature derivation.
//!
//! Pure and stateless: the same input always yields the same columns in the
//! same order, in training and at inference.

use ndarray::{Array1, ArrayView1, Zip};

use super::drop_label;
use crate::config::FeatureConfig;
use crate::domain::patient::{
    AGE, BLOOD_PRESSURE, BMI, GLUCOSE, INSULIN, PEDIGREE, PREGNANCIES, SKIN_THICKNESS,
};
use crate::domain::{BmiCategory, FeatureFrame};
use crate::Result;

/// Names of the numeric features appended by [`FeatureDeriver::derive`],
/// in output order. The BMI category indicators follow them.
pub const DERIVED_FEATURES: [&str; 9] = [
    "Log_DPF",
    "Log_Age",
    "Sqrt_Insulin",
    "Sqrt_Pregnancies",
    "Glucose_to_Insulin_Ratio",
    "Age_BMI_Interaction",
    "BP_Age_Index",
    "Skin_BMI_Ratio",
    "Is_Glucose_Critical",
];

#[derive(Debug, Clone)]
pub struct FeatureDeriver {
    config: FeatureConfig,
}

impl FeatureDeriver {
    #[must_use]
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Derive engineered features from a clean (imputed) table.
    ///
    /// Input columns are kept in order, except the label and the raw
    /// pedigree value, which are removed. The derived features and then
    /// one indicator per non-reference BMI category are appended. Any
    /// infinity produced along the way becomes 0.
    ///
    /// # Errors
    /// Returns `Validation` if one of the eight raw fields is absent.
    pub fn derive(&self, clean: &FeatureFrame) -> Result<FeatureFrame> {
        let mut out = clean.clone();
        drop_label(&mut out, "FeatureDeriver");

        let eps = self.config.epsilon;
        let pregnancies = clean.require_column(PREGNANCIES)?;
        let glucose = clean.require_column(GLUCOSE)?;
        let blood_pressure = clean.require_column(BLOOD_PRESSURE)?;
        let skin = clean.require_column(SKIN_THICKNESS)?;
        let insulin = clean.require_column(INSULIN)?;
        let bmi = clean.require_column(BMI)?;
        let pedigree = clean.require_column(PEDIGREE)?;
        let age = clean.require_column(AGE)?;

        let cutoff = self.config.glucose_critical_cutoff;
        let derived: [Array1<f64>; 9] = [
            pedigree.mapv(|v| (v + eps).ln()),
            age.mapv(f64::ln_1p),
            insulin.mapv(|v| v.max(0.0).sqrt()),
            pregnancies.mapv(|v| v.max(0.0).sqrt()),
            ratio(glucose, insulin, eps),
            &age * &bmi,
            ratio(blood_pressure, age, eps),
            ratio(skin, bmi, eps),
            glucose.mapv(|v| if v >= cutoff { 1.0 } else { 0.0 }),
        ];

        let categories: Vec<BmiCategory> = bmi.iter().map(|&v| BmiCategory::classify(v)).collect();

        out.drop_column(PEDIGREE);
        for (name, column) in DERIVED_FEATURES.iter().zip(derived) {
            out.push_column(*name, column)?;
        }
        for category in BmiCategory::encoded() {
            let indicator: Array1<f64> = categories
                .iter()
                .map(|c| if c == category { 1.0 } else { 0.0 })
                .collect();
            out.push_column(category.column_name(), indicator)?;
        }

        out.replace_infinite(0.0);
        Ok(out)
    }
}

fn ratio(num: ArrayView1<'_, f64>, den: ArrayView1<'_, f64>, eps: f64) -> Array1<f64> {
    Zip::from(&num).and(&den).map_collect(|&n, &d| n / (d + eps))
}
