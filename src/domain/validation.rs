//! Dataset validation gate.
//!
//! Runs once on the raw training table, before the label is split off and
//! before any feature work. The rule suite is chosen when the [`Validator`]
//! is built and never changes between calls.

use super::frame::FeatureFrame;
use super::patient::{
    AGE, BLOOD_PRESSURE, BMI, FEATURE_NAMES, GLUCOSE, INSULIN, LABEL, PREGNANCIES, SKIN_THICKNESS,
};
use crate::config::ValidationMode;
use crate::{PipelineError, Result};

/// Share of a column that must fall inside its plausible range.
const MOSTLY: f64 = 0.95;

/// `(column, min, max)` ranges checked with the [`MOSTLY`] tolerance.
const RANGE_RULES: [(&str, f64, f64); 6] = [
    (AGE, 0.0, 120.0),
    (PREGNANCIES, 0.0, 20.0),
    (BLOOD_PRESSURE, 0.0, 200.0),
    (BMI, 0.0, 70.0),
    (INSULIN, 0.0, 900.0),
    (SKIN_THICKNESS, 0.0, 100.0),
];

/// Bounds for the smallest Glucose value in the table.
const GLUCOSE_MIN_BOUNDS: (f64, f64) = (0.0, 100.0);

/// Pass/fail gate over a raw labelled table.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    mode: ValidationMode,
}

impl Validator {
    #[must_use]
    pub fn new(mode: ValidationMode) -> Self {
        if mode == ValidationMode::Basic {
            tracing::warn!("Full rule suite disabled, using basic dataset validation");
        }
        Self { mode }
    }

    #[must_use]
    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Validate a raw table (features plus label).
    ///
    /// # Errors
    /// Returns `Validation` listing every failed rule.
    pub fn validate(&self, table: &FeatureFrame) -> Result<()> {
        tracing::info!("Starting data validation ({:?})", self.mode);
        let failures = match self.mode {
            ValidationMode::Expectations => expectation_failures(table),
            ValidationMode::Basic => basic_failures(table),
        };

        if failures.is_empty() {
            tracing::info!("Data validation passed");
            Ok(())
        } else {
            for failure in &failures {
                tracing::error!("Validation rule failed: {failure}");
            }
            Err(PipelineError::Validation(failures.join("; ")))
        }
    }
}

fn basic_failures(table: &FeatureFrame) -> Vec<String> {
    let mut failures = Vec::new();
    if table.n_rows() == 0 {
        failures.push("Dataset is empty".to_string());
    }
    if !table.has_column(LABEL) {
        failures.push(format!("Missing '{LABEL}' column"));
    }
    match table.column(GLUCOSE) {
        Some(col) if col.iter().any(|v| !v.is_nan()) => {}
        _ => failures.push(format!("{GLUCOSE} column has no observed values")),
    }
    failures
}

fn expectation_failures(table: &FeatureFrame) -> Vec<String> {
    let mut failures = Vec::new();

    if table.n_rows() == 0 {
        failures.push("Dataset is empty".to_string());
        return failures;
    }

    let required = FEATURE_NAMES.iter().copied().chain(std::iter::once(LABEL));
    for name in required {
        match table.column(name) {
            None => failures.push(format!("Missing required column '{name}'")),
            Some(col) => {
                let non_numeric = col.iter().filter(|v| !v.is_finite()).count();
                if non_numeric > 0 {
                    failures.push(format!(
                        "Column '{name}' has {non_numeric} non-numeric value(s)"
                    ));
                }
            }
        }
    }

    for (name, min, max) in RANGE_RULES {
        let Some(col) = table.column(name) else {
            continue;
        };
        let n = col.len() as f64;
        let inside = col.iter().filter(|&&v| v >= min && v <= max).count() as f64;
        if inside / n < MOSTLY {
            failures.push(format!(
                "Column '{name}': only {:.1}% of values within [{min}, {max}] (need {:.0}%)",
                inside / n * 100.0,
                MOSTLY * 100.0
            ));
        }
    }

    if let Some(col) = table.column(GLUCOSE) {
        let min = col.iter().copied().filter(|v| v.is_finite()).fold(f64::INFINITY, f64::min);
        let (lo, hi) = GLUCOSE_MIN_BOUNDS;
        if !(lo..=hi).contains(&min) {
            failures.push(format!(
                "Column '{GLUCOSE}': minimum {min} outside [{lo}, {hi}]"
            ));
        }
    }

    if let Some(col) = table.column(LABEL) {
        let bad = col.iter().filter(|&&v| v != 0.0 && v != 1.0).count();
        if bad > 0 {
            failures.push(format!("Column '{LABEL}': {bad} value(s) not in {{0, 1}}"));
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn table(rows: &[[f64; 9]]) -> FeatureFrame {
        let columns = FEATURE_NAMES
            .iter()
            .chain(std::iter::once(&LABEL))
            .map(|s| (*s).to_string())
            .collect();
        let flat: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        let values = Array2::from_shape_vec((rows.len(), 9), flat).expect("Should shape");
        FeatureFrame::new(columns, values).expect("Should build")
    }

    fn valid_rows() -> Vec<[f64; 9]> {
        (0..40)
            .map(|i| {
                let i = f64::from(i);
                [i % 6.0, 80.0 + i, 70.0, 20.0, 0.0, 25.0 + i / 4.0, 0.4, 21.0 + i, i % 2.0]
            })
            .collect()
    }

    #[test]
    fn test_valid_table_passes() {
        let v = Validator::new(ValidationMode::Expectations);
        assert!(v.validate(&table(&valid_rows())).is_ok());
    }

    #[test]
    fn test_missing_label_fails() {
        let mut t = table(&valid_rows());
        t.drop_column(LABEL);
        let err = Validator::new(ValidationMode::Expectations)
            .validate(&t)
            .expect_err("Should fail");
        assert!(err.to_string().contains(LABEL));
    }

    #[test]
    fn test_out_of_range_age_fails() {
        let mut rows = valid_rows();
        for row in rows.iter_mut().take(5) {
            row[7] = 150.0;
        }
        let result = Validator::new(ValidationMode::Expectations).validate(&table(&rows));
        assert!(matches!(result, Err(PipelineError::Validation(msg)) if msg.contains("Age")));
    }

    #[test]
    fn test_few_outliers_tolerated() {
        let mut rows = valid_rows();
        rows[0][5] = 90.0; // 1 of 40 BMI values out of range
        assert!(Validator::new(ValidationMode::Expectations)
            .validate(&table(&rows))
            .is_ok());
    }

    #[test]
    fn test_non_numeric_and_bad_label_fail() {
        let mut rows = valid_rows();
        rows[3][2] = f64::NAN;
        rows[4][8] = 2.0;
        let err = Validator::new(ValidationMode::Expectations)
            .validate(&table(&rows))
            .expect_err("Should fail");
        let msg = err.to_string();
        assert!(msg.contains("non-numeric"));
        assert!(msg.contains("not in {0, 1}"));
    }

    #[test]
    fn test_basic_mode_only_checks_structure() {
        let mut rows = valid_rows();
        rows[0][7] = 500.0;
        rows[1][7] = 500.0;
        rows[2][7] = 500.0;
        let basic = Validator::new(ValidationMode::Basic);
        assert!(basic.validate(&table(&rows)).is_ok());
        assert!(basic.validate(&table(&[])).is_err());
    }
}
