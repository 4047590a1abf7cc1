//! Patient record types for diabetes risk prediction.
//!
//! Based on the eight measurements of the Pima Indians Diabetes dataset.

use serde::{Deserialize, Serialize};

pub const PREGNANCIES: &str = "Pregnancies";
pub const GLUCOSE: &str = "Glucose";
pub const BLOOD_PRESSURE: &str = "BloodPressure";
pub const SKIN_THICKNESS: &str = "SkinThickness";
pub const INSULIN: &str = "Insulin";
pub const BMI: &str = "BMI";
pub const PEDIGREE: &str = "DiabetesPedigreeFunction";
pub const AGE: &str = "Age";

/// Binary target column. Must never reach a feature-producing stage.
pub const LABEL: &str = "Outcome";

/// Raw feature names in dataset order.
pub const FEATURE_NAMES: [&str; 8] = [
    PREGNANCIES,
    GLUCOSE,
    BLOOD_PRESSURE,
    SKIN_THICKNESS,
    INSULIN,
    BMI,
    PEDIGREE,
    AGE,
];

/// Fields for which a recorded zero means "not measured".
pub const ZERO_INVALID_FIELDS: [&str; 5] = [GLUCOSE, BLOOD_PRESSURE, SKIN_THICKNESS, INSULIN, BMI];

/// Name of the missingness indicator column for `field`.
#[must_use]
pub fn missing_indicator_name(field: &str) -> String {
    format!("Is_{field}_Missing")
}

/// One patient observation as submitted for inference.
///
/// Field names on the wire match the dataset column names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Number of pregnancies
    #[serde(rename = "Pregnancies")]
    pub pregnancies: u32,

    /// Plasma glucose concentration, 2h oral glucose tolerance test (mg/dL)
    #[serde(rename = "Glucose")]
    pub glucose: f64,

    /// Diastolic blood pressure (mm Hg)
    #[serde(rename = "BloodPressure")]
    pub blood_pressure: f64,

    /// Triceps skin fold thickness (mm)
    #[serde(rename = "SkinThickness")]
    pub skin_thickness: f64,

    /// 2-hour serum insulin (mu U/ml)
    #[serde(rename = "Insulin")]
    pub insulin: f64,

    /// Body mass index (kg/m^2)
    #[serde(rename = "BMI")]
    pub bmi: f64,

    /// Diabetes pedigree function
    #[serde(rename = "DiabetesPedigreeFunction")]
    pub diabetes_pedigree_function: f64,

    /// Age in years
    #[serde(rename = "Age")]
    pub age: u32,
}

impl PatientRecord {
    /// Convert to a vector in [`FEATURE_NAMES`] order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            f64::from(self.pregnancies),
            self.glucose,
            self.blood_pressure,
            self.skin_thickness,
            self.insulin,
            self.bmi,
            self.diabetes_pedigree_function,
            f64::from(self.age),
        ]
    }

    /// Validate a single submitted record.
    ///
    /// # Errors
    /// Returns every violated constraint.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let continuous = [
            (GLUCOSE, self.glucose),
            (BLOOD_PRESSURE, self.blood_pressure),
            (SKIN_THICKNESS, self.skin_thickness),
            (INSULIN, self.insulin),
            (BMI, self.bmi),
            (PEDIGREE, self.diabetes_pedigree_function),
        ];
        for (name, value) in continuous {
            if !value.is_finite() {
                errors.push(format!("{name} must be a finite number"));
            } else if value < 0.0 {
                errors.push(format!("{name} {value} must be >= 0"));
            }
        }
        if !(1..=120).contains(&self.age) {
            errors.push(format!("Age {} out of range [1, 120]", self.age));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PatientRecord {
        PatientRecord {
            pregnancies: 1,
            glucose: 100.0,
            blood_pressure: 70.0,
            skin_thickness: 20.0,
            insulin: 50.0,
            bmi: 23.0,
            diabetes_pedigree_function: 0.3,
            age: 25,
        }
    }

    #[test]
    fn test_record_to_vec_order() {
        let v = sample().to_vec();
        assert_eq!(v.len(), FEATURE_NAMES.len());
        assert!((v[1] - 100.0).abs() < f64::EPSILON);
        assert!((v[6] - 0.3).abs() < f64::EPSILON);
        assert!((v[7] - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wire_names() {
        let json = r#"{"Pregnancies":1,"Glucose":100,"BloodPressure":70,"SkinThickness":20,
            "Insulin":50,"BMI":23.0,"DiabetesPedigreeFunction":0.3,"Age":25}"#;
        let record: PatientRecord = serde_json::from_str(json).expect("Should parse");
        assert_eq!(record, sample());
    }

    #[test]
    fn test_validation() {
        assert!(sample().validate().is_ok());

        let invalid = PatientRecord {
            glucose: -5.0,
            age: 0,
            ..sample()
        };
        let errors = invalid.validate().expect_err("Should reject");
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_zero_readings_are_valid_input() {
        let record = PatientRecord {
            insulin: 0.0,
            skin_thickness: 0.0,
            ..sample()
        };
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_indicator_name() {
        assert_eq!(missing_indicator_name(INSULIN), "Is_Insulin_Missing");
    }
}
