//! Domain layer: Core types and validation rules.
//!
//! This module contains plain data types with no I/O. Column-name constants
//! here are the single source of truth for every stage.

mod bmi;
mod frame;
pub mod patient;
mod prediction;
mod validation;

pub use bmi::BmiCategory;
pub use frame::FeatureFrame;
pub use patient::{PatientRecord, FEATURE_NAMES, LABEL, ZERO_INVALID_FIELDS};
pub use prediction::{Prediction, PredictionStatus};
pub use validation::Validator;
