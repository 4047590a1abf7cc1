//! CSV dataset adapter.
//!
//! Reads a headered CSV into a [`FeatureFrame`]. Every column is parsed as
//! `f64`; cells that are empty or not numeric become NaN so the validation
//! gate can report them instead of the loader guessing.

use std::path::Path;

use ndarray::Array2;

use crate::domain::FeatureFrame;
use crate::{PipelineError, Result};

/// Load a raw dataset from a CSV file.
///
/// # Errors
/// Returns `DataNotFound` if the file does not exist, `Csv` if it is not
/// well-formed CSV, `Validation` if the header repeats a column.
pub fn load_data(path: &Path) -> Result<FeatureFrame> {
    tracing::info!("Loading data from: {}", path.display());

    if !path.is_file() {
        return Err(PipelineError::DataNotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut flat = Vec::new();
    let mut n_rows = 0;
    for result in reader.records() {
        let record = result?;
        flat.extend(record.iter().map(|cell| cell.parse::<f64>().unwrap_or(f64::NAN)));
        n_rows += 1;
    }

    let values = Array2::from_shape_vec((n_rows, columns.len()), flat)
        .map_err(|e| PipelineError::Validation(format!("Ragged CSV rows: {e}")))?;
    let frame = FeatureFrame::new(columns, values)?;

    tracing::info!(
        "Data loaded successfully. Shape: ({}, {})",
        frame.n_rows(),
        frame.n_cols()
    );
    Ok(frame)
}
