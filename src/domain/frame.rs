//! Named-column numeric table shared by every pipeline stage.

use ndarray::{concatenate, Array1, Array2, ArrayView1, Axis};

use super::patient::{PatientRecord, FEATURE_NAMES};
use crate::{PipelineError, Result};

/// An ordered set of named `f64` columns over a row-major matrix.
///
/// Column names are unique; column order is significant and preserved by
/// every operation.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl FeatureFrame {
    /// Create a frame, checking that names are unique and match the matrix width.
    ///
    /// # Errors
    /// Returns `Validation` on a width mismatch or duplicate column.
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if columns.len() != values.ncols() {
            return Err(PipelineError::Validation(format!(
                "Expected {} columns, matrix has {}",
                columns.len(),
                values.ncols()
            )));
        }
        for (i, name) in columns.iter().enumerate() {
            if columns[..i].contains(name) {
                return Err(PipelineError::Validation(format!(
                    "Duplicate column '{name}'"
                )));
            }
        }
        Ok(Self { columns, values })
    }

    /// Build a raw feature frame (no label) from typed records.
    #[must_use]
    pub fn from_records(records: &[PatientRecord]) -> Self {
        let n_cols = FEATURE_NAMES.len();
        let flat: Vec<f64> = records.iter().flat_map(PatientRecord::to_vec).collect();
        let values = Array2::from_shape_vec((records.len(), n_cols), flat)
            .unwrap_or_else(|_| Array2::zeros((0, n_cols)));
        Self {
            columns: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
            values,
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Array2<f64> {
        self.values
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(name).map(|i| self.values.column(i))
    }

    /// Column by name, or a `Validation` error naming the missing column.
    ///
    /// # Errors
    /// Returns `Validation` if the column does not exist.
    pub fn require_column(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
        self.column(name)
            .ok_or_else(|| PipelineError::Validation(format!("Missing required column '{name}'")))
    }

    /// Remove a column if present. Returns whether anything was removed.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        let keep: Vec<usize> = (0..self.n_cols()).filter(|&i| i != idx).collect();
        self.values = self.values.select(Axis(1), &keep);
        self.columns.remove(idx);
        true
    }

    /// Append a column at the end.
    ///
    /// # Errors
    /// Returns `Validation` if the name exists or the length is wrong.
    pub fn push_column(&mut self, name: impl Into<String>, column: Array1<f64>) -> Result<()> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(PipelineError::Validation(format!("Duplicate column '{name}'")));
        }
        if column.len() != self.n_rows() {
            return Err(PipelineError::Validation(format!(
                "Column '{name}' has {} rows, frame has {}",
                column.len(),
                self.n_rows()
            )));
        }
        let column = column.insert_axis(Axis(1));
        self.values = concatenate(Axis(1), &[self.values.view(), column.view()])
            .map_err(|e| PipelineError::Numerical(e.to_string()))?;
        self.columns.push(name);
        Ok(())
    }

    /// Select the given columns in the given order; all must exist.
    ///
    /// # Errors
    /// Returns `Validation` naming the first missing column.
    pub fn select(&self, names: &[&str]) -> Result<Self> {
        let indices = names
            .iter()
            .map(|name| {
                self.column_index(name).ok_or_else(|| {
                    PipelineError::Validation(format!("Missing required column '{name}'"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            columns: names.iter().map(|s| (*s).to_string()).collect(),
            values: self.values.select(Axis(1), &indices),
        })
    }

    /// Conform to `columns`: absent columns are filled with `fill`, unknown
    /// columns are discarded and the order follows `columns`.
    #[must_use]
    pub fn reindex(&self, columns: &[String], fill: f64) -> Self {
        let sources: Vec<Option<usize>> = columns.iter().map(|c| self.column_index(c)).collect();
        let values = Array2::from_shape_fn((self.n_rows(), columns.len()), |(row, col)| {
            match sources[col] {
                Some(src) => self.values[[row, src]],
                None => fill,
            }
        });
        Self {
            columns: columns.to_vec(),
            values,
        }
    }

    /// Rows at `indices`, in that order (duplicates allowed).
    #[must_use]
    pub fn take_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            values: self.values.select(Axis(0), indices),
        }
    }

    /// Replace every `±inf` with `value`.
    pub fn replace_infinite(&mut self, value: f64) {
        self.values.mapv_inplace(|v| if v.is_infinite() { value } else { v });
    }
}
