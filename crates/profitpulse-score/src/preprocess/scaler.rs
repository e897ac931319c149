//! Column standardization.

use crate::error::{Result, ScoreError};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Mean and population standard deviation per column.
///
/// A column with zero spread stores a std of 1.0, so constant inputs map to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Column means
    pub mean: Array1<f64>,
    /// Column standard deviations (never zero)
    pub std: Array1<f64>,
}

impl StandardScaler {
    /// Fit on the rows of `x`.
    pub fn fit(x: ArrayView2<'_, f64>) -> Result<Self> {
        let n = x.nrows();
        if n == 0 {
            return Err(ScoreError::InsufficientData {
                stage: "standardization",
                required: 1,
                actual: 0,
            });
        }
        let mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(x.ncols()));
        let std = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s.is_finite() && s > 0.0 { s } else { 1.0 });
        Ok(Self { mean, std })
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// `(x - mean) / std` with the frozen parameters.
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.width() {
            return Err(ScoreError::DimensionMismatch {
                expected: self.width(),
                actual: x.ncols(),
            });
        }
        Ok((&x - &self.mean) / &self.std)
    }

    /// Transform a single observation.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.width() {
            return Err(ScoreError::DimensionMismatch {
                expected: self.width(),
                actual: row.len(),
            });
        }
        Ok(row
            .iter()
            .enumerate()
            .map(|(j, v)| (v - self.mean[j]) / self.std[j])
            .collect())
    }
}
