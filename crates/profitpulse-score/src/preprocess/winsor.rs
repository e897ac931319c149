//! Quantile winsorization bounds.

use crate::error::{Result, ScoreError};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Linear-interpolation quantile of an ascending-sorted slice.
///
/// Position `q * (n - 1)` between the neighbouring order statistics.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Median with the same interpolation rule.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, 0.5)
}

fn column_quantiles(column: ArrayView1<'_, f64>, lower_q: f64, upper_q: f64) -> (f64, f64) {
    let mut sorted = column.to_vec();
    sorted.sort_by(f64::total_cmp);
    // Non-empty: callers check the row count first.
    let lower = quantile_sorted(&sorted, lower_q).unwrap_or(f64::NEG_INFINITY);
    let upper = quantile_sorted(&sorted, upper_q).unwrap_or(f64::INFINITY);
    (lower, upper)
}

/// Per-column clipping bounds computed from the fit window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinsorBounds {
    /// Lower quantile used
    pub lower_quantile: f64,
    /// Upper quantile used
    pub upper_quantile: f64,
    /// Lower bound per column
    pub lower: Array1<f64>,
    /// Upper bound per column
    pub upper: Array1<f64>,
}

impl WinsorBounds {
    /// Fit bounds from complete fit-window rows.
    ///
    /// # Arguments
    /// * `x` - Fit-window observations (rows) by ratio (columns)
    /// * `lower_q` - Lower quantile, e.g. 0.01
    /// * `upper_q` - Upper quantile, e.g. 0.99
    /// * `min_rows` - Minimum number of rows required
    pub fn fit(
        x: ArrayView2<'_, f64>,
        lower_q: f64,
        upper_q: f64,
        min_rows: usize,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&lower_q) || !(0.0..=1.0).contains(&upper_q) || lower_q > upper_q
        {
            return Err(ScoreError::InvalidParameter(format!(
                "winsor quantiles must satisfy 0 <= lower <= upper <= 1, got {lower_q} / {upper_q}"
            )));
        }
        let required = min_rows.max(1);
        if x.nrows() < required {
            return Err(ScoreError::InsufficientData {
                stage: "winsorization",
                required,
                actual: x.nrows(),
            });
        }

        let (lower, upper): (Vec<f64>, Vec<f64>) = x
            .columns()
            .into_iter()
            .map(|col| column_quantiles(col, lower_q, upper_q))
            .unzip();

        debug!(?lower, ?upper, rows = x.nrows(), "winsor bounds fit");

        Ok(Self {
            lower_quantile: lower_q,
            upper_quantile: upper_q,
            lower: Array1::from(lower),
            upper: Array1::from(upper),
        })
    }

    /// Symmetric bounds at `q` and `1 - q`.
    pub fn fit_symmetric(x: ArrayView2<'_, f64>, q: f64, min_rows: usize) -> Result<Self> {
        Self::fit(x, q, 1.0 - q, min_rows)
    }

    /// Number of columns the bounds cover.
    pub fn width(&self) -> usize {
        self.lower.len()
    }

    /// Clip every column to its bounds.
    pub fn apply(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.width() {
            return Err(ScoreError::DimensionMismatch {
                expected: self.width(),
                actual: x.ncols(),
            });
        }
        let mut out = x.to_owned();
        for (j, mut col) in out.columns_mut().into_iter().enumerate() {
            let (lo, hi) = (self.lower[j], self.upper[j]);
            col.mapv_inplace(|v| v.clamp(lo, hi));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, array};
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(0.25, 1.75)]
    #[case(0.5, 2.5)]
    #[case(1.0, 4.0)]
    fn test_quantile_linear(#[case] q: f64, #[case] expected: f64) {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_abs_diff_eq!(quantile_sorted(&sorted, q).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_fit_and_apply() {
        let x = Array2::from_shape_fn((101, 1), |(i, _)| i as f64);
        let bounds = WinsorBounds::fit_symmetric(x.view(), 0.01, 10).unwrap();

        assert_abs_diff_eq!(bounds.lower[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bounds.upper[0], 99.0, epsilon = 1e-12);

        let clipped = bounds.apply(array![[-50.0], [50.0], [500.0]].view()).unwrap();
        assert_eq!(clipped, array![[1.0], [50.0], [99.0]]);
    }

    #[test]
    fn test_fit_insufficient_rows() {
        let x = Array2::<f64>::zeros((5, 2));
        let err = WinsorBounds::fit_symmetric(x.view(), 0.01, 300).unwrap_err();
        assert_eq!(
            err,
            ScoreError::InsufficientData {
                stage: "winsorization",
                required: 300,
                actual: 5
            }
        );
    }

    #[test]
    fn test_apply_width_mismatch() {
        let x = Array2::<f64>::zeros((3, 2));
        let bounds = WinsorBounds::fit_symmetric(x.view(), 0.01, 1).unwrap();
        assert!(bounds.apply(Array2::<f64>::zeros((1, 3)).view()).is_err());
    }
}
