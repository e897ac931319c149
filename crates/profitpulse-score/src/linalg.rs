//! Small dense linear-algebra helpers
//!
//! Column means, sample covariance, and a sorted symmetric eigen-decomposition
//! for the projection step. The decomposition itself is nalgebra's.

use crate::error::{Result, ScoreError};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Result of eigenvalue decomposition
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// Eigenvalues (sorted in descending order)
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors (columns are eigenvectors)
    pub eigenvectors: Array2<f64>,
}

/// Column means of a row-major observation matrix.
pub fn column_means(x: ArrayView2<'_, f64>) -> Array1<f64> {
    x.mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(x.ncols()))
}

/// Sample covariance (divisor n - 1) of the columns of `x`.
pub fn sample_covariance(x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    let n = x.nrows();
    if n < 2 {
        return Err(ScoreError::InsufficientData {
            stage: "covariance",
            required: 2,
            actual: n,
        });
    }
    let mean = column_means(x);
    let centered = &x - &mean;
    Ok(centered.t().dot(&centered) / (n as f64 - 1.0))
}

/// Eigen-decomposition of a symmetric matrix, strongest component first.
///
/// Only the lower triangle of `matrix` is read. Equal eigenvalues keep the
/// solver's column order, so repeated calls give identical vectors.
pub fn symmetric_eigen(matrix: &Array2<f64>) -> Result<EigenDecomposition> {
    let (n, m) = matrix.dim();
    if n != m {
        return Err(ScoreError::DimensionMismatch {
            expected: n,
            actual: m,
        });
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(ScoreError::InvalidParameter(
            "covariance matrix has non-finite entries".to_string(),
        ));
    }

    let eigen = DMatrix::from_fn(n, n, |i, j| matrix[[i.max(j), i.min(j)]]).symmetric_eigen();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| eigen.eigenvalues[j].total_cmp(&eigen.eigenvalues[i]));

    let eigenvalues = order.iter().map(|&i| eigen.eigenvalues[i]).collect();
    let eigenvectors =
        Array2::from_shape_fn((n, n), |(row, col)| eigen.eigenvectors[(row, order[col])]);

    Ok(EigenDecomposition {
        eigenvalues,
        eigenvectors,
    })
}
