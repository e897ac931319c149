//! Principal-component projection and the ProfitScore
//!
//! The projection is fit once on standardized fit-window rows. The score of
//! a row is the variance-weighted sum of its component scores, with weights
//! (omega) proportional to the retained eigenvalues.

use crate::error::{Result, ScoreError};
use crate::linalg::{column_means, sample_covariance, symmetric_eigen};
use ndarray::{Array1, Array2, ArrayView2, s};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fitted projection onto the leading principal components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionModel {
    /// Fit-window column means used for centering
    pub mean: Array1<f64>,
    /// Loadings, one row per retained component
    pub components: Array2<f64>,
    /// Variance along each retained component
    pub explained_variance: Array1<f64>,
    /// Share of total variance per retained component
    pub explained_variance_ratio: Array1<f64>,
    /// Normalized component weights (omega); non-negative, sum to 1
    pub weights: Array1<f64>,
}

impl ProjectionModel {
    /// Fit the projection.
    ///
    /// # Arguments
    /// * `x` - Standardized fit-window rows
    /// * `rank` - Number of components to retain
    /// * `min_rows` - Minimum number of rows required
    ///
    /// # Returns
    /// * The fitted projection; each component is oriented so that its
    ///   largest-magnitude loading is positive
    pub fn fit(x: ArrayView2<'_, f64>, rank: usize, min_rows: usize) -> Result<Self> {
        let (n, p) = x.dim();
        if rank == 0 || rank > p {
            return Err(ScoreError::InvalidParameter(format!(
                "PCA rank must be between 1 and {p}, got {rank}"
            )));
        }
        let required = min_rows.max(rank + 1);
        if n < required {
            return Err(ScoreError::InsufficientData {
                stage: "projection",
                required,
                actual: n,
            });
        }

        let mean = column_means(x);
        let cov = sample_covariance(x)?;
        let decomp = symmetric_eigen(&cov)?;

        let all: Array1<f64> = decomp.eigenvalues.mapv(|v| v.max(0.0));
        let total: f64 = all.sum();

        let explained_variance = all.slice(s![..rank]).to_owned();
        let explained_variance_ratio = if total > 0.0 {
            &explained_variance / total
        } else {
            Array1::zeros(rank)
        };

        let retained: f64 = explained_variance.sum();
        let weights = if retained > 0.0 {
            &explained_variance / retained
        } else {
            Array1::from_elem(rank, 1.0 / rank as f64)
        };

        let mut components = decomp.eigenvectors.slice(s![.., ..rank]).t().to_owned();
        for mut row in components.rows_mut() {
            let pivot = row
                .iter()
                .copied()
                .fold(0.0_f64, |best, v| if v.abs() > best.abs() { v } else { best });
            if pivot < 0.0 {
                row.mapv_inplace(|v| -v);
            }
        }

        debug!(
            ?explained_variance_ratio,
            ?weights,
            rows = n,
            "projection fit"
        );

        Ok(Self {
            mean,
            components,
            explained_variance,
            explained_variance_ratio,
            weights,
        })
    }

    /// Number of retained components.
    pub fn rank(&self) -> usize {
        self.components.nrows()
    }

    /// Number of input columns.
    pub fn width(&self) -> usize {
        self.components.ncols()
    }

    /// Component loadings (rank x width).
    pub fn loadings(&self) -> ArrayView2<'_, f64> {
        self.components.view()
    }

    /// Project standardized rows onto the fixed basis.
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.width() {
            return Err(ScoreError::DimensionMismatch {
                expected: self.width(),
                actual: x.ncols(),
            });
        }
        Ok((&x - &self.mean).dot(&self.components.t()))
    }

    /// ProfitScore per row: `sum_i omega_i * component_i`.
    pub fn compute_score(&self, components: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        if components.ncols() != self.rank() {
            return Err(ScoreError::DimensionMismatch {
                expected: self.rank(),
                actual: components.ncols(),
            });
        }
        Ok(components.dot(&self.weights))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, array};

    fn sample() -> Array2<f64> {
        Array2::from_shape_fn((40, 4), |(i, j)| {
            let t = i as f64;
            match j {
                0 => t.sin() * 2.0,
                1 => t.sin() * 1.5 + (t * 0.7).cos() * 0.2,
                2 => (t * 0.3).cos(),
                _ => ((i * 7) % 11) as f64 / 11.0,
            }
        })
    }

    #[test]
    fn test_weights_sum_to_one() {
        let model = ProjectionModel::fit(sample().view(), 3, 10).unwrap();

        assert_abs_diff_eq!(model.weights.sum(), 1.0, epsilon = 1e-12);
        assert!(model.weights.iter().all(|w| *w >= 0.0));
        assert!(model.explained_variance_ratio.sum() <= 1.0 + 1e-12);
        // Descending variance
        assert!(model.explained_variance[0] >= model.explained_variance[1]);
        assert!(model.explained_variance[1] >= model.explained_variance[2]);
    }

    #[test]
    fn test_sign_convention() {
        let model = ProjectionModel::fit(sample().view(), 4, 10).unwrap();
        for row in model.components.rows() {
            let pivot = row
                .iter()
                .copied()
                .fold(0.0_f64, |best, v| if v.abs() > best.abs() { v } else { best });
            assert!(pivot > 0.0);
        }
    }

    #[test]
    fn test_collinear_data() {
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0], [4.0, 8.0]];
        let model = ProjectionModel::fit(x.view(), 2, 1).unwrap();

        assert_abs_diff_eq!(model.explained_variance_ratio[0], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(model.weights[0], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(model.weights[1], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_constant_data_uniform_weights() {
        let x = Array2::<f64>::ones((5, 3));
        let model = ProjectionModel::fit(x.view(), 2, 1).unwrap();
        assert_eq!(model.weights, array![0.5, 0.5]);

        let scores = model
            .compute_score(model.transform(x.view()).unwrap().view())
            .unwrap();
        assert!(scores.iter().all(|s| s.abs() < 1e-12));
    }

    #[test]
    fn test_score_is_weighted_sum() {
        let x = sample();
        let model = ProjectionModel::fit(x.view(), 2, 10).unwrap();
        let comps = model.transform(x.view()).unwrap();
        let scores = model.compute_score(comps.view()).unwrap();

        for (i, score) in scores.iter().enumerate() {
            let expected = comps[[i, 0]] * model.weights[0] + comps[[i, 1]] * model.weights[1];
            assert_abs_diff_eq!(*score, expected, epsilon = 1e-12);
        }
        // Centered on the fit mean
        assert_abs_diff_eq!(scores.mean().unwrap(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_invalid_rank() {
        let x = sample();
        assert!(matches!(
            ProjectionModel::fit(x.view(), 0, 1),
            Err(ScoreError::InvalidParameter(_))
        ));
        assert!(matches!(
            ProjectionModel::fit(x.view(), 5, 1),
            Err(ScoreError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_insufficient_rows() {
        let x = Array2::<f64>::zeros((3, 4));
        assert_eq!(
            ProjectionModel::fit(x.view(), 3, 1).unwrap_err(),
            ScoreError::InsufficientData {
                stage: "projection",
                required: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_transform_width_mismatch() {
        let model = ProjectionModel::fit(sample().view(), 2, 10).unwrap();
        assert!(model.transform(Array2::<f64>::zeros((1, 3)).view()).is_err());
        assert!(model.compute_score(Array2::<f64>::zeros((1, 3)).view()).is_err());
    }
}
