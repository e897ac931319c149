//! Leakage-safe preprocessing
//!
//! Winsorization bounds and standardization parameters are fit once, on the
//! fit window, and applied unchanged to every later row. Applying a stage
//! before it has been fit is an error rather than a silent default.

pub mod scaler;
pub mod winsor;

pub use scaler::StandardScaler;
pub use winsor::{WinsorBounds, median, quantile_sorted};

use crate::error::{Result, ScoreError};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Configuration for the preprocessor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Winsorization quantile; bounds are `q` and `1 - q` (default: 0.01)
    pub winsor_quantile: f64,
    /// Minimum fit-window rows (default: 300)
    pub min_fit_rows: usize,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            winsor_quantile: 0.01,
            min_fit_rows: 300,
        }
    }
}

/// Owns the fitted winsorization bounds and scaler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafePreprocessor {
    config: PreprocessConfig,
    bounds: Option<WinsorBounds>,
    scaler: Option<StandardScaler>,
}

impl SafePreprocessor {
    /// Create an unfitted preprocessor
    pub const fn new(config: PreprocessConfig) -> Self {
        Self {
            config,
            bounds: None,
            scaler: None,
        }
    }

    /// Fit winsorization bounds on fit-window rows.
    pub fn fit_bounds(&mut self, fit_rows: ArrayView2<'_, f64>) -> Result<&WinsorBounds> {
        let bounds = WinsorBounds::fit_symmetric(
            fit_rows,
            self.config.winsor_quantile,
            self.config.min_fit_rows,
        )?;
        Ok(&*self.bounds.insert(bounds))
    }

    /// Clip rows with the fitted bounds.
    pub fn apply_bounds(&self, rows: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.bounds
            .as_ref()
            .ok_or(ScoreError::NotFitted("winsorization bounds"))?
            .apply(rows)
    }

    /// Fit the scaler on already-clipped fit-window rows.
    pub fn fit_scale(&mut self, clipped_fit_rows: ArrayView2<'_, f64>) -> Result<&StandardScaler> {
        let scaler = StandardScaler::fit(clipped_fit_rows)?;
        Ok(&*self.scaler.insert(scaler))
    }

    /// Standardize rows with the fitted scaler.
    pub fn apply_scale(&self, rows: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.scaler
            .as_ref()
            .ok_or(ScoreError::NotFitted("standard scaler"))?
            .transform(rows)
    }

    /// Fit both stages on raw fit-window rows; returns the standardized fit rows.
    pub fn fit(&mut self, fit_rows: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.fit_bounds(fit_rows)?;
        let clipped = self.apply_bounds(fit_rows)?;
        self.fit_scale(clipped.view())?;
        self.apply_scale(clipped.view())
    }

    /// Configuration.
    pub const fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Fitted bounds, if any.
    pub const fn bounds(&self) -> Option<&WinsorBounds> {
        self.bounds.as_ref()
    }

    /// Fitted scaler, if any.
    pub const fn scaler(&self) -> Option<&StandardScaler> {
        self.scaler.as_ref()
    }
}
