//! Measurement model
//!
//! Runs winsorization, standardization and projection in order on the fit
//! window and then scores every complete row of every year with the frozen
//! parameters.

use crate::error::{Result, ScoreError};
use crate::pca::ProjectionModel;
use crate::preprocess::{PreprocessConfig, SafePreprocessor};
use ndarray::Array2;
use profitpulse_factors::{ProxyKind, ProxyRecord, ProxySet};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Configuration for the measurement model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementConfig {
    /// Proxies fed to the projection, in column order (default: all five)
    pub proxies: Vec<ProxyKind>,
    /// Last year of the fit window, inclusive (default: 2019)
    pub fit_cutoff_year: i32,
    /// Winsorization quantile (default: 0.01)
    pub winsor_quantile: f64,
    /// Number of principal components retained (default: 3)
    pub pca_rank: usize,
    /// Minimum complete fit-window rows (default: 300)
    pub min_fit_rows: usize,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            proxies: ProxyKind::ALL.to_vec(),
            fit_cutoff_year: 2019,
            winsor_quantile: 0.01,
            pca_rank: 3,
            min_fit_rows: 300,
        }
    }
}

/// One complete firm-year after measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// Firm identifier
    pub firm_id: String,
    /// Calendar year
    pub year: i32,
    /// Winsorized proxies
    pub proxies: ProxySet,
    /// Standardized proxies (fit-window scaler)
    pub z: ProxySet,
    /// Component scores, one per retained axis
    pub components: Vec<f64>,
    /// Variance-weighted ProfitScore
    pub profit_score: f64,
    /// Same-year label, assigned by the labeler
    pub label: Option<u8>,
}

/// Fitted preprocessing and projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementModel {
    config: MeasurementConfig,
    preprocessor: SafePreprocessor,
    projection: ProjectionModel,
    fit_rows: usize,
}

impl MeasurementModel {
    /// Fit on the complete rows with `year <= fit_cutoff_year`.
    pub fn fit(rows: &[ProxyRecord], config: MeasurementConfig) -> Result<Self> {
        if config.proxies.is_empty() {
            return Err(ScoreError::InvalidParameter(
                "proxy list must not be empty".to_string(),
            ));
        }

        let fit_window: Vec<&ProxyRecord> = rows
            .iter()
            .filter(|r| r.year() <= config.fit_cutoff_year && r.is_complete(&config.proxies))
            .collect();
        let x = design_matrix(&fit_window, &config.proxies)?;

        let mut preprocessor = SafePreprocessor::new(PreprocessConfig {
            winsor_quantile: config.winsor_quantile,
            min_fit_rows: config.min_fit_rows,
        });
        let z = preprocessor.fit(x.view())?;
        let projection = ProjectionModel::fit(z.view(), config.pca_rank, config.min_fit_rows)?;

        info!(
            fit_rows = fit_window.len(),
            cutoff = config.fit_cutoff_year,
            rank = config.pca_rank,
            "measurement model fit"
        );

        Ok(Self {
            fit_rows: fit_window.len(),
            config,
            preprocessor,
            projection,
        })
    }

    /// Score every complete row, preserving input order.
    pub fn score(&self, rows: &[ProxyRecord]) -> Result<Vec<ScoredRecord>> {
        let kinds = &self.config.proxies;
        let complete: Vec<&ProxyRecord> = rows.iter().filter(|r| r.is_complete(kinds)).collect();
        if complete.is_empty() {
            return Ok(Vec::new());
        }

        let x = design_matrix(&complete, kinds)?;
        let clipped = self.preprocessor.apply_bounds(x.view())?;
        let z = self.preprocessor.apply_scale(clipped.view())?;
        let comps = self.projection.transform(z.view())?;
        let scores = self.projection.compute_score(comps.view())?;

        let scored: Vec<ScoredRecord> = complete
            .iter()
            .enumerate()
            .map(|(i, rec)| {
                let mut proxies = ProxySet::default();
                let mut zs = ProxySet::default();
                for (j, kind) in kinds.iter().enumerate() {
                    proxies.set(*kind, Some(clipped[[i, j]]));
                    zs.set(*kind, Some(z[[i, j]]));
                }
                ScoredRecord {
                    firm_id: rec.firm_id().to_string(),
                    year: rec.year(),
                    proxies,
                    z: zs,
                    components: comps.row(i).to_vec(),
                    profit_score: scores[i],
                    label: None,
                }
            })
            .collect();

        info!(
            scored = scored.len(),
            skipped = rows.len() - scored.len(),
            "rows scored"
        );
        Ok(scored)
    }

    /// Configuration.
    pub const fn config(&self) -> &MeasurementConfig {
        &self.config
    }

    /// Fitted preprocessor.
    pub const fn preprocessor(&self) -> &SafePreprocessor {
        &self.preprocessor
    }

    /// Fitted projection.
    pub const fn projection(&self) -> &ProjectionModel {
        &self.projection
    }

    /// Number of fit-window rows used.
    pub const fn fit_rows(&self) -> usize {
        self.fit_rows
    }
}

fn design_matrix(rows: &[&ProxyRecord], kinds: &[ProxyKind]) -> Result<Array2<f64>> {
    let flat: Vec<f64> = rows
        .iter()
        .filter_map(|r| r.proxies.select(kinds))
        .flatten()
        .collect();
    Array2::from_shape_vec((rows.len(), kinds.len()), flat).map_err(|_| {
        ScoreError::DimensionMismatch {
            expected: rows.len() * kinds.len(),
            actual: rows.len(),
        }
    })
}
