//! Feature matrices built from forecast rows.

use crate::error::{ModelError, Result};
use ndarray::{Array1, Array2};
use profitpulse_factors::{ProxyKind, ProxySet};
use profitpulse_score::ForecastRow;

/// Features (winsorized proxies) and binary labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Observations by feature
    pub x: Array2<f64>,
    /// Labels in {0, 1}
    pub y: Array1<u8>,
}

impl Dataset {
    /// Build from forecast rows using the listed proxies as columns.
    pub fn from_forecast(rows: &[ForecastRow], features: &[ProxyKind]) -> Result<Self> {
        let x = feature_matrix(
            rows.iter()
                .map(|r| (r.firm_id.as_str(), r.predictor_year, &r.features)),
            rows.len(),
            features,
        )?;
        let y = rows.iter().map(|r| r.label).collect();
        Ok(Self { x, y })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.y.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Number of features.
    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Row counts of class 0 and class 1.
    pub fn class_counts(&self) -> [usize; 2] {
        let positives = self.y.iter().filter(|v| **v == 1).count();
        [self.len() - positives, positives]
    }

    /// Fail unless the set is non-empty and has both classes.
    pub fn check_trainable(&self) -> Result<()> {
        match self.class_counts() {
            [0, 0] => Err(ModelError::EmptyTrainingSet),
            [_, 0] => Err(ModelError::SingleClass(0)),
            [0, _] => Err(ModelError::SingleClass(1)),
            _ => Ok(()),
        }
    }

    /// Per-class weights `n / (2 * count_c)`, or ones when not balancing.
    pub fn class_weights(&self, balanced: bool) -> [f64; 2] {
        if !balanced {
            return [1.0, 1.0];
        }
        let n = self.len() as f64;
        self.class_counts()
            .map(|count| if count == 0 { 0.0 } else { n / (2.0 * count as f64) })
    }

    /// Labels as 0.0 / 1.0.
    pub fn targets(&self) -> Vec<f64> {
        self.y.iter().map(|v| f64::from(*v)).collect()
    }
}

/// Stack proxy sets into a matrix, failing on any undefined feature.
pub fn feature_matrix<'a>(
    rows: impl Iterator<Item = (&'a str, i32, &'a ProxySet)>,
    n_rows: usize,
    features: &[ProxyKind],
) -> Result<Array2<f64>> {
    let mut x = Array2::zeros((n_rows, features.len()));
    for (i, (firm_id, year, set)) in rows.enumerate() {
        for (j, kind) in features.iter().enumerate() {
            x[[i, j]] = set.get(*kind).ok_or_else(|| ModelError::MissingFeature {
                firm_id: firm_id.to_string(),
                year,
                proxy: *kind,
            })?;
        }
    }
    Ok(x)
}
