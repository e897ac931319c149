//! Metrics and methodology documents.

use profitpulse_factors::ProxyKind;
use profitpulse_models::{Backend, Metrics, Substitution, TrainingReport};
use profitpulse_score::{Labeler, MeasurementModel, Split, TemporalSplit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Partition sizes and boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSummary {
    /// Last target year used for training
    pub train_cutoff: i32,
    /// Target years evaluated
    pub test_years: Vec<i32>,
    /// Training rows
    pub train_rows: usize,
    /// Test rows
    pub test_rows: usize,
    /// Forecast rows in neither partition
    pub excluded_rows: usize,
}

impl SplitSummary {
    /// Summarize a split.
    pub fn new(temporal: &TemporalSplit, split: &Split) -> Self {
        Self {
            train_cutoff: temporal.train_cutoff(),
            test_years: temporal.test_years().iter().copied().collect(),
            train_rows: split.train.len(),
            test_rows: split.test.len(),
            excluded_rows: split.excluded,
        }
    }
}

/// One model's entry in the metrics document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    /// Backend that produced the fit
    pub backend: Backend,
    /// Test-set metrics
    pub metrics: Metrics,
    /// Feature importances keyed by proxy name
    pub feature_importances: Option<BTreeMap<String, f64>>,
}

/// Contents of `model_metrics.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Split boundaries and sizes
    pub split: SplitSummary,
    /// Per-model results keyed by model id
    pub models: BTreeMap<String, ModelReport>,
    /// Backend substitutions
    pub substitutions: Vec<Substitution>,
    /// Model used for the screener and alerts
    pub default_model: String,
    /// Effective run configuration
    pub config: serde_json::Value,
}

impl MetricsReport {
    /// Assemble the report for a finished training stage.
    pub fn new(
        split: SplitSummary,
        training: &TrainingReport,
        default_model: impl Into<String>,
        config: serde_json::Value,
    ) -> Self {
        let models = training
            .models
            .iter()
            .map(|m| {
                (
                    m.kind.id().to_string(),
                    ModelReport {
                        backend: m.backend,
                        metrics: m.metrics.clone(),
                        feature_importances: m.feature_importances.clone(),
                    },
                )
            })
            .collect();
        Self {
            split,
            models,
            substitutions: training.substitutions.clone(),
            default_model: default_model.into(),
            config,
        }
    }
}

/// Contents of `methodology_snapshot.json`: every fitted measurement
/// parameter, keyed by proxy name where it is per-proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodologySnapshot {
    /// Last year of the fit window
    pub fit_cutoff_year: i32,
    /// Rows in the fit window
    pub fit_rows: usize,
    /// Proxies in column order
    pub proxies: Vec<ProxyKind>,
    /// Winsorization tail quantile
    pub winsor_quantile: f64,
    /// Lower clip bound per proxy
    pub winsor_lower: BTreeMap<String, f64>,
    /// Upper clip bound per proxy
    pub winsor_upper: BTreeMap<String, f64>,
    /// Scaler mean per proxy
    pub scaler_mean: BTreeMap<String, f64>,
    /// Scaler standard deviation per proxy
    pub scaler_std: BTreeMap<String, f64>,
    /// Retained components
    pub pca_rank: usize,
    /// Variance per retained component
    pub explained_variance: Vec<f64>,
    /// Variance ratio per retained component
    pub explained_variance_ratio: Vec<f64>,
    /// ProfitScore weight per component
    pub weights: Vec<f64>,
    /// Component loadings, one row per component, keyed by proxy name
    pub loadings: Vec<BTreeMap<String, f64>>,
    /// Label rule name
    pub label_rule: String,
    /// Fixed label threshold, if the rule has one
    pub label_threshold: Option<f64>,
}

fn keyed<'a>(
    proxies: &[ProxyKind],
    values: impl IntoIterator<Item = &'a f64>,
) -> BTreeMap<String, f64> {
    proxies
        .iter()
        .zip(values)
        .map(|(k, v)| (k.name().to_string(), *v))
        .collect()
}

impl MethodologySnapshot {
    /// Snapshot a fitted measurement model and labeler.
    pub fn new(model: &MeasurementModel, labeler: &Labeler) -> Self {
        let config = model.config();
        let proxies = &config.proxies;
        let preprocessor = model.preprocessor();
        let projection = model.projection();

        let (winsor_lower, winsor_upper) = preprocessor
            .bounds()
            .map(|b| (keyed(proxies, &b.lower), keyed(proxies, &b.upper)))
            .unwrap_or_default();
        let (scaler_mean, scaler_std) = preprocessor
            .scaler()
            .map(|s| (keyed(proxies, &s.mean), keyed(proxies, &s.std)))
            .unwrap_or_default();

        Self {
            fit_cutoff_year: config.fit_cutoff_year,
            fit_rows: model.fit_rows(),
            proxies: proxies.clone(),
            winsor_quantile: config.winsor_quantile,
            winsor_lower,
            winsor_upper,
            scaler_mean,
            scaler_std,
            pca_rank: projection.rank(),
            explained_variance: projection.explained_variance.to_vec(),
            explained_variance_ratio: projection.explained_variance_ratio.to_vec(),
            weights: projection.weights.to_vec(),
            loadings: projection
                .loadings()
                .rows()
                .into_iter()
                .map(|row| keyed(proxies, row))
                .collect(),
            label_rule: labeler.rule().to_string(),
            label_threshold: labeler.threshold(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_follows_proxy_order() {
        let map = keyed(&[ProxyKind::Npm, ProxyKind::Roa], &[1.0, 2.0]);
        assert_eq!(map["NPM"], 1.0);
        assert_eq!(map["ROA"], 2.0);
    }

    #[test]
    fn test_split_summary() {
        let temporal = TemporalSplit::new(2020, [2022, 2021]).unwrap();
        let split = Split {
            train: Vec::new(),
            test: Vec::new(),
            excluded: 3,
        };
        let summary = SplitSummary::new(&temporal, &split);
        assert_eq!(summary.test_years, vec![2021, 2022]);
        assert_eq!(summary.excluded_rows, 3);
    }
}
