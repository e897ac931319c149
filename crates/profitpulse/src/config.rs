//! Run configuration.

use crate::error::{PipelineError, Result};
use profitpulse_data::SchemaMapping;
use profitpulse_factors::{ProxyConfig, ProxyKind};
use profitpulse_models::{ModelConfig, ModelKind};
use profitpulse_output::ViewConfig;
use profitpulse_score::{LabelRule, MeasurementConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a full pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Input CSV (default: `data.csv`)
    pub input_path: PathBuf,
    /// Artifact directory (default: `artifacts`)
    pub output_dir: PathBuf,
    /// Accepted input column names per field
    pub columns: SchemaMapping,
    /// Par value per share for ROC (default: 10 000)
    pub par_value: f64,
    /// Winsorization tail quantile (default: 0.01)
    pub winsor_quantile: f64,
    /// Last year of the measurement fit window (default: 2019)
    pub fit_cutoff_year: i32,
    /// Last target year used for training (default: 2020)
    pub train_cutoff_year: i32,
    /// Target years held out for evaluation (default: 2021-2024)
    pub test_years: Vec<i32>,
    /// Proxies used for scoring and as model features (default: all five)
    pub proxies: Vec<ProxyKind>,
    /// Principal components retained (default: 3)
    pub pca_rank: usize,
    /// Minimum fit-window rows (default: 300)
    pub min_fit_rows: usize,
    /// Label rule (default: zero)
    pub label_rule: LabelRule,
    /// Model behind the screener and alerts (default: xgboost)
    pub default_model: ModelKind,
    /// Predictor year of the exported screener; latest year when unset
    pub screener_year: Option<i32>,
    /// Risk cutoffs, borderline and reason thresholds
    pub views: ViewConfig,
    /// Model list, seed, probability threshold and hyperparameters
    pub models: ModelConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("data.csv"),
            output_dir: PathBuf::from("artifacts"),
            columns: SchemaMapping::default(),
            par_value: 10_000.0,
            winsor_quantile: 0.01,
            fit_cutoff_year: 2019,
            train_cutoff_year: 2020,
            test_years: vec![2021, 2022, 2023, 2024],
            proxies: ProxyKind::ALL.to_vec(),
            pca_rank: 3,
            min_fit_rows: 300,
            label_rule: LabelRule::Zero,
            default_model: ModelKind::XGBoost,
            screener_year: None,
            views: ViewConfig::default(),
            models: ModelConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file; absent keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Proxy computation settings.
    pub const fn proxy_config(&self) -> ProxyConfig {
        ProxyConfig {
            par_value: self.par_value,
        }
    }

    /// Measurement model settings.
    pub fn measurement_config(&self) -> MeasurementConfig {
        MeasurementConfig {
            proxies: self.proxies.clone(),
            fit_cutoff_year: self.fit_cutoff_year,
            winsor_quantile: self.winsor_quantile,
            pca_rank: self.pca_rank,
            min_fit_rows: self.min_fit_rows,
        }
    }

    /// Reject inconsistent settings.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(PipelineError::Config(msg));

        if self.proxies.is_empty() {
            return invalid("proxy list must not be empty".to_string());
        }
        let mut unique = self.proxies.clone();
        unique.sort();
        unique.dedup();
        if unique.len() != self.proxies.len() {
            return invalid("proxy list contains duplicates".to_string());
        }
        if self.pca_rank == 0 || self.pca_rank > self.proxies.len() {
            return invalid(format!(
                "pca_rank must be within 1..={} (got {})",
                self.proxies.len(),
                self.pca_rank
            ));
        }
        if !(self.winsor_quantile > 0.0 && self.winsor_quantile < 0.5) {
            return invalid(format!(
                "winsor_quantile must be within (0, 0.5) (got {})",
                self.winsor_quantile
            ));
        }
        self.proxy_config().validate()?;

        let Some(&first_test) = self.test_years.iter().min() else {
            return invalid("test_years must not be empty".to_string());
        };
        if first_test <= self.train_cutoff_year {
            return invalid(format!(
                "test year {first_test} is not after train cutoff {}",
                self.train_cutoff_year
            ));
        }
        if self.fit_cutoff_year >= first_test {
            return invalid(format!(
                "fit cutoff {} must precede the first test year {first_test}",
                self.fit_cutoff_year
            ));
        }

        let views = &self.views;
        if !(0.0 <= views.risk_high_cut
            && views.risk_high_cut <= views.risk_low_cut
            && views.risk_low_cut <= 1.0)
        {
            return invalid(format!(
                "risk cutoffs out of order: high {} / low {}",
                views.risk_high_cut, views.risk_low_cut
            ));
        }
        if !(views.borderline_cutoff >= 0.0) || !(views.chance_drop >= 0.0) {
            return invalid("borderline_cutoff and chance_drop must be non-negative".to_string());
        }

        self.models.validate()?;
        if !self.models.models.contains(&self.default_model) {
            return invalid(format!(
                "default model {} is not among the trained models",
                self.default_model
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rstest::rstest;

    #[test]
    fn test_defaults_validate() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.models.seed, 42);
        assert_eq!(config.test_years, vec![2021, 2022, 2023, 2024]);
    }

    fn broken(edit: fn(&mut PipelineConfig)) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        edit(&mut config);
        config
    }

    #[rstest]
    #[case(broken(|c| c.proxies.clear()))]
    #[case(broken(|c| c.pca_rank = 6))]
    #[case(broken(|c| c.pca_rank = 0))]
    #[case(broken(|c| c.winsor_quantile = 0.5))]
    #[case(broken(|c| c.winsor_quantile = 0.0))]
    #[case(broken(|c| c.test_years = vec![2020]))]
    #[case(broken(|c| c.test_years.clear()))]
    #[case(broken(|c| c.fit_cutoff_year = 2021))]
    #[case(broken(|c| c.views.risk_high_cut = 0.7))]
    #[case(broken(|c| c.par_value = 0.0))]
    #[case(broken(|c| c.models.models = vec![ModelKind::SvmRbf]))]
    fn test_validate_rejects(#[case] config: PipelineConfig) {
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_partial_json() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{"fit_cutoff_year": 2018, "label_rule": "median_by_year", "models": {"seed": 7}}"#,
        )
        .unwrap();
        assert_eq!(config.fit_cutoff_year, 2018);
        assert_eq!(config.label_rule, LabelRule::MedianByYear);
        assert_eq!(config.models.seed, 7);
        assert_eq!(config.pca_rank, 3);
    }
}
