//! End-to-end run: ingestion through screener, alerts and artifacts.
//!
//! Every fitted parameter flows one way. The measurement model and label
//! threshold see only the fit window, the classifiers see only the training
//! partition, and nothing downstream refits anything upstream.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use profitpulse_data::{Panel, PanelLoader};
use profitpulse_factors::ProxyBuilder;
use profitpulse_models::{
    FittedModel, ModelTrainer, PredictionRow, TrainingReport, predict_all,
};
use profitpulse_output::{
    Alert, AlertEngine, ArtifactWriter, CompanyView, ExportFormat, MethodologySnapshot,
    MetricsReport, RUN_MARKER, ScreenerRow, SplitSummary, Table, build_screener,
};
use profitpulse_score::{
    ForecastRow, Labeler, MeasurementModel, ScoredRecord, Split, TemporalSplit, shift_to_target,
};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Stages reported to a run observer, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Reading the input file
    Loading,
    /// Computing the financial proxies
    Proxies,
    /// Fitting and applying the measurement model
    Measurement,
    /// Labeling and shifting to forecast rows
    Labeling,
    /// Partitioning forecast rows by target year
    Splitting,
    /// Fitting and evaluating the classifiers
    Training,
    /// Forecasting every scored firm-year
    Predicting,
    /// Building screeners and alerts
    Views,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Loading => "Loading panel",
            Self::Proxies => "Computing proxies",
            Self::Measurement => "Fitting measurement model",
            Self::Labeling => "Labeling",
            Self::Splitting => "Splitting",
            Self::Training => "Training models",
            Self::Predicting => "Predicting",
            Self::Views => "Building views",
        })
    }
}

/// Configured pipeline, ready to run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Validate `config` and build a pipeline.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run configuration.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load the configured input file and run every stage.
    pub fn run(&self) -> Result<PipelineOutput> {
        self.run_with(|_| {})
    }

    /// Like [`Pipeline::run`], calling `observe` as each stage starts.
    pub fn run_with(&self, mut observe: impl FnMut(Stage)) -> Result<PipelineOutput> {
        observe(Stage::Loading);
        let loader = PanelLoader::new(self.config.columns.clone());
        let panel = loader.load_csv(&self.config.input_path)?;
        self.run_panel_with(&panel, observe)
    }

    /// Run every stage on an already loaded panel.
    pub fn run_panel(&self, panel: &Panel) -> Result<PipelineOutput> {
        self.run_panel_with(panel, |_| {})
    }

    fn run_panel_with(
        &self,
        panel: &Panel,
        mut observe: impl FnMut(Stage),
    ) -> Result<PipelineOutput> {
        let config = &self.config;
        info!(
            rows = panel.len(),
            firms = panel.firms().len(),
            "Pipeline started"
        );

        observe(Stage::Proxies);
        let proxies = ProxyBuilder::new(config.proxy_config()).build(panel);

        observe(Stage::Measurement);
        let measurement = MeasurementModel::fit(&proxies, config.measurement_config())?;
        let mut scored = measurement.score(&proxies)?;

        observe(Stage::Labeling);
        let labeler = Labeler::fit(config.label_rule, &scored, config.fit_cutoff_year)?;
        labeler.apply(&mut scored);
        let forecast = shift_to_target(&scored)?;

        observe(Stage::Splitting);
        let temporal =
            TemporalSplit::new(config.train_cutoff_year, config.test_years.iter().copied())?;
        let split = temporal.split(&forecast);

        observe(Stage::Training);
        let trainer = ModelTrainer::new(config.models.clone())?;
        let training = trainer.train_all(&split, &config.proxies)?;

        observe(Stage::Predicting);
        let predictions = predict_all(
            &scored,
            &training.models,
            &config.proxies,
            config.models.threshold,
        )?;

        observe(Stage::Views);
        let years: Vec<i32> = {
            let mut ys: Vec<i32> = scored.iter().map(|r| r.year).collect();
            ys.sort_unstable();
            ys.dedup();
            ys
        };
        let screeners: BTreeMap<i32, Vec<ScreenerRow>> = years
            .iter()
            .map(|&year| {
                let rows = build_screener(
                    year,
                    &scored,
                    &predictions,
                    config.default_model,
                    &config.views,
                );
                debug!(year, rows = rows.len(), "screener built");
                (year, rows)
            })
            .collect();
        let history: Vec<ScreenerRow> = screeners.values().flatten().cloned().collect();
        let alerts = AlertEngine::new(config.views.clone()).detect(&history);

        let metrics = MetricsReport::new(
            SplitSummary::new(&temporal, &split),
            &training,
            config.default_model.id(),
            serde_json::to_value(config)?,
        );
        let methodology = MethodologySnapshot::new(&measurement, &labeler);

        info!(
            scored = scored.len(),
            forecast = forecast.len(),
            predictions = predictions.len(),
            alerts = alerts.len(),
            "Pipeline finished"
        );

        Ok(PipelineOutput {
            config: config.clone(),
            measurement,
            labeler,
            scored,
            forecast,
            split,
            training,
            predictions,
            screeners,
            alerts,
            metrics,
            methodology,
        })
    }
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct PipelineOutput {
    /// Configuration the run used
    pub config: PipelineConfig,
    /// Fitted preprocessing and projection
    pub measurement: MeasurementModel,
    /// Fitted label rule
    pub labeler: Labeler,
    /// Scored and labeled firm-years
    pub scored: Vec<ScoredRecord>,
    /// Predictor rows paired with next-year labels
    pub forecast: Vec<ForecastRow>,
    /// Train and test partitions of `forecast`
    pub split: Split,
    /// Fitted classifiers and their test metrics
    pub training: TrainingReport,
    /// Forecasts of every model for every scored firm-year
    pub predictions: Vec<PredictionRow>,
    /// Default-model screener per predictor year
    pub screeners: BTreeMap<i32, Vec<ScreenerRow>>,
    /// Alerts over the screener history
    pub alerts: Vec<Alert>,
    /// Contents of `model_metrics.json`
    pub metrics: MetricsReport,
    /// Contents of `methodology_snapshot.json`
    pub methodology: MethodologySnapshot,
}

impl PipelineOutput {
    /// Latest predictor year with a screener.
    pub fn latest_year(&self) -> Option<i32> {
        self.screeners
            .iter()
            .rev()
            .find(|(_, rows)| !rows.is_empty())
            .map(|(year, _)| *year)
    }

    /// Screener for one predictor year.
    pub fn screener(&self, year: i32) -> Option<&[ScreenerRow]> {
        self.screeners
            .get(&year)
            .filter(|rows| !rows.is_empty())
            .map(Vec::as_slice)
    }

    /// Scored history of one firm, oldest first.
    pub fn company(&self, firm_id: &str) -> Option<Vec<&ScoredRecord>> {
        let mut rows: Vec<&ScoredRecord> =
            self.scored.iter().filter(|r| r.firm_id == firm_id).collect();
        rows.sort_by_key(|r| r.year);
        (!rows.is_empty()).then_some(rows)
    }

    /// Every model's forecasts for one firm.
    pub fn predictions_for(&self, firm_id: &str) -> Option<Vec<&PredictionRow>> {
        let rows: Vec<&PredictionRow> =
            self.predictions.iter().filter(|p| p.firm_id == firm_id).collect();
        (!rows.is_empty()).then_some(rows)
    }

    /// Alerts raised for one firm; empty when there are none.
    pub fn alerts_for(&self, firm_id: &str) -> Vec<&Alert> {
        self.alerts.iter().filter(|a| a.firm_id == firm_id).collect()
    }

    /// [`PipelineOutput::screener`], failing when the year has no rows.
    pub fn require_screener(&self, year: i32) -> Result<&[ScreenerRow]> {
        self.screener(year)
            .ok_or_else(|| PipelineError::NotFound(format!("screener for year {year}")))
    }

    /// [`PipelineOutput::company`], failing for an unknown firm.
    pub fn require_company(&self, firm_id: &str) -> Result<Vec<&ScoredRecord>> {
        self.company(firm_id)
            .ok_or_else(|| PipelineError::NotFound(format!("company {firm_id}")))
    }

    /// [`PipelineOutput::predictions_for`], failing for an unknown firm.
    pub fn require_predictions(&self, firm_id: &str) -> Result<Vec<&PredictionRow>> {
        self.predictions_for(firm_id)
            .ok_or_else(|| PipelineError::NotFound(format!("predictions for {firm_id}")))
    }

    /// Write all artifacts to the configured output directory.
    pub fn export(&self) -> Result<PathBuf> {
        self.export_to(&self.config.output_dir)
    }

    /// Write all artifacts to `dir`, replacing its previous contents in one step.
    pub fn export_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let screener_year = match self.config.screener_year {
            Some(year) => year,
            None => self
                .latest_year()
                .ok_or_else(|| PipelineError::NotFound("any screener year".to_string()))?,
        };
        let screener = self.require_screener(screener_year)?;

        let mut writer = ArtifactWriter::begin(dir)?;
        let company = CompanyView::new(self.scored.clone(), &self.config.proxies);
        writer.write("company_view.csv", &company, ExportFormat::Csv)?;
        writer.write("predictions.csv", self.predictions.as_slice(), ExportFormat::Csv)?;
        writer.write(&format!("screener_{screener_year}.csv"), screener, ExportFormat::Csv)?;
        let alerts = Table::new(Alert::CSV_COLUMNS, self.alerts.as_slice());
        writer.write("alerts.csv", &alerts, ExportFormat::Csv)?;
        writer.write_json(RUN_MARKER, &self.metrics)?;
        writer.write_json("methodology_snapshot.json", &self.methodology)?;

        let models: BTreeMap<&str, &FittedModel> = self
            .training
            .models
            .iter()
            .map(|m| (m.kind.id(), &m.model))
            .collect();
        writer.write_json("models.json", &models)?;

        Ok(writer.publish()?)
    }
}
