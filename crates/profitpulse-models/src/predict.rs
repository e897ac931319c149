//! Next-year predictions for every scored firm-year.

use crate::classifier::{Classifier, ModelKind};
use crate::dataset::feature_matrix;
use crate::error::Result;
use crate::trainer::TrainedModel;
use profitpulse_data::FirmYear;
use profitpulse_factors::ProxyKind;
use profitpulse_score::ScoredRecord;
use profitpulse_score::label::next_recorded_years;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// One model's forecast for one firm-year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    /// Firm identifier
    pub firm_id: String,
    /// Year whose indicators were used
    pub predictor_year: i32,
    /// Year being forecast
    pub target_year: i32,
    /// Model that produced the forecast
    pub model: ModelKind,
    /// P(target label = 1)
    pub chance: f64,
    /// `chance >= threshold`
    pub predicted_class: u8,
    /// ProfitScore at the predictor year
    pub profit_score: f64,
    /// Realized target label, when the target year is recorded
    pub actual_label: Option<u8>,
}

/// Apply every model to every scored row.
///
/// The target year is the firm's next recorded year when there is one and
/// `predictor_year + 1` otherwise, so each firm's latest year is forecast too.
/// Output is ordered by model, then by the order of `rows`.
pub fn predict_all(
    rows: &[ScoredRecord],
    models: &[TrainedModel],
    features: &[ProxyKind],
    threshold: f64,
) -> Result<Vec<PredictionRow>> {
    let next = next_recorded_years(rows);
    let labels: BTreeMap<FirmYear, Option<u8>> = rows
        .iter()
        .map(|r| (FirmYear::new(r.firm_id.clone(), r.year), r.label))
        .collect();

    let x = feature_matrix(
        rows.iter().map(|r| (r.firm_id.as_str(), r.year, &r.proxies)),
        rows.len(),
        features,
    )?;

    let mut out = Vec::with_capacity(rows.len() * models.len());
    for trained in models {
        let proba = trained.model.predict_proba(x.view())?;
        for (row, chance) in rows.iter().zip(proba.iter()) {
            let key = FirmYear::new(row.firm_id.clone(), row.year);
            let target_year = next.get(&key).copied().unwrap_or(row.year + 1);
            let actual_label = labels
                .get(&FirmYear::new(row.firm_id.clone(), target_year))
                .copied()
                .flatten();
            out.push(PredictionRow {
                firm_id: row.firm_id.clone(),
                predictor_year: row.year,
                target_year,
                model: trained.kind,
                chance: *chance,
                predicted_class: u8::from(*chance >= threshold),
                profit_score: row.profit_score,
                actual_label,
            });
        }
    }

    info!(rows = out.len(), models = models.len(), "Predictions generated");
    Ok(out)
}
