//! Labels and the forecast shift
//!
//! A row is labeled 1 when its ProfitScore is strictly above a threshold.
//! The forecast shift pairs a firm's year-*t* predictors with the label of
//! that firm's next recorded year; gaps in a firm's history are bridged, not
//! dropped.

use crate::error::{Result, ScoreError};
use crate::measurement::ScoredRecord;
use crate::preprocess::median;
use profitpulse_data::FirmYear;
use profitpulse_factors::ProxySet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// How the label threshold is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelRule {
    /// Label 1 iff ProfitScore > 0
    #[default]
    Zero,
    /// Label 1 iff ProfitScore > that year's median
    MedianByYear,
    /// Label 1 iff ProfitScore > the fit-window median, fit once
    MedianFitWindow,
}

impl fmt::Display for LabelRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Zero => "zero",
            Self::MedianByYear => "median_by_year",
            Self::MedianFitWindow => "median_fit_window",
        })
    }
}

/// Assigns same-year labels to scored rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Labeler {
    rule: LabelRule,
    threshold: Option<f64>,
}

impl Labeler {
    /// Fit the labeler. Only [`LabelRule::MedianFitWindow`] learns anything:
    /// the median ProfitScore of rows with `year <= fit_cutoff_year`.
    pub fn fit(rule: LabelRule, rows: &[ScoredRecord], fit_cutoff_year: i32) -> Result<Self> {
        let threshold = match rule {
            LabelRule::Zero => Some(0.0),
            LabelRule::MedianByYear => None,
            LabelRule::MedianFitWindow => {
                let scores: Vec<f64> = rows
                    .iter()
                    .filter(|r| r.year <= fit_cutoff_year)
                    .map(|r| r.profit_score)
                    .collect();
                let value = median(&scores).ok_or(ScoreError::InsufficientData {
                    stage: "label threshold",
                    required: 1,
                    actual: 0,
                })?;
                debug!(threshold = value, "fit-window median threshold");
                Some(value)
            }
        };
        Ok(Self { rule, threshold })
    }

    /// Labeling rule.
    pub const fn rule(&self) -> LabelRule {
        self.rule
    }

    /// Fixed threshold, when the rule has one.
    pub const fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    /// Label every row in place.
    pub fn apply(&self, rows: &mut [ScoredRecord]) {
        match self.threshold {
            Some(threshold) => {
                for row in rows.iter_mut() {
                    row.label = Some(u8::from(row.profit_score > threshold));
                }
            }
            None => {
                let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
                for row in rows.iter() {
                    by_year.entry(row.year).or_default().push(row.profit_score);
                }
                let medians: BTreeMap<i32, f64> = by_year
                    .into_iter()
                    .filter_map(|(year, scores)| median(&scores).map(|m| (year, m)))
                    .collect();
                for row in rows.iter_mut() {
                    let threshold = medians.get(&row.year).copied().unwrap_or(0.0);
                    row.label = Some(u8::from(row.profit_score > threshold));
                }
            }
        }
        let positives = rows.iter().filter(|r| r.label == Some(1)).count();
        info!(rule = %self.rule, rows = rows.len(), positives, "rows labeled");
    }
}

/// Year-*t* predictors paired with the next recorded year's label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    /// Firm identifier
    pub firm_id: String,
    /// Year the predictors come from
    pub predictor_year: i32,
    /// Firm's next recorded year
    pub target_year: i32,
    /// `target_year - predictor_year`
    pub gap: i32,
    /// Winsorized predictor-year proxies
    pub features: ProxySet,
    /// Standardized predictor-year proxies
    pub z: ProxySet,
    /// Predictor-year ProfitScore
    pub profit_score: f64,
    /// Target-year label
    pub label: u8,
}

/// Next recorded year of every firm-year that has one.
pub fn next_recorded_years(rows: &[ScoredRecord]) -> BTreeMap<FirmYear, i32> {
    let mut years: BTreeMap<&str, Vec<i32>> = BTreeMap::new();
    for row in rows {
        years.entry(row.firm_id.as_str()).or_default().push(row.year);
    }

    let mut next = BTreeMap::new();
    for (firm, mut ys) in years {
        ys.sort_unstable();
        ys.dedup();
        for pair in ys.windows(2) {
            next.insert(FirmYear::new(firm, pair[0]), pair[1]);
        }
    }
    next
}

/// Build forecast rows, sorted by (firm, predictor year).
///
/// Each firm's last recorded year is dropped; single-observation firms
/// contribute nothing. Every target row must already carry a label.
pub fn shift_to_target(rows: &[ScoredRecord]) -> Result<Vec<ForecastRow>> {
    let mut by_firm: BTreeMap<&str, Vec<&ScoredRecord>> = BTreeMap::new();
    for row in rows {
        by_firm.entry(row.firm_id.as_str()).or_default().push(row);
    }

    let mut out = Vec::new();
    for (_, mut history) in by_firm {
        history.sort_by_key(|r| r.year);
        for pair in history.windows(2) {
            let (current, next) = (pair[0], pair[1]);
            let label = next.label.ok_or_else(|| ScoreError::MissingLabel {
                firm_id: next.firm_id.clone(),
                year: next.year,
            })?;
            out.push(ForecastRow {
                firm_id: current.firm_id.clone(),
                predictor_year: current.year,
                target_year: next.year,
                gap: next.year - current.year,
                features: current.proxies,
                z: current.z,
                profit_score: current.profit_score,
                label,
            });
        }
    }

    let gapped = out.iter().filter(|r| r.gap > 1).count();
    info!(rows = out.len(), gapped, "forecast rows built");
    Ok(out)
}
