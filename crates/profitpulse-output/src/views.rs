//! Risk buckets and the per-year screener.

use crate::explain::Explainer;
use profitpulse_factors::ProxyKind;
use profitpulse_models::{ModelKind, PredictionRow};
use profitpulse_score::ScoredRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Thresholds for the reader-facing views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Chance below this is High risk (default: 0.40)
    pub risk_high_cut: f64,
    /// Chance above this is Low risk (default: 0.60)
    pub risk_low_cut: f64,
    /// |ProfitScore| below this is borderline (default: 0.10)
    pub borderline_cutoff: f64,
    /// z-score at or below which a ratio is weak (default: -0.5)
    pub z_weak: f64,
    /// z-score at or above which a ratio is strong (default: 0.7)
    pub z_strong: f64,
    /// Year-over-year z change counted as a jump (default: 1.0)
    pub z_jump: f64,
    /// ROA z-score ceiling for the leverage reason (default: -0.20)
    pub roa_soft: f64,
    /// Chance decrease that raises an alert (default: 0.15)
    pub chance_drop: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            risk_high_cut: 0.40,
            risk_low_cut: 0.60,
            borderline_cutoff: 0.10,
            z_weak: -0.5,
            z_strong: 0.7,
            z_jump: 1.0,
            roa_soft: -0.20,
            chance_drop: 0.15,
        }
    }
}

/// Risk level derived from the chance of staying profitable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskBucket {
    /// Chance below the high-risk cut
    High,
    /// Between the cuts
    Medium,
    /// Chance above the low-risk cut
    Low,
}

impl RiskBucket {
    /// Bucket for a chance value. Both cuts are exclusive.
    pub fn from_chance(chance: f64, config: &ViewConfig) -> Self {
        if chance < config.risk_high_cut {
            Self::High
        } else if chance > config.risk_low_cut {
            Self::Low
        } else {
            Self::Medium
        }
    }

    /// Sort rank; High first.
    pub const fn rank(&self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }

    /// Display name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a ProfitScore sits close enough to zero to flip on small moves.
pub fn is_borderline(profit_score: f64, config: &ViewConfig) -> bool {
    profit_score.abs() < config.borderline_cutoff
}

/// One screener line for one firm and predictor year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenerRow {
    /// Firm identifier
    pub firm_id: String,
    /// Predictor year
    pub year: i32,
    /// Forecast year
    pub target_year: i32,
    /// ProfitScore at the predictor year
    pub profit_score: f64,
    /// Chance of a profitable target year
    pub chance: f64,
    /// Risk bucket of `chance`
    pub risk: RiskBucket,
    /// Borderline flag of `profit_score`
    pub borderline: bool,
    /// One-line reason
    pub reason: String,
    /// Suggested follow-up
    pub action_tip: String,
    /// Return on assets
    pub roa: Option<f64>,
    /// Return on equity
    pub roe: Option<f64>,
    /// Return on charter capital
    pub roc: Option<f64>,
    /// Earnings per share
    pub eps: Option<f64>,
    /// Net profit margin
    pub npm: Option<f64>,
}

/// Index of each row's previous recorded year for the same firm.
pub(crate) fn previous_rows(rows: &[ScoredRecord]) -> BTreeMap<(&str, i32), &ScoredRecord> {
    let mut by_firm: BTreeMap<&str, Vec<&ScoredRecord>> = BTreeMap::new();
    for row in rows {
        by_firm.entry(row.firm_id.as_str()).or_default().push(row);
    }

    let mut previous = BTreeMap::new();
    for (firm, mut history) in by_firm {
        history.sort_by_key(|r| r.year);
        for pair in history.windows(2) {
            previous.insert((firm, pair[1].year), pair[0]);
        }
    }
    previous
}

/// Build the screener for one predictor year using one model's predictions.
///
/// Rows are sorted High, Medium, Low and then by ascending chance, with the
/// firm id as a final tie-break. Firms without a prediction from `model` for
/// `year` are left out.
pub fn build_screener(
    year: i32,
    rows: &[ScoredRecord],
    predictions: &[PredictionRow],
    model: ModelKind,
    config: &ViewConfig,
) -> Vec<ScreenerRow> {
    let explainer = Explainer::new(config.clone());
    let previous = previous_rows(rows);
    let chances: BTreeMap<&str, &PredictionRow> = predictions
        .iter()
        .filter(|p| p.model == model && p.predictor_year == year)
        .map(|p| (p.firm_id.as_str(), p))
        .collect();

    let mut screener: Vec<ScreenerRow> = rows
        .iter()
        .filter(|r| r.year == year)
        .filter_map(|row| {
            let Some(prediction) = chances.get(row.firm_id.as_str()) else {
                debug!(firm = %row.firm_id, year, "no prediction for screener row");
                return None;
            };
            let prev = previous.get(&(row.firm_id.as_str(), row.year)).copied();
            let explanation = explainer.explain(row, prev);
            Some(ScreenerRow {
                firm_id: row.firm_id.clone(),
                year,
                target_year: prediction.target_year,
                profit_score: row.profit_score,
                chance: prediction.chance,
                risk: RiskBucket::from_chance(prediction.chance, config),
                borderline: is_borderline(row.profit_score, config),
                reason: explanation.reason,
                action_tip: explanation.action_tip,
                roa: row.proxies.get(ProxyKind::Roa),
                roe: row.proxies.get(ProxyKind::Roe),
                roc: row.proxies.get(ProxyKind::Roc),
                eps: row.proxies.get(ProxyKind::Eps),
                npm: row.proxies.get(ProxyKind::Npm),
            })
        })
        .collect();

    screener.sort_by(|a, b| {
        a.risk
            .rank()
            .cmp(&b.risk.rank())
            .then(a.chance.total_cmp(&b.chance))
            .then_with(|| a.firm_id.cmp(&b.firm_id))
    });
    screener
}

#[cfg(test)]
mod tests {
    use super::*;
    use profitpulse_factors::ProxySet;
    use rstest::rstest;

    #[rstest]
    #[case(0.10, RiskBucket::High)]
    #[case(0.40, RiskBucket::Medium)]
    #[case(0.50, RiskBucket::Medium)]
    #[case(0.60, RiskBucket::Medium)]
    #[case(0.61, RiskBucket::Low)]
    fn test_risk_bucket(#[case] chance: f64, #[case] expected: RiskBucket) {
        assert_eq!(RiskBucket::from_chance(chance, &ViewConfig::default()), expected);
    }

    #[rstest]
    #[case(0.09, true)]
    #[case(-0.09, true)]
    #[case(0.10, false)]
    #[case(-0.10, false)]
    #[case(0.5, false)]
    fn test_borderline(#[case] score: f64, #[case] expected: bool) {
        assert_eq!(is_borderline(score, &ViewConfig::default()), expected);
    }

    fn scored(firm: &str, year: i32, score: f64) -> ScoredRecord {
        ScoredRecord {
            firm_id: firm.to_string(),
            year,
            proxies: ProxySet::default(),
            z: ProxySet::default(),
            components: vec![score],
            profit_score: score,
            label: None,
        }
    }

    fn prediction(firm: &str, year: i32, chance: f64) -> PredictionRow {
        PredictionRow {
            firm_id: firm.to_string(),
            predictor_year: year,
            target_year: year + 1,
            model: ModelKind::XGBoost,
            chance,
            predicted_class: u8::from(chance >= 0.5),
            profit_score: 0.0,
            actual_label: None,
        }
    }

    #[test]
    fn test_screener_order() {
        let rows = vec![
            scored("A", 2023, 0.5),
            scored("B", 2023, -0.3),
            scored("C", 2023, 0.05),
            scored("D", 2023, -0.8),
            scored("E", 2023, 0.2),
            scored("A", 2022, 0.4),
        ];
        let preds = vec![
            prediction("A", 2023, 0.9),
            prediction("B", 2023, 0.35),
            prediction("C", 2023, 0.5),
            prediction("D", 2023, 0.1),
            prediction("A", 2022, 0.2),
        ];

        let config = ViewConfig::default();
        let screener = build_screener(2023, &rows, &preds, ModelKind::XGBoost, &config);
        let order: Vec<&str> = screener.iter().map(|r| r.firm_id.as_str()).collect();

        // E has no prediction and is skipped
        assert_eq!(order, ["D", "B", "C", "A"]);
        assert_eq!(screener[0].risk, RiskBucket::High);
        assert!(screener[2].borderline);
        assert_eq!(screener[3].target_year, 2024);
    }

    #[test]
    fn test_screener_ignores_other_models() {
        let rows = vec![scored("A", 2023, 0.5)];
        let preds = vec![prediction("A", 2023, 0.9)];
        let config = ViewConfig::default();
        assert!(build_screener(2023, &rows, &preds, ModelKind::SvmRbf, &config).is_empty());
    }
}
