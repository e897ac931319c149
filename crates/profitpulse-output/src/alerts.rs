//! Year-over-year alerts
//!
//! Alerts compare consecutive available years of the same firm. Each rule
//! looks at a window of `span` years ending at the current one; rules are
//! independent, so one year can raise several alerts.

use crate::views::{RiskBucket, ScreenerRow, ViewConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

/// Type of alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Risk bucket changed
    RiskChange,
    /// ProfitScore became borderline
    BorderlineEntered,
    /// Chance fell sharply
    ChanceDrop,
    /// ROA fell two years running
    RoaDecline,
    /// NPM fell two years running
    NpmDecline,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RiskChange => "risk_change",
            Self::BorderlineEntered => "borderline_entered",
            Self::ChanceDrop => "chance_drop",
            Self::RoaDecline => "roa_decline",
            Self::NpmDecline => "npm_decline",
        })
    }
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational
    Low,
    /// Worth a look
    Medium,
    /// Act on it
    High,
}

/// A raised alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Firm identifier
    pub firm_id: String,
    /// Year the alert refers to
    pub year: i32,
    /// Alert type
    pub kind: AlertKind,
    /// Severity
    pub severity: Severity,
    /// Reader-facing message
    pub message: String,
}

impl Alert {
    /// CSV columns, in field order.
    pub const CSV_COLUMNS: &'static [&'static str] =
        &["firm_id", "year", "kind", "severity", "message"];
}

/// Rule evaluation over a window of years.
pub type AlertCheck = fn(&[&ScreenerRow], &ViewConfig) -> Option<(Severity, String)>;

/// An alert rule over a window of consecutive available years.
#[derive(Debug, Clone, Copy)]
pub struct AlertRule {
    /// Alert type raised
    pub kind: AlertKind,
    /// Years in the window, current year last
    pub span: usize,
    /// Evaluation; `None` means no alert
    pub check: AlertCheck,
}

fn strictly_declining(
    window: &[&ScreenerRow],
    value: fn(&ScreenerRow) -> Option<f64>,
) -> Option<Vec<f64>> {
    let values: Option<Vec<f64>> = window.iter().map(|r| value(r)).collect();
    let values = values?;
    values.windows(2).all(|w| w[1] < w[0]).then_some(values)
}

fn format_path(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{v:.4}"))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Default alert rules.
pub fn default_rules() -> Vec<AlertRule> {
    vec![
        AlertRule {
            kind: AlertKind::RiskChange,
            span: 2,
            check: |w, _| {
                let (prev, cur) = (w[0], w[1]);
                if prev.risk == cur.risk {
                    return None;
                }
                let severity = match cur.risk {
                    RiskBucket::High => Severity::High,
                    _ if cur.risk.rank() < prev.risk.rank() => Severity::Medium,
                    _ => Severity::Low,
                };
                Some((
                    severity,
                    format!(
                        "Risk changed from {} to {} (chance {:.2} -> {:.2}).",
                        prev.risk, cur.risk, prev.chance, cur.chance
                    ),
                ))
            },
        },
        AlertRule {
            kind: AlertKind::BorderlineEntered,
            span: 2,
            check: |w, _| {
                (w[1].borderline && !w[0].borderline).then(|| {
                    (
                        Severity::Low,
                        format!(
                            "ProfitScore {:.3} is near the threshold; \
                             small moves could flip the status.",
                            w[1].profit_score
                        ),
                    )
                })
            },
        },
        AlertRule {
            kind: AlertKind::ChanceDrop,
            span: 2,
            check: |w, c| {
                (w[0].chance - w[1].chance >= c.chance_drop).then(|| {
                    (
                        Severity::Medium,
                        format!(
                            "Chance dropped sharply: {:.2} -> {:.2}.",
                            w[0].chance, w[1].chance
                        ),
                    )
                })
            },
        },
        AlertRule {
            kind: AlertKind::RoaDecline,
            span: 3,
            check: |w, _| {
                strictly_declining(w, |r| r.roa).map(|values| {
                    (
                        Severity::Medium,
                        format!("ROA declined two years in a row: {}.", format_path(&values)),
                    )
                })
            },
        },
        AlertRule {
            kind: AlertKind::NpmDecline,
            span: 3,
            check: |w, _| {
                strictly_declining(w, |r| r.npm).map(|values| {
                    (
                        Severity::Medium,
                        format!(
                            "Net margin declined two years in a row: {}.",
                            format_path(&values)
                        ),
                    )
                })
            },
        },
    ]
}

/// Evaluates alert rules over screener history.
#[derive(Debug, Clone)]
pub struct AlertEngine {
    config: ViewConfig,
    rules: Vec<AlertRule>,
}

impl AlertEngine {
    /// Engine with the default rules.
    pub fn new(config: ViewConfig) -> Self {
        Self {
            config,
            rules: default_rules(),
        }
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[AlertRule] {
        &self.rules
    }

    /// Raise alerts over screener rows from any number of predictor years.
    ///
    /// Output is ordered by firm, then year, then rule order.
    pub fn detect(&self, history: &[ScreenerRow]) -> Vec<Alert> {
        let mut by_firm: BTreeMap<&str, Vec<&ScreenerRow>> = BTreeMap::new();
        for row in history {
            by_firm.entry(row.firm_id.as_str()).or_default().push(row);
        }

        let mut alerts = Vec::new();
        for (firm, mut years) in by_firm {
            years.sort_by_key(|r| r.year);
            for end in 1..years.len() {
                for rule in &self.rules {
                    if rule.span == 0 || end + 1 < rule.span {
                        continue;
                    }
                    let window = &years[end + 1 - rule.span..=end];
                    if let Some((severity, message)) = (rule.check)(window, &self.config) {
                        alerts.push(Alert {
                            firm_id: firm.to_string(),
                            year: years[end].year,
                            kind: rule.kind,
                            severity,
                            message,
                        });
                    }
                }
            }
        }

        info!(alerts = alerts.len(), "Alerts raised");
        alerts
    }
}
