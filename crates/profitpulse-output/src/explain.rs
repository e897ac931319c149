//! One-line reasons and action tips
//!
//! Reasons come from an ordered list of rules evaluated against the row's
//! standardized proxies and their change since the firm's previous recorded
//! year. The first rule whose predicate holds wins; the last rule always
//! matches. Undefined z-scores never satisfy a predicate.

use crate::views::ViewConfig;
use profitpulse_factors::ProxyKind;
use profitpulse_score::ScoredRecord;
use serde::{Deserialize, Serialize};

/// Stable identifier of a reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// Strong ROE on weak ROA
    Leverage,
    /// ROA and ROE both weak
    WeakReturns,
    /// Weak or collapsing net margin
    MarginDeterioration,
    /// Large EPS swing
    EpsVolatility,
    /// Nothing stands out
    Neutral,
}

/// Inputs a rule can look at.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Signals {
    /// z(ROA)
    pub z_roa: Option<f64>,
    /// z(ROE)
    pub z_roe: Option<f64>,
    /// z(NPM)
    pub z_npm: Option<f64>,
    /// z(EPS)
    pub z_eps: Option<f64>,
    /// z(NPM) change since the previous recorded year
    pub dz_npm: Option<f64>,
    /// z(EPS) change since the previous recorded year
    pub dz_eps: Option<f64>,
}

impl Signals {
    /// Gather signals for a row and its predecessor.
    pub fn new(row: &ScoredRecord, previous: Option<&ScoredRecord>) -> Self {
        let delta = |kind: ProxyKind| {
            let prev = previous?.z.get(kind)?;
            Some(row.z.get(kind)? - prev)
        };
        Self {
            z_roa: row.z.get(ProxyKind::Roa),
            z_roe: row.z.get(ProxyKind::Roe),
            z_npm: row.z.get(ProxyKind::Npm),
            z_eps: row.z.get(ProxyKind::Eps),
            dz_npm: delta(ProxyKind::Npm),
            dz_eps: delta(ProxyKind::Eps),
        }
    }
}

fn at_most(value: Option<f64>, limit: f64) -> bool {
    value.is_some_and(|v| v <= limit)
}

fn at_least(value: Option<f64>, limit: f64) -> bool {
    value.is_some_and(|v| v >= limit)
}

/// A reason with its trigger.
#[derive(Debug, Clone, Copy)]
pub struct ReasonRule {
    /// Reason identifier
    pub code: ReasonCode,
    /// Reader-facing reason
    pub message: &'static str,
    /// Suggested follow-up
    pub action_tip: &'static str,
    /// Trigger
    pub predicate: fn(&Signals, &ViewConfig) -> bool,
}

/// Reason chosen for a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    /// Reason identifier
    pub code: ReasonCode,
    /// Reader-facing reason
    pub reason: String,
    /// Suggested follow-up
    pub action_tip: String,
}

/// Default rules in priority order.
pub fn default_rules() -> Vec<ReasonRule> {
    vec![
        ReasonRule {
            code: ReasonCode::Leverage,
            message: "High ROE but low ROA (possibly driven by leverage).",
            action_tip: "Check borrowings, interest expense and earnings quality.",
            predicate: |s, c| at_least(s.z_roe, c.z_strong) && at_most(s.z_roa, c.roa_soft),
        },
        ReasonRule {
            code: ReasonCode::WeakReturns,
            message: "Returns on assets and equity (ROA/ROE) are weak.",
            action_tip: "Review asset utilization, turnover and capital efficiency.",
            predicate: |s, c| at_most(s.z_roa, c.z_weak) && at_most(s.z_roe, c.z_weak),
        },
        ReasonRule {
            code: ReasonCode::MarginDeterioration,
            message: "Net profit margin (NPM) is deteriorating.",
            action_tip: "Review cost of goods sold, operating costs and pricing.",
            predicate: |s, c| at_most(s.z_npm, c.z_weak) || at_most(s.dz_npm, -c.z_jump),
        },
        ReasonRule {
            code: ReasonCode::EpsVolatility,
            message: "EPS swings sharply (per-share earnings are unstable).",
            action_tip: "Check for share dilution and one-off gains or losses.",
            predicate: |s, c| at_least(s.dz_eps.map(f64::abs), c.z_jump),
        },
        ReasonRule {
            code: ReasonCode::Neutral,
            message: "Profitability signals are neutral; keep monitoring.",
            action_tip: "Skim the financial statements and notes to confirm the drivers.",
            predicate: |_, _| true,
        },
    ]
}

/// Picks the first matching reason rule.
#[derive(Debug, Clone)]
pub struct Explainer {
    config: ViewConfig,
    rules: Vec<ReasonRule>,
}

impl Explainer {
    /// Explainer with the default rule list.
    pub fn new(config: ViewConfig) -> Self {
        Self::with_rules(config, default_rules())
    }

    /// Explainer with a custom rule list.
    pub const fn with_rules(config: ViewConfig, rules: Vec<ReasonRule>) -> Self {
        Self { config, rules }
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[ReasonRule] {
        &self.rules
    }

    /// Explain `row`, using `previous` (the firm's previous recorded year)
    /// for year-over-year changes.
    pub fn explain(&self, row: &ScoredRecord, previous: Option<&ScoredRecord>) -> Explanation {
        let signals = Signals::new(row, previous);
        self.explain_signals(&signals)
    }

    /// Explain precomputed signals.
    pub fn explain_signals(&self, signals: &Signals) -> Explanation {
        self.rules
            .iter()
            .find(|rule| (rule.predicate)(signals, &self.config))
            .map_or_else(
                || Explanation {
                    code: ReasonCode::Neutral,
                    reason: String::new(),
                    action_tip: String::new(),
                },
                |rule| Explanation {
                    code: rule.code,
                    reason: rule.message.to_string(),
                    action_tip: rule.action_tip.to_string(),
                },
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use profitpulse_factors::ProxySet;
    use rstest::rstest;

    fn explain(signals: Signals) -> ReasonCode {
        Explainer::new(ViewConfig::default())
            .explain_signals(&signals)
            .code
    }

    fn returns(z_roe: f64, z_roa: f64) -> Signals {
        Signals {
            z_roe: Some(z_roe),
            z_roa: Some(z_roa),
            ..Signals::default()
        }
    }

    #[rstest]
    #[case(returns(0.8, -0.3), ReasonCode::Leverage)]
    #[case(returns(0.7, -0.2), ReasonCode::Leverage)]
    #[case(returns(0.8, 0.1), ReasonCode::Neutral)]
    #[case(returns(-0.6, -0.5), ReasonCode::WeakReturns)]
    #[case(Signals { z_npm: Some(-0.5), ..Signals::default() }, ReasonCode::MarginDeterioration)]
    #[case(
        Signals { z_npm: Some(0.3), dz_npm: Some(-1.2), ..Signals::default() },
        ReasonCode::MarginDeterioration
    )]
    #[case(Signals { dz_eps: Some(-1.0), ..Signals::default() }, ReasonCode::EpsVolatility)]
    #[case(Signals { dz_eps: Some(0.99), ..Signals::default() }, ReasonCode::Neutral)]
    #[case(Signals::default(), ReasonCode::Neutral)]
    fn test_rule_priority(#[case] signals: Signals, #[case] expected: ReasonCode) {
        assert_eq!(explain(signals), expected);
    }

    #[test]
    fn test_leverage_beats_weak_margin() {
        let signals = Signals {
            z_roe: Some(1.0),
            z_roa: Some(-0.6),
            z_npm: Some(-2.0),
            ..Signals::default()
        };
        assert_eq!(explain(signals), ReasonCode::Leverage);
    }

    fn scored(year: i32, eps: f64) -> ScoredRecord {
        let mut z = ProxySet::default();
        z.set(ProxyKind::Eps, Some(eps));
        ScoredRecord {
            firm_id: "A".to_string(),
            year,
            proxies: ProxySet::default(),
            z,
            components: vec![0.0],
            profit_score: 0.0,
            label: None,
        }
    }

    #[test]
    fn test_deltas_use_previous_row() {
        let explainer = Explainer::new(ViewConfig::default());
        let prev = scored(2019, -0.4);
        let row = scored(2021, 0.8);

        let with_prev = explainer.explain(&row, Some(&prev));
        assert_eq!(with_prev.code, ReasonCode::EpsVolatility);
        assert!(!with_prev.action_tip.is_empty());

        assert_eq!(explainer.explain(&row, None).code, ReasonCode::Neutral);
    }
}
