//! Proxy trait and the per-row proxy container.

use crate::builder::ProxyConfig;
use crate::error::ProxyError;
use profitpulse_data::{RawField, RawRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of profitability ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProxyKind {
    /// Return on assets
    Roa,
    /// Return on equity
    Roe,
    /// Return on capital (par-value based)
    Roc,
    /// Earnings per share
    Eps,
    /// Net profit margin
    Npm,
}

impl ProxyKind {
    /// All proxies in canonical order.
    pub const ALL: [Self; 5] = [Self::Roa, Self::Roe, Self::Roc, Self::Eps, Self::Npm];

    /// Display name (`ROA`, `ROE`, ...).
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Roa => "ROA",
            Self::Roe => "ROE",
            Self::Roc => "ROC",
            Self::Eps => "EPS",
            Self::Npm => "NPM",
        }
    }

    /// Position in [`ProxyKind::ALL`].
    pub const fn index(&self) -> usize {
        match self {
            Self::Roa => 0,
            Self::Roe => 1,
            Self::Roc => 2,
            Self::Eps => 3,
            Self::Npm => 4,
        }
    }
}

impl fmt::Display for ProxyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProxyKind {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProxyError::UnknownProxy(s.to_string()))
    }
}

/// A single profitability ratio computed from raw statement fields.
pub trait Proxy: fmt::Debug + Send + Sync {
    /// Which ratio this is.
    fn kind(&self) -> ProxyKind;

    /// Display name.
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Raw fields the ratio reads.
    fn required_fields(&self) -> &'static [RawField];

    /// Compute the ratio; `None` when any input is undefined or the
    /// denominator is zero.
    fn compute(&self, record: &RawRecord, config: &ProxyConfig) -> Option<f64>;
}

/// `numerator / denominator`, undefined on a zero denominator or a
/// non-finite result.
pub(crate) fn safe_ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let den = denominator?;
    if den == 0.0 {
        return None;
    }
    let value = numerator? / den;
    value.is_finite().then_some(value)
}

/// Values of the five proxies for one row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxySet {
    values: [Option<f64>; 5],
}

impl ProxySet {
    /// Value of one proxy.
    pub const fn get(&self, kind: ProxyKind) -> Option<f64> {
        self.values[kind.index()]
    }

    /// Set one proxy; non-finite values are stored as undefined.
    pub fn set(&mut self, kind: ProxyKind, value: Option<f64>) {
        self.values[kind.index()] = value.filter(|v| v.is_finite());
    }

    /// Whether every listed proxy is defined.
    pub fn is_complete(&self, kinds: &[ProxyKind]) -> bool {
        kinds.iter().all(|k| self.get(*k).is_some())
    }

    /// Values of the listed proxies, in order, when all are defined.
    pub fn select(&self, kinds: &[ProxyKind]) -> Option<Vec<f64>> {
        kinds.iter().map(|k| self.get(*k)).collect()
    }

    /// Iterate `(kind, value)` over all five proxies.
    pub fn iter(&self) -> impl Iterator<Item = (ProxyKind, Option<f64>)> + '_ {
        ProxyKind::ALL.into_iter().map(|k| (k, self.get(k)))
    }
}

/// A raw record with its computed proxies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyRecord {
    /// Source row
    pub raw: RawRecord,
    /// Computed ratios
    pub proxies: ProxySet,
}

impl ProxyRecord {
    /// Firm identifier.
    pub fn firm_id(&self) -> &str {
        &self.raw.firm_id
    }

    /// Calendar year.
    pub const fn year(&self) -> i32 {
        self.raw.year
    }

    /// Whether every configured proxy is defined. Incomplete rows are kept
    /// for display but never scored.
    pub fn is_complete(&self, kinds: &[ProxyKind]) -> bool {
        self.proxies.is_complete(kinds)
    }
}
