//! Canonical firm-year records.
//!
//! Every input row, whatever its source column names, is reduced to a
//! [`RawRecord`]. Numeric fields are `None` when the cell was missing,
//! non-numeric or non-finite.

use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unique key of a panel row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FirmYear {
    /// Firm identifier
    pub firm_id: String,
    /// Calendar year
    pub year: i32,
}

impl FirmYear {
    /// Create a new key.
    pub fn new(firm_id: impl Into<String>, year: i32) -> Self {
        Self {
            firm_id: firm_id.into(),
            year,
        }
    }
}

/// Raw financial-statement fields of one firm in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Firm identifier
    pub firm_id: String,
    /// Calendar year
    pub year: i32,
    /// Total assets (`TA`)
    pub total_assets: Option<f64>,
    /// Equity basis (`EQ_P`)
    pub equity: Option<f64>,
    /// Shares issued (`SH_ISS`)
    pub shares_issued: Option<f64>,
    /// Reported basic EPS (`EPS_B`)
    pub eps: Option<f64>,
    /// Revenue (`REV`)
    pub revenue: Option<f64>,
    /// Preferred net income source (`NI_P`)
    pub net_income_primary: Option<f64>,
    /// Fallback net income source (`NI_AT`)
    pub net_income_secondary: Option<f64>,
}

impl RawRecord {
    /// Create a record with every numeric field undefined.
    pub fn new(firm_id: impl Into<String>, year: i32) -> Self {
        Self {
            firm_id: firm_id.into(),
            year,
            total_assets: None,
            equity: None,
            shares_issued: None,
            eps: None,
            revenue: None,
            net_income_primary: None,
            net_income_secondary: None,
        }
    }

    /// Set total assets.
    pub const fn with_total_assets(mut self, value: f64) -> Self {
        self.total_assets = Some(value);
        self
    }

    /// Set the equity basis.
    pub const fn with_equity(mut self, value: f64) -> Self {
        self.equity = Some(value);
        self
    }

    /// Set shares issued.
    pub const fn with_shares_issued(mut self, value: f64) -> Self {
        self.shares_issued = Some(value);
        self
    }

    /// Set reported EPS.
    pub const fn with_eps(mut self, value: f64) -> Self {
        self.eps = Some(value);
        self
    }

    /// Set revenue.
    pub const fn with_revenue(mut self, value: f64) -> Self {
        self.revenue = Some(value);
        self
    }

    /// Set the preferred net income field.
    pub const fn with_net_income(mut self, value: f64) -> Self {
        self.net_income_primary = Some(value);
        self
    }

    /// Set the fallback net income field.
    pub const fn with_net_income_secondary(mut self, value: f64) -> Self {
        self.net_income_secondary = Some(value);
        self
    }

    /// Net income used for ratio computation: primary source, else fallback.
    pub fn net_income(&self) -> Option<f64> {
        self.net_income_primary.or(self.net_income_secondary)
    }

    /// Key of this record.
    pub fn key(&self) -> FirmYear {
        FirmYear::new(self.firm_id.clone(), self.year)
    }
}

/// A validated firm-year panel, sorted by (firm, year) with unique keys.
#[derive(Debug, Clone, Default)]
pub struct Panel {
    records: Vec<RawRecord>,
}

impl Panel {
    /// Build a panel, rejecting duplicate firm-year keys.
    pub fn from_records(mut records: Vec<RawRecord>) -> Result<Self> {
        records.sort_by(|a, b| a.firm_id.cmp(&b.firm_id).then(a.year.cmp(&b.year)));

        if let Some(dup) = records
            .windows(2)
            .find(|w| w[0].firm_id == w[1].firm_id && w[0].year == w[1].year)
        {
            return Err(DataError::DuplicateKey {
                firm_id: dup[0].firm_id.clone(),
                year: dup[0].year,
            });
        }

        Ok(Self { records })
    }

    /// Records in (firm, year) order.
    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    /// Consume the panel, returning its records.
    pub fn into_records(self) -> Vec<RawRecord> {
        self.records
    }

    /// Number of firm-years.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the panel has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct firm identifiers, sorted.
    pub fn firms(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.firm_id.as_str()).collect();
        set.into_iter().collect()
    }

    /// Distinct years, sorted.
    pub fn years(&self) -> Vec<i32> {
        let set: BTreeSet<i32> = self.records.iter().map(|r| r.year).collect();
        set.into_iter().collect()
    }
}
