//! Return on Capital (ROC)
//!
//! Net income relative to paid-in capital at par: shares issued times the
//! configured par value.

use crate::builder::ProxyConfig;
use crate::proxy::{Proxy, ProxyKind, safe_ratio};
use profitpulse_data::{RawField, RawRecord};

/// ROC = net income / (shares issued * par value)
#[derive(Debug, Default, Clone, Copy)]
pub struct RocProxy;

impl Proxy for RocProxy {
    fn kind(&self) -> ProxyKind {
        ProxyKind::Roc
    }

    fn required_fields(&self) -> &'static [RawField] {
        &[
            RawField::NetIncomePrimary,
            RawField::NetIncomeSecondary,
            RawField::SharesIssued,
        ]
    }

    fn compute(&self, record: &RawRecord, config: &ProxyConfig) -> Option<f64> {
        let capital = record.shares_issued.map(|s| s * config.par_value);
        safe_ratio(record.net_income(), capital)
    }
}
