//! Return on Equity (ROE)
//!
//! Measures profitability relative to the equity basis. Negative equity is
//! kept as-is; only a zero base makes the ratio undefined.

use crate::builder::ProxyConfig;
use crate::proxy::{Proxy, ProxyKind, safe_ratio};
use profitpulse_data::{RawField, RawRecord};

/// ROE = net income / equity
#[derive(Debug, Default, Clone, Copy)]
pub struct RoeProxy;

impl Proxy for RoeProxy {
    fn kind(&self) -> ProxyKind {
        ProxyKind::Roe
    }

    fn required_fields(&self) -> &'static [RawField] {
        &[
            RawField::NetIncomePrimary,
            RawField::NetIncomeSecondary,
            RawField::Equity,
        ]
    }

    fn compute(&self, record: &RawRecord, _config: &ProxyConfig) -> Option<f64> {
        safe_ratio(record.net_income(), record.equity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_roe_uses_fallback_income() {
        let rec = RawRecord::new("AAA", 2020)
            .with_net_income_secondary(-5.0)
            .with_equity(50.0);
        let value = RoeProxy.compute(&rec, &ProxyConfig::default()).unwrap();
        assert_relative_eq!(value, -0.1);
    }

    #[test]
    fn test_roe_undefined_equity() {
        let rec = RawRecord::new("AAA", 2020).with_net_income(5.0);
        assert_eq!(RoeProxy.compute(&rec, &ProxyConfig::default()), None);
    }
}
