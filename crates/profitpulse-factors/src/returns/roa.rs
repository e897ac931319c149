//! Return on Assets (ROA)
//!
//! Net income relative to total assets.

use crate::builder::ProxyConfig;
use crate::proxy::{Proxy, ProxyKind, safe_ratio};
use profitpulse_data::{RawField, RawRecord};

/// ROA = net income / total assets
#[derive(Debug, Default, Clone, Copy)]
pub struct RoaProxy;

impl Proxy for RoaProxy {
    fn kind(&self) -> ProxyKind {
        ProxyKind::Roa
    }

    fn required_fields(&self) -> &'static [RawField] {
        &[
            RawField::NetIncomePrimary,
            RawField::NetIncomeSecondary,
            RawField::TotalAssets,
        ]
    }

    fn compute(&self, record: &RawRecord, _config: &ProxyConfig) -> Option<f64> {
        safe_ratio(record.net_income(), record.total_assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_roa() {
        let rec = RawRecord::new("AAA", 2020)
            .with_net_income(12.0)
            .with_total_assets(240.0);
        let value = RoaProxy.compute(&rec, &ProxyConfig::default()).unwrap();
        assert_relative_eq!(value, 0.05);
    }

    #[test]
    fn test_roa_zero_assets() {
        let rec = RawRecord::new("AAA", 2020)
            .with_net_income(12.0)
            .with_total_assets(0.0);
        assert_eq!(RoaProxy.compute(&rec, &ProxyConfig::default()), None);
    }
}
