//! Net Profit Margin (NPM)

use crate::builder::ProxyConfig;
use crate::proxy::{Proxy, ProxyKind, safe_ratio};
use profitpulse_data::{RawField, RawRecord};

/// NPM = net income / revenue
#[derive(Debug, Default, Clone, Copy)]
pub struct NpmProxy;

impl Proxy for NpmProxy {
    fn kind(&self) -> ProxyKind {
        ProxyKind::Npm
    }

    fn required_fields(&self) -> &'static [RawField] {
        &[
            RawField::NetIncomePrimary,
            RawField::NetIncomeSecondary,
            RawField::Revenue,
        ]
    }

    fn compute(&self, record: &RawRecord, _config: &ProxyConfig) -> Option<f64> {
        safe_ratio(record.net_income(), record.revenue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_npm() {
        let rec = RawRecord::new("AAA", 2020)
            .with_net_income(30.0)
            .with_revenue(120.0);
        assert_relative_eq!(NpmProxy.compute(&rec, &ProxyConfig::default()).unwrap(), 0.25);
    }
}
