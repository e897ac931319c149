//! Proxy computation over a panel.

use crate::error::ProxyError;
use crate::margin::NpmProxy;
use crate::per_share::EpsProxy;
use crate::proxy::{Proxy, ProxyKind, ProxyRecord, ProxySet};
use crate::returns::{RoaProxy, RocProxy, RoeProxy};
use profitpulse_data::{Panel, RawRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Configuration for proxy computation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Par value per share used by ROC (default: 10 000)
    pub par_value: f64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self { par_value: 10_000.0 }
    }
}

impl ProxyConfig {
    /// Reject a non-positive or non-finite par value.
    pub fn validate(&self) -> Result<(), ProxyError> {
        if self.par_value.is_finite() && self.par_value > 0.0 {
            Ok(())
        } else {
            Err(ProxyError::InvalidParValue(self.par_value.to_string()))
        }
    }
}

/// Instantiate the proxy implementation for a kind.
pub fn proxy_for(kind: ProxyKind) -> Box<dyn Proxy> {
    match kind {
        ProxyKind::Roa => Box::new(RoaProxy),
        ProxyKind::Roe => Box::new(RoeProxy),
        ProxyKind::Roc => Box::new(RocProxy),
        ProxyKind::Eps => Box::new(EpsProxy),
        ProxyKind::Npm => Box::new(NpmProxy),
    }
}

/// Computes all five proxies for every row.
#[derive(Debug)]
pub struct ProxyBuilder {
    config: ProxyConfig,
    proxies: Vec<Box<dyn Proxy>>,
}

impl Default for ProxyBuilder {
    fn default() -> Self {
        Self::new(ProxyConfig::default())
    }
}

impl ProxyBuilder {
    /// Create a builder.
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            config,
            proxies: ProxyKind::ALL.into_iter().map(proxy_for).collect(),
        }
    }

    /// Builder configuration.
    pub const fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Proxies for a single record.
    pub fn compute(&self, record: &RawRecord) -> ProxySet {
        let mut set = ProxySet::default();
        for proxy in &self.proxies {
            set.set(proxy.kind(), proxy.compute(record, &self.config));
        }
        set
    }

    /// Proxies for every panel row, in panel order.
    pub fn build(&self, panel: &Panel) -> Vec<ProxyRecord> {
        let rows: Vec<ProxyRecord> = panel
            .records()
            .iter()
            .map(|raw| ProxyRecord {
                raw: raw.clone(),
                proxies: self.compute(raw),
            })
            .collect();

        for kind in ProxyKind::ALL {
            let undefined = rows.iter().filter(|r| r.proxies.get(kind).is_none()).count();
            if undefined > 0 {
                debug!(proxy = %kind, undefined, "undefined proxy values");
            }
        }
        let complete = rows.iter().filter(|r| r.is_complete(&ProxyKind::ALL)).count();
        info!(rows = rows.len(), complete, "proxies computed");

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn full_record() -> RawRecord {
        RawRecord::new("AAA", 2020)
            .with_total_assets(1_000.0)
            .with_equity(400.0)
            .with_shares_issued(2.0)
            .with_eps(3.5)
            .with_revenue(800.0)
            .with_net_income(80.0)
    }

    #[test]
    fn test_compute_all_proxies() {
        let set = ProxyBuilder::default().compute(&full_record());

        assert_relative_eq!(set.get(ProxyKind::Roa).unwrap(), 0.08);
        assert_relative_eq!(set.get(ProxyKind::Roe).unwrap(), 0.2);
        assert_relative_eq!(set.get(ProxyKind::Roc).unwrap(), 80.0 / 20_000.0);
        assert_relative_eq!(set.get(ProxyKind::Eps).unwrap(), 3.5);
        assert_relative_eq!(set.get(ProxyKind::Npm).unwrap(), 0.1);
    }

    #[test]
    fn test_undefined_ratio_touches_only_its_proxy() {
        let mut rec = full_record();
        rec.revenue = Some(0.0);
        let set = ProxyBuilder::default().compute(&rec);

        assert_eq!(set.get(ProxyKind::Npm), None);
        assert!(set.is_complete(&[
            ProxyKind::Roa,
            ProxyKind::Roe,
            ProxyKind::Roc,
            ProxyKind::Eps
        ]));
    }

    #[test]
    fn test_build_preserves_panel_order() {
        let panel = Panel::from_records(vec![
            full_record(),
            RawRecord::new("AAA", 2019).with_eps(1.0),
        ])
        .unwrap();

        let rows = ProxyBuilder::default().build(&panel);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].year(), 2019);
        assert!(!rows[0].is_complete(&ProxyKind::ALL));
        assert!(rows[0].is_complete(&[ProxyKind::Eps]));
        assert!(rows[1].is_complete(&ProxyKind::ALL));
    }

    #[test]
    fn test_config_validation() {
        assert!(ProxyConfig::default().validate().is_ok());
        assert!(ProxyConfig { par_value: 0.0 }.validate().is_err());
        assert!(ProxyConfig { par_value: f64::NAN }.validate().is_err());
    }
}
