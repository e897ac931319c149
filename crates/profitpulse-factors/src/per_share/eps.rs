//! Earnings per Share (EPS)
//!
//! Reported basic EPS, passed through unchanged.

use crate::builder::ProxyConfig;
use crate::proxy::{Proxy, ProxyKind};
use profitpulse_data::{RawField, RawRecord};

/// EPS = reported basic EPS
#[derive(Debug, Default, Clone, Copy)]
pub struct EpsProxy;

impl Proxy for EpsProxy {
    fn kind(&self) -> ProxyKind {
        ProxyKind::Eps
    }

    fn required_fields(&self) -> &'static [RawField] {
        &[RawField::Eps]
    }

    fn compute(&self, record: &RawRecord, _config: &ProxyConfig) -> Option<f64> {
        record.eps.filter(|v| v.is_finite())
    }
}
