#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/profitpulse/profitpulse/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod alerts;
pub mod explain;
pub mod export;
pub mod report;
pub mod views;

pub use alerts::{Alert, AlertEngine, AlertKind, Severity};
pub use explain::{Explainer, Explanation, ReasonCode, ReasonRule};
pub use export::{
    ArtifactWriter, CompanyView, ExportError, ExportFormat, Exporter, RUN_MARKER, Table,
};
pub use report::{MethodologySnapshot, MetricsReport, ModelReport, SplitSummary};
pub use views::{RiskBucket, ScreenerRow, ViewConfig, build_screener, is_borderline};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
