#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/profitpulse/profitpulse/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod label;
pub mod linalg;
pub mod measurement;
pub mod pca;
pub mod preprocess;
pub mod split;

// Re-export main types
pub use error::{Result, ScoreError};
pub use label::{ForecastRow, LabelRule, Labeler, shift_to_target};
pub use measurement::{MeasurementConfig, MeasurementModel, ScoredRecord};
pub use pca::ProjectionModel;
pub use preprocess::{PreprocessConfig, SafePreprocessor, StandardScaler, WinsorBounds};
pub use split::{Split, TemporalSplit};

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
