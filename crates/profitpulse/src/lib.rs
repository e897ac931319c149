#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/profitpulse/profitpulse/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod pipeline;

// Re-export main types from sub-crates
pub use profitpulse_data as data;
pub use profitpulse_factors as factors;
pub use profitpulse_models as models;
pub use profitpulse_output as output;
pub use profitpulse_score as score;

pub use config::PipelineConfig;
pub use error::{ErrorKind, PipelineError, Result};
pub use pipeline::{Pipeline, PipelineOutput, Stage};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
