#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/profitpulse/profitpulse/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod boosting;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod error;
pub mod forest;
pub mod metrics;
pub mod predict;
pub mod svm;
pub mod trainer;
pub mod tree;
#[cfg(feature = "xgboost")]
pub mod xgb;

// Re-export main types
pub use classifier::{Backend, Classifier, FittedModel, ModelKind};
pub use config::{BoostingConfig, ForestConfig, ModelConfig, SvmConfig, XgbConfig};
pub use dataset::Dataset;
pub use error::{ModelError, Result};
pub use metrics::{Metrics, evaluate};
pub use predict::{PredictionRow, predict_all};
pub use trainer::{ModelTrainer, Substitution, TrainedModel, TrainingReport};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
