//! Errors raised while training, evaluating or applying classifiers.

use profitpulse_factors::ProxyKind;
use thiserror::Error;

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur in model training and prediction
#[derive(Debug, Error)]
pub enum ModelError {
    /// No training rows
    #[error("Training set is empty")]
    EmptyTrainingSet,

    /// Training labels contain a single class
    #[error("Training labels contain only class {0}")]
    SingleClass(u8),

    /// No evaluation rows
    #[error("Evaluation set is empty")]
    EmptyEvaluationSet,

    /// A feature value was undefined
    #[error("Row {firm_id} / {year} is missing feature {proxy}")]
    MissingFeature {
        /// Firm identifier
        firm_id: String,
        /// Predictor year
        year: i32,
        /// Missing proxy
        proxy: ProxyKind,
    },

    /// Feature count does not match the fitted model
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Native backend failure
    #[error("Backend error: {0}")]
    Backend(String),

    /// Error from the scoring stages
    #[error(transparent)]
    Score(#[from] profitpulse_score::ScoreError),
}
