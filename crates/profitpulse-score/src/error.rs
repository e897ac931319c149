//! Errors raised while fitting or applying the measurement stages.

use thiserror::Error;

/// Result type for scoring operations.
pub type Result<T> = std::result::Result<T, ScoreError>;

/// Errors that can occur during preprocessing, projection, labeling or splitting
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoreError {
    /// Not enough rows to fit a stage
    #[error("Insufficient data for {stage}: need at least {required} rows, got {actual}")]
    InsufficientData {
        /// Stage being fit
        stage: &'static str,
        /// Required number of rows
        required: usize,
        /// Actual number of rows
        actual: usize,
    },

    /// A transform was requested before its parameters were fit
    #[error("{0} has not been fit")]
    NotFitted(&'static str),

    /// Matrix width does not match the fitted parameters
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

    /// A scored row reached the shift step without a label
    #[error("Row {firm_id} / {year} has no label")]
    MissingLabel {
        /// Firm identifier
        firm_id: String,
        /// Calendar year
        year: i32,
    },
}
