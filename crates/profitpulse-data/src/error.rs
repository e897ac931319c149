//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while ingesting the firm-year panel.
#[derive(Debug, Error)]
pub enum DataError {
    /// Required columns are absent from the input header
    #[error("Missing required columns: {}", missing.join(", "))]
    MissingColumns {
        /// Canonical names (with accepted variants) of the missing columns
        missing: Vec<String>,
    },

    /// The same firm-year appears more than once
    #[error("Duplicate firm-year key: {firm_id} / {year}")]
    DuplicateKey {
        /// Firm identifier
        firm_id: String,
        /// Calendar year
        year: i32,
    },

    /// No row survived ingestion
    #[error("Input contains no usable firm-year rows")]
    Empty,

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
