//! Pipeline errors.

use profitpulse_data::DataError;
use profitpulse_factors::ProxyError;
use profitpulse_models::ModelError;
use profitpulse_output::ExportError;
use profitpulse_score::ScoreError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Coarse error category, stable across the underlying crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input columns or keys are wrong
    Schema,
    /// Too few rows (or classes) for a fitting stage
    InsufficientData,
    /// A lookup on a finished run found nothing
    NotFound,
    /// Settings are inconsistent
    Config,
    /// Filesystem failure
    Io,
}

/// Errors that can occur while running the pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Ingestion error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Proxy configuration error
    #[error(transparent)]
    Proxy(#[from] ProxyError),

    /// Measurement, labeling or split error
    #[error(transparent)]
    Score(#[from] ScoreError),

    /// Training, evaluation or prediction error
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Artifact export error
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Inconsistent configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Lookup on a finished run found nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const fn score_kind(err: &ScoreError) -> ErrorKind {
    match err {
        ScoreError::InsufficientData { .. } | ScoreError::MissingLabel { .. } => {
            ErrorKind::InsufficientData
        }
        ScoreError::InvalidParameter(_) => ErrorKind::Config,
        ScoreError::NotFitted(_) | ScoreError::DimensionMismatch { .. } => ErrorKind::Schema,
    }
}

impl PipelineError {
    /// Category of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Data(DataError::Io(_)) | Self::Export(_) | Self::Io(_) => ErrorKind::Io,
            Self::Data(DataError::Empty) => ErrorKind::InsufficientData,
            Self::Data(_) => ErrorKind::Schema,
            Self::Proxy(_) | Self::Config(_) | Self::ConfigParse(_) => ErrorKind::Config,
            Self::Score(err) => score_kind(err),
            Self::Model(err) => match err {
                ModelError::EmptyTrainingSet
                | ModelError::SingleClass(_)
                | ModelError::EmptyEvaluationSet => ErrorKind::InsufficientData,
                ModelError::MissingFeature { .. } | ModelError::DimensionMismatch { .. } => {
                    ErrorKind::Schema
                }
                ModelError::InvalidParameter(_) | ModelError::Backend(_) => ErrorKind::Config,
                ModelError::Score(inner) => score_kind(inner),
            },
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DataError::MissingColumns { missing: vec!["TA".into()] }.into(), ErrorKind::Schema)]
    #[case(DataError::DuplicateKey { firm_id: "A".into(), year: 2020 }.into(), ErrorKind::Schema)]
    #[case(
        ScoreError::InsufficientData { stage: "projection", required: 300, actual: 4 }.into(),
        ErrorKind::InsufficientData
    )]
    #[case(ModelError::SingleClass(1).into(), ErrorKind::InsufficientData)]
    #[case(
        ModelError::Score(ScoreError::InvalidParameter("rank".into())).into(),
        ErrorKind::Config
    )]
    #[case(PipelineError::NotFound("screener 2030".into()), ErrorKind::NotFound)]
    #[case(PipelineError::Config("empty".into()), ErrorKind::Config)]
    #[case(std::io::Error::other("disk").into(), ErrorKind::Io)]
    fn test_kind(#[case] err: PipelineError, #[case] expected: ErrorKind) {
        assert_eq!(err.kind(), expected);
    }
}
