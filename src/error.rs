//! Error types for the fleet-risk pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, FleetError>;

/// Main error type for the fleet-risk crate
#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Tracking error: {0}")]
    TrackingError(String),

    #[error("Report error: {0}")]
    ReportError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),
}

impl From<polars::error::PolarsError> for FleetError {
    fn from(err: polars::error::PolarsError) -> Self {
        FleetError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for FleetError {
    fn from(err: serde_json::Error) -> Self {
        FleetError::SerializationError(err.to_string())
    }
}
