//! Error types for plasmidminer

use thiserror::Error;

/// Result type alias for plasmidminer operations
pub type Result<T> = std::result::Result<T, MinerError>;

/// Main error type for the training pipeline
#[derive(Error, Debug)]
pub enum MinerError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Label error: row {row} has identifier {id:?}, expected a 'positive' or 'negative' class token")]
    LabelError { row: usize, id: String },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<polars::error::PolarsError> for MinerError {
    fn from(err: polars::error::PolarsError) -> Self {
        MinerError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for MinerError {
    fn from(err: serde_json::Error) -> Self {
        MinerError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for MinerError {
    fn from(err: ndarray::ShapeError) -> Self {
        MinerError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MinerError::DataError("test error".to_string());
        assert_eq!(err.to_string(), "Data error: test error");
    }

    #[test]
    fn test_label_error_names_row() {
        let err = MinerError::LabelError { row: 3, id: "unknown-7".to_string() };
        let msg = err.to_string();
        assert!(msg.contains("row 3"));
        assert!(msg.contains("unknown-7"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MinerError = io_err.into();
        assert!(matches!(err, MinerError::IoError(_)));
    }
}
