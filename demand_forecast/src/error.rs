//! Error types for the demand_forecast crate

use demand_math::MathError;
use thiserror::Error;

/// Custom error types for the demand_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Input rejected before any work was done: empty corpus, missing
    /// required column, invalid parameter
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Artifact bundle built for a different feature layout
    #[error("Schema mismatch: bundle was trained with schema {found}, this build produces {expected}")]
    SchemaMismatch {
        /// Signature of the running feature builder
        expected: String,
        /// Signature stored in the bundle
        found: String,
    },

    /// Error related to stored or supplied observations
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from fitting or evaluating a model
    #[error("Model error: {0}")]
    ModelError(#[from] MathError),

    /// Invalid configuration
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from reading or writing CSV
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error encoding or decoding artifacts and config files
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<bincode::Error> for ForecastError {
    fn from(err: bincode::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}
