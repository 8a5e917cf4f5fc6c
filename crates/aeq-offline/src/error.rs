//! Error types for file-level enhancement

use aeq_ml::MlError;
use thiserror::Error;

/// File layer errors
#[derive(Error, Debug)]
pub enum OfflineError {
    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("Failed to read audio file: {0}")]
    ReadError(String),

    #[error("Failed to write output file: {0}")]
    WriteError(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Sample rate conversion failed: {0}")]
    SampleRateConversion(String),

    #[error("Enhancement failed: {0}")]
    Enhance(#[from] MlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for file operations
pub type OfflineResult<T> = Result<T, OfflineError>;
