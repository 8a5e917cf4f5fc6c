//! Error types for spectral enhancement

use thiserror::Error;

/// Enhancement error types
#[derive(Error, Debug)]
pub enum MlError {
    /// Model file not found
    #[error("Model not found: {path}")]
    ModelNotFound { path: String },

    /// Model loading failed
    #[error("Failed to load model: {reason}")]
    ModelLoadFailed { reason: String },

    /// A weight exists in the blob but cannot be bound to the topology
    #[error("Incompatible weight {name}: expected shape {expected}, got {got}")]
    IncompatibleWeight {
        name: String,
        expected: String,
        got: String,
    },

    /// Projection matrix does not match the spectral parameters
    #[error("Invalid projection matrix: expected {expected}, got {got}")]
    InvalidProjection { expected: String, got: String },

    /// Inference failed
    #[error("Inference failed: {reason}")]
    InferenceFailed { reason: String },

    /// Invalid input shape
    #[error("Invalid input shape: expected {expected}, got {got}")]
    InvalidInputShape { expected: String, got: String },

    /// Invalid output shape
    #[error("Invalid output shape: expected {expected}, got {got}")]
    InvalidOutputShape { expected: String, got: String },

    /// Processing failed
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    /// Invalid sample rate
    #[error("Invalid sample rate: expected {expected}, got {got}")]
    InvalidSampleRate { expected: u32, got: u32 },

    /// NaN or infinite sample in the input waveform
    #[error("Non-finite sample at index {index}")]
    NonFiniteInput { index: usize },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// GPU not available
    #[error("GPU acceleration not available: {reason}")]
    GpuNotAvailable { reason: String },

    /// Candle tensor error
    #[error("Candle error: {0}")]
    Candle(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<candle_core::Error> for MlError {
    fn from(e: candle_core::Error) -> Self {
        MlError::Candle(e.to_string())
    }
}

/// Result type for enhancement operations
pub type MlResult<T> = Result<T, MlError>;
