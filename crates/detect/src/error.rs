//! Error types for the detection pipeline.

use thiserror::Error;

/// Errors produced by the detection pipeline.
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("input layer '{layer}' is not aligned with the radar grid: {source}")]
    Misaligned {
        layer: String,
        #[source]
        source: subcanopy_core::Error,
    },

    #[error("temporal stack '{0}' holds no epochs")]
    EmptyStack(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("fusion weights sum to {sum:.4}, expected 1.0 within {tolerance}")]
    WeightSum { sum: f64, tolerance: f64 },

    #[error("configuration document: {0}")]
    ConfigFormat(#[from] serde_json::Error),

    #[error("core error: {0}")]
    Core(#[from] subcanopy_core::Error),
}

/// Result alias for detection operations.
pub type Result<T> = std::result::Result<T, DetectError>;
