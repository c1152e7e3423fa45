//! Error types for subcanopy rasters

use thiserror::Error;

/// Main error type for raster-level operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Geotransform mismatch: {expected} vs {actual}")]
    TransformMismatch { expected: String, actual: String },

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for raster operations
pub type Result<T> = std::result::Result<T, Error>;
