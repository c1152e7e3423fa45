//! Imagery analysis algorithms
//!
//! Normalized-difference spectral indices computed from single-band
//! optical rasters:
//! - NDVI: vegetation vigour
//! - NDWI: open water (McFeeters)
//! - NDBI: built-up surfaces

mod indices;

pub use indices::{ndbi, ndvi, ndwi, normalized_difference};
