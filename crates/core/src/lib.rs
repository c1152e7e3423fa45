//! # Subcanopy Core
//!
//! Core types shared by every stage of the subcanopy detector.
//!
//! This crate provides:
//! - `Raster<T>`: Generic georeferenced raster grid with an explicit no-data value
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `CRS`: Coordinate Reference System handling, including UTM to WGS84
//! - Grid alignment checks used to reject misaligned inputs
//! - The `Algorithm` trait for a consistent operator API

pub mod crs;
pub mod error;
pub mod raster;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::Algorithm;
}

/// Core trait for all operators in subcanopy.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
