//! Statistical analysis algorithms for raster data
//!
//! - **focal**: Moving window (focal) moments and local z-scores
//! - **percentile**: Order statistics over the valid cells of a raster
//! - **zonal**: Per-region aggregation over labeled components

pub mod focal;
pub mod percentile;
pub mod zonal;

pub use focal::{focal_statistics, FocalParams, FocalStatistic};
pub use percentile::{percentile_range, percentiles};
pub use zonal::{zonal_statistics, ZonalResult};
