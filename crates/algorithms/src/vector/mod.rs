//! Vector outlines of raster regions
//!
//! - Polygonize: trace the exact pixel-square boundary of a labeled region
//!   into a polygon with holes

mod polygonize;

pub use polygonize::{outline_region, RegionOutline};
