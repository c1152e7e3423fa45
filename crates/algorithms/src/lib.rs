//! # Subcanopy Algorithms
//!
//! Raster operators shared by the detection pipeline.
//!
//! ## Available Algorithm Categories
//!
//! - **imagery**: Normalized-difference spectral indices (NDVI, NDWI, NDBI)
//! - **statistics**: Focal (moving window) moments and z-scores, percentiles,
//!   per-region zonal aggregation
//! - **texture**: Gray-level co-occurrence contrast
//! - **morphology**: Binary erosion, dilation and opening
//! - **segmentation**: Connected-component labeling
//! - **vector**: Polygon outlines of labeled pixel regions

pub mod imagery;
pub mod morphology;
pub mod segmentation;
pub mod statistics;
pub mod texture;
pub mod vector;

mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::imagery::{ndbi, ndvi, ndwi, normalized_difference};
    pub use crate::morphology::{binary_dilate, binary_erode, binary_opening, StructuringElement};
    pub use crate::segmentation::{connected_components, Connectivity, Labeling, Region};
    pub use crate::statistics::{
        focal_statistics, percentiles, zonal_statistics, FocalParams, FocalStatistic, ZonalResult,
    };
    pub use crate::texture::{glcm_contrast, quantize, GlcmParams};
    pub use crate::vector::{outline_region, RegionOutline};
    pub use subcanopy_core::prelude::*;
}
