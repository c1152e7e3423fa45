//! Optical micro-anomaly from the built-up index
//!
//! Roofs and cleared ground raise NDBI above the surrounding canopy even
//! through gaps. The local NDBI z-score is clamped to [0, 3] and rescaled.

use subcanopy_algorithms::imagery::ndbi;
use subcanopy_core::raster::Raster;

use super::{local_zscore, unit_score, Windowing};
use crate::error::Result;

const Z_CAP: f64 = 3.0;

/// Optical score `clamp(z, 0, 3) / 3` of the local NDBI z-score
pub fn optical_score(
    swir: &Raster<f64>,
    nir: &Raster<f64>,
    radius: usize,
    windowing: Windowing,
) -> Result<Raster<f64>> {
    let index = ndbi(swir, nir)?;
    let z = local_zscore(&index, radius, windowing)?;
    unit_score(&z, |z| z.clamp(0.0, Z_CAP) / Z_CAP)
}
