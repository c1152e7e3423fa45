//! Double-bounce indicator from the cross/co polarization ratio
//!
//! Wall-ground dihedrals return strongly in the co-polarized channel and
//! weakly in the cross-polarized one, so a low VH/VV ratio scores high.

use rayon::prelude::*;
use subcanopy_core::raster::Raster;

use super::EPSILON;
use crate::error::{DetectError, Result};

/// Score `clamp((max - ratio) / (max - min), 0, 1)` with
/// `ratio = vh_mean / max(vv_mean, ε)`, both means in linear power.
pub fn double_bounce_score(
    vh_mean: &Raster<f64>,
    vv_mean: &Raster<f64>,
    ratio_min: f64,
    ratio_max: f64,
) -> Result<Raster<f64>> {
    if !(ratio_max > ratio_min) {
        return Err(DetectError::InvalidConfig(format!(
            "pol_ratio_max ({ratio_max}) must exceed pol_ratio_min ({ratio_min})"
        )));
    }
    vv_mean.ensure_same_grid(vh_mean)?;

    let span = ratio_max - ratio_min;
    let (rows, cols) = vv_mean.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let vh = unsafe { vh_mean.get_unchecked(row, col) };
                let vv = unsafe { vv_mean.get_unchecked(row, col) };
                if !vh.is_finite() || !vv.is_finite() {
                    continue;
                }
                let ratio = vh / vv.max(EPSILON);
                *out = ((ratio_max - ratio) / span).clamp(0.0, 1.0);
            }
            row_data
        })
        .collect();

    Ok(vv_mean.derive(data, Some(f64::NAN))?)
}
