//! Temporal stability of co-polarized backscatter
//!
//! Built structures return nearly the same power in every acquisition;
//! vegetation fluctuates with moisture and wind. Stability is `1 - CoV`
//! of the linear power series, rescaled from `[floor, 1]` onto `[0, 1]`.

use rayon::prelude::*;
use subcanopy_core::raster::Raster;

use super::EPSILON;
use crate::error::{DetectError, Result};
use crate::radiometry::TemporalMoments;

/// Stability score from the linear moments of a stack.
///
/// `CoV = std / max(mean, ε)`, `stability = clamp(1 - CoV, 0, 1)` and the
/// score is `clamp((stability - floor) / (1 - floor), 0, 1)`. Pixels with
/// no valid epoch are NaN.
pub fn stability_score(moments: &TemporalMoments, floor: f64) -> Result<Raster<f64>> {
    if !floor.is_finite() || floor >= 1.0 {
        return Err(DetectError::InvalidConfig(format!(
            "stability_floor must be below 1, got {floor}"
        )));
    }
    let span = 1.0 - floor;
    let (rows, cols) = moments.mean.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let mean = unsafe { moments.mean.get_unchecked(row, col) };
                let std = unsafe { moments.std_dev.get_unchecked(row, col) };
                if !mean.is_finite() || !std.is_finite() {
                    continue;
                }
                let cov = std / mean.max(EPSILON);
                let stability = (1.0 - cov).clamp(0.0, 1.0);
                *out = ((stability - floor) / span).clamp(0.0, 1.0);
            }
            row_data
        })
        .collect();

    Ok(moments.mean.derive(data, Some(f64::NAN))?)
}
