//! Gray-Level Co-occurrence Matrix (GLCM) contrast
//!
//! The input is first quantized to a fixed number of gray levels over a
//! caller-supplied value range. Contrast is then measured at each pixel
//! from the co-occurrence pairs found in the surrounding window.

use crate::maybe_rayon::*;
use subcanopy_core::raster::Raster;
use subcanopy_core::{Error, Result};

/// Value ranges narrower than this are widened to it before quantizing.
const RANGE_FLOOR: f64 = 1e-10;

/// Parameters for GLCM computation
#[derive(Debug, Clone)]
pub struct GlcmParams {
    /// Window radius for GLCM computation
    pub radius: usize,
    /// Distance for co-occurrence (default: 1)
    pub distance: usize,
}

impl Default for GlcmParams {
    fn default() -> Self {
        Self {
            radius: 3,
            distance: 1,
        }
    }
}

impl GlcmParams {
    /// Furthest input cell (in rows or columns) that influences an output cell
    pub fn reach(&self) -> usize {
        self.radius + self.distance
    }
}

/// Quantize a continuous raster to integer gray levels `0..n_levels`.
///
/// Values are linearly mapped from `[vmin, vmax]` onto the level range,
/// clamped at both ends and rounded to the nearest level. NaN and
/// no-data cells stay NaN. A degenerate range maps every value to level 0
/// or the top level instead of failing.
pub fn quantize(raster: &Raster<f64>, vmin: f64, vmax: f64, n_levels: usize) -> Result<Raster<f64>> {
    if n_levels < 2 {
        return Err(Error::InvalidParameter {
            name: "n_levels",
            value: n_levels.to_string(),
            reason: "at least two gray levels are required".into(),
        });
    }
    if !vmin.is_finite() || !vmax.is_finite() || vmin > vmax {
        return Err(Error::Algorithm(format!(
            "Invalid quantization range [{vmin}, {vmax}]"
        )));
    }

    let range = (vmax - vmin).max(RANGE_FLOOR);
    let top = (n_levels - 1) as f64;

    let data: Vec<f64> = raster
        .data()
        .iter()
        .map(|&v| {
            if v.is_nan() || raster.is_nodata(v) {
                f64::NAN
            } else {
                (((v - vmin) / range).clamp(0.0, 1.0) * top).round()
            }
        })
        .collect();

    raster.derive(data, Some(f64::NAN))
}

/// Compute GLCM contrast of a quantized raster.
///
/// For each pixel, co-occurring pairs are gathered from the surrounding
/// square window in 4 directions (0°, 45°, 90°, 135°) at the configured
/// distance and counted symmetrically. The contrast of the normalized
/// matrix, `Σ p(i,j)·(i-j)²`, equals the mean squared level difference
/// over those pairs, which is what is accumulated here.
///
/// Pixels whose window holds no valid pair are NaN. The output at a cell
/// depends only on input cells within `radius + distance` of it.
pub fn glcm_contrast(levels: &Raster<f64>, params: GlcmParams) -> Result<Raster<f64>> {
    if params.radius == 0 {
        return Err(Error::Algorithm("GLCM radius must be > 0".into()));
    }
    if params.distance == 0 {
        return Err(Error::Algorithm("GLCM distance must be > 0".into()));
    }

    let (rows, cols) = levels.shape();
    let d = params.distance as isize;
    let r = params.radius as isize;

    // Direction offsets: 0°, 45°, 90°, 135°
    let directions: [(isize, isize); 4] = [(0, d), (-d, d), (-d, 0), (-d, -d)];

    let inside = |r: isize, c: isize| r >= 0 && c >= 0 && (r as usize) < rows && (c as usize) < cols;

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];

            for (col, out) in row_data.iter_mut().enumerate() {
                let mut weighted = 0.0;
                let mut pairs = 0usize;

                for dir in &directions {
                    for dr in -r..=r {
                        for dc in -r..=r {
                            let r1 = row as isize + dr;
                            let c1 = col as isize + dc;
                            let r2 = r1 + dir.0;
                            let c2 = c1 + dir.1;

                            if !inside(r1, c1) || !inside(r2, c2) {
                                continue;
                            }

                            let v1 = unsafe { levels.get_unchecked(r1 as usize, c1 as usize) };
                            let v2 = unsafe { levels.get_unchecked(r2 as usize, c2 as usize) };

                            if v1.is_finite() && v2.is_finite() {
                                let diff = v1 - v2;
                                weighted += diff * diff;
                                pairs += 1;
                            }
                        }
                    }
                }

                if pairs > 0 {
                    *out = weighted / pairs as f64;
                }
            }

            row_data
        })
        .collect();

    levels.derive(output_data, Some(f64::NAN))
}
