//! Co-occurrence texture contrast of the median co-polarized image
//!
//! The median dB image is quantized over its 2nd-98th percentile range,
//! GLCM contrast is measured in a square window, and the contrast itself
//! is stretched over its own 2nd-98th percentile range.

use subcanopy_algorithms::statistics::percentile_range;
use subcanopy_algorithms::texture::{glcm_contrast, quantize, GlcmParams};
use subcanopy_core::raster::Raster;
use tracing::warn;

use super::{unit_score, Windowing, EPSILON};
use crate::error::Result;

const STRETCH_LOW: f64 = 2.0;
const STRETCH_HIGH: f64 = 98.0;

/// Texture score in [0, 1].
///
/// When the contrast has no spread (a perfectly uniform scene) every
/// valid cell scores 0.
pub fn texture_score(
    median_db: &Raster<f64>,
    radius: usize,
    distance: usize,
    levels: usize,
    windowing: Windowing,
) -> Result<Raster<f64>> {
    let Some((vmin, vmax)) = percentile_range(median_db, STRETCH_LOW, STRETCH_HIGH)? else {
        return unit_score(median_db, |_| f64::NAN);
    };
    let quantized = quantize(median_db, vmin, vmax, levels)?;

    let params = GlcmParams { radius, distance };
    let contrast = windowing.apply(&quantized, |w| glcm_contrast(w, params.clone()))?;

    let Some((cmin, cmax)) = percentile_range(&contrast, STRETCH_LOW, STRETCH_HIGH)? else {
        return unit_score(&contrast, |_| f64::NAN);
    };
    let range = cmax - cmin;
    if range < EPSILON {
        warn!(
            contrast = cmin,
            "texture contrast has no spread; scoring texture as 0"
        );
        return unit_score(&contrast, |_| 0.0);
    }

    unit_score(&contrast, |c| (c - cmin) / range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use subcanopy_core::GeoTransform;

    fn grid(rows: usize, cols: usize, f: impl Fn(usize, usize) -> f64) -> Raster<f64> {
        let mut r = Raster::new(rows, cols);
        r.set_transform(GeoTransform::new(0.0, rows as f64 * 10.0, 10.0, -10.0));
        for row in 0..rows {
            for col in 0..cols {
                r.set(row, col, f(row, col)).unwrap();
            }
        }
        r
    }

    #[test]
    fn test_uniform_scene_scores_zero() {
        let median = grid(12, 12, |_, _| -11.0);
        let score = texture_score(&median, 2, 1, 32, Windowing::whole()).unwrap();
        assert!(score.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_edge_scores_above_flat() {
        // Bright block on a flat background
        let median = grid(30, 30, |r, c| {
            if (12..18).contains(&r) && (12..18).contains(&c) {
                -1.0
            } else {
                -12.0
            }
        });
        let score = texture_score(&median, 2, 1, 32, Windowing::whole()).unwrap();
        let edge = score.get(12, 12).unwrap();
        let far = score.get(2, 2).unwrap();
        assert!(edge > 0.5, "edge score {edge}");
        assert_relative_eq!(far, 0.0);
        assert!(score.data().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_missing_center_uses_neighbour_pairs() {
        let mut median = grid(10, 10, |r, c| ((r * 3 + c * 7) % 5) as f64 - 10.0);
        median.set(4, 4, f64::NAN).unwrap();
        let score = texture_score(&median, 1, 1, 16, Windowing::whole()).unwrap();
        assert!(score.get(0, 0).unwrap().is_finite());
        // A missing center still has valid neighbour pairs
        assert!(score.get(4, 4).unwrap().is_finite());
    }

    #[test]
    fn test_tiled_matches_whole() {
        let median = grid(33, 29, |r, c| ((r * 13 + c * 5) % 17) as f64 * 0.8 - 15.0);
        let whole = texture_score(&median, 3, 1, 32, Windowing::whole()).unwrap();
        let tiled = texture_score(&median, 3, 1, 32, Windowing::tiled(8, 4)).unwrap();
        let a: Vec<u64> = whole.data().iter().map(|v| v.to_bits()).collect();
        let b: Vec<u64> = tiled.data().iter().map(|v| v.to_bits()).collect();
        assert_eq!(a, b);
    }
}
