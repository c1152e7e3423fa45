//! Percentiles over the valid cells of a raster
//!
//! Uses linear interpolation between closest ranks, so the 0th and 100th
//! percentiles are the minimum and maximum.

use subcanopy_core::raster::Raster;
use subcanopy_core::{Error, Result};

/// Compute several percentiles (0-100) of the valid cells in one sort.
///
/// Returns `Ok(None)` when the raster holds no valid cell.
pub fn percentiles(raster: &Raster<f64>, pcts: &[f64]) -> Result<Option<Vec<f64>>> {
    for &p in pcts {
        if !(0.0..=100.0).contains(&p) {
            return Err(Error::InvalidParameter {
                name: "percentile",
                value: p.to_string(),
                reason: "must be between 0 and 100".into(),
            });
        }
    }

    let mut values: Vec<f64> = raster
        .data()
        .iter()
        .copied()
        .filter(|v| v.is_finite() && !raster.is_nodata(*v))
        .collect();

    if values.is_empty() {
        return Ok(None);
    }

    values.sort_by(f64::total_cmp);

    Ok(Some(pcts.iter().map(|&p| interpolate(&values, p)).collect()))
}

/// Convenience wrapper returning `(low, high)` percentiles.
pub fn percentile_range(raster: &Raster<f64>, low: f64, high: f64) -> Result<Option<(f64, f64)>> {
    if low > high {
        return Err(Error::InvalidParameter {
            name: "low",
            value: low.to_string(),
            reason: format!("must not exceed high percentile {high}"),
        });
    }
    Ok(percentiles(raster, &[low, high])?.map(|v| (v[0], v[1])))
}

fn interpolate(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp(n: usize) -> Raster<f64> {
        Raster::from_vec((0..n).map(|v| v as f64).collect(), 1, n).unwrap()
    }

    #[test]
    fn test_extremes_are_min_max() {
        let r = ramp(11);
        let p = percentiles(&r, &[0.0, 100.0]).unwrap().unwrap();
        assert_relative_eq!(p[0], 0.0);
        assert_relative_eq!(p[1], 10.0);
    }

    #[test]
    fn test_linear_interpolation() {
        // 101 values 0..=100: the p-th percentile is p
        let r = ramp(101);
        let (lo, hi) = percentile_range(&r, 2.0, 98.0).unwrap().unwrap();
        assert_relative_eq!(lo, 2.0, epsilon = 1e-12);
        assert_relative_eq!(hi, 98.0, epsilon = 1e-12);

        // 5 values: 50th between ranks exactly at index 2; 25th at index 1
        let r = Raster::from_vec(vec![4.0, 1.0, 3.0, 2.0, 5.0], 1, 5).unwrap();
        let p = percentiles(&r, &[25.0, 50.0, 90.0]).unwrap().unwrap();
        assert_relative_eq!(p[0], 2.0);
        assert_relative_eq!(p[1], 3.0);
        assert_relative_eq!(p[2], 4.6, epsilon = 1e-12);
    }

    #[test]
    fn test_nan_skipped_and_empty() {
        let r = Raster::from_vec(vec![f64::NAN, 7.0, f64::NAN], 1, 3).unwrap();
        let p = percentiles(&r, &[2.0, 98.0]).unwrap().unwrap();
        assert_relative_eq!(p[0], 7.0);
        assert_relative_eq!(p[1], 7.0);

        let empty = Raster::from_vec(vec![f64::NAN; 4], 2, 2).unwrap();
        assert!(percentiles(&empty, &[50.0]).unwrap().is_none());
    }

    #[test]
    fn test_invalid_percentile() {
        let r = ramp(3);
        assert!(percentiles(&r, &[101.0]).is_err());
        assert!(percentile_range(&r, 60.0, 40.0).is_err());
    }
}
