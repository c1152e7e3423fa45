//! Spectral vegetation, water and built-up indices
//!
//! All indices operate on single-band rasters (one band per raster) that
//! share the same grid.

use crate::maybe_rayon::*;
use subcanopy_core::raster::Raster;
use subcanopy_core::Result;

/// Denominators with a smaller magnitude produce no-data.
const DENOMINATOR_FLOOR: f64 = 1e-10;

/// Compute the normalized difference between two bands:
///
/// `(band_a - band_b) / (band_a + band_b)`
///
/// The result is clamped to [-1, 1]. Pixels where the band sum is
/// (near) zero or either band is no-data are set to NaN.
///
/// # Errors
/// Fails if the two bands do not share shape, transform and CRS.
pub fn normalized_difference(band_a: &Raster<f64>, band_b: &Raster<f64>) -> Result<Raster<f64>> {
    band_a.ensure_same_grid(band_b)?;

    let (rows, cols) = band_a.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let a = unsafe { band_a.get_unchecked(row, col) };
                let b = unsafe { band_b.get_unchecked(row, col) };

                if band_a.is_nodata(a) || band_b.is_nodata(b) || !a.is_finite() || !b.is_finite() {
                    continue;
                }

                let sum = a + b;
                if sum.abs() < DENOMINATOR_FLOOR {
                    continue;
                }

                *out = ((a - b) / sum).clamp(-1.0, 1.0);
            }
            row_data
        })
        .collect();

    band_a.derive(data, Some(f64::NAN))
}

/// Normalized Difference Vegetation Index
///
/// `NDVI = (NIR - Red) / (NIR + Red)`
///
/// Closed canopy typically sits above 0.6; bare soil around 0.1 to 0.2.
pub fn ndvi(nir: &Raster<f64>, red: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(nir, red)
}

/// Normalized Difference Water Index (McFeeters, 1996)
///
/// `NDWI = (Green - NIR) / (Green + NIR)`
///
/// Positive values indicate open water.
pub fn ndwi(green: &Raster<f64>, nir: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(green, nir)
}

/// Normalized Difference Built-up Index (Zha et al., 2003)
///
/// `NDBI = (SWIR - NIR) / (SWIR + NIR)`
///
/// Impervious surfaces reflect more shortwave infrared than near infrared,
/// so roofs and pavement push the index up relative to surrounding canopy.
pub fn ndbi(swir: &Raster<f64>, nir: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(swir, nir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use subcanopy_core::GeoTransform;

    fn band(values: Vec<f64>, rows: usize, cols: usize) -> Raster<f64> {
        let mut r = Raster::from_vec(values, rows, cols).unwrap();
        r.set_transform(GeoTransform::new(0.0, 20.0, 10.0, -10.0));
        r.set_nodata(Some(f64::NAN));
        r
    }

    #[test]
    fn test_ndvi_values() {
        let nir = band(vec![0.4, 0.3, 0.5, 0.0], 2, 2);
        let red = band(vec![0.05, 0.3, 0.1, 0.0], 2, 2);
        let out = ndvi(&nir, &red).unwrap();

        assert_relative_eq!(out.get(0, 0).unwrap(), 0.35 / 0.45, epsilon = 1e-12);
        assert_relative_eq!(out.get(0, 1).unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(out.get(1, 0).unwrap(), 0.4 / 0.6, epsilon = 1e-12);
        // zero sum
        assert!(out.get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn test_nodata_propagates() {
        let swir = band(vec![f64::NAN, 0.3], 1, 2);
        let nir = band(vec![0.4, 0.4], 1, 2);
        let out = ndbi(&swir, &nir).unwrap();
        assert!(out.get(0, 0).unwrap().is_nan());
        assert_relative_eq!(out.get(0, 1).unwrap(), -0.1 / 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_clamped_for_negative_reflectance() {
        // Slightly negative surface reflectance can push the ratio past 1
        let green = band(vec![0.2], 1, 1);
        let nir = band(vec![-0.1], 1, 1);
        let out = ndwi(&green, &nir).unwrap();
        assert_relative_eq!(out.get(0, 0).unwrap(), 1.0);
    }

    #[test]
    fn test_grid_mismatch_rejected() {
        let a = band(vec![0.1; 4], 2, 2);
        let b = band(vec![0.1; 6], 2, 3);
        assert!(normalized_difference(&a, &b).is_err());
    }
}
