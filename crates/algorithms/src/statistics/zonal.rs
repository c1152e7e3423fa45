//! Zonal statistics
//!
//! Aggregates a value raster over each region of a connected-component
//! labeling. Regions are processed in parallel once labeling is complete;
//! results come back in label order.

use crate::maybe_rayon::*;
use crate::segmentation::Labeling;
use subcanopy_core::raster::Raster;
use subcanopy_core::Result;

/// Result of zonal statistics for one region
#[derive(Debug, Clone, PartialEq)]
pub struct ZonalResult {
    /// Label id of the region
    pub label: u32,
    /// Number of valid (non-NaN) value cells in the region
    pub count: usize,
    pub sum: f64,
    /// NaN when `count == 0`
    pub mean: f64,
    /// NaN when `count == 0`
    pub min: f64,
    /// NaN when `count == 0`
    pub max: f64,
}

impl ZonalResult {
    fn from_values(label: u32, values: impl Iterator<Item = f64>) -> Self {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }

        if count == 0 {
            return Self {
                label,
                count,
                sum,
                mean: f64::NAN,
                min: f64::NAN,
                max: f64::NAN,
            };
        }

        Self {
            label,
            count,
            sum,
            mean: sum / count as f64,
            min,
            max,
        }
    }
}

/// Compute per-region statistics of `values`.
///
/// Cells holding NaN or the raster's no-data value are skipped. The
/// returned vector has one entry per region, ordered by label id.
///
/// # Errors
/// Fails if `values` and the label raster do not share a grid.
pub fn zonal_statistics(values: &Raster<f64>, labeling: &Labeling) -> Result<Vec<ZonalResult>> {
    values.ensure_same_grid(&labeling.labels)?;

    let results = labeling
        .regions
        .par_iter()
        .map(|region| {
            let cells = region.cells.iter().filter_map(|&(r, c)| {
                let v = unsafe { values.get_unchecked(r, c) };
                (!v.is_nan() && !values.is_nodata(v)).then_some(v)
            });
            ZonalResult::from_values(region.label, cells)
        })
        .collect();

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::{connected_components, Connectivity};
    use approx::assert_relative_eq;
    use subcanopy_core::GeoTransform;

    fn two_blocks() -> (Raster<f64>, Labeling) {
        let gt = GeoTransform::new(0.0, 4.0, 1.0, -1.0);
        let mut values = Raster::new(4, 5);
        values.set_transform(gt);
        let mut mask: Raster<u8> = Raster::new(4, 5);
        mask.set_transform(gt);

        // Block 1: columns 0-1, block 2: columns 3-4
        for row in 0..4 {
            for col in 0..5 {
                values.set(row, col, (row * 5 + col) as f64).unwrap();
                if col != 2 {
                    mask.set(row, col, 1).unwrap();
                }
            }
        }
        let labeling = connected_components(&mask, Connectivity::Eight).unwrap();
        (values, labeling)
    }

    #[test]
    fn test_zonal_basic() {
        let (values, labeling) = two_blocks();
        let results = zonal_statistics(&values, &labeling).unwrap();
        assert_eq!(results.len(), 2);

        let z1 = &results[0];
        assert_eq!(z1.label, 1);
        assert_eq!(z1.count, 8);
        assert_relative_eq!(z1.min, 0.0);
        assert_relative_eq!(z1.max, 16.0);
        // 0,1,5,6,10,11,15,16
        assert_relative_eq!(z1.mean, 64.0 / 8.0);

        let z2 = &results[1];
        assert_eq!(z2.label, 2);
        assert_relative_eq!(z2.max, 19.0);
    }

    #[test]
    fn test_zonal_skip_nodata() {
        let (mut values, labeling) = two_blocks();
        values.set(0, 0, f64::NAN).unwrap();
        let results = zonal_statistics(&values, &labeling).unwrap();
        assert_eq!(results[0].count, 7);
        assert_relative_eq!(results[0].min, 1.0);
    }

    #[test]
    fn test_zonal_all_nodata_region() {
        let (mut values, labeling) = two_blocks();
        for row in 0..4 {
            values.set(row, 3, f64::NAN).unwrap();
            values.set(row, 4, f64::NAN).unwrap();
        }
        let results = zonal_statistics(&values, &labeling).unwrap();
        assert_eq!(results[1].count, 0);
        assert!(results[1].max.is_nan());
        assert!(results[1].mean.is_nan());
    }

    #[test]
    fn test_zonal_dimension_mismatch() {
        let (_, labeling) = two_blocks();
        let values: Raster<f64> = Raster::new(3, 3);
        assert!(zonal_statistics(&values, &labeling).is_err());
    }
}
