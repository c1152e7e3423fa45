//! Focal (moving window) statistics
//!
//! Computes statistics within a moving window centered on each cell.
//! Supports: Mean, StdDev and the local z-score of the center cell.

use crate::maybe_rayon::*;
use subcanopy_core::raster::{Neighborhood, Raster};
use subcanopy_core::{Error, Result};

/// Available focal statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocalStatistic {
    /// Arithmetic mean
    Mean,
    /// Standard deviation (population)
    StdDev,
    /// `(center - mean) / max(stddev, std_floor)` of the window
    ZScore {
        /// Lower bound applied to the window standard deviation
        std_floor: f64,
    },
}

/// Parameters for focal statistics
#[derive(Debug, Clone)]
pub struct FocalParams {
    /// Window radius (actual window size = 2*radius + 1)
    pub radius: usize,
    /// Statistic to compute
    pub statistic: FocalStatistic,
    /// Whether to use circular window (default: false = square)
    pub circular: bool,
}

impl Default for FocalParams {
    fn default() -> Self {
        Self {
            radius: 1,
            statistic: FocalStatistic::Mean,
            circular: false,
        }
    }
}

/// Compute focal statistics on a raster
///
/// Applies a moving window of the specified radius and computes the
/// requested statistic over all valid (non-NaN) cells within the window.
/// Cells outside the raster are ignored, so windows shrink at the edges.
///
/// Mean and StdDev are produced wherever the window holds at least one
/// valid cell. ZScore needs a valid center cell and is NaN otherwise.
/// The output at a cell depends only on input cells within `radius` of it,
/// which makes the operator safe to evaluate on halo-padded tiles.
pub fn focal_statistics(raster: &Raster<f64>, params: FocalParams) -> Result<Raster<f64>> {
    if params.radius == 0 {
        return Err(Error::Algorithm("Focal radius must be > 0".into()));
    }
    if let FocalStatistic::ZScore { std_floor } = params.statistic
        && !(std_floor > 0.0)
    {
        return Err(Error::InvalidParameter {
            name: "std_floor",
            value: std_floor.to_string(),
            reason: "must be positive".into(),
        });
    }

    let (rows, cols) = raster.shape();
    let window = if params.circular {
        Neighborhood::Circle(params.radius)
    } else {
        Neighborhood::Square(params.radius)
    };
    let offsets = window.offsets();

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            let mut values: Vec<f64> = Vec::with_capacity(offsets.len());

            for (col, out) in row_data.iter_mut().enumerate() {
                let center = unsafe { raster.get_unchecked(row, col) };
                if matches!(params.statistic, FocalStatistic::ZScore { .. })
                    && (center.is_nan() || raster.is_nodata(center))
                {
                    continue;
                }

                values.clear();
                for &(dr, dc) in &offsets {
                    let nr = row as isize + dr;
                    let nc = col as isize + dc;

                    if nr >= 0 && nc >= 0 && (nr as usize) < rows && (nc as usize) < cols {
                        let v = unsafe { raster.get_unchecked(nr as usize, nc as usize) };
                        if !v.is_nan() && !raster.is_nodata(v) {
                            values.push(v);
                        }
                    }
                }

                if values.is_empty() {
                    continue;
                }

                *out = compute_statistic(&values, center, params.statistic);
            }

            row_data
        })
        .collect();

    raster.derive(output_data, Some(f64::NAN))
}

fn compute_statistic(values: &[f64], center: f64, stat: FocalStatistic) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;

    match stat {
        FocalStatistic::Mean => mean,
        FocalStatistic::StdDev => population_std(values, mean),
        FocalStatistic::ZScore { std_floor } => {
            (center - mean) / population_std(values, mean).max(std_floor)
        }
    }
}

fn population_std(values: &[f64], mean: f64) -> f64 {
    let n = values.len() as f64;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    var.sqrt()
}
