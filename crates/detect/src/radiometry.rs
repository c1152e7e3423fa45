//! Decibel/linear conversions and per-pixel temporal reductions
//!
//! Radar backscatter is delivered in decibels. Means and variances are
//! only taken in linear power; the median is order-preserving and can be
//! taken directly in dB.

use rayon::prelude::*;
use subcanopy_core::raster::Raster;

use crate::error::{DetectError, Result};

/// Smallest linear power accepted by [`linear_to_db`] (−100 dB)
pub const LINEAR_FLOOR: f64 = 1e-10;

/// `10^(dB/10)`
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

/// `10·log10(linear)`, with the power floored at [`LINEAR_FLOOR`]
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    10.0 * linear.max(LINEAR_FLOOR).log10()
}

/// Per-pixel temporal moments of a stack, in linear power
#[derive(Debug, Clone)]
pub struct TemporalMoments {
    /// Mean linear power (NaN where no epoch is valid)
    pub mean: Raster<f64>,
    /// Population standard deviation of linear power (NaN where no epoch is valid)
    pub std_dev: Raster<f64>,
    /// Number of valid epochs per pixel
    pub count: Raster<u32>,
}

/// Compute the linear-power mean and standard deviation of a dB stack.
///
/// NaN and no-data samples are skipped per pixel. All layers must share
/// the first layer's grid; callers validate alignment beforehand.
pub fn temporal_moments(stack: &[Raster<f64>], name: &'static str) -> Result<TemporalMoments> {
    let first = stack.first().ok_or(DetectError::EmptyStack(name))?;
    let (rows, cols) = first.shape();

    let per_cell: Vec<(f64, f64, u32)> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut samples = Vec::with_capacity(stack.len());
            let mut row_data = Vec::with_capacity(cols);
            for col in 0..cols {
                samples.clear();
                samples.extend(
                    stack
                        .iter()
                        .map(|layer| (layer, unsafe { layer.get_unchecked(row, col) }))
                        .filter(|(layer, db)| db.is_finite() && !layer.is_nodata(*db))
                        .map(|(_, db)| db_to_linear(db)),
                );
                if samples.is_empty() {
                    row_data.push((f64::NAN, f64::NAN, 0));
                    continue;
                }
                // Two passes: sum of squared deviations around the mean
                let n = samples.len() as f64;
                let mean = samples.iter().sum::<f64>() / n;
                let variance = samples.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
                row_data.push((mean, variance.sqrt(), samples.len() as u32));
            }
            row_data
        })
        .collect();

    let mean = first.derive(per_cell.iter().map(|c| c.0).collect(), Some(f64::NAN))?;
    let std_dev = first.derive(per_cell.iter().map(|c| c.1).collect(), Some(f64::NAN))?;
    let count = first.derive(per_cell.iter().map(|c| c.2).collect(), None)?;

    Ok(TemporalMoments { mean, std_dev, count })
}

/// Per-pixel temporal median of a dB stack, in dB.
///
/// Even-length series average the two middle samples. Pixels without a
/// valid sample are NaN.
pub fn temporal_median_db(stack: &[Raster<f64>], name: &'static str) -> Result<Raster<f64>> {
    let first = stack.first().ok_or(DetectError::EmptyStack(name))?;
    let (rows, cols) = first.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut samples = Vec::with_capacity(stack.len());
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                samples.clear();
                samples.extend(
                    stack
                        .iter()
                        .map(|layer| (layer, unsafe { layer.get_unchecked(row, col) }))
                        .filter(|(layer, v)| v.is_finite() && !layer.is_nodata(*v))
                        .map(|(_, v)| v),
                );
                if samples.is_empty() {
                    continue;
                }
                samples.sort_by(f64::total_cmp);
                let mid = samples.len() / 2;
                *out = if samples.len() % 2 == 0 {
                    (samples[mid - 1] + samples[mid]) / 2.0
                } else {
                    samples[mid]
                };
            }
            row_data
        })
        .collect();

    Ok(first.derive(data, Some(f64::NAN))?)
}
