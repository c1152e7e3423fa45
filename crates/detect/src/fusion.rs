//! Weighted fusion of the indicators and confidence classification

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use subcanopy_core::raster::Raster;

use crate::config::FusionWeights;
use crate::error::Result;
use crate::indicators::Indicators;

/// Ordinal confidence bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    /// Outside the region mask
    None = 0,
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Confidence {
    /// Raster code of the bucket
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Bucket for a raster code; unknown codes map to `None`
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Confidence::Low,
            2 => Confidence::Medium,
            3 => Confidence::High,
            _ => Confidence::None,
        }
    }
}

/// The two ascending confidence thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub medium: f64,
    pub high: f64,
}

impl Thresholds {
    /// Bucket of a defined score: High at or above `high`, Medium at or
    /// above `medium`, Low below.
    pub fn classify(&self, score: f64) -> Confidence {
        if score >= self.high {
            Confidence::High
        } else if score >= self.medium {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// Weighted sum of the indicators inside the mask.
///
/// Cells outside the mask are NaN (the declared no-data value). Inside
/// the mask an indicator without a value contributes 0.
pub fn fuse(indicators: &Indicators, weights: &FusionWeights, mask: &Raster<u8>) -> Result<Raster<f64>> {
    let layers = indicators.as_array();
    for layer in layers {
        mask.ensure_same_grid(layer)?;
    }
    let w = weights.as_array();
    let (rows, cols) = mask.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                if unsafe { mask.get_unchecked(row, col) } == 0 {
                    continue;
                }
                let mut sum = 0.0;
                for (layer, weight) in layers.iter().zip(w) {
                    let v = unsafe { layer.get_unchecked(row, col) };
                    if v.is_finite() {
                        sum += weight * v;
                    }
                }
                *out = sum;
            }
            row_data
        })
        .collect();

    Ok(mask.derive(data, Some(f64::NAN))?)
}

/// Confidence codes of a probability raster.
///
/// Undefined cells are [`Confidence::None`]; the output declares code 0
/// as its no-data value.
pub fn classify_confidence(probability: &Raster<f64>, thresholds: Thresholds) -> Result<Raster<u8>> {
    let data: Vec<u8> = probability
        .data()
        .iter()
        .map(|&p| {
            if p.is_nan() {
                Confidence::None.code()
            } else {
                thresholds.classify(p).code()
            }
        })
        .collect();
    Ok(probability.derive(data, Some(Confidence::None.code()))?)
}
