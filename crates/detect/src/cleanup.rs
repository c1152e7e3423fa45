//! Morphological cleanup of the candidate surface
//!
//! Candidates are the cells scoring at least `thresh_medium`. A 3×3
//! opening removes detections too thin to be a footprint.

use subcanopy_algorithms::morphology::{Opening, OpeningParams, StructuringElement};
use subcanopy_core::raster::Raster;
use subcanopy_core::Algorithm;

use crate::error::Result;

/// Opened candidate mask and the probability values it retains
#[derive(Debug, Clone)]
pub struct Cleanup {
    /// 0/1 candidates before opening
    pub candidates: Raster<u8>,
    /// 0/1 candidates after opening
    pub opened: Raster<u8>,
    /// Probability where `opened` is set, NaN elsewhere
    pub cleaned: Raster<f64>,
}

/// Threshold the probability raster at `thresh_medium` and open it with
/// the 8-connected 3×3 element.
pub fn clean(probability: &Raster<f64>, thresh_medium: f64) -> Result<Cleanup> {
    let data: Vec<u8> = probability
        .data()
        .iter()
        .map(|&p| u8::from(p.is_finite() && p >= thresh_medium))
        .collect();
    let candidates = probability.derive(data, None)?;

    let opened = Opening.execute(
        candidates.clone(),
        OpeningParams {
            element: StructuringElement::Square(1),
        },
    )?;

    let data: Vec<f64> = probability
        .data()
        .iter()
        .zip(opened.data().iter())
        .map(|(&p, &keep)| if keep != 0 { p } else { f64::NAN })
        .collect();
    let cleaned = probability.derive(data, Some(f64::NAN))?;

    Ok(Cleanup {
        candidates,
        opened,
        cleaned,
    })
}
