//! Cross-reference of detections against an external built-up layer
//!
//! Informational only: nothing here feeds back into the detections.

use serde::{Deserialize, Serialize};
use subcanopy_core::raster::Raster;

use crate::error::Result;

/// Pixel counts comparing the cleaned detections with the reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Reference-positive pixels inside the region mask
    pub reference_in_mask: usize,
    /// Detected pixels that are also reference-positive
    pub confirmed: usize,
    /// Detected pixels the reference does not know
    pub novel: usize,
    /// All detected (cleaned) pixels
    pub detected_pixels: usize,
}

impl ValidationSummary {
    /// Compare `cleaned` (defined = detected) with `reference` (> 0 = built-up)
    pub fn compute(mask: &Raster<u8>, cleaned: &Raster<f64>, reference: &Raster<f64>) -> Result<Self> {
        mask.ensure_same_grid(cleaned)?;
        mask.ensure_same_grid(reference)?;

        let mut summary = Self::default();
        for ((&m, &p), &r) in mask
            .data()
            .iter()
            .zip(cleaned.data().iter())
            .zip(reference.data().iter())
        {
            let built = r.is_finite() && r > 0.0;
            let detected = !p.is_nan();
            if m != 0 && built {
                summary.reference_in_mask += 1;
            }
            if detected {
                summary.detected_pixels += 1;
                if built {
                    summary.confirmed += 1;
                } else {
                    summary.novel += 1;
                }
            }
        }
        Ok(summary)
    }

    /// Share of reference pixels inside the mask that were detected
    pub fn recall(&self) -> Option<f64> {
        (self.reference_in_mask > 0).then(|| self.confirmed as f64 / self.reference_in_mask as f64)
    }

    /// Share of detected pixels the reference does not know
    pub fn novel_fraction(&self) -> Option<f64> {
        (self.detected_pixels > 0).then(|| self.novel as f64 / self.detected_pixels as f64)
    }
}
