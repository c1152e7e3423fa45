//! Run-level counts

use serde::{Deserialize, Serialize};
use subcanopy_core::raster::Raster;

use crate::footprint::{Footprint, ValidationClass};
use crate::fusion::Confidence;

/// Pixel and footprint counts of one run
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub epochs: usize,
    pub masked_pixels: usize,
    pub high_pixels: usize,
    pub medium_pixels: usize,
    pub low_pixels: usize,
    pub cleaned_pixels: usize,
    pub footprint_count: usize,
    /// Total footprint area
    pub footprint_area: f64,
    pub known_footprints: usize,
    pub novel_footprints: usize,
}

impl DetectionSummary {
    pub(crate) fn collect(
        epochs: usize,
        masked_pixels: usize,
        confidence: &Raster<u8>,
        cleaned: &Raster<f64>,
        footprints: &[Footprint],
    ) -> Self {
        let mut summary = Self {
            epochs,
            masked_pixels,
            cleaned_pixels: cleaned.data().iter().filter(|v| !v.is_nan()).count(),
            footprint_count: footprints.len(),
            ..Self::default()
        };

        for &code in confidence.data() {
            match Confidence::from_code(code) {
                Confidence::High => summary.high_pixels += 1,
                Confidence::Medium => summary.medium_pixels += 1,
                Confidence::Low => summary.low_pixels += 1,
                Confidence::None => {}
            }
        }

        for f in footprints {
            summary.footprint_area += f.area_m2;
            match f.validation_class {
                ValidationClass::Known => summary.known_footprints += 1,
                ValidationClass::Novel => summary.novel_footprints += 1,
            }
        }
        summary
    }
}
