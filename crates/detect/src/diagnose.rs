//! Point diagnostics
//!
//! Everything the pipeline knows about one pixel, for inspecting why a
//! location was or was not detected.

use serde::{Deserialize, Serialize};

use crate::fusion::Confidence;
use crate::pipeline::DetectionResult;

/// Indicator scores at a pixel; `None` where the indicator has no value
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorValues {
    pub stability: Option<f64>,
    pub double_bounce: Option<f64>,
    pub texture: Option<f64>,
    pub anomaly: Option<f64>,
    pub optical: Option<f64>,
}

/// Mask components at a pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MaskFlags {
    pub valid: bool,
    pub forest: bool,
    pub not_water: bool,
    pub gentle_slope: bool,
    pub in_mask: bool,
}

/// Diagnostic record for one pixel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelDiagnostics {
    pub row: usize,
    pub col: usize,
    /// Pixel centre, grid coordinates
    pub x: f64,
    pub y: f64,
    pub indicators: IndicatorValues,
    pub ndvi: Option<f64>,
    pub ndwi: Option<f64>,
    pub slope: Option<f64>,
    pub mask: MaskFlags,
    /// Fused probability; `None` outside the mask
    pub fusion: Option<f64>,
    pub confidence: Confidence,
    /// Survived the morphological cleanup
    pub cleaned: bool,
    /// Label of the connected region the pixel belongs to, if any
    pub region: Option<u32>,
}

impl DetectionResult {
    /// Diagnose the pixel containing grid coordinate (`x`, `y`).
    ///
    /// Returns `None` outside the grid.
    pub fn diagnose(&self, x: f64, y: f64) -> Option<PixelDiagnostics> {
        let (row, col) = self.probability.cell_at(x, y)?;
        self.diagnose_cell(row, col)
    }

    /// Diagnose pixel (`row`, `col`); `None` outside the grid.
    pub fn diagnose_cell(&self, row: usize, col: usize) -> Option<PixelDiagnostics> {
        let fusion = finite(self.probability.get(row, col).ok()?);
        let (x, y) = self.probability.pixel_to_geo(col, row);
        let flag = |v: Option<u8>| v.is_some_and(|v| v != 0);

        Some(PixelDiagnostics {
            row,
            col,
            x,
            y,
            indicators: IndicatorValues {
                stability: self.indicators.stability.value_at(row, col).and_then(finite),
                double_bounce: self.indicators.double_bounce.value_at(row, col).and_then(finite),
                texture: self.indicators.texture.value_at(row, col).and_then(finite),
                anomaly: self.indicators.anomaly.value_at(row, col).and_then(finite),
                optical: self.indicators.optical.value_at(row, col).and_then(finite),
            },
            ndvi: self.mask.ndvi.value_at(row, col).and_then(finite),
            ndwi: self.mask.ndwi.value_at(row, col).and_then(finite),
            slope: self.slope.value_at(row, col).and_then(finite),
            mask: MaskFlags {
                valid: flag(self.mask.validity.value_at(row, col)),
                forest: flag(self.mask.forest.value_at(row, col)),
                not_water: flag(self.mask.not_water.value_at(row, col)),
                gentle_slope: flag(self.mask.gentle_slope.value_at(row, col)),
                in_mask: self.mask.contains(row, col),
            },
            fusion,
            confidence: Confidence::from_code(self.confidence.get(row, col).ok()?),
            cleaned: self.cleaned.get(row, col).is_ok_and(|v| !v.is_nan()),
            region: self.labeling.labels.get(row, col).ok().filter(|&l| l != 0),
        })
    }
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}
