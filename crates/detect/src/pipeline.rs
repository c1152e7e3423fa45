//! End-to-end detection run
//!
//! Stages run strictly forward: indicators and region mask, fusion and
//! confidence, cleanup, footprint extraction, validation. Every stage
//! reads the previous stage's rasters and allocates its own output.

use subcanopy_algorithms::segmentation::Labeling;
use subcanopy_core::raster::Raster;
use subcanopy_core::Algorithm;
use tracing::info;

use crate::cleanup::clean;
use crate::config::{DetectionConfig, FusionWeights};
use crate::error::{DetectError, Result};
use crate::footprint::{Footprint, FootprintExtractor};
use crate::fusion::{classify_confidence, fuse, Thresholds};
use crate::indicators::{Indicators, Windowing};
use crate::inputs::SceneInputs;
use crate::mask::RegionMask;
use crate::summary::DetectionSummary;
use crate::validation::ValidationSummary;

/// Everything one run produces
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub indicators: Indicators,
    pub mask: RegionMask,
    /// Slope layer the mask was built from
    pub slope: Raster<f64>,
    /// Fused score inside the mask, NaN (no-data) outside
    pub probability: Raster<f64>,
    /// Confidence codes 0..=3, no-data 0 outside the mask
    pub confidence: Raster<u8>,
    /// Candidate mask after opening
    pub opened: Raster<u8>,
    /// Probability where `opened` is set, NaN elsewhere
    pub cleaned: Raster<f64>,
    /// Connected regions of `opened`, before the area filter
    pub labeling: Labeling,
    /// Footprints passing the area filter, by label
    pub footprints: Vec<Footprint>,
    pub validation: ValidationSummary,
    pub summary: DetectionSummary,
    /// Weights the fusion used
    pub weights: FusionWeights,
    /// Configured weight sum, when it was outside tolerance of 1.0
    pub weight_sum_warning: Option<f64>,
}

/// Configured detector
#[derive(Debug, Clone, Default)]
pub struct Detector {
    config: DetectionConfig,
}

impl Detector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Run the pipeline on aligned inputs.
    ///
    /// Fails before any computation when the configuration is invalid or
    /// an input layer is off the radar grid.
    pub fn run(&self, inputs: &SceneInputs) -> Result<DetectionResult> {
        let config = &self.config;
        config.validate()?;
        inputs.validate()?;
        let resolved = config.resolve_weights()?;

        config
            .execution
            .mode
            .install(|| self.run_stages(inputs, resolved.weights))?
            .map(|mut result| {
                result.weight_sum_warning =
                    (!resolved.within_tolerance).then_some(resolved.configured_sum);
                result
            })
    }

    fn run_stages(&self, inputs: &SceneInputs, weights: FusionWeights) -> Result<DetectionResult> {
        let config = &self.config;
        let grid = inputs.grid()?;
        let (rows, cols) = grid.shape();
        info!(
            rows,
            cols,
            epochs = inputs.epochs(),
            mode = ?config.execution.mode,
            tile_size = ?config.execution.tile_size,
            "detection run started"
        );

        let indicators = Indicators::compute(inputs, config, Windowing::from_config(config))?;
        info!("indicators computed");

        let mask = RegionMask::build(inputs, config)?;
        let masked_pixels = mask.masked_pixels();
        info!(masked_pixels, "region mask built");

        let thresholds = Thresholds {
            medium: config.thresh_medium,
            high: config.thresh_high,
        };
        let probability = fuse(&indicators, &weights, &mask.mask)?;
        let confidence = classify_confidence(&probability, thresholds)?;
        info!("fusion and confidence classified");

        let cleanup = clean(&probability, config.thresh_medium)?;
        info!(
            candidates = crate::mask::count_set(&cleanup.candidates),
            retained = crate::mask::count_set(&cleanup.opened),
            "morphological cleanup"
        );

        let extractor = FootprintExtractor {
            thresholds,
            min_area: config.min_footprint_area,
        };
        let set = extractor.extract(&cleanup.opened, &probability, &inputs.reference)?;
        info!(
            regions = set.labeling.count(),
            footprints = set.footprints.len(),
            "footprints extracted"
        );

        let validation = ValidationSummary::compute(&mask.mask, &cleanup.cleaned, &inputs.reference)?;
        info!(
            reference_in_mask = validation.reference_in_mask,
            confirmed = validation.confirmed,
            novel = validation.novel,
            "validation cross-reference"
        );

        let summary = DetectionSummary::collect(
            inputs.epochs(),
            masked_pixels,
            &confidence,
            &cleanup.cleaned,
            &set.footprints,
        );
        info!(
            high = summary.high_pixels,
            medium = summary.medium_pixels,
            low = summary.low_pixels,
            footprints = summary.footprint_count,
            area = summary.footprint_area,
            known = summary.known_footprints,
            novel = summary.novel_footprints,
            "detection run finished"
        );

        Ok(DetectionResult {
            indicators,
            mask,
            slope: inputs.slope.clone(),
            probability,
            confidence,
            opened: cleanup.opened,
            cleaned: cleanup.cleaned,
            labeling: set.labeling,
            footprints: set.footprints,
            validation,
            summary,
            weights,
            weight_sum_warning: None,
        })
    }
}

/// [`Detector`] behind the workspace-wide [`Algorithm`] interface
#[derive(Debug, Clone, Default)]
pub struct SubcanopyDetection;

impl Algorithm for SubcanopyDetection {
    type Input = SceneInputs;
    type Output = DetectionResult;
    type Params = DetectionConfig;
    type Error = DetectError;

    fn name(&self) -> &'static str {
        "SubcanopyDetection"
    }

    fn description(&self) -> &'static str {
        "Radar/optical indicator fusion detecting structures beneath forest canopy"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        Detector::new(params).run(&input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::Confidence;
    use crate::inputs::OpticalComposite;

    fn layer(value: f64) -> Raster<f64> {
        Raster::filled(8, 8, value)
    }

    fn quiet_forest() -> SceneInputs {
        SceneInputs {
            vv_db: vec![layer(-8.0), layer(-9.0), layer(-8.0)],
            vh_db: vec![layer(-12.0), layer(-12.5), layer(-12.0)],
            optical: OpticalComposite {
                red: layer(0.05),
                green: layer(0.06),
                nir: layer(0.4),
                swir: layer(0.15),
            },
            slope: layer(2.0),
            reference: layer(0.0),
        }
    }

    #[test]
    fn test_quiet_forest_detects_nothing() {
        let result = Detector::default().run(&quiet_forest()).unwrap();
        assert_eq!(result.summary.masked_pixels, 64);
        assert!(result.footprints.is_empty());
        assert_eq!(result.summary.low_pixels, 64);
        assert_eq!(result.weight_sum_warning, None);
    }

    #[test]
    fn test_diagnose_cell() {
        let result = Detector::default().run(&quiet_forest()).unwrap();
        let d = result.diagnose_cell(3, 4).unwrap();
        assert!(d.mask.in_mask && d.mask.valid && d.mask.forest);
        assert!(d.fusion.is_some());
        assert_eq!(d.confidence, Confidence::Low);
        assert!(!d.cleaned);
        assert_eq!(d.region, None);
        assert!(result.diagnose_cell(8, 0).is_none());
    }

    #[test]
    fn test_algorithm_interface() {
        let algo = SubcanopyDetection;
        assert_eq!(algo.name(), "SubcanopyDetection");
        let result = algo.execute_default(quiet_forest()).unwrap();
        assert_eq!(result.summary.epochs, 3);
    }
}
