//! Detection configuration
//!
//! All options have defaults; a JSON document only needs the keys it
//! overrides:
//!
//! ```json
//! { "thresh_high": 0.7, "execution": { "mode": "sequential", "tile_size": 256 } }
//! ```

use serde::{Deserialize, Serialize};
use subcanopy_parallel::ProcessingMode;
use tracing::warn;

use crate::error::{DetectError, Result};

/// Allowed deviation of the fusion weight sum from 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.001;

/// What to do when the fusion weights do not sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightPolicy {
    /// Log a warning and fuse with the weights as given. The probability
    /// surface may then leave [0, 1].
    #[default]
    Warn,
    /// Log a warning and divide every weight by the sum.
    Normalize,
    /// Refuse the configuration.
    Reject,
}

/// How the pipeline is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Thread pool selection
    pub mode: ProcessingMode,
    /// Core tile edge in pixels for windowed operators; `None` processes
    /// the whole grid at once
    pub tile_size: Option<usize>,
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum NDVI for a pixel to count as forest canopy
    pub forest_ndvi_threshold: f64,
    /// Pixels with NDWI at or above this are treated as water
    pub water_ndwi_threshold: f64,
    /// Stability (1 - CoV) mapped to a score of 0
    pub stability_floor: f64,
    /// GLCM window radius in pixels
    pub texture_kernel_radius: usize,
    /// Circular neighborhood radius for the local z-scores, in pixels
    pub anomaly_kernel_radius: usize,
    /// z-score at which the backscatter anomaly starts to score
    pub anomaly_sigma: f64,
    pub weight_stability: f64,
    pub weight_double_bounce: f64,
    pub weight_texture: f64,
    pub weight_anomaly: f64,
    pub weight_optical: f64,
    pub thresh_high: f64,
    pub thresh_medium: f64,
    /// Terrain steeper than this (degrees) is excluded
    pub slope_threshold: f64,
    /// Cross/co ratio that scores 1 on the double-bounce indicator
    pub pol_ratio_min: f64,
    /// Cross/co ratio that scores 0 on the double-bounce indicator
    pub pol_ratio_max: f64,
    /// Smallest footprint kept, in square units of the grid (m² for
    /// projected and geographic grids)
    pub min_footprint_area: f64,
    /// Gray-level bit depth for texture quantization
    pub texture_levels_bits: u32,
    /// Co-occurrence pixel offset
    pub texture_distance: usize,
    /// Erosions applied to the validity mask (0 disables)
    pub edge_erosion_px: usize,
    pub weight_policy: WeightPolicy,
    pub execution: ExecutionConfig,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            forest_ndvi_threshold: 0.55,
            water_ndwi_threshold: 0.15,
            stability_floor: 0.70,
            texture_kernel_radius: 3,
            anomaly_kernel_radius: 15,
            anomaly_sigma: 1.5,
            weight_stability: 0.30,
            weight_double_bounce: 0.25,
            weight_texture: 0.20,
            weight_anomaly: 0.15,
            weight_optical: 0.10,
            thresh_high: 0.65,
            thresh_medium: 0.45,
            slope_threshold: 15.0,
            pol_ratio_min: 0.02,
            pol_ratio_max: 0.30,
            min_footprint_area: 80.0,
            texture_levels_bits: 5,
            texture_distance: 1,
            edge_erosion_px: 0,
            weight_policy: WeightPolicy::Warn,
            execution: ExecutionConfig::default(),
        }
    }
}

/// The five fusion coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub stability: f64,
    pub double_bounce: f64,
    pub texture: f64,
    pub anomaly: f64,
    pub optical: f64,
}

impl FusionWeights {
    /// Sum of all five weights
    pub fn sum(&self) -> f64 {
        self.stability + self.double_bounce + self.texture + self.anomaly + self.optical
    }

    /// Weights in indicator order: stability, double bounce, texture, anomaly, optical
    pub fn as_array(&self) -> [f64; 5] {
        [self.stability, self.double_bounce, self.texture, self.anomaly, self.optical]
    }

    fn scaled(&self, factor: f64) -> Self {
        Self {
            stability: self.stability * factor,
            double_bounce: self.double_bounce * factor,
            texture: self.texture * factor,
            anomaly: self.anomaly * factor,
            optical: self.optical * factor,
        }
    }
}

/// Weights after the weight policy has been applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedWeights {
    /// Weights the fusion will use
    pub weights: FusionWeights,
    /// Sum of the weights as configured
    pub configured_sum: f64,
    /// Whether the configured sum was within tolerance of 1.0
    pub within_tolerance: bool,
}

impl DetectionConfig {
    /// Parse a JSON document, filling unspecified keys with defaults, and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Configured fusion weights
    pub fn weights(&self) -> FusionWeights {
        FusionWeights {
            stability: self.weight_stability,
            double_bounce: self.weight_double_bounce,
            texture: self.weight_texture,
            anomaly: self.weight_anomaly,
            optical: self.weight_optical,
        }
    }

    /// Number of gray levels used for texture quantization
    pub fn texture_levels(&self) -> usize {
        1usize << self.texture_levels_bits
    }

    /// Halo (in pixels) that tiled windowed operators need
    pub fn halo(&self) -> usize {
        (self.texture_kernel_radius + self.texture_distance).max(self.anomaly_kernel_radius)
    }

    /// Reject structurally invalid values.
    ///
    /// Under [`WeightPolicy::Reject`] a weight sum outside tolerance is
    /// also an error; the other policies accept it here and report it from
    /// [`DetectionConfig::resolve_weights`].
    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("forest_ndvi_threshold", self.forest_ndvi_threshold),
            ("water_ndwi_threshold", self.water_ndwi_threshold),
            ("stability_floor", self.stability_floor),
            ("anomaly_sigma", self.anomaly_sigma),
            ("thresh_high", self.thresh_high),
            ("thresh_medium", self.thresh_medium),
            ("slope_threshold", self.slope_threshold),
            ("pol_ratio_min", self.pol_ratio_min),
            ("pol_ratio_max", self.pol_ratio_max),
            ("min_footprint_area", self.min_footprint_area),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(invalid(format!("{name} must be finite, got {value}")));
            }
        }

        for (name, value) in [
            ("weight_stability", self.weight_stability),
            ("weight_double_bounce", self.weight_double_bounce),
            ("weight_texture", self.weight_texture),
            ("weight_anomaly", self.weight_anomaly),
            ("weight_optical", self.weight_optical),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{name} must be a non-negative number, got {value}")));
            }
        }

        if self.thresh_medium > self.thresh_high {
            return Err(invalid(format!(
                "thresh_medium ({}) must not exceed thresh_high ({})",
                self.thresh_medium, self.thresh_high
            )));
        }
        if self.pol_ratio_max <= self.pol_ratio_min {
            return Err(invalid(format!(
                "pol_ratio_max ({}) must exceed pol_ratio_min ({})",
                self.pol_ratio_max, self.pol_ratio_min
            )));
        }
        if self.stability_floor >= 1.0 {
            return Err(invalid(format!(
                "stability_floor must be below 1, got {}",
                self.stability_floor
            )));
        }
        if self.anomaly_sigma <= 0.0 {
            return Err(invalid(format!(
                "anomaly_sigma must be positive, got {}",
                self.anomaly_sigma
            )));
        }
        if self.texture_kernel_radius == 0 || self.anomaly_kernel_radius == 0 {
            return Err(invalid("kernel radii must be at least 1 pixel".into()));
        }
        if self.texture_distance == 0 {
            return Err(invalid("texture_distance must be at least 1 pixel".into()));
        }
        if !(1..=8).contains(&self.texture_levels_bits) {
            return Err(invalid(format!(
                "texture_levels_bits must be within 1..=8, got {}",
                self.texture_levels_bits
            )));
        }
        if self.execution.tile_size == Some(0) {
            return Err(invalid("execution.tile_size must be at least 1 pixel".into()));
        }
        if let ProcessingMode::ParallelWith(0) = self.execution.mode {
            return Err(invalid("execution.mode parallel_with needs at least 1 thread".into()));
        }

        if self.weight_policy == WeightPolicy::Reject {
            let sum = self.weights().sum();
            if !within_tolerance(sum) {
                return Err(DetectError::WeightSum {
                    sum,
                    tolerance: WEIGHT_SUM_TOLERANCE,
                });
            }
        }

        Ok(())
    }

    /// Check the weight sum against 1.0 and apply the weight policy.
    ///
    /// A sum outside tolerance is logged as a warning under `Warn` and
    /// `Normalize`, and is an error under `Reject`.
    pub fn resolve_weights(&self) -> Result<ResolvedWeights> {
        let configured = self.weights();
        let sum = configured.sum();
        let ok = within_tolerance(sum);

        let weights = match (ok, self.weight_policy) {
            (true, _) => configured,
            (false, WeightPolicy::Warn) => {
                warn!(
                    sum,
                    tolerance = WEIGHT_SUM_TOLERANCE,
                    "fusion weights do not sum to 1.0; proceeding with weights as given"
                );
                configured
            }
            (false, WeightPolicy::Normalize) => {
                if sum <= 0.0 {
                    return Err(invalid("fusion weights sum to zero; cannot normalize".into()));
                }
                warn!(
                    sum,
                    tolerance = WEIGHT_SUM_TOLERANCE,
                    "fusion weights do not sum to 1.0; normalizing"
                );
                configured.scaled(1.0 / sum)
            }
            (false, WeightPolicy::Reject) => {
                return Err(DetectError::WeightSum {
                    sum,
                    tolerance: WEIGHT_SUM_TOLERANCE,
                });
            }
        };

        Ok(ResolvedWeights {
            weights,
            configured_sum: sum,
            within_tolerance: ok,
        })
    }
}

fn within_tolerance(sum: f64) -> bool {
    (sum - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
}

fn invalid(reason: String) -> DetectError {
    DetectError::InvalidConfig(reason)
}
