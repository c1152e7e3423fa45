//! The five indicator scores
//!
//! Every indicator is a pure function of the input layers and returns a
//! raster of scores in [0, 1] on the input grid. Cells whose inputs are
//! missing carry NaN (the declared no-data value); well-formed inputs
//! never produce NaN or infinities.
//!
//! Windowed indicators (texture, anomaly, optical) can run tile by tile
//! through [`Windowing`]; the stitched result is identical to a
//! whole-grid evaluation.

mod anomaly;
mod optical;
mod polarimetric;
mod stability;
mod texture;

pub use anomaly::{anomaly_score, local_zscore, STD_FLOOR};
pub use optical::optical_score;
pub use polarimetric::double_bounce_score;
pub use stability::stability_score;
pub use texture::texture_score;

use subcanopy_core::raster::Raster;
use subcanopy_parallel::TiledProcessor;
use tracing::debug;

use crate::config::DetectionConfig;
use crate::error::Result;
use crate::inputs::SceneInputs;
use crate::radiometry::{temporal_median_db, temporal_moments, TemporalMoments};

/// Small positive value guarding divisions by a mean or range
pub(crate) const EPSILON: f64 = 1e-10;

/// How windowed operators are evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Windowing {
    tiler: Option<TiledProcessor>,
}

impl Windowing {
    /// Evaluate over the whole grid at once
    pub fn whole() -> Self {
        Self { tiler: None }
    }

    /// Evaluate on `tile_size` core tiles padded by `halo` cells
    pub fn tiled(tile_size: usize, halo: usize) -> Self {
        Self {
            tiler: Some(TiledProcessor::new(tile_size, halo)),
        }
    }

    /// Windowing implied by a configuration's execution settings
    pub fn from_config(config: &DetectionConfig) -> Self {
        match config.execution.tile_size {
            Some(tile_size) => Self::tiled(tile_size, config.halo()),
            None => Self::whole(),
        }
    }

    pub(crate) fn apply<F>(&self, input: &Raster<f64>, op: F) -> Result<Raster<f64>>
    where
        F: Fn(&Raster<f64>) -> subcanopy_core::Result<Raster<f64>> + Sync + Send,
    {
        let out = match &self.tiler {
            Some(tiler) => tiler.map_windowed(input, op)?,
            None => op(input)?,
        };
        Ok(out)
    }
}

/// Per-pixel temporal reductions of the radar stacks shared by the indicators
#[derive(Debug, Clone)]
pub struct RadarComposites {
    /// Co-polarized linear moments
    pub vv: TemporalMoments,
    /// Cross-polarized linear mean
    pub vh_mean: Raster<f64>,
    /// Co-polarized temporal median, in dB
    pub vv_median_db: Raster<f64>,
}

impl RadarComposites {
    /// Reduce the VV and VH stacks of a scene
    pub fn from_inputs(inputs: &SceneInputs) -> Result<Self> {
        let vv = temporal_moments(&inputs.vv_db, "vv_db")?;
        let vh_mean = temporal_moments(&inputs.vh_db, "vh_db")?.mean;
        let vv_median_db = temporal_median_db(&inputs.vv_db, "vv_db")?;
        Ok(Self {
            vv,
            vh_mean,
            vv_median_db,
        })
    }
}

/// The five indicator rasters of a run
#[derive(Debug, Clone)]
pub struct Indicators {
    pub stability: Raster<f64>,
    pub double_bounce: Raster<f64>,
    pub texture: Raster<f64>,
    pub anomaly: Raster<f64>,
    pub optical: Raster<f64>,
}

impl Indicators {
    /// Compute all five indicators
    pub fn compute(
        inputs: &SceneInputs,
        config: &DetectionConfig,
        windowing: Windowing,
    ) -> Result<Self> {
        let radar = RadarComposites::from_inputs(inputs)?;
        debug!(
            epochs = inputs.epochs(),
            texture_radius = config.texture_kernel_radius,
            anomaly_radius = config.anomaly_kernel_radius,
            tiled = windowing.tiler.is_some(),
            "computing indicators"
        );

        let stability = stability_score(&radar.vv, config.stability_floor)?;
        let double_bounce = double_bounce_score(
            &radar.vh_mean,
            &radar.vv.mean,
            config.pol_ratio_min,
            config.pol_ratio_max,
        )?;
        let texture = texture_score(
            &radar.vv_median_db,
            config.texture_kernel_radius,
            config.texture_distance,
            config.texture_levels(),
            windowing,
        )?;
        let anomaly = anomaly_score(
            &radar.vv_median_db,
            config.anomaly_kernel_radius,
            config.anomaly_sigma,
            windowing,
        )?;
        let optical = optical_score(
            &inputs.optical.swir,
            &inputs.optical.nir,
            config.anomaly_kernel_radius,
            windowing,
        )?;

        Ok(Self {
            stability,
            double_bounce,
            texture,
            anomaly,
            optical,
        })
    }

    /// Indicator rasters in fusion-weight order
    pub fn as_array(&self) -> [&Raster<f64>; 5] {
        [
            &self.stability,
            &self.double_bounce,
            &self.texture,
            &self.anomaly,
            &self.optical,
        ]
    }
}

/// Map every finite cell through `f` and clamp to [0, 1]; NaN stays NaN.
pub(crate) fn unit_score(raster: &Raster<f64>, f: impl Fn(f64) -> f64) -> Result<Raster<f64>> {
    let data: Vec<f64> = raster
        .data()
        .iter()
        .map(|&v| {
            if v.is_finite() {
                f(v).clamp(0.0, 1.0)
            } else {
                f64::NAN
            }
        })
        .collect();
    Ok(raster.derive(data, Some(f64::NAN))?)
}
