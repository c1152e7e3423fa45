//! Region mask: where fusion is evaluated
//!
//! A pixel is analysed when every input layer is valid there, the canopy
//! is dense (NDVI), the surface is not water (NDWI) and the terrain is
//! gentle (slope). All component layers are kept for diagnostics.

use rayon::prelude::*;
use subcanopy_algorithms::imagery::{ndvi, ndwi};
use subcanopy_algorithms::morphology::{Erode, ErodeParams, StructuringElement};
use subcanopy_core::raster::Raster;
use subcanopy_core::Algorithm;
use tracing::{debug, warn};

use crate::config::DetectionConfig;
use crate::error::Result;
use crate::inputs::SceneInputs;

/// Mask components as 0/1 rasters on the run grid
#[derive(Debug, Clone)]
pub struct RegionMask {
    /// NDVI of the optical composite
    pub ndvi: Raster<f64>,
    /// NDWI of the optical composite
    pub ndwi: Raster<f64>,
    /// Every input layer finite (after optional edge erosion)
    pub validity: Raster<u8>,
    pub forest: Raster<u8>,
    pub not_water: Raster<u8>,
    pub gentle_slope: Raster<u8>,
    /// Conjunction of the four layers above
    pub mask: Raster<u8>,
}

impl RegionMask {
    /// Build the mask for a scene.
    ///
    /// An empty mask is a valid outcome and only logged.
    pub fn build(inputs: &SceneInputs, config: &DetectionConfig) -> Result<Self> {
        let grid = inputs.grid()?;
        let ndvi = ndvi(&inputs.optical.nir, &inputs.optical.red)?;
        let ndwi = ndwi(&inputs.optical.green, &inputs.optical.nir)?;

        let mut validity = validity_mask(inputs)?;
        if config.edge_erosion_px > 0 {
            validity = Erode.execute(
                validity,
                ErodeParams {
                    element: StructuringElement::Square(1),
                    iterations: config.edge_erosion_px,
                },
            )?;
        }

        let forest_t = config.forest_ndvi_threshold;
        let water_t = config.water_ndwi_threshold;
        let slope_t = config.slope_threshold;

        let forest = threshold(&ndvi, |v| v >= forest_t)?;
        let not_water = threshold(&ndwi, |v| v < water_t)?;
        let gentle_slope = threshold(&inputs.slope, |v| v < slope_t)?;

        let data: Vec<u8> = validity
            .data()
            .iter()
            .zip(forest.data().iter())
            .zip(not_water.data().iter())
            .zip(gentle_slope.data().iter())
            .map(|(((&v, &f), &w), &s)| v & f & w & s)
            .collect();
        let mask = grid.derive(data, None)?;

        let masked = count_set(&mask);
        debug!(
            valid = count_set(&validity),
            forest = count_set(&forest),
            not_water = count_set(&not_water),
            gentle_slope = count_set(&gentle_slope),
            masked,
            "region mask"
        );
        if masked == 0 {
            warn!("region mask is empty; no pixel will be fused");
        }

        Ok(Self {
            ndvi,
            ndwi,
            validity,
            forest,
            not_water,
            gentle_slope,
            mask,
        })
    }

    /// Number of pixels inside the mask
    pub fn masked_pixels(&self) -> usize {
        count_set(&self.mask)
    }

    /// Whether (row, col) is inside the mask; false outside the grid
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.mask.value_at(row, col).is_some_and(|v| v != 0)
    }
}

/// 1 where every radar epoch, optical band and the slope are finite.
///
/// The reference layer is informational and does not take part.
fn validity_mask(inputs: &SceneInputs) -> Result<Raster<u8>> {
    let grid = inputs.grid()?;
    let layers: Vec<&Raster<f64>> = inputs
        .vv_db
        .iter()
        .chain(inputs.vh_db.iter())
        .chain([
            &inputs.optical.red,
            &inputs.optical.green,
            &inputs.optical.nir,
            &inputs.optical.swir,
            &inputs.slope,
        ])
        .collect();

    let (rows, cols) = grid.shape();
    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    let valid = layers.iter().all(|layer| {
                        let v = unsafe { layer.get_unchecked(row, col) };
                        v.is_finite() && !layer.is_nodata(v)
                    });
                    u8::from(valid)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    Ok(grid.derive(data, None)?)
}

/// 0/1 raster of a predicate over finite cells; NaN cells are 0.
fn threshold(raster: &Raster<f64>, pred: impl Fn(f64) -> bool) -> Result<Raster<u8>> {
    let data: Vec<u8> = raster
        .data()
        .iter()
        .map(|&v| u8::from(v.is_finite() && pred(v)))
        .collect();
    Ok(raster.derive(data, None)?)
}

pub(crate) fn count_set(mask: &Raster<u8>) -> usize {
    mask.data().iter().filter(|&&v| v != 0).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::OpticalComposite;

    fn layer(value: f64) -> Raster<f64> {
        Raster::filled(6, 6, value)
    }

    /// Dense canopy, dry, flat
    fn forest_scene() -> SceneInputs {
        SceneInputs {
            vv_db: vec![layer(-8.0), layer(-8.5)],
            vh_db: vec![layer(-15.0)],
            optical: OpticalComposite {
                red: layer(0.05),
                green: layer(0.06),
                nir: layer(0.4),
                swir: layer(0.15),
            },
            slope: layer(3.0),
            reference: layer(0.0),
        }
    }

    #[test]
    fn test_full_forest_mask() {
        let mask = RegionMask::build(&forest_scene(), &DetectionConfig::default()).unwrap();
        assert_eq!(mask.masked_pixels(), 36);
        assert!(mask.contains(0, 0));
        assert!(!mask.contains(6, 0));
    }

    #[test]
    fn test_conditions_exclude() {
        let mut scene = forest_scene();
        // Sparse vegetation
        scene.optical.red.set(0, 0, 0.3).unwrap();
        // Water: green above NIR
        scene.optical.green.set(1, 1, 0.9).unwrap();
        // Steep slope, and exactly at the threshold
        scene.slope.set(2, 2, 30.0).unwrap();
        scene.slope.set(2, 3, 15.0).unwrap();
        // Missing radar epoch
        scene.vh_db[0].set(3, 3, f64::NAN).unwrap();

        let mask = RegionMask::build(&scene, &DetectionConfig::default()).unwrap();
        assert_eq!(mask.forest.get(0, 0).unwrap(), 0);
        assert_eq!(mask.not_water.get(1, 1).unwrap(), 0);
        assert_eq!(mask.gentle_slope.get(2, 2).unwrap(), 0);
        assert_eq!(mask.gentle_slope.get(2, 3).unwrap(), 0);
        assert_eq!(mask.validity.get(3, 3).unwrap(), 0);
        assert_eq!(mask.masked_pixels(), 36 - 5);
    }

    #[test]
    fn test_missing_reference_does_not_invalidate() {
        let mut scene = forest_scene();
        scene.reference.set(4, 4, f64::NAN).unwrap();
        let mask = RegionMask::build(&scene, &DetectionConfig::default()).unwrap();
        assert!(mask.contains(4, 4));
    }

    #[test]
    fn test_no_forest_gives_empty_mask() {
        let mut scene = forest_scene();
        scene.optical.red = layer(0.35);
        let mask = RegionMask::build(&scene, &DetectionConfig::default()).unwrap();
        assert_eq!(mask.masked_pixels(), 0);
    }

    #[test]
    fn test_edge_erosion() {
        let config = DetectionConfig {
            edge_erosion_px: 1,
            ..Default::default()
        };
        let mask = RegionMask::build(&forest_scene(), &config).unwrap();
        // Grid edges count as invalid: only the 4x4 interior survives
        assert_eq!(mask.masked_pixels(), 16);
        assert!(!mask.contains(0, 3));
        assert!(mask.contains(1, 1));

        let config = DetectionConfig {
            edge_erosion_px: 2,
            ..Default::default()
        };
        let mask = RegionMask::build(&forest_scene(), &config).unwrap();
        assert_eq!(mask.masked_pixels(), 4);
    }
}
