//! Aligned input layers for one detection run

use subcanopy_core::raster::Raster;

use crate::error::{DetectError, Result};

/// Cloud-free optical composite, surface reflectance
#[derive(Debug, Clone)]
pub struct OpticalComposite {
    pub red: Raster<f64>,
    pub green: Raster<f64>,
    pub nir: Raster<f64>,
    /// Short-wave infrared (≈1.6 µm)
    pub swir: Raster<f64>,
}

/// Every layer a run consumes, already calibrated and on one grid.
///
/// The grid of `vv_db[0]` is the reference every other layer must match
/// exactly (shape, transform and CRS).
#[derive(Debug, Clone)]
pub struct SceneInputs {
    /// Co-polarized backscatter per epoch, in dB
    pub vv_db: Vec<Raster<f64>>,
    /// Cross-polarized backscatter per epoch, in dB
    pub vh_db: Vec<Raster<f64>>,
    pub optical: OpticalComposite,
    /// Terrain slope in degrees
    pub slope: Raster<f64>,
    /// Built-up fraction of an external reference product (> 0 = built)
    pub reference: Raster<f64>,
}

impl SceneInputs {
    /// Reference grid of the run
    pub fn grid(&self) -> Result<&Raster<f64>> {
        self.vv_db.first().ok_or(DetectError::EmptyStack("vv_db"))
    }

    /// Number of co-polarized epochs
    pub fn epochs(&self) -> usize {
        self.vv_db.len()
    }

    /// Fail fast unless both stacks are non-empty and every layer sits on
    /// the reference grid.
    pub fn validate(&self) -> Result<()> {
        let grid = self.grid()?;
        if self.vh_db.is_empty() {
            return Err(DetectError::EmptyStack("vh_db"));
        }

        for (i, layer) in self.vv_db.iter().enumerate().skip(1) {
            check(grid, layer, || format!("vv_db[{i}]"))?;
        }
        for (i, layer) in self.vh_db.iter().enumerate() {
            check(grid, layer, || format!("vh_db[{i}]"))?;
        }
        check(grid, &self.optical.red, || "optical.red".into())?;
        check(grid, &self.optical.green, || "optical.green".into())?;
        check(grid, &self.optical.nir, || "optical.nir".into())?;
        check(grid, &self.optical.swir, || "optical.swir".into())?;
        check(grid, &self.slope, || "slope".into())?;
        check(grid, &self.reference, || "reference".into())?;
        Ok(())
    }
}

fn check(grid: &Raster<f64>, layer: &Raster<f64>, name: impl FnOnce() -> String) -> Result<()> {
    grid.ensure_same_grid(layer).map_err(|source| DetectError::Misaligned {
        layer: name(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use subcanopy_core::{GeoTransform, CRS};

    fn layer(rows: usize, cols: usize) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, 0.1);
        r.set_transform(GeoTransform::new(500_000.0, 4_000_000.0, 10.0, -10.0));
        r.set_crs(Some(CRS::from_epsg(32618)));
        r
    }

    fn inputs() -> SceneInputs {
        SceneInputs {
            vv_db: vec![layer(4, 5), layer(4, 5)],
            vh_db: vec![layer(4, 5)],
            optical: OpticalComposite {
                red: layer(4, 5),
                green: layer(4, 5),
                nir: layer(4, 5),
                swir: layer(4, 5),
            },
            slope: layer(4, 5),
            reference: layer(4, 5),
        }
    }

    #[test]
    fn test_aligned_inputs_pass() {
        let scene = inputs();
        scene.validate().unwrap();
        assert_eq!(scene.epochs(), 2);
    }

    #[test]
    fn test_shape_mismatch_names_layer() {
        let mut scene = inputs();
        scene.vh_db.push(layer(4, 6));
        match scene.validate() {
            Err(DetectError::Misaligned { layer, .. }) => assert_eq!(layer, "vh_db[1]"),
            other => panic!("expected misalignment, got {other:?}"),
        }
    }

    #[test]
    fn test_transform_mismatch() {
        let mut scene = inputs();
        scene
            .optical
            .nir
            .set_transform(GeoTransform::new(500_005.0, 4_000_000.0, 10.0, -10.0));
        match scene.validate() {
            Err(DetectError::Misaligned { layer, .. }) => assert_eq!(layer, "optical.nir"),
            other => panic!("expected misalignment, got {other:?}"),
        }
    }

    #[test]
    fn test_crs_mismatch() {
        let mut scene = inputs();
        scene.slope.set_crs(Some(CRS::from_epsg(32619)));
        assert!(matches!(
            scene.validate(),
            Err(DetectError::Misaligned { ref layer, .. }) if layer == "slope"
        ));
    }

    #[test]
    fn test_empty_stacks() {
        let mut scene = inputs();
        scene.vh_db.clear();
        assert!(matches!(scene.validate(), Err(DetectError::EmptyStack("vh_db"))));
        scene.vv_db.clear();
        assert!(matches!(scene.validate(), Err(DetectError::EmptyStack("vv_db"))));
    }
}
