//! Synthetic scenes shared by the integration tests

#![allow(dead_code)]

use subcanopy_core::{GeoTransform, Raster, CRS};
use subcanopy_detect::{OpticalComposite, SceneInputs};

pub const SIZE: usize = 40;
pub const PIXEL: f64 = 10.0;
/// Rows and columns of the 5×5 structure patch
pub const PATCH: std::ops::Range<usize> = 18..23;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn in_patch(row: usize, col: usize) -> bool {
    PATCH.contains(&row) && PATCH.contains(&col)
}

pub fn transform() -> GeoTransform {
    GeoTransform::new(500_000.0, 4_500_000.0, PIXEL, -PIXEL)
}

/// Raster on the scene grid (UTM 18N, 10 m)
pub fn layer(f: impl Fn(usize, usize) -> f64) -> Raster<f64> {
    let mut r = Raster::new(SIZE, SIZE);
    r.set_transform(transform());
    r.set_crs(Some(CRS::from_epsg(32618)));
    for row in 0..SIZE {
        for col in 0..SIZE {
            r.set(row, col, f(row, col)).unwrap();
        }
    }
    r
}

pub fn db(linear: f64) -> f64 {
    10.0 * linear.log10()
}

/// Forest with one building-like patch in the centre.
///
/// The patch returns a constant, strong co-polarized signal with a low
/// cross/co ratio and a bright SWIR response. The forest alternates
/// between two backscatter levels from epoch to epoch (CoV 0.5) with a
/// mid-range cross/co ratio of 0.16.
pub fn scenario_a() -> SceneInputs {
    let epochs = 4;
    let vv_db = (0..epochs)
        .map(|e| {
            let forest = if e % 2 == 0 { 0.075 } else { 0.025 };
            layer(|r, c| if in_patch(r, c) { db(0.8) } else { db(forest) })
        })
        .collect();
    let vh_db = (0..epochs)
        .map(|_| layer(|r, c| if in_patch(r, c) { db(0.8 * 0.02) } else { db(0.008) }))
        .collect();

    SceneInputs {
        vv_db,
        vh_db,
        optical: OpticalComposite {
            red: layer(|_, _| 0.05),
            green: layer(|_, _| 0.06),
            nir: layer(|_, _| 0.4),
            swir: layer(|r, c| if in_patch(r, c) { 0.3 } else { 0.15 }),
        },
        slope: layer(|_, _| 0.0),
        reference: layer(|_, _| 0.0),
    }
}

/// Same scene re-expressed on a WGS84 grid of ~11 m pixels near the equator
pub fn scenario_a_geographic() -> SceneInputs {
    let mut scene = scenario_a();
    let gt = GeoTransform::new(-60.0, -2.0, 0.0001, -0.0001);
    let wgs84 = Some(CRS::wgs84());
    for r in scene
        .vv_db
        .iter_mut()
        .chain(scene.vh_db.iter_mut())
        .chain([
            &mut scene.optical.red,
            &mut scene.optical.green,
            &mut scene.optical.nir,
            &mut scene.optical.swir,
            &mut scene.slope,
            &mut scene.reference,
        ])
    {
        r.set_transform(gt);
        r.set_crs(wgs84.clone());
    }
    scene
}

pub fn bits(r: &Raster<f64>) -> Vec<u64> {
    r.data().iter().map(|v| v.to_bits()).collect()
}
