//! Benchmarks for the full detection pipeline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use subcanopy_core::{GeoTransform, Raster, CRS};
use subcanopy_detect::prelude::*;

fn layer(size: usize, f: impl Fn(usize, usize) -> f64) -> Raster<f64> {
    let mut r = Raster::new(size, size);
    r.set_transform(GeoTransform::new(500_000.0, 4_500_000.0, 10.0, -10.0));
    r.set_crs(Some(CRS::from_epsg(32618)));
    for row in 0..size {
        for col in 0..size {
            r.set(row, col, f(row, col)).unwrap();
        }
    }
    r
}

/// Forest with a regular lattice of 5×5 structures
fn create_scene(size: usize) -> SceneInputs {
    let building = |r: usize, c: usize| r % 40 >= 18 && r % 40 < 23 && c % 40 >= 18 && c % 40 < 23;
    let vv_db = (0..6)
        .map(|e| {
            let forest = if e % 2 == 0 { -11.2 } else { -16.0 };
            layer(size, |r, c| {
                let jitter = ((r * 7 + c * 13 + e * 5) % 11) as f64 * 0.05;
                if building(r, c) { -1.0 } else { forest + jitter }
            })
        })
        .collect();
    let vh_db = (0..6)
        .map(|_| layer(size, |r, c| if building(r, c) { -18.0 } else { -21.0 }))
        .collect();

    SceneInputs {
        vv_db,
        vh_db,
        optical: OpticalComposite {
            red: layer(size, |_, _| 0.05),
            green: layer(size, |_, _| 0.06),
            nir: layer(size, |_, _| 0.4),
            swir: layer(size, |r, c| if building(r, c) { 0.3 } else { 0.15 }),
        },
        slope: layer(size, |r, _| (r % 20) as f64),
        reference: layer(size, |r, c| if building(r, c) && c < size / 2 { 0.5 } else { 0.0 }),
    }
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/run");
    group.sample_size(10);

    for size in [128, 256, 512] {
        let scene = create_scene(size);
        let detector = Detector::default();
        group.bench_with_input(BenchmarkId::new("whole", size), &size, |b, _| {
            b.iter(|| detector.run(black_box(&scene)).unwrap())
        });

        let tiled = Detector::new(DetectionConfig {
            execution: ExecutionConfig {
                mode: ProcessingMode::Parallel,
                tile_size: Some(128),
            },
            ..Default::default()
        });
        group.bench_with_input(BenchmarkId::new("tiled_128", size), &size, |b, _| {
            b.iter(|| tiled.run(black_box(&scene)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
