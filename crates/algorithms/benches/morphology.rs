//! Benchmarks for binary opening, labeling and region outlines

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use subcanopy_algorithms::morphology::{binary_opening, StructuringElement};
use subcanopy_algorithms::segmentation::{connected_components, Connectivity};
use subcanopy_algorithms::vector::outline_region;
use subcanopy_core::{GeoTransform, Raster};

fn create_test_mask(size: usize) -> Raster<u8> {
    let mut r = Raster::new(size, size);
    r.set_transform(GeoTransform::new(0.0, size as f64, 1.0, -1.0));
    // Blocks of varying size plus scattered speckle
    for row in 0..size {
        for col in 0..size {
            let block = (row / 6) % 3 == 0 && (col / 9) % 2 == 0;
            let speckle = (row * 7 + col * 13) % 31 == 0;
            r.set(row, col, u8::from(block || speckle)).unwrap();
        }
    }
    r
}

fn bench_opening(c: &mut Criterion) {
    let mut group = c.benchmark_group("morphology/binary_opening");
    let se = StructuringElement::Square(1);
    for size in [256, 512, 1024, 2048] {
        let mask = create_test_mask(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| binary_opening(black_box(&mask), &se).unwrap())
        });
    }
    group.finish();
}

fn bench_labeling(c: &mut Criterion) {
    let mut group = c.benchmark_group("segmentation/connected_components");
    for size in [256, 512, 1024, 2048] {
        let mask = create_test_mask(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| connected_components(black_box(&mask), Connectivity::Eight).unwrap())
        });
    }
    group.finish();
}

fn bench_outlines(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector/outline_region");
    for size in [256, 512, 1024] {
        let mask = create_test_mask(size);
        let labeling = connected_components(&mask, Connectivity::Eight).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                for region in &labeling.regions {
                    black_box(outline_region(&labeling.labels, region).unwrap());
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_opening, bench_labeling, bench_outlines);
criterion_main!(benches);
