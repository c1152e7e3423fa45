//! Reference scenarios for the detection pipeline

mod common;

use approx::assert_relative_eq;
use common::{in_patch, init_tracing, layer, scenario_a, SIZE};
use subcanopy_algorithms::segmentation::{connected_components, Connectivity};
use subcanopy_core::Raster;
use subcanopy_detect::footprint::FootprintExtractor;
use subcanopy_detect::fusion::Thresholds;
use subcanopy_detect::prelude::*;

#[test]
fn scenario_a_single_structure() {
    init_tracing();
    let config = DetectionConfig::default();
    let result = Detector::new(config.clone()).run(&scenario_a()).unwrap();

    assert_eq!(result.summary.masked_pixels, SIZE * SIZE);
    for row in 0..SIZE {
        for col in 0..SIZE {
            let p = result.probability.get(row, col).unwrap();
            if in_patch(row, col) {
                assert!(p >= config.thresh_high, "patch ({row}, {col}) = {p}");
                assert!(p >= 0.8, "patch ({row}, {col}) = {p}");
            } else {
                assert!(p < config.thresh_medium, "forest ({row}, {col}) = {p}");
                assert!(p <= 0.33, "forest ({row}, {col}) = {p}");
            }
        }
    }

    assert_eq!(result.footprints.len(), 1);
    let f = &result.footprints[0];
    assert_eq!(f.pixel_count, 25);
    assert_relative_eq!(f.area_m2, 2500.0, epsilon = 1.0);
    assert_relative_eq!(f.perimeter, 200.0);
    assert_eq!(f.confidence, Confidence::High);
    assert_eq!(f.validation_class, ValidationClass::Novel);
    assert!(f.prob_max >= f.prob_mean);
    // Centre of cell (20, 20)
    assert_relative_eq!(f.centroid.x, 500_205.0);
    assert_relative_eq!(f.centroid.y, 4_499_795.0);
    assert!(f.centroid_lon.is_some() && f.centroid_lat.is_some());

    assert_eq!(result.validation.detected_pixels, 25);
    assert_eq!(result.validation.novel, 25);
    assert_eq!(result.validation.confirmed, 0);
    assert_eq!(result.validation.recall(), None);
    assert_eq!(result.summary.high_pixels, 25);
    assert_eq!(result.summary.cleaned_pixels, 25);
    assert_eq!(result.weight_sum_warning, None);
}

#[test]
fn scenario_a_known_structure() {
    let mut scene = scenario_a();
    scene.reference = layer(|r, c| if r == 20 && c == 21 { 0.6 } else { 0.0 });
    let result = Detector::default().run(&scene).unwrap();
    assert_eq!(result.footprints[0].validation_class, ValidationClass::Known);
    assert_eq!(result.validation.reference_in_mask, 1);
    assert_eq!(result.validation.confirmed, 1);
    assert_relative_eq!(result.validation.recall().unwrap(), 1.0);
    assert_eq!(result.summary.known_footprints, 1);
}

#[test]
fn scenario_b_weights_below_one_still_run() {
    init_tracing();
    let config = DetectionConfig {
        weight_stability: 0.10,
        ..Default::default()
    };
    let result = Detector::new(config).run(&scenario_a()).unwrap();

    let sum = result.weight_sum_warning.expect("weight sum warning");
    assert_relative_eq!(sum, 0.8, epsilon = 1e-12);
    assert_relative_eq!(result.weights.stability, 0.10);

    let max = result
        .probability
        .data()
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f64::MIN, f64::max);
    assert!(max <= 0.8 + 1e-12, "max {max}");
    assert!(max > 0.0);
}

#[test]
fn scenario_c_no_forest() {
    let mut scene = scenario_a();
    // NDVI = (0.4 - 0.35) / 0.75 everywhere
    scene.optical.red = layer(|_, _| 0.35);
    let result = Detector::default().run(&scene).unwrap();

    assert_eq!(result.summary.masked_pixels, 0);
    assert!(result.footprints.is_empty());
    assert!(result.probability.data().iter().all(|v| v.is_nan()));
    assert!(result.confidence.data().iter().all(|&c| c == 0));
    assert_eq!(result.validation, ValidationSummary::default());
}

/// Starts from an already-opened candidate mask. One-pixel-wide lines
/// cannot survive the 3×3 opening of a full run, so the corner-touching
/// clusters are handed straight to footprint extraction.
#[test]
fn scenario_d_diagonal_clusters_merge() {
    // Two one-pixel-wide lines meeting only at a corner
    let mut opened: Raster<u8> = layer(|_, _| 0.0).derive(vec![0u8; SIZE * SIZE], None).unwrap();
    let mut probability = layer(|_, _| 0.1);
    for c in 2..8 {
        opened.set(5, c, 1).unwrap();
        probability.set(5, c, 0.9).unwrap();
    }
    for c in 8..14 {
        opened.set(6, c, 1).unwrap();
        probability.set(6, c, 0.9).unwrap();
    }
    let reference = layer(|_, _| 0.0);

    let extractor = FootprintExtractor {
        thresholds: Thresholds {
            medium: 0.45,
            high: 0.65,
        },
        min_area: 80.0,
    };
    let set = extractor.extract(&opened, &probability, &reference).unwrap();
    assert_eq!(set.footprints.len(), 1);
    assert_eq!(set.footprints[0].pixel_count, 12);
    assert_eq!(set.footprints[0].confidence, Confidence::High);
    assert_relative_eq!(set.footprints[0].area_m2, 1200.0);

    // Rook adjacency would have split them
    let four = connected_components(&opened, Connectivity::Four).unwrap();
    assert_eq!(four.count(), 2);
}

#[test]
fn scenario_e_mean_on_medium_threshold() {
    let mut opened: Raster<u8> = layer(|_, _| 0.0).derive(vec![0u8; SIZE * SIZE], None).unwrap();
    let mut probability = layer(|_, _| 0.1);
    for r in 10..13 {
        for c in 10..13 {
            opened.set(r, c, 1).unwrap();
            probability.set(r, c, 0.5).unwrap();
        }
    }
    let reference = layer(|_, _| 0.0);

    let extractor = FootprintExtractor {
        thresholds: Thresholds {
            medium: 0.5,
            high: 0.75,
        },
        min_area: 0.0,
    };
    let set = extractor.extract(&opened, &probability, &reference).unwrap();
    assert_eq!(set.footprints.len(), 1);
    assert_eq!(set.footprints[0].prob_mean, 0.5);
    assert_eq!(set.footprints[0].confidence, Confidence::Medium);
}
