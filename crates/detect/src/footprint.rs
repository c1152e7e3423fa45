//! Footprint extraction and attribution
//!
//! The opened candidate mask is labeled with 8-connectivity, so regions
//! joined only through a diagonal corner form a single footprint. Each
//! region is then outlined and attributed independently in parallel;
//! results keep label order.

use geo_types::{Coord, Polygon};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use subcanopy_algorithms::segmentation::{connected_components, Connectivity, Labeling, Region};
use subcanopy_algorithms::statistics::{zonal_statistics, ZonalResult};
use subcanopy_algorithms::vector::outline_region;
use subcanopy_core::raster::Raster;
use tracing::debug;

use crate::area::CellArea;
use crate::error::Result;
use crate::fusion::{Confidence, Thresholds};

/// Whether the reference layer already knows a footprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationClass {
    /// Reference built-up fraction above 0 somewhere inside
    Known,
    Novel,
}

/// One detected structure
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    /// Label id in [`FootprintSet::labeling`]
    pub label: u32,
    /// Union of the member pixels in grid coordinates
    pub polygon: Polygon<f64>,
    pub pixel_count: usize,
    /// Ground area (m² for metric and geographic grids)
    pub area_m2: f64,
    /// Outline length in grid units
    pub perimeter: f64,
    /// Polsby-Popper compactness `4πA/P²`, in pixel units
    pub compactness: f64,
    pub prob_mean: f64,
    pub prob_max: f64,
    /// Bucket of `prob_mean`; never [`Confidence::None`]
    pub confidence: Confidence,
    pub validation_class: ValidationClass,
    /// Mean of the member pixel centres, grid coordinates
    pub centroid: Coord<f64>,
    /// WGS84 longitude of the centroid when the grid CRS supports it
    pub centroid_lon: Option<f64>,
    /// WGS84 latitude of the centroid when the grid CRS supports it
    pub centroid_lat: Option<f64>,
}

/// Labeling of the cleaned surface and the footprints that passed the area filter
#[derive(Debug, Clone)]
pub struct FootprintSet {
    pub labeling: Labeling,
    /// Ordered by label id
    pub footprints: Vec<Footprint>,
}

/// Extraction settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootprintExtractor {
    pub thresholds: Thresholds,
    /// Smallest area kept, same unit as [`Footprint::area_m2`]
    pub min_area: f64,
}

impl FootprintExtractor {
    /// Label `opened`, attribute every region from `probability` and
    /// `reference`, and drop regions smaller than `min_area`.
    pub fn extract(
        &self,
        opened: &Raster<u8>,
        probability: &Raster<f64>,
        reference: &Raster<f64>,
    ) -> Result<FootprintSet> {
        opened.ensure_same_grid(probability)?;
        opened.ensure_same_grid(reference)?;

        let labeling = connected_components(opened, Connectivity::Eight)?;
        let prob_stats = zonal_statistics(probability, &labeling)?;
        let ref_stats = zonal_statistics(reference, &labeling)?;
        let cell_area = CellArea::for_raster(opened);

        let footprints: Vec<Footprint> = labeling
            .regions
            .par_iter()
            .zip(prob_stats.par_iter())
            .zip(ref_stats.par_iter())
            .map(|((region, prob), reference)| {
                self.attribute(&labeling, region, prob, reference, &cell_area, opened)
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .filter(|f| f.area_m2 >= self.min_area)
            .collect();

        debug!(
            regions = labeling.count(),
            kept = footprints.len(),
            min_area = self.min_area,
            "footprints extracted"
        );

        Ok(FootprintSet {
            labeling,
            footprints,
        })
    }

    fn attribute(
        &self,
        labeling: &Labeling,
        region: &Region,
        prob: &ZonalResult,
        reference: &ZonalResult,
        cell_area: &CellArea,
        grid: &Raster<u8>,
    ) -> Result<Footprint> {
        let transform = grid.transform();
        let outline = outline_region(&labeling.labels, region)?;

        let n = region.len() as f64;
        let (sum_row, sum_col) = region
            .cells
            .iter()
            .fold((0.0, 0.0), |(sr, sc), &(r, c)| (sr + r as f64, sc + c as f64));
        let (cx, cy) = transform.fractional_to_geo(sum_col / n + 0.5, sum_row / n + 0.5);
        let lonlat = grid.crs().and_then(|crs| crs.to_lonlat(cx, cy));

        let pixel_perimeter = outline.pixel_perimeter() as f64;
        let compactness = if pixel_perimeter > 0.0 {
            4.0 * std::f64::consts::PI * n / (pixel_perimeter * pixel_perimeter)
        } else {
            0.0
        };

        let validation_class = if reference.count > 0 && reference.max > 0.0 {
            ValidationClass::Known
        } else {
            ValidationClass::Novel
        };

        Ok(Footprint {
            label: region.label,
            polygon: outline.to_grid(transform),
            pixel_count: region.len(),
            area_m2: cell_area.of_cells(&region.cells),
            perimeter: outline.perimeter(transform),
            compactness,
            prob_mean: prob.mean,
            prob_max: prob.max,
            confidence: self.thresholds.classify(prob.mean),
            validation_class,
            centroid: Coord { x: cx, y: cy },
            centroid_lon: lonlat.map(|(lon, _)| lon),
            centroid_lat: lonlat.map(|(_, lat)| lat),
        })
    }
}
