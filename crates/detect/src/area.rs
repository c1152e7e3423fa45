//! Ground area of grid cells
//!
//! Projected grids have a constant cell area. Geographic grids (degrees)
//! use the area of the cell on the WGS84 ellipsoid at its row latitude:
//! `dx = N·cos(φ)·Δλ`, `dy = M·Δφ` with the prime-vertical and meridional
//! radii of curvature `N` and `M`.

use subcanopy_core::raster::{GeoTransform, Raster, RasterElement};

/// WGS84 semi-major axis (m)
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening
const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// Area of one cell at `latitude_deg` for a grid spaced `d_lon` × `d_lat` degrees
pub fn spheroidal_cell_area(latitude_deg: f64, d_lon: f64, d_lat: f64) -> f64 {
    let lat = latitude_deg.to_radians();
    let e2 = 2.0 * WGS84_F - WGS84_F * WGS84_F;
    let sin2 = lat.sin() * lat.sin();

    let n = WGS84_A / (1.0 - e2 * sin2).sqrt();
    let m = WGS84_A * (1.0 - e2) / (1.0 - e2 * sin2).powf(1.5);

    let dx = n * lat.cos() * d_lon.to_radians();
    let dy = m * d_lat.to_radians();
    dx.abs() * dy.abs()
}

/// Per-cell area lookup for one grid
#[derive(Debug, Clone, PartialEq)]
pub enum CellArea {
    /// Constant area in squared grid units
    Planar(f64),
    /// Area per row, in m²
    Geographic(Vec<f64>),
}

impl CellArea {
    /// Area model for a raster's grid
    pub fn for_raster<T: RasterElement>(raster: &Raster<T>) -> Self {
        let geographic = raster.crs().is_some_and(|crs| crs.is_geographic());
        if geographic {
            Self::geographic(raster.transform(), raster.rows())
        } else {
            Self::Planar(raster.transform().pixel_area())
        }
    }

    fn geographic(transform: &GeoTransform, rows: usize) -> Self {
        let d_lon = transform.pixel_width.abs();
        let d_lat = transform.pixel_height.abs();
        let areas = (0..rows)
            .map(|row| {
                let (_, lat) = transform.fractional_to_geo(0.5, row as f64 + 0.5);
                spheroidal_cell_area(lat, d_lon, d_lat)
            })
            .collect();
        Self::Geographic(areas)
    }

    /// Area of a cell in the given row
    pub fn at_row(&self, row: usize) -> f64 {
        match self {
            Self::Planar(area) => *area,
            Self::Geographic(rows) => rows.get(row).copied().unwrap_or(0.0),
        }
    }

    /// Summed area of a set of cells
    pub fn of_cells(&self, cells: &[(usize, usize)]) -> f64 {
        match self {
            Self::Planar(area) => area * cells.len() as f64,
            Self::Geographic(_) => cells.iter().map(|&(row, _)| self.at_row(row)).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use subcanopy_core::CRS;

    #[test]
    fn test_equator_cell() {
        // 1 arc-second at the equator is about 30.9 m × 30.7 m
        let arcsec = 1.0 / 3600.0;
        let area = spheroidal_cell_area(0.0, arcsec, arcsec);
        assert_relative_eq!(area, 30.92 * 30.72, max_relative = 0.01);
    }

    #[test]
    fn test_area_shrinks_with_latitude() {
        let d = 0.0001;
        let a0 = spheroidal_cell_area(0.0, d, d);
        let a60 = spheroidal_cell_area(60.0, d, d);
        assert!(a60 < a0);
        // cos(60°) = 0.5 on a sphere; flattening lifts the ellipsoid ratio to ~0.505
        assert_relative_eq!(a60 / a0, 0.505_06, max_relative = 1e-3);
        assert!(a60 / a0 > 0.5);
    }

    #[test]
    fn test_planar_grid() {
        let mut r: Raster<f64> = Raster::new(4, 4);
        r.set_transform(GeoTransform::new(500_000.0, 100.0, 10.0, -10.0));
        r.set_crs(Some(CRS::from_epsg(32618)));
        let area = CellArea::for_raster(&r);
        assert_eq!(area, CellArea::Planar(100.0));
        assert_relative_eq!(area.of_cells(&[(0, 0), (3, 3)]), 200.0);
    }

    #[test]
    fn test_geographic_grid() {
        let mut r: Raster<f64> = Raster::new(3, 3);
        r.set_transform(GeoTransform::new(-60.0, -3.0, 0.0001, -0.0001));
        r.set_crs(Some(CRS::wgs84()));
        let area = CellArea::for_raster(&r);
        let expected = spheroidal_cell_area(-3.00005, 0.0001, 0.0001);
        assert_relative_eq!(area.at_row(0), expected, epsilon = 1e-9);
        assert_relative_eq!(area.of_cells(&[(0, 0), (0, 1)]), 2.0 * expected, epsilon = 1e-9);
        assert_relative_eq!(area.at_row(3), 0.0);
    }
}
