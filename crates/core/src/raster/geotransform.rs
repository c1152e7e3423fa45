//! Affine geotransformation for rasters

use serde::{Deserialize, Serialize};
use std::fmt;

/// Affine transformation coefficients for georeferencing rasters.
///
/// Converts between pixel coordinates (col, row) and grid coordinates (x, y):
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// For north-up images, `row_rotation` and `col_rotation` are typically 0,
/// and `pixel_height` is negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel width (cell size in X direction)
    pub pixel_width: f64,
    /// Pixel height (cell size in Y direction, usually negative)
    pub pixel_height: f64,
    /// Rotation about X axis (usually 0)
    pub row_rotation: f64,
    /// Rotation about Y axis (usually 0)
    pub col_rotation: f64,
}

impl GeoTransform {
    /// Create a new GeoTransform with no rotation (north-up image)
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// Convert pixel coordinates to grid coordinates
    ///
    /// Returns the coordinates of the pixel center
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.fractional_to_geo(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Convert pixel coordinates to grid coordinates (top-left corner)
    pub fn pixel_to_geo_corner(&self, col: usize, row: usize) -> (f64, f64) {
        self.fractional_to_geo(col as f64, row as f64)
    }

    /// Convert fractional pixel coordinates (corner space) to grid coordinates
    pub fn fractional_to_geo(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.origin_x + col * self.pixel_width + row * self.row_rotation;
        let y = self.origin_y + col * self.col_rotation + row * self.pixel_height;
        (x, y)
    }

    /// Convert grid coordinates to pixel coordinates
    ///
    /// Returns fractional pixel coordinates; use `.floor()` to get integer indices
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation;

        if det.abs() < 1e-10 {
            // Degenerate transformation
            return (f64::NAN, f64::NAN);
        }

        let dx = x - self.origin_x;
        let dy = y - self.origin_y;

        let col = (self.pixel_height * dx - self.row_rotation * dy) / det;
        let row = (-self.col_rotation * dx + self.pixel_width * dy) / det;

        (col, row)
    }

    /// Locate the cell containing a grid coordinate.
    ///
    /// Returns `None` when the point falls outside a `rows` x `cols` grid or
    /// the transform is degenerate.
    pub fn geo_to_cell(&self, x: f64, y: f64, rows: usize, cols: usize) -> Option<(usize, usize)> {
        let (col, row) = self.geo_to_pixel(x, y);
        if !col.is_finite() || !row.is_finite() || col < 0.0 || row < 0.0 {
            return None;
        }
        let (r, c) = (row.floor() as usize, col.floor() as usize);
        (r < rows && c < cols).then_some((r, c))
    }

    /// Planar area of one cell in squared grid units
    pub fn pixel_area(&self) -> f64 {
        (self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation).abs()
    }

    /// Transform of a sub-window whose top-left cell is (`row`, `col`) of this grid
    pub fn window(&self, row: usize, col: usize) -> Self {
        let (origin_x, origin_y) = self.pixel_to_geo_corner(col, row);
        Self {
            origin_x,
            origin_y,
            ..*self
        }
    }

    /// Coefficient-wise comparison with an absolute tolerance
    pub fn approx_eq(&self, other: &GeoTransform, tolerance: f64) -> bool {
        let a = [
            self.origin_x,
            self.origin_y,
            self.pixel_width,
            self.pixel_height,
            self.row_rotation,
            self.col_rotation,
        ];
        let b = [
            other.origin_x,
            other.origin_y,
            other.pixel_width,
            other.pixel_height,
            other.row_rotation,
            other.col_rotation,
        ];
        a.iter().zip(b.iter()).all(|(p, q)| (p - q).abs() <= tolerance)
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

impl fmt::Display for GeoTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}, {}, {}]",
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height
        )
    }
}
