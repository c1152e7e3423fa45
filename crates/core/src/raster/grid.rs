//! Main Raster type

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::Array2;

/// Tolerance used when comparing transforms of rasters that must share a grid
const GRID_TOLERANCE: f64 = 1e-9;

/// A georeferenced 2D raster grid.
///
/// `Raster<T>` stores values of type `T` in a 2D grid with associated
/// geographic metadata (transform and CRS) and an optional no-data value.
///
/// # Example
///
/// ```ignore
/// use subcanopy_core::Raster;
///
/// let mut raster: Raster<f64> = Raster::new(100, 100);
/// raster.set(10, 20, 42.0)?;
/// let value = raster.get(10, 20)?;
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    /// Raster data stored in row-major order (row, col)
    data: Array2<T>,
    /// Affine transformation
    transform: GeoTransform,
    /// Coordinate reference system
    crs: Option<CRS>,
    /// No-data value
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), value),
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Create a raster from existing row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self::from_array(array))
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Create a zero-filled raster with the same metadata but a different data type
    pub fn with_same_meta<U: RasterElement>(&self, rows: usize, cols: usize) -> Raster<U> {
        Raster {
            data: Array2::zeros((rows, cols)),
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: None,
        }
    }

    /// Build a raster on this raster's grid from row-major data.
    ///
    /// The result shares shape, transform and CRS with `self` and carries
    /// the given no-data value.
    pub fn derive<U: RasterElement>(&self, data: Vec<U>, nodata: Option<U>) -> Result<Raster<U>> {
        let (rows, cols) = self.shape();
        let mut output = self.with_same_meta::<U>(rows, cols);
        output.data = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        output.nodata = nodata;
        Ok(output)
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the raster is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get the value at (row, col), or `None` when out of bounds or no-data
    pub fn value_at(&self, row: usize, col: usize) -> Option<T> {
        self.data
            .get((row, col))
            .copied()
            .filter(|v| !self.is_nodata(*v))
    }

    /// Get value at (row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Get a mutable reference to the underlying array
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    /// Copy a rectangular window into a new raster.
    ///
    /// The window keeps the CRS and no-data value; its transform is
    /// shifted so that grid coordinates are preserved.
    pub fn window(&self, row: usize, col: usize, rows: usize, cols: usize) -> Result<Raster<T>> {
        if row + rows > self.rows() || col + cols > self.cols() {
            return Err(Error::IndexOutOfBounds {
                row: row + rows,
                col: col + cols,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        let data = self
            .data
            .slice(ndarray::s![row..row + rows, col..col + cols])
            .to_owned();
        Ok(Raster {
            data,
            transform: self.transform.window(row, col),
            crs: self.crs.clone(),
            nodata: self.nodata,
        })
    }

    // Metadata

    /// Get the geotransform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Set the geotransform
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// Get the CRS
    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// Set the CRS
    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    /// Get the no-data value
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Set the no-data value
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    // Coordinate conversion

    /// Convert pixel coordinates to grid coordinates (cell center)
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.transform.pixel_to_geo(col, row)
    }

    /// Locate the cell containing a grid coordinate, `None` outside coverage
    pub fn cell_at(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        self.transform.geo_to_cell(x, y, self.rows(), self.cols())
    }

    // Grid geometry

    /// Whether `other` shares this raster's shape, transform and CRS
    pub fn same_grid<U: RasterElement>(&self, other: &Raster<U>) -> bool {
        self.ensure_same_grid(other).is_ok()
    }

    /// Fail unless `other` shares this raster's shape, transform and CRS.
    ///
    /// Rasters are never resampled to make them fit; any difference is
    /// reported as an error.
    pub fn ensure_same_grid<U: RasterElement>(&self, other: &Raster<U>) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::SizeMismatch {
                er: self.rows(),
                ec: self.cols(),
                ar: other.rows(),
                ac: other.cols(),
            });
        }
        if !self.transform.approx_eq(other.transform(), GRID_TOLERANCE) {
            return Err(Error::TransformMismatch {
                expected: self.transform.to_string(),
                actual: other.transform().to_string(),
            });
        }
        match (self.crs(), other.crs()) {
            (None, None) => Ok(()),
            (Some(a), Some(b)) if a.is_equivalent(b) => Ok(()),
            (a, b) => Err(Error::CrsMismatch(
                a.map_or_else(|| "none".to_string(), |c| c.identifier()),
                b.map_or_else(|| "none".to_string(), |c| c.identifier()),
            )),
        }
    }

    // Value checks

    /// Check if a value is no-data
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Count cells holding a value other than no-data
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !self.is_nodata(**v)).count()
    }
}
