//! Binary mathematical morphology
//!
//! Operations on 0/1 rasters (any non-zero, non-nodata cell is set):
//! - **Erosion**: a cell stays set only if its whole element is set
//! - **Dilation**: a cell becomes set if any element cell is set
//! - **Opening**: erosion then dilation (removes features smaller than the element)
//!
//! Cells beyond the raster edge count as unset for erosion and are ignored
//! by dilation, so an opening never grows a region past its original extent.

mod dilate;
mod element;
mod erode;
mod opening;

pub use dilate::{binary_dilate, Dilate, DilateParams};
pub use element::StructuringElement;
pub use erode::{binary_erode, Erode, ErodeParams};
pub use opening::{binary_opening, Opening, OpeningParams};

use subcanopy_core::raster::Raster;

/// Whether the cell at (row, col) is set in a binary raster
#[inline]
pub(crate) fn is_set(mask: &Raster<u8>, row: usize, col: usize) -> bool {
    let v = unsafe { mask.get_unchecked(row, col) };
    v != 0 && !mask.is_nodata(v)
}
