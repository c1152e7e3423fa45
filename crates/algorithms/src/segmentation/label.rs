//! Connected-component labeling
//!
//! Groups contiguous foreground cells of a binary raster into regions.
//! Labels are assigned in row-major order of each region's first cell,
//! starting at 1, so the numbering is stable for identical inputs.

use subcanopy_core::raster::{Neighborhood, Raster};
use subcanopy_core::Result;

/// Adjacency rule used to join foreground cells into one region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// Edge neighbours only. Two cells touching at a corner form two regions.
    Four,
    /// Edge and corner neighbours. Diagonal contact joins a region.
    #[default]
    Eight,
}

impl Connectivity {
    fn neighborhood(self) -> Neighborhood {
        match self {
            Connectivity::Four => Neighborhood::Rook3x3,
            Connectivity::Eight => Neighborhood::Queen3x3,
        }
    }
}

/// One labeled region
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Label id (>= 1)
    pub label: u32,
    /// Member cells as (row, col), in flood-fill visiting order
    pub cells: Vec<(usize, usize)>,
    /// Inclusive bounding box: (min_row, min_col, max_row, max_col)
    pub bbox: (usize, usize, usize, usize),
}

impl Region {
    /// Number of member cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the region has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Result of connected-component labeling
#[derive(Debug, Clone)]
pub struct Labeling {
    /// Label raster; background cells hold 0, which is also its no-data value
    pub labels: Raster<u32>,
    /// Regions ordered by label id
    pub regions: Vec<Region>,
}

impl Labeling {
    /// Number of regions found
    pub fn count(&self) -> usize {
        self.regions.len()
    }

    /// Look up a region by label id
    pub fn region(&self, label: u32) -> Option<&Region> {
        label
            .checked_sub(1)
            .and_then(|i| self.regions.get(i as usize))
    }
}

/// Label the connected foreground regions of a binary raster.
///
/// Foreground is any cell whose value is non-zero and not no-data.
/// Labeling is a single global pass; per-region work can be parallelized
/// afterwards over `Labeling::regions`.
pub fn connected_components(mask: &Raster<u8>, connectivity: Connectivity) -> Result<Labeling> {
    let (rows, cols) = mask.shape();
    let neighbors = connectivity.neighborhood().offsets_no_center();

    let mut label_data = vec![0u32; rows * cols];
    let mut regions: Vec<Region> = Vec::new();
    let mut stack: Vec<(usize, usize)> = Vec::new();

    let is_foreground = |r: usize, c: usize| {
        let v = unsafe { mask.get_unchecked(r, c) };
        v != 0 && !mask.is_nodata(v)
    };

    for row in 0..rows {
        for col in 0..cols {
            if label_data[row * cols + col] != 0 || !is_foreground(row, col) {
                continue;
            }

            let label = regions.len() as u32 + 1;
            let mut cells = Vec::new();
            let mut bbox = (row, col, row, col);

            label_data[row * cols + col] = label;
            stack.push((row, col));

            while let Some((cr, cc)) = stack.pop() {
                cells.push((cr, cc));
                bbox.0 = bbox.0.min(cr);
                bbox.1 = bbox.1.min(cc);
                bbox.2 = bbox.2.max(cr);
                bbox.3 = bbox.3.max(cc);

                for &(dr, dc) in &neighbors {
                    let nr = cr as isize + dr;
                    let nc = cc as isize + dc;
                    if nr < 0 || nc < 0 || nr as usize >= rows || nc as usize >= cols {
                        continue;
                    }
                    let (nr, nc) = (nr as usize, nc as usize);
                    let idx = nr * cols + nc;
                    if label_data[idx] == 0 && is_foreground(nr, nc) {
                        label_data[idx] = label;
                        stack.push((nr, nc));
                    }
                }
            }

            regions.push(Region { label, cells, bbox });
        }
    }

    let labels = mask.derive(label_data, Some(0))?;
    Ok(Labeling { labels, regions })
}
