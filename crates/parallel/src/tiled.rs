//! Tiled processing for large rasters
//!
//! The grid is split into non-overlapping core tiles. Each tile is read
//! together with a halo of surrounding cells (clipped at the grid edge),
//! the windowed operator runs on that padded window, and only the core
//! cells are copied back. With a halo at least as wide as the operator's
//! reach, every core cell sees exactly the neighbours it would see in a
//! whole-raster run, so the stitched result is identical.

use rayon::prelude::*;
use subcanopy_core::raster::{Raster, RasterElement};
use subcanopy_core::{Error, Result};
use tracing::debug;

/// A core tile plus the halo-padded window read around it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// Row offset of the padded window in the source raster
    pub row_offset: usize,
    /// Column offset of the padded window in the source raster
    pub col_offset: usize,
    /// Number of rows in the padded window
    pub rows: usize,
    /// Number of columns in the padded window
    pub cols: usize,
    /// Row offset of the core in the source raster
    pub core_row: usize,
    /// Column offset of the core in the source raster
    pub core_col: usize,
    /// Number of core rows
    pub core_rows: usize,
    /// Number of core columns
    pub core_cols: usize,
}

impl Tile {
    /// Core bounds in window-local coordinates: (start_row, start_col, end_row, end_col)
    pub fn valid_bounds(&self) -> (usize, usize, usize, usize) {
        let start_row = self.core_row - self.row_offset;
        let start_col = self.core_col - self.col_offset;
        (
            start_row,
            start_col,
            start_row + self.core_rows,
            start_col + self.core_cols,
        )
    }

    /// Convert window-local coordinates to source raster coordinates
    pub fn to_source_coords(&self, local_row: usize, local_col: usize) -> (usize, usize) {
        (self.row_offset + local_row, self.col_offset + local_col)
    }
}

/// Iterator over tiles covering a raster, in row-major order
pub struct TileIterator {
    total_rows: usize,
    total_cols: usize,
    tile_size: usize,
    halo: usize,
    current_row: usize,
    current_col: usize,
}

impl TileIterator {
    /// Create a new tile iterator. A `tile_size` of 0 is treated as 1.
    pub fn new(total_rows: usize, total_cols: usize, tile_size: usize, halo: usize) -> Self {
        Self {
            total_rows,
            total_cols,
            tile_size: tile_size.max(1),
            halo,
            current_row: 0,
            current_col: 0,
        }
    }
}

impl Iterator for TileIterator {
    type Item = Tile;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row >= self.total_rows || self.total_cols == 0 {
            return None;
        }

        let core_rows = self.tile_size.min(self.total_rows - self.current_row);
        let core_cols = self.tile_size.min(self.total_cols - self.current_col);

        let row_start = self.current_row.saturating_sub(self.halo);
        let col_start = self.current_col.saturating_sub(self.halo);
        let row_end = (self.current_row + core_rows + self.halo).min(self.total_rows);
        let col_end = (self.current_col + core_cols + self.halo).min(self.total_cols);

        let tile = Tile {
            row_offset: row_start,
            col_offset: col_start,
            rows: row_end - row_start,
            cols: col_end - col_start,
            core_row: self.current_row,
            core_col: self.current_col,
            core_rows,
            core_cols,
        };

        self.current_col += self.tile_size;
        if self.current_col >= self.total_cols {
            self.current_col = 0;
            self.current_row += self.tile_size;
        }

        Some(tile)
    }
}

/// Processor for tiled raster operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiledProcessor {
    tile_size: usize,
    halo: usize,
}

impl TiledProcessor {
    /// Create a new tiled processor.
    ///
    /// `halo` must be at least the reach of every operator run through it.
    pub fn new(tile_size: usize, halo: usize) -> Self {
        Self { tile_size, halo }
    }

    /// Core tile edge length in cells
    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    /// Halo width in cells
    pub fn halo(&self) -> usize {
        self.halo
    }

    /// Tiles covering a raster of the given shape
    pub fn tiles(&self, rows: usize, cols: usize) -> Vec<Tile> {
        TileIterator::new(rows, cols, self.tile_size, self.halo).collect()
    }

    /// Apply a windowed operator tile by tile and stitch the core cells.
    ///
    /// `op` receives each halo-padded window as a standalone raster (its
    /// transform shifted to the window origin) and must return a raster of
    /// the same shape. Tiles run in parallel on the current rayon pool.
    /// The output carries the no-data value reported by the operator.
    pub fn map_windowed<T, U, F>(&self, input: &Raster<T>, op: F) -> Result<Raster<U>>
    where
        T: RasterElement,
        U: RasterElement,
        F: Fn(&Raster<T>) -> Result<Raster<U>> + Sync + Send,
    {
        if self.tile_size == 0 {
            return Err(Error::InvalidParameter {
                name: "tile_size",
                value: "0".into(),
                reason: "tiles must hold at least one cell".into(),
            });
        }

        let (rows, cols) = input.shape();
        let tiles = self.tiles(rows, cols);
        debug!(
            tiles = tiles.len(),
            tile_size = self.tile_size,
            halo = self.halo,
            rows,
            cols,
            "tiled windowed operator"
        );

        let results: Vec<(Tile, Raster<U>)> = tiles
            .into_par_iter()
            .map(|tile| {
                let window = input.window(tile.row_offset, tile.col_offset, tile.rows, tile.cols)?;
                let out = op(&window)?;
                if out.shape() != window.shape() {
                    return Err(Error::SizeMismatch {
                        er: window.rows(),
                        ec: window.cols(),
                        ar: out.rows(),
                        ac: out.cols(),
                    });
                }
                Ok((tile, out))
            })
            .collect::<Result<_>>()?;

        let mut output = input.with_same_meta::<U>(rows, cols);
        if let Some((_, first)) = results.first() {
            output.set_nodata(first.nodata());
        }

        let data = output.data_mut();
        for (tile, out) in &results {
            let (r0, c0, r1, c1) = tile.valid_bounds();
            for local_row in r0..r1 {
                for local_col in c0..c1 {
                    let (src_row, src_col) = tile.to_source_coords(local_row, local_col);
                    data[[src_row, src_col]] = unsafe { out.get_unchecked(local_row, local_col) };
                }
            }
        }

        Ok(output)
    }
}
