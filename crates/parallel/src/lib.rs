//! # Subcanopy Parallel
//!
//! Parallel processing strategies for raster operators.
//!
//! This crate provides:
//! - Processing modes: sequential, global rayon pool, or a fixed thread count
//! - Tiled execution of windowed operators with halo overlap, stitched back
//!   into a result identical to a whole-raster run

pub mod strategy;
pub mod tiled;

pub use strategy::{num_cpus, ProcessingMode};
pub use tiled::{Tile, TileIterator, TiledProcessor};
