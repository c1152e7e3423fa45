//! Segmentation of binary rasters into discrete regions
//!
//! - **label**: Connected-component labeling (4- or 8-connected)

mod label;

pub use label::{connected_components, Connectivity, Labeling, Region};
