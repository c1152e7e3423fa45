//! Structuring element definitions for morphological operations
//!
//! A structuring element defines the neighborhood shape used in
//! erosion, dilation, and opening.

use subcanopy_core::raster::Neighborhood;
use subcanopy_core::{Error, Result};

/// Shape of a structuring element for morphological operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuringElement {
    /// Square element of given radius (side = 2*radius + 1); `Square(1)` is
    /// the 8-connected 3×3 element
    Square(usize),
    /// Cross (plus-shaped) element of given radius; `Cross(1)` is the
    /// 4-connected element
    Cross(usize),
    /// Disk element of given radius
    Disk(usize),
}

impl Default for StructuringElement {
    fn default() -> Self {
        StructuringElement::Square(1)
    }
}

impl StructuringElement {
    /// Validate the structuring element, returning an error for invalid configurations
    pub fn validate(&self) -> Result<()> {
        if self.radius() == 0 {
            return Err(Error::InvalidParameter {
                name: "radius",
                value: "0".to_string(),
                reason: "structuring element radius must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Get the radius of the structuring element
    pub fn radius(&self) -> usize {
        match self {
            StructuringElement::Square(r)
            | StructuringElement::Cross(r)
            | StructuringElement::Disk(r) => *r,
        }
    }

    /// Compute (dr, dc) offsets relative to center for all active cells
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        match self {
            StructuringElement::Square(r) => Neighborhood::Square(*r).offsets(),
            StructuringElement::Disk(r) => Neighborhood::Circle(*r).offsets(),
            StructuringElement::Cross(r) => {
                let r = *r as isize;
                let mut offsets = Vec::new();
                for d in -r..=r {
                    offsets.push((d, 0)); // vertical arm
                    if d != 0 {
                        offsets.push((0, d)); // horizontal arm
                    }
                }
                offsets
            }
        }
    }
}
