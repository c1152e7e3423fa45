//! Binary opening (erosion followed by dilation)
//!
//! Removes set features that the structuring element cannot fit inside
//! (isolated cells, one-pixel lines, thin spurs) while restoring the
//! shape of larger regions.

use subcanopy_core::raster::Raster;
use subcanopy_core::{Algorithm, Error, Result};

use super::dilate::binary_dilate;
use super::element::StructuringElement;
use super::erode::binary_erode;

/// Parameters for binary opening
#[derive(Debug, Clone, Default)]
pub struct OpeningParams {
    /// Structuring element shape
    pub element: StructuringElement,
}

/// Opening algorithm
#[derive(Debug, Clone, Default)]
pub struct Opening;

impl Algorithm for Opening {
    type Input = Raster<u8>;
    type Output = Raster<u8>;
    type Params = OpeningParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Opening"
    }

    fn description(&self) -> &'static str {
        "Binary opening (erosion then dilation) to remove small isolated features"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        binary_opening(&input, &params.element)
    }
}

/// Perform binary opening on a 0/1 raster.
///
/// The result is always a subset of the input's set cells.
pub fn binary_opening(mask: &Raster<u8>, element: &StructuringElement) -> Result<Raster<u8>> {
    let eroded = binary_erode(mask, element)?;
    binary_dilate(&eroded, element)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(m: &Raster<u8>) -> usize {
        m.data().iter().map(|&v| v as usize).sum()
    }

    #[test]
    fn test_opening_removes_isolated_pixel() {
        let mut m: Raster<u8> = Raster::new(11, 11);
        m.set(5, 5, 1).unwrap();
        let o = binary_opening(&m, &StructuringElement::Square(1)).unwrap();
        assert_eq!(count(&o), 0);
    }

    #[test]
    fn test_opening_preserves_block() {
        let mut m: Raster<u8> = Raster::new(11, 11);
        for r in 3..8 {
            for c in 3..8 {
                m.set(r, c, 1).unwrap();
            }
        }
        // A spur one pixel wide
        m.set(5, 8, 1).unwrap();
        m.set(5, 9, 1).unwrap();

        let o = Opening.execute_default(m).unwrap();
        assert_eq!(count(&o), 25);
        assert_eq!(o.get(3, 3).unwrap(), 1);
        assert_eq!(o.get(5, 8).unwrap(), 0);
    }

    #[test]
    fn test_opening_removes_thin_line() {
        let mut m: Raster<u8> = Raster::new(7, 7);
        for c in 0..7 {
            m.set(3, c, 1).unwrap();
        }
        let o = binary_opening(&m, &StructuringElement::Square(1)).unwrap();
        assert_eq!(count(&o), 0);
    }

    #[test]
    fn test_opening_is_subset_and_idempotent() {
        let mut m: Raster<u8> = Raster::new(12, 12);
        for (r, c) in [(1, 1), (1, 2), (2, 1), (2, 2), (2, 3), (3, 3), (6, 6), (9, 2)] {
            m.set(r, c, 1).unwrap();
        }
        for r in 5..10 {
            for c in 5..9 {
                m.set(r, c, 1).unwrap();
            }
        }
        let once = binary_opening(&m, &StructuringElement::Square(1)).unwrap();
        for (o, i) in once.data().iter().zip(m.data().iter()) {
            assert!(*o <= *i);
        }
        let twice = binary_opening(&once, &StructuringElement::Square(1)).unwrap();
        assert_eq!(once.data(), twice.data());
    }

    #[test]
    fn test_opening_keeps_block_at_border() {
        // Edge cells count as unset for erosion but the dilation restores them
        let m: Raster<u8> = Raster::filled(4, 4, 1);
        let o = binary_opening(&m, &StructuringElement::Square(1)).unwrap();
        assert_eq!(count(&o), 16);
    }
}
