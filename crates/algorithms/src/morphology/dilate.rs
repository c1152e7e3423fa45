//! Binary dilation
//!
//! A cell becomes set when any cell under the (reflected) structuring
//! element is set. Cells beyond the raster edge are ignored.

use crate::maybe_rayon::*;
use subcanopy_core::raster::Raster;
use subcanopy_core::{Algorithm, Error, Result};

use super::element::StructuringElement;
use super::is_set;

/// Parameters for binary dilation
#[derive(Debug, Clone, Default)]
pub struct DilateParams {
    /// Structuring element shape
    pub element: StructuringElement,
}

/// Dilation algorithm
#[derive(Debug, Clone, Default)]
pub struct Dilate;

impl Algorithm for Dilate {
    type Input = Raster<u8>;
    type Output = Raster<u8>;
    type Params = DilateParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Dilate"
    }

    fn description(&self) -> &'static str {
        "Binary dilation over a structuring element"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        binary_dilate(&input, &params.element)
    }
}

/// Perform one binary dilation.
///
/// The output holds 1 where the reflected element hits at least one set
/// cell and 0 elsewhere; it carries no no-data value.
pub fn binary_dilate(mask: &Raster<u8>, element: &StructuringElement) -> Result<Raster<u8>> {
    element.validate()?;

    let (rows, cols) = mask.shape();
    let offsets = element.offsets();

    let output_data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0u8; cols];

            for (col, out) in row_data.iter_mut().enumerate() {
                let hit = offsets.iter().any(|&(dr, dc)| {
                    let nr = row as isize - dr;
                    let nc = col as isize - dc;
                    nr >= 0
                        && nc >= 0
                        && (nr as usize) < rows
                        && (nc as usize) < cols
                        && is_set(mask, nr as usize, nc as usize)
                });
                *out = u8::from(hit);
            }

            row_data
        })
        .collect();

    mask.derive(output_data, None)
}
