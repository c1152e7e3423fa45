//! Binary erosion
//!
//! A cell stays set only when every cell under the structuring element is
//! set. Cells beyond the raster edge count as unset, so regions touching
//! the border lose their edge row or column.

use crate::maybe_rayon::*;
use subcanopy_core::raster::Raster;
use subcanopy_core::{Algorithm, Error, Result};

use super::element::StructuringElement;
use super::is_set;

/// Parameters for binary erosion
#[derive(Debug, Clone)]
pub struct ErodeParams {
    /// Structuring element shape
    pub element: StructuringElement,
    /// Number of successive erosions (0 returns a copy of the input)
    pub iterations: usize,
}

impl Default for ErodeParams {
    fn default() -> Self {
        Self {
            element: StructuringElement::default(),
            iterations: 1,
        }
    }
}

/// Erosion algorithm
#[derive(Debug, Clone, Default)]
pub struct Erode;

impl Algorithm for Erode {
    type Input = Raster<u8>;
    type Output = Raster<u8>;
    type Params = ErodeParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Erode"
    }

    fn description(&self) -> &'static str {
        "Binary erosion over a structuring element"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        params.element.validate()?;
        let mut current = input;
        for _ in 0..params.iterations {
            current = binary_erode(&current, &params.element)?;
        }
        Ok(current)
    }
}

/// Perform one binary erosion.
///
/// The output holds 1 where the element fits entirely inside the set
/// cells and 0 elsewhere; it carries no no-data value.
pub fn binary_erode(mask: &Raster<u8>, element: &StructuringElement) -> Result<Raster<u8>> {
    element.validate()?;

    let (rows, cols) = mask.shape();
    let offsets = element.offsets();

    let output_data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0u8; cols];

            for (col, out) in row_data.iter_mut().enumerate() {
                let fits = offsets.iter().all(|&(dr, dc)| {
                    let nr = row as isize + dr;
                    let nc = col as isize + dc;
                    nr >= 0
                        && nc >= 0
                        && (nr as usize) < rows
                        && (nc as usize) < cols
                        && is_set(mask, nr as usize, nc as usize)
                });
                *out = u8::from(fits);
            }

            row_data
        })
        .collect();

    mask.derive(output_data, None)
}
