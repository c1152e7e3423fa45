//! Neighborhood shapes for windowed raster operators

/// Defines a neighborhood pattern around a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighborhood {
    /// 3x3 neighborhood (8 neighbors + center)
    Queen3x3,
    /// 3x3 without corners (4 neighbors + center)
    Rook3x3,
    /// Square neighborhood of given radius
    Square(usize),
    /// Circular neighborhood of given radius (in cells)
    Circle(usize),
}

impl Neighborhood {
    /// Get the radius of the neighborhood
    pub fn radius(&self) -> usize {
        match self {
            Neighborhood::Queen3x3 | Neighborhood::Rook3x3 => 1,
            Neighborhood::Square(r) | Neighborhood::Circle(r) => *r,
        }
    }

    /// Get the size of the neighborhood (width and height)
    pub fn size(&self) -> usize {
        self.radius() * 2 + 1
    }

    /// Check if a relative position is within this neighborhood
    pub fn contains(&self, dr: isize, dc: isize) -> bool {
        match self {
            Neighborhood::Queen3x3 => dr.abs() <= 1 && dc.abs() <= 1,
            Neighborhood::Rook3x3 => {
                (dr.abs() <= 1 && dc == 0) || (dr == 0 && dc.abs() <= 1)
            }
            Neighborhood::Square(r) => {
                let r = *r as isize;
                dr.abs() <= r && dc.abs() <= r
            }
            Neighborhood::Circle(r) => {
                let r = *r as isize;
                dr * dr + dc * dc <= r * r
            }
        }
    }

    /// Relative positions in this neighborhood, row-major from the top-left
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        let r = self.radius() as isize;
        let mut offsets = Vec::new();

        for dr in -r..=r {
            for dc in -r..=r {
                if self.contains(dr, dc) {
                    offsets.push((dr, dc));
                }
            }
        }

        offsets
    }

    /// Get offsets excluding the center cell
    pub fn offsets_no_center(&self) -> Vec<(isize, isize)> {
        self.offsets()
            .into_iter()
            .filter(|&(dr, dc)| dr != 0 || dc != 0)
            .collect()
    }
}
