//! Polygonization of labeled pixel regions
//!
//! Boundary edges are emitted between region cells and non-region cells in
//! pixel-corner space (x = column, y = row, y pointing down) and linked
//! into closed rings. Where two region cells touch only at a corner the
//! tracer turns left, which keeps 8-connected pinch points inside a
//! single ring. Rings with positive shoelace area (in this y-down frame)
//! are exteriors; negative ones are holes.

use std::collections::HashMap;

use geo_types::{Coord, LineString, Polygon};
use subcanopy_core::raster::{GeoTransform, Raster};
use subcanopy_core::{Error, Result};

use crate::segmentation::Region;

type Vertex = (i64, i64);

/// Boundary of one labeled region
#[derive(Debug, Clone, PartialEq)]
pub struct RegionOutline {
    /// Polygon in pixel-corner coordinates (x = column, y = row)
    pub polygon: Polygon<f64>,
    /// Number of unit boundary edges running along rows
    pub horizontal_edges: usize,
    /// Number of unit boundary edges running along columns
    pub vertical_edges: usize,
}

impl RegionOutline {
    /// Perimeter in pixel units
    pub fn pixel_perimeter(&self) -> usize {
        self.horizontal_edges + self.vertical_edges
    }

    /// Perimeter in grid units for an axis-aligned transform
    pub fn perimeter(&self, transform: &GeoTransform) -> f64 {
        self.horizontal_edges as f64 * transform.pixel_width.abs()
            + self.vertical_edges as f64 * transform.pixel_height.abs()
    }

    /// Map the pixel-space polygon into grid coordinates
    pub fn to_grid(&self, transform: &GeoTransform) -> Polygon<f64> {
        let map_ring = |ring: &LineString<f64>| -> LineString<f64> {
            ring.coords()
                .map(|c| {
                    let (x, y) = transform.fractional_to_geo(c.x, c.y);
                    Coord { x, y }
                })
                .collect()
        };
        Polygon::new(
            map_ring(self.polygon.exterior()),
            self.polygon.interiors().iter().map(map_ring).collect(),
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    from: Vertex,
    to: Vertex,
}

impl Edge {
    fn direction(&self) -> Vertex {
        (self.to.0 - self.from.0, self.to.1 - self.from.1)
    }
}

/// Trace the outline of `region` within a label raster.
///
/// # Errors
/// Fails for an empty region or if the boundary does not close into rings
/// (which only happens when `region` does not match `labels`).
pub fn outline_region(labels: &Raster<u32>, region: &Region) -> Result<RegionOutline> {
    if region.is_empty() {
        return Err(Error::Algorithm(format!("Region {} has no cells", region.label)));
    }

    let (rows, cols) = labels.shape();
    let member = |r: i64, c: i64| -> bool {
        r >= 0
            && c >= 0
            && (r as usize) < rows
            && (c as usize) < cols
            && unsafe { labels.get_unchecked(r as usize, c as usize) } == region.label
    };

    let mut edges: Vec<Edge> = Vec::new();
    let mut horizontal_edges = 0usize;
    let mut vertical_edges = 0usize;

    // Clockwise on screen around each cell, keeping the region on the right
    for &(row, col) in &region.cells {
        let (r, c) = (row as i64, col as i64);
        if !member(r - 1, c) {
            edges.push(Edge { from: (c, r), to: (c + 1, r) });
            horizontal_edges += 1;
        }
        if !member(r, c + 1) {
            edges.push(Edge { from: (c + 1, r), to: (c + 1, r + 1) });
            vertical_edges += 1;
        }
        if !member(r + 1, c) {
            edges.push(Edge { from: (c + 1, r + 1), to: (c, r + 1) });
            horizontal_edges += 1;
        }
        if !member(r, c - 1) {
            edges.push(Edge { from: (c, r + 1), to: (c, r) });
            vertical_edges += 1;
        }
    }

    // Edges are traced from the lowest vertex first so ring order is stable
    edges.sort_by_key(|e| (e.from.1, e.from.0, e.to.1, e.to.0));

    let mut outgoing: HashMap<Vertex, Vec<usize>> = HashMap::new();
    for (i, e) in edges.iter().enumerate() {
        outgoing.entry(e.from).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut rings: Vec<Vec<Vertex>> = Vec::new();

    for start in 0..edges.len() {
        if used[start] {
            continue;
        }

        let mut ring: Vec<Vertex> = Vec::new();
        let mut current = start;
        loop {
            used[current] = true;
            let edge = edges[current];
            ring.push(edge.from);

            let next = next_edge(&edges, &outgoing, edge)?;
            if next == start {
                break;
            }
            if used[next] {
                return Err(Error::Algorithm(format!(
                    "Boundary of region {} does not close",
                    region.label
                )));
            }
            current = next;
        }
        rings.push(merge_collinear(ring));
    }

    let mut exterior: Option<(f64, Vec<Vertex>)> = None;
    let mut holes: Vec<Vec<Vertex>> = Vec::new();
    for ring in rings {
        let area = signed_area(&ring);
        if area < 0.0 {
            holes.push(ring);
        } else if exterior.as_ref().is_none_or(|(a, _)| area > *a) {
            exterior = Some((area, ring));
        }
    }

    let (_, exterior) = exterior
        .ok_or_else(|| Error::Algorithm(format!("Region {} has no exterior ring", region.label)))?;

    Ok(RegionOutline {
        polygon: Polygon::new(to_linestring(&exterior), holes.iter().map(|h| to_linestring(h)).collect()),
        horizontal_edges,
        vertical_edges,
    })
}

/// Pick the edge leaving `edge.to`. At a pinch vertex two edges leave;
/// the left turn keeps diagonally touching cells in one ring.
fn next_edge(edges: &[Edge], outgoing: &HashMap<Vertex, Vec<usize>>, edge: Edge) -> Result<usize> {
    let candidates = outgoing
        .get(&edge.to)
        .ok_or_else(|| Error::Algorithm("Dangling boundary edge".into()))?;

    match candidates.as_slice() {
        [only] => Ok(*only),
        many => {
            let (dx, dy) = edge.direction();
            let left = (dy, -dx);
            many.iter()
                .copied()
                .find(|&i| edges[i].direction() == left)
                .ok_or_else(|| Error::Algorithm("Ambiguous boundary vertex".into()))
        }
    }
}

fn merge_collinear(ring: Vec<Vertex>) -> Vec<Vertex> {
    let n = ring.len();
    (0..n)
        .filter(|&i| {
            let prev = ring[(i + n - 1) % n];
            let cur = ring[i];
            let next = ring[(i + 1) % n];
            (cur.0 - prev.0) * (next.1 - cur.1) != (cur.1 - prev.1) * (next.0 - cur.0)
        })
        .map(|i| ring[i])
        .collect()
}

fn signed_area(ring: &[Vertex]) -> f64 {
    let n = ring.len();
    let twice: i64 = (0..n)
        .map(|i| {
            let (x1, y1) = ring[i];
            let (x2, y2) = ring[(i + 1) % n];
            x1 * y2 - x2 * y1
        })
        .sum();
    twice as f64 / 2.0
}

fn to_linestring(ring: &[Vertex]) -> LineString<f64> {
    ring.iter()
        .map(|&(x, y)| Coord { x: x as f64, y: y as f64 })
        .collect()
}
