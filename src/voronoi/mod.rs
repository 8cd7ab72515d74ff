//! Voronoi tessellation of geometry vertices.
//!
//! The tessellation itself is delegated to a [`Tessellator`], which reports
//! the diagram as ridges between pairs of sites. A ridge running off to
//! infinity has a `None` endpoint. Cells are rebuilt here from the bounded
//! ridges only: every site whose ridges are all finite gets a closed, convex
//! cell.

use crate::errors::{GeoError, Result};
use crate::float_types::{Real, tolerance};
use crate::vector::Vector;
use geo::{Area, Coord, LineString, Polygon};

pub mod bounded;
pub mod spade;

pub use bounded::generate_voronoi_with_bounds;
pub use self::spade::SpadeTessellator;

/// A ridge (edge) of a Voronoi diagram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ridge {
    /// Indices into [`Tessellation::sites`] of the two sites this ridge separates
    pub sites: [usize; 2],
    /// Endpoints of the ridge, `None` for the end extending to infinity
    pub vertices: [Option<Coord<Real>>; 2],
}

impl Ridge {
    pub const fn is_bounded(&self) -> bool {
        self.vertices[0].is_some() && self.vertices[1].is_some()
    }
}

/// Voronoi diagram of a point set, as sites and the ridges between them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tessellation {
    /// Distinct input points
    pub sites: Vec<Coord<Real>>,
    pub ridges: Vec<Ridge>,
}

/// Capability to compute the Voronoi diagram of a 2D point set.
pub trait Tessellator {
    /// Tessellate `points`. Duplicated points may be merged into one site.
    fn tessellate(&self, points: &[Coord<Real>]) -> Result<Tessellation>;
}

/// Closed cells of a tessellation, with the index of their site.
///
/// A site touching any unbounded ridge is skipped, as are cells collapsing
/// to fewer than three distinct corners.
pub fn closed_cells(tessellation: &Tessellation) -> Vec<(usize, Polygon<Real>)> {
    let n = tessellation.sites.len();
    let mut open = vec![false; n];
    let mut corners: Vec<Vec<Coord<Real>>> = vec![Vec::new(); n];

    for ridge in &tessellation.ridges {
        for site in ridge.sites.into_iter().filter(|&site| site < n) {
            match ridge.vertices {
                [Some(a), Some(b)] => corners[site].extend([a, b]),
                _ => open[site] = true,
            }
        }
    }

    (0..n)
        .filter(|&site| !open[site])
        .filter_map(|site| cell_polygon(tessellation.sites[site], &corners[site]).map(|p| (site, p)))
        .collect()
}

/// Voronoi cells are convex and contain their site, so sorting the corners by
/// angle around the site yields the ring.
fn cell_polygon(site: Coord<Real>, corners: &[Coord<Real>]) -> Option<Polygon<Real>> {
    let tol = tolerance();
    let same = |a: &Coord<Real>, b: &Coord<Real>| (a.x - b.x).abs() <= tol && (a.y - b.y).abs() <= tol;

    let mut ring: Vec<(Real, Coord<Real>)> = corners
        .iter()
        .map(|c| ((c.y - site.y).atan2(c.x - site.x), *c))
        .collect();
    ring.sort_by(|a, b| a.0.total_cmp(&b.0));
    ring.dedup_by(|a, b| same(&a.1, &b.1));
    if ring.len() > 1 && same(&ring[0].1, &ring[ring.len() - 1].1) {
        ring.pop();
    }
    if ring.len() < 3 {
        return None;
    }

    let polygon = Polygon::new(LineString::from(ring.into_iter().map(|(_, c)| c).collect::<Vec<_>>()), vec![]);
    (polygon.unsigned_area() > tol * tol).then_some(polygon)
}

/// Fail unless the points span a 2D area: at least three distinct,
/// non-collinear points.
pub fn ensure_non_degenerate(points: &[Coord<Real>]) -> Result<()> {
    let tol = tolerance();
    let first = *points
        .first()
        .ok_or_else(|| GeoError::DegenerateGeometry("no vertices to tessellate".into()))?;
    let second = points
        .iter()
        .find(|p| (p.x - first.x).hypot(p.y - first.y) > tol)
        .copied()
        .ok_or_else(|| GeoError::DegenerateGeometry("fewer than 3 distinct vertices".into()))?;

    let direction = second - first;
    let length = direction.x.hypot(direction.y);
    let off_line = points.iter().any(|p| {
        let offset = *p - first;
        (direction.x * offset.y - direction.y * offset.x).abs() / length > tol
    });
    if off_line {
        Ok(())
    } else {
        Err(GeoError::DegenerateGeometry("all vertices are collinear".into()))
    }
}

/// Finite Voronoi cells of all exterior vertices of `vector`.
///
/// Vertices on the convex hull of the point set have unbounded cells and do
/// not contribute. The cells carry the CRS of `vector` but no identity.
pub fn generate_voronoi_polygons(vector: &Vector, tessellator: &dyn Tessellator) -> Result<Vector> {
    let points: Vec<Coord<Real>> = vector.extract_vertices()?.into_iter().flatten().collect();
    ensure_non_degenerate(&points)?;

    let tessellation = tessellator.tessellate(&points)?;
    let cells = closed_cells(&tessellation);
    if cells.is_empty() {
        return Err(GeoError::DegenerateGeometry(format!(
            "no closed cell among {} sites",
            tessellation.sites.len()
        )));
    }
    Ok(Vector::from_polygons(cells.into_iter().map(|(_, cell)| cell), vector.crs().clone()))
}
