//! Voronoi diagrams via the dual of `spade`'s Delaunay triangulation.

use super::{Ridge, Tessellation, Tessellator};
use crate::errors::{GeoError, Result};
use crate::float_types::Real;
use geo::Coord;
use spade::{DelaunayTriangulation, Point2, Triangulation};

/// The default [`Tessellator`], backed by an incremental Delaunay
/// triangulation.
///
/// Duplicated points collapse into a single site. A Voronoi vertex is the
/// circumcenter of an inner Delaunay face; vertices of the outer face are
/// reported as `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpadeTessellator;

impl Tessellator for SpadeTessellator {
    fn tessellate(&self, points: &[Coord<Real>]) -> Result<Tessellation> {
        let mut triangulation: DelaunayTriangulation<Point2<Real>> = DelaunayTriangulation::new();
        for point in points {
            triangulation
                .insert(Point2::new(point.x, point.y))
                .map_err(|e| {
                    GeoError::Tessellation(format!("cannot insert ({}, {}): {e:?}", point.x, point.y))
                })?;
        }

        let sites = triangulation
            .vertices()
            .map(|vertex| to_coord(vertex.position()))
            .collect();

        let ridges = triangulation
            .undirected_voronoi_edges()
            .map(|edge| {
                let [a, b] = edge.as_delaunay_edge().vertices();
                let [from, to] = edge.vertices();
                Ridge {
                    sites: [a.fix().index(), b.fix().index()],
                    vertices: [from.position().map(to_coord), to.position().map(to_coord)],
                }
            })
            .collect();

        Ok(Tessellation { sites, ridges })
    }
}

fn to_coord(p: Point2<Real>) -> Coord<Real> {
    Coord { x: p.x, y: p.y }
}
