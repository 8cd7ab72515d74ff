//! Exterior vertices of polygonal and linear geometries

use super::{Vector, geometry_kind};
use crate::errors::{GeoError, Result};
use crate::float_types::Real;
use geo::{Coord, Geometry};

/// Extract the exterior vertices of every geometry.
///
/// Returns one coordinate list per exterior ring or line, in input order:
/// - **Polygon**: its exterior ring
/// - **MultiPolygon**: the exterior ring of every member (holes are ignored)
/// - **LineString**: the line itself
/// - **MultiLineString**: every member line
///
/// Any other kind fails with [`GeoError::UnsupportedGeometry`].
pub fn extract_vertices(geometries: &[Geometry<Real>]) -> Result<Vec<Vec<Coord<Real>>>> {
    let mut vertices = Vec::new();
    for (index, geometry) in geometries.iter().enumerate() {
        match geometry {
            Geometry::Polygon(polygon) => vertices.push(polygon.exterior().0.clone()),
            Geometry::MultiPolygon(mp) => {
                vertices.extend(mp.iter().map(|polygon| polygon.exterior().0.clone()))
            },
            Geometry::LineString(ls) => vertices.push(ls.0.clone()),
            Geometry::MultiLineString(mls) => vertices.extend(mls.iter().map(|ls| ls.0.clone())),
            other => {
                return Err(GeoError::UnsupportedGeometry {
                    index,
                    kind: geometry_kind(other),
                });
            },
        }
    }
    Ok(vertices)
}

impl Vector {
    /// Exterior vertices of every geometry, see [`extract_vertices`].
    pub fn extract_vertices(&self) -> Result<Vec<Vec<Coord<Real>>>> {
        extract_vertices(self.geometries())
    }
}
