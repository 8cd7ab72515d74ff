//! Voronoi cells clipped to a bounding region, with the uncovered remainder
//! returned as extra pieces.

use super::{Tessellator, closed_cells, ensure_non_degenerate};
use crate::errors::{GeoError, Result};
use crate::float_types::Real;
use crate::vector::{Vector, union_all};
use geo::{Area, BooleanOps, BoundingRect, Coord, MultiPolygon, Polygon, Rect, coord};
use log::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How far the frame sites sit from the center, in multiples of the
/// largest extent of the region to tessellate.
const FRAME_REACH: Real = 4.0;

/// Voronoi cells of the exterior vertices of `vector`, clipped to `bound`.
///
/// Eight frame sites are added far outside `bound` before tessellating, so
/// every input vertex (hull vertices included) gets a closed cell. Cells of
/// frame sites are dropped. The clipped cells are returned one polygon per
/// geometry; whatever part of `bound` they leave uncovered is appended as
/// further polygons, so the result always tiles `bound`.
///
/// The gap area is computed in the units of the vector's CRS, which is
/// unreliable for geographic coordinates.
pub fn generate_voronoi_with_bounds(
    vector: &Vector,
    bound: &MultiPolygon<Real>,
    tessellator: &dyn Tessellator,
) -> Result<Vector> {
    let mut points: Vec<Coord<Real>> = vector.extract_vertices()?.into_iter().flatten().collect();
    ensure_non_degenerate(&points)?;

    let envelope = bound
        .bounding_rect()
        .ok_or_else(|| GeoError::InvalidArgument("empty bounding polygon".into()))?;
    let frame = frame_sites(&envelope, &points);
    points.extend_from_slice(&frame);

    let tessellation = tessellator.tessellate(&points)?;
    let cells: Vec<Polygon<Real>> = closed_cells(&tessellation)
        .into_iter()
        .filter(|(site, _)| !frame.contains(&tessellation.sites[*site]))
        .map(|(_, cell)| cell)
        .collect();
    if cells.is_empty() {
        return Err(GeoError::DegenerateGeometry(format!(
            "no closed cell among {} sites",
            tessellation.sites.len()
        )));
    }

    #[cfg(feature = "parallel")]
    let clipped: Vec<Polygon<Real>> = cells
        .par_iter()
        .flat_map_iter(|cell| cell.intersection(bound).0)
        .collect();
    #[cfg(not(feature = "parallel"))]
    let clipped: Vec<Polygon<Real>> = cells
        .iter()
        .flat_map(|cell| cell.intersection(bound).0)
        .collect();

    let covered = union_all(clipped.iter().cloned());
    let gaps = bound.difference(&covered);
    let gap_area = gaps.unsigned_area();
    if vector.crs().is_geographic() {
        warn!(
            "voronoi: gap area {gap_area} is measured in degrees for {}, results may be inaccurate",
            vector.crs()
        );
    }
    debug!(
        "voronoi: {} cells clipped into {} pieces, gap area {gap_area}",
        cells.len(),
        clipped.len()
    );

    let mut pieces = clipped;
    if gap_area > 0.0 {
        pieces.extend(gaps.0);
    }
    Ok(Vector::from_polygons(pieces, vector.crs().clone()))
}

/// Corners and edge midpoints of a square around both `envelope` and the
/// points, far enough away that no frame cell reaches into them.
fn frame_sites(envelope: &Rect<Real>, points: &[Coord<Real>]) -> [Coord<Real>; 8] {
    let (mut min, mut max) = (envelope.min(), envelope.max());
    for p in points {
        min = coord! { x: min.x.min(p.x), y: min.y.min(p.y) };
        max = coord! { x: max.x.max(p.x), y: max.y.max(p.y) };
    }
    let center = coord! { x: (min.x + max.x) / 2.0, y: (min.y + max.y) / 2.0 };
    let reach = FRAME_REACH * (max.x - min.x).max(max.y - min.y);

    let site = |dx: Real, dy: Real| coord! { x: center.x + dx * reach, y: center.y + dy * reach };
    [
        site(-1.0, -1.0),
        site(0.0, -1.0),
        site(1.0, -1.0),
        site(1.0, 0.0),
        site(1.0, 1.0),
        site(0.0, 1.0),
        site(-1.0, 1.0),
        site(-1.0, 0.0),
    ]
}
