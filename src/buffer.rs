//! Buffers that do not overlap each other.
//!
//! Every geometry receives the part of a uniform buffer band that is closer
//! to its own vertices than to those of any neighbour. Closeness comes from
//! a Voronoi tessellation of all exterior vertices:
//!
//! 1. optionally move to the local UTM zone, so the distance is in metres
//! 2. band = (union of the buffered geometries) minus (union of the geometries)
//! 3. Voronoi cells of all vertices, clipped to the bounds grown by the distance
//! 4. cut the band with the cells and split the result into single polygons
//! 5. give every piece the identity of the geometry it touches, one per piece
//! 6. merge the pieces of each identity, and move back to the input CRS
//!
//! A piece touching several geometries keeps only one of them, see
//! [`TieBreak`]. Pieces touching none are dropped, which can leave tiny gaps
//! where geometries meet.

use crate::diagnostics::{BufferObserver, LogObserver, Stage};
use crate::errors::{GeoError, Result};
use crate::float_types::{Real, tolerance};
use crate::projection::{CrsTransform, default_transform};
use crate::vector::{Vector, multi_polygon_to_geometry, polygonal_parts, union_all};
use crate::voronoi::{SpadeTessellator, Tessellator, ensure_non_degenerate, generate_voronoi_with_bounds};
use geo::{
    Area, BooleanOps, BoundingRect, Buffer, Centroid, Distance, Euclidean, Geometry, Intersects,
    MultiPolygon, Point, Polygon,
};
use log::{debug, warn};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Which identity a band piece keeps when it touches several geometries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// The geometry that comes first in the input. Cheap, but a piece may
    /// end up with a neighbour slightly farther away.
    #[default]
    FirstMatch,
    /// The geometry closest to the centroid of the piece.
    Nearest,
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieBreak::FirstMatch => f.write_str("first"),
            TieBreak::Nearest => f.write_str("nearest"),
        }
    }
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" | "first-match" => Ok(TieBreak::FirstMatch),
            "nearest" => Ok(TieBreak::Nearest),
            other => Err(format!("unknown tie-break policy '{other}', expected 'first' or 'nearest'")),
        }
    }
}

/// Parameters of [`Vector::buffer_without_overlap_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferOptions {
    /// Buffer distance, in metres when `metric` is set, CRS units otherwise
    pub buffer_size: Real,
    /// Work in the local UTM zone of the vector
    pub metric: bool,
    pub tie_break: TieBreak,
}

impl BufferOptions {
    pub const fn new(buffer_size: Real) -> Self {
        BufferOptions {
            buffer_size,
            metric: true,
            tie_break: TieBreak::FirstMatch,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.buffer_size.is_finite() && self.buffer_size > 0.0 {
            Ok(())
        } else {
            Err(GeoError::InvalidArgument(format!(
                "buffer size must be a positive number, got {}",
                self.buffer_size
            )))
        }
    }
}

/// Collaborators of [`Vector::buffer_without_overlap_with`].
pub struct BufferContext<'a> {
    pub transform: &'a dyn CrsTransform,
    pub tessellator: &'a dyn Tessellator,
    /// Receives the intermediate stages, if any
    pub observer: Option<&'a mut dyn BufferObserver>,
}

impl Default for BufferContext<'_> {
    fn default() -> Self {
        BufferContext {
            transform: default_transform(),
            tessellator: &SpadeTessellator,
            observer: None,
        }
    }
}

impl BufferContext<'_> {
    fn notify(&mut self, stage: Stage, vector: &Vector) {
        if let Some(observer) = self.observer.as_deref_mut() {
            if let Err(e) = observer.observe(stage, vector) {
                warn!("{stage}: observer failed: {e}");
            }
        }
    }
}

impl Vector {
    /// Buffer the geometries without overlapping each other.
    ///
    /// `buffer_size` is in metres when `metric` is set (the vector is buffered
    /// in its local UTM zone), in CRS units otherwise. With `plot`, every
    /// intermediate stage is logged at `info` level. The result holds one
    /// polygon (or multi-polygon) per identity, ordered by identity, in the
    /// CRS of `self`.
    ///
    /// # Example
    /// ```no_run
    /// use geoutils::{Crs, Vector};
    /// use geo::{Rect, coord};
    ///
    /// let squares = Vector::from_polygons(
    ///     [
    ///         Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 }).to_polygon(),
    ///         Rect::new(coord! { x: 15.0, y: 0.0 }, coord! { x: 25.0, y: 10.0 }).to_polygon(),
    ///     ],
    ///     Crs::Epsg(32645),
    /// );
    /// let buffers = squares.buffer_without_overlap(4.0, false, false)?;
    /// assert_eq!(buffers.index(), &[0, 1]);
    /// # Ok::<(), geoutils::GeoError>(())
    /// ```
    pub fn buffer_without_overlap(&self, buffer_size: Real, metric: bool, plot: bool) -> Result<Vector> {
        let options = BufferOptions {
            metric,
            ..BufferOptions::new(buffer_size)
        };
        let mut log = LogObserver;
        let mut context = BufferContext::default();
        if plot {
            context.observer = Some(&mut log);
        }
        self.buffer_without_overlap_with(&options, &mut context)
    }

    /// [`Vector::buffer_without_overlap`] with explicit options and
    /// collaborators.
    pub fn buffer_without_overlap_with(
        &self,
        options: &BufferOptions,
        context: &mut BufferContext<'_>,
    ) -> Result<Vector> {
        options.validate()?;
        if self.is_empty() {
            return Err(GeoError::EmptyCollection);
        }
        if let Some(id) = self.repeated_identity() {
            return Err(GeoError::InvalidArgument(format!(
                "identity {id} labels several geometries, expected one buffer per identity"
            )));
        }
        let buffer_size = options.buffer_size;

        let working = if options.metric {
            let utm = self.local_utm_crs(context.transform)?;
            debug!("buffer_without_overlap: working in {utm}");
            self.reproject(&utm, context.transform)?
        } else {
            self.clone()
        };

        let vertices: Vec<_> = working.extract_vertices()?.into_iter().flatten().collect();
        ensure_non_degenerate(&vertices)?;

        let merged = working.dissolve();
        let reach = union_all(working.geometries().iter().flat_map(|g| g.buffer(buffer_size).0));
        let band = reach.difference(&merged);

        let result = if working.len() == 1 {
            // nothing to share the band with
            let band: Vec<Geometry<Real>> = multi_polygon_to_geometry(band).into_iter().collect();
            let index = working.index()[..band.len()].to_vec();
            Vector::with_index(band, index, working.crs().clone())?
        } else {
            split_band(&working, &band, options, context)?
        };
        context.notify(Stage::Final, &result);

        if options.metric {
            result.reproject(self.crs(), context.transform)
        } else {
            Ok(result)
        }
    }
}

/// Share `band` among the geometries of `working`, one merged geometry per
/// identity.
fn split_band(
    working: &Vector,
    band: &MultiPolygon<Real>,
    options: &BufferOptions,
    context: &mut BufferContext<'_>,
) -> Result<Vector> {
    let bounds = working.bounds().ok_or(GeoError::EmptyCollection)?;
    let bound = bounds.to_polygon().buffer(options.buffer_size);
    let voronoi = generate_voronoi_with_bounds(working, &bound, context.tessellator)?;
    context.notify(Stage::Voronoi, &voronoi);

    let pieces = restrict_to_band(voronoi.geometries(), band);
    let matcher = IdentityMatcher::new(working);
    let matches: Vec<Vec<usize>> = pieces.iter().map(|piece| matcher.matches(piece)).collect();

    if context.observer.is_some() {
        let (geometries, index) = pieces
            .iter()
            .zip(&matches)
            .flat_map(|(piece, hits)| hits.iter().map(move |&pos| (Geometry::Polygon(piece.clone()), pos)))
            .map(|(g, pos)| (g, working.index()[pos]))
            .unzip();
        context.notify(Stage::Duplicated, &Vector::labelled(geometries, index, working.crs().clone()));
    }

    let total = pieces.len();
    let assigned: Vec<(usize, Polygon<Real>)> = pieces
        .into_iter()
        .zip(&matches)
        .filter_map(|(piece, hits)| {
            matcher
                .pick(&piece, hits, options.tie_break)
                .map(|pos| (working.index()[pos], piece))
        })
        .collect();
    if assigned.len() < total {
        debug!(
            "buffer_without_overlap: {} of {total} band pieces touch no geometry and are dropped",
            total - assigned.len()
        );
    }

    if context.observer.is_some() {
        let (index, geometries) = assigned
            .iter()
            .map(|(id, piece)| (*id, Geometry::Polygon(piece.clone())))
            .unzip();
        context.notify(Stage::Deduplicated, &Vector::labelled(geometries, index, working.crs().clone()));
    }

    let mut groups: BTreeMap<usize, Vec<Polygon<Real>>> = BTreeMap::new();
    for (id, piece) in assigned {
        groups.entry(id).or_default().push(piece);
    }
    let (index, geometries): (Vec<usize>, Vec<Geometry<Real>>) = groups
        .into_iter()
        .filter_map(|(id, parts)| multi_polygon_to_geometry(union_all(parts)).map(|g| (id, g)))
        .unzip();
    if index.len() < working.len() {
        warn!(
            "buffer_without_overlap: {} of {} geometries received no buffer",
            working.len() - index.len(),
            working.len()
        );
    }
    Vector::with_index(geometries, index, working.crs().clone())
}

/// Cut `band` with every cell, as single polygons in cell order.
fn restrict_to_band(cells: &[Geometry<Real>], band: &MultiPolygon<Real>) -> Vec<Polygon<Real>> {
    let cut = |cell: &Geometry<Real>| -> Vec<Polygon<Real>> {
        let mut parts = MultiPolygon::new(polygonal_parts(cell)).intersection(band).0;
        parts.retain(|p| p.unsigned_area() > 0.0);
        parts
    };

    #[cfg(feature = "parallel")]
    let pieces: Vec<Polygon<Real>> = cells.par_iter().flat_map_iter(cut).collect();
    #[cfg(not(feature = "parallel"))]
    let pieces: Vec<Polygon<Real>> = cells.iter().flat_map(cut).collect();
    pieces
}

type Envelope = GeomWithData<Rectangle<[Real; 2]>, usize>;

/// Spatial join of band pieces against the original geometries.
struct IdentityMatcher<'v> {
    originals: &'v Vector,
    /// Originals grown by the tolerance, since computed pieces rarely touch
    /// their geometry exactly
    near: Vec<MultiPolygon<Real>>,
    tree: RTree<Envelope>,
}

impl<'v> IdentityMatcher<'v> {
    fn new(originals: &'v Vector) -> Self {
        let near: Vec<MultiPolygon<Real>> = originals
            .geometries()
            .iter()
            .map(|g| g.buffer(tolerance()))
            .collect();
        let envelopes = near
            .iter()
            .enumerate()
            .filter_map(|(pos, grown)| {
                let rect = grown.bounding_rect()?;
                let corners = Rectangle::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
                Some(GeomWithData::new(corners, pos))
            })
            .collect();
        IdentityMatcher {
            originals,
            near,
            tree: RTree::bulk_load(envelopes),
        }
    }

    /// Positions of every original geometry the piece relates to, ascending.
    fn matches(&self, piece: &Polygon<Real>) -> Vec<usize> {
        let Some(rect) = piece.bounding_rect() else {
            return Vec::new();
        };
        let envelope = AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|candidate| candidate.data)
            .filter(|&pos| self.near[pos].intersects(piece))
            .collect();
        hits.sort_unstable();
        hits
    }

    fn pick(&self, piece: &Polygon<Real>, hits: &[usize], tie_break: TieBreak) -> Option<usize> {
        match (tie_break, hits) {
            (_, []) => None,
            (_, [only]) => Some(*only),
            (TieBreak::FirstMatch, [first, ..]) => Some(*first),
            (TieBreak::Nearest, _) => {
                let centroid = piece.centroid()?;
                hits.iter()
                    .copied()
                    .min_by(|&a, &b| self.distance(a, centroid).total_cmp(&self.distance(b, centroid)))
            },
        }
    }

    fn distance(&self, pos: usize, point: Point<Real>) -> Real {
        Euclidean.distance(&self.originals.geometries()[pos], &point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::Crs;
    use geo::{Rect, coord};

    fn square(x: Real, y: Real, size: Real) -> Polygon<Real> {
        Rect::new(coord! { x: x, y: y }, coord! { x: x + size, y: y + size }).to_polygon()
    }

    #[test]
    fn invalid_sizes_are_rejected() {
        let vector = Vector::from_polygons([square(0.0, 0.0, 1.0)], Crs::Epsg(32630));
        for size in [0.0, -1.0, Real::NAN, Real::INFINITY] {
            let err = vector.buffer_without_overlap(size, false, false).unwrap_err();
            assert!(matches!(err, GeoError::InvalidArgument(_)), "{size}");
        }
    }

    #[test]
    fn empty_vector_is_rejected() {
        let empty = Vector::new(vec![], Crs::Epsg(32630));
        assert!(matches!(
            empty.buffer_without_overlap(1.0, false, false),
            Err(GeoError::EmptyCollection)
        ));
    }

    #[test]
    fn repeated_identities_are_rejected() {
        // explode keeps the identity of every part
        let parts = MultiPolygon::new(vec![square(0.0, 0.0, 10.0), square(15.0, 0.0, 10.0)]);
        let vector = Vector::new(vec![Geometry::MultiPolygon(parts)], Crs::Epsg(32630)).explode();
        assert_eq!(vector.index(), &[0, 0]);
        assert!(matches!(
            vector.buffer_without_overlap(4.0, false, false),
            Err(GeoError::InvalidArgument(_))
        ));
    }

    #[test]
    fn single_geometry_gets_the_whole_band() {
        let vector = Vector::from_polygons([square(0.0, 0.0, 2.0)], Crs::Epsg(32630));
        let buffered = vector.buffer_without_overlap(1.0, false, false).unwrap();
        assert_eq!(buffered.index(), &[0]);
        let expected = vector.buffer(1.0).geometries()[0].unsigned_area() - 4.0;
        let area = buffered.geometries()[0].unsigned_area();
        assert!((area - expected).abs() < 1e-6, "{area} vs {expected}");
    }

    #[test]
    fn tie_break_parsing() {
        assert_eq!("first".parse::<TieBreak>(), Ok(TieBreak::FirstMatch));
        assert_eq!("Nearest".parse::<TieBreak>(), Ok(TieBreak::Nearest));
        assert!("closest".parse::<TieBreak>().is_err());
        assert_eq!(TieBreak::Nearest.to_string(), "nearest");
    }

    #[test]
    fn nearest_prefers_the_closer_geometry() {
        // a piece touching both squares, but sitting against the right one
        let vector = Vector::from_polygons([square(0.0, 0.0, 1.0), square(2.0, 0.0, 1.0)], Crs::Epsg(32630));
        let matcher = IdentityMatcher::new(&vector);
        let piece = square(1.0, 0.0, 1.0);
        let sliver = Polygon::new(
            geo::LineString::from(vec![(1.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.9, 1.0), (1.0, 0.0)]),
            vec![],
        );

        assert_eq!(matcher.matches(&piece), vec![0, 1]);
        assert_eq!(matcher.pick(&piece, &[0, 1], TieBreak::FirstMatch), Some(0));
        assert_eq!(matcher.pick(&sliver, &[0, 1], TieBreak::Nearest), Some(1));
        assert_eq!(matcher.pick(&piece, &[], TieBreak::Nearest), None);
    }

    #[test]
    fn far_pieces_match_nothing() {
        let vector = Vector::from_polygons([square(0.0, 0.0, 1.0)], Crs::Epsg(32630));
        let matcher = IdentityMatcher::new(&vector);
        assert!(matcher.matches(&square(5.0, 5.0, 1.0)).is_empty());
    }
}
