//! `Vector`: an ordered, CRS-tagged collection of geometries

use crate::crs::{Crs, latlon_to_utm, utm_to_epsg};
use crate::errors::{GeoError, Result};
use crate::float_types::Real;
use crate::projection::{CrsTransform, transform_geometry};
use geo::{
    BooleanOps, BoundingRect, Centroid, Coord, Geometry, GeometryCollection, Intersects,
    LineString, MultiLineString, MultiPoint, MultiPolygon, Polygon, Rect, coord,
};
use std::collections::BTreeSet;
use std::sync::OnceLock;

pub mod offset;
pub mod vertices;

pub use vertices::extract_vertices;

/// A georeferenced vector: geometries sharing one [`Crs`], each carrying an
/// integer identity in `index` (its position when the vector was created).
#[derive(Debug, Clone)]
pub struct Vector {
    geometries: Vec<Geometry<Real>>,
    index: Vec<usize>,
    crs: Crs,

    /// Lazily calculated total bounds of `geometries`.
    bounds: OnceLock<Option<Rect<Real>>>,
}

impl PartialEq for Vector {
    fn eq(&self, other: &Self) -> bool {
        self.crs == other.crs && self.index == other.index && self.geometries == other.geometries
    }
}

impl Vector {
    /// Build a vector whose identities are the positions `0..n`.
    pub fn new(geometries: Vec<Geometry<Real>>, crs: Crs) -> Self {
        let index = (0..geometries.len()).collect();
        Vector {
            geometries,
            index,
            crs,
            bounds: OnceLock::new(),
        }
    }

    /// Build a vector with explicit identities, one distinct label per
    /// geometry.
    pub fn with_index(geometries: Vec<Geometry<Real>>, index: Vec<usize>, crs: Crs) -> Result<Self> {
        if geometries.len() != index.len() {
            return Err(GeoError::InvalidArgument(format!(
                "{} geometries but {} index labels",
                geometries.len(),
                index.len()
            )));
        }
        let vector = Vector::labelled(geometries, index, crs);
        match vector.repeated_identity() {
            Some(id) => Err(GeoError::InvalidArgument(format!("index label {id} is used more than once"))),
            None => Ok(vector),
        }
    }

    /// Several geometries may share a label here: parts of an exploded
    /// geometry, or band pieces before they are dissolved.
    pub(crate) const fn labelled(geometries: Vec<Geometry<Real>>, index: Vec<usize>, crs: Crs) -> Self {
        Vector {
            geometries,
            index,
            crs,
            bounds: OnceLock::new(),
        }
    }

    /// The first identity carried by more than one geometry, if any.
    pub fn repeated_identity(&self) -> Option<usize> {
        let mut seen = BTreeSet::new();
        self.index.iter().copied().find(|&id| !seen.insert(id))
    }

    /// Build a vector of polygons, identities `0..n`.
    pub fn from_polygons(polygons: impl IntoIterator<Item = Polygon<Real>>, crs: Crs) -> Self {
        Vector::new(polygons.into_iter().map(Geometry::Polygon).collect(), crs)
    }

    pub fn geometries(&self) -> &[Geometry<Real>] {
        &self.geometries
    }

    pub fn index(&self) -> &[usize] {
        &self.index
    }

    pub const fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// Iterate over `(identity, geometry)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Geometry<Real>)> + '_ {
        self.index.iter().copied().zip(self.geometries.iter())
    }

    /// Geometry carrying the identity `id`, if any.
    pub fn get(&self, id: usize) -> Option<&Geometry<Real>> {
        self.iter().find(|(i, _)| *i == id).map(|(_, g)| g)
    }

    /// Every polygon of the vector, multi-polygons flattened, with the
    /// identity of the geometry it came from.
    pub fn polygons(&self) -> Vec<(usize, Polygon<Real>)> {
        self.iter()
            .flat_map(|(id, geometry)| polygonal_parts(geometry).into_iter().map(move |p| (id, p)))
            .collect()
    }

    /// Total bounds of all geometries, `None` when the vector is empty.
    pub fn bounds(&self) -> Option<Rect<Real>> {
        *self.bounds.get_or_init(|| {
            self.geometries
                .iter()
                .filter_map(|g| g.bounding_rect())
                .reduce(|a, b| {
                    Rect::new(
                        coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                        coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
                    )
                })
        })
    }

    /// Keep the geometries intersecting `bounds`. With `clip`, the kept
    /// geometries are also cut to the rectangle.
    pub fn crop(&self, bounds: Rect<Real>, clip: bool) -> Vector {
        let mut geometries = Vec::new();
        let mut index = Vec::new();
        for (id, geometry) in self.iter() {
            if !geometry.intersects(&bounds) {
                continue;
            }
            let kept = if clip {
                clip_to_rect(geometry, &bounds)
            } else {
                Some(geometry.clone())
            };
            if let Some(kept) = kept {
                geometries.push(kept);
                index.push(id);
            }
        }
        Vector {
            geometries,
            index,
            crs: self.crs.clone(),
            bounds: OnceLock::new(),
        }
    }

    /// Crop to the bounds of another vector, reprojected into this CRS.
    pub fn crop_to(&self, other: &Vector, clip: bool, transform: &dyn CrsTransform) -> Result<Vector> {
        let bounds = other.get_bounds_projected(&self.crs, 5000, transform)?;
        Ok(self.crop(bounds, clip))
    }

    /// Reproject every geometry into `dst_crs`.
    pub fn reproject(&self, dst_crs: &Crs, transform: &dyn CrsTransform) -> Result<Vector> {
        if *dst_crs == self.crs {
            return Ok(self.clone());
        }
        let operation = transform.operation(&self.crs, dst_crs)?;
        let geometries = self
            .geometries
            .iter()
            .map(|g| transform_geometry(g, &operation))
            .collect::<Result<Vec<_>>>()?;
        Ok(Vector {
            geometries,
            index: self.index.clone(),
            crs: dst_crs.clone(),
            bounds: OnceLock::new(),
        })
    }

    /// Bounds of the vector expressed in `out_crs`.
    ///
    /// Every edge of the bounding rectangle is densified with `densify_pts`
    /// intermediate points before projecting, so curved edges in the target
    /// CRS are accounted for.
    pub fn get_bounds_projected(
        &self,
        out_crs: &Crs,
        densify_pts: usize,
        transform: &dyn CrsTransform,
    ) -> Result<Rect<Real>> {
        let bounds = self.bounds().ok_or(GeoError::EmptyCollection)?;
        if *out_crs == self.crs {
            return Ok(bounds);
        }
        let operation = transform.operation(&self.crs, out_crs)?;

        let (min, max) = (bounds.min(), bounds.max());
        let corners = [
            min,
            coord! { x: max.x, y: min.y },
            max,
            coord! { x: min.x, y: max.y },
        ];
        let steps = densify_pts + 1;
        let mut envelope: Option<Rect<Real>> = None;
        for (i, start) in corners.iter().enumerate() {
            let end = corners[(i + 1) % corners.len()];
            for step in 0..steps {
                let t = step as Real / steps as Real;
                let point = operation(coord! {
                    x: start.x + (end.x - start.x) * t,
                    y: start.y + (end.y - start.y) * t,
                })?;
                envelope = Some(match envelope {
                    None => Rect::new(point, point),
                    Some(r) => Rect::new(
                        coord! { x: r.min().x.min(point.x), y: r.min().y.min(point.y) },
                        coord! { x: r.max().x.max(point.x), y: r.max().y.max(point.y) },
                    ),
                });
            }
        }
        envelope.ok_or(GeoError::EmptyCollection)
    }

    /// A one-polygon vector covering the bounds of `vector` in `out_crs`
    /// (the CRS of `vector` when `None`).
    pub fn from_bounds_projected(
        vector: &Vector,
        out_crs: Option<&Crs>,
        densify_pts: usize,
        transform: &dyn CrsTransform,
    ) -> Result<Vector> {
        let out_crs = out_crs.unwrap_or(&vector.crs);
        let bounds = vector.get_bounds_projected(out_crs, densify_pts, transform)?;
        Ok(Vector::from_polygons([bounds.to_polygon()], out_crs.clone()))
    }

    /// Rough centroid of the whole vector as `(longitude, latitude)`.
    ///
    /// The planar centroid is computed in the vector's own CRS and then
    /// reprojected, so it is only indicative for vectors spanning large
    /// extents or the antimeridian.
    pub fn geographic_centroid(&self, transform: &dyn CrsTransform) -> Result<Coord<Real>> {
        let centroid = GeometryCollection(self.geometries.clone())
            .centroid()
            .ok_or(GeoError::EmptyCollection)?;
        transform.convert(&self.crs, &Crs::wgs84(), centroid.0)
    }

    /// The WGS84 / UTM zone containing the rough centroid of the vector.
    pub fn local_utm_crs(&self, transform: &dyn CrsTransform) -> Result<Crs> {
        let lonlat = self.geographic_centroid(transform).map_err(|e| match e {
            GeoError::UnsupportedCrs(crs) => GeoError::MetricUnavailable(crs),
            other => other,
        })?;
        let zone = latlon_to_utm(lonlat.y, lonlat.x)?;
        Ok(Crs::Epsg(utm_to_epsg(&zone)?))
    }

    /// Union of all polygonal geometries into one multi-polygon.
    pub fn dissolve(&self) -> MultiPolygon<Real> {
        union_all(self.polygons().into_iter().map(|(_, p)| p))
    }

    /// Split multi-part geometries into single parts, keeping their identity.
    pub fn explode(&self) -> Vector {
        let mut geometries = Vec::new();
        let mut index = Vec::new();
        for (id, geometry) in self.iter() {
            for part in single_parts(geometry) {
                geometries.push(part);
                index.push(id);
            }
        }
        Vector::labelled(geometries, index, self.crs.clone())
    }
}

/// Name of a geometry kind, as used in error messages.
pub const fn geometry_kind(geometry: &Geometry<Real>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Polygons making up the areal part of a geometry (empty for points and lines).
pub fn polygonal_parts(geometry: &Geometry<Real>) -> Vec<Polygon<Real>> {
    match geometry {
        Geometry::Polygon(p) => vec![p.clone()],
        Geometry::MultiPolygon(mp) => mp.0.clone(),
        Geometry::Rect(r) => vec![r.to_polygon()],
        Geometry::Triangle(t) => vec![t.to_polygon()],
        Geometry::GeometryCollection(gc) => gc.iter().flat_map(polygonal_parts).collect(),
        _ => Vec::new(),
    }
}

/// Wrap a multi-polygon as a geometry, unwrapping the single-part case.
pub fn multi_polygon_to_geometry(mut mp: MultiPolygon<Real>) -> Option<Geometry<Real>> {
    match mp.0.len() {
        0 => None,
        1 => mp.0.pop().map(Geometry::Polygon),
        _ => Some(Geometry::MultiPolygon(mp)),
    }
}

/// Union of polygons, merged pairwise so each boolean operation sees
/// operands of similar size.
pub fn union_all<I>(polygons: I) -> MultiPolygon<Real>
where
    I: IntoIterator<Item = Polygon<Real>>,
{
    let mut layer: Vec<MultiPolygon<Real>> = polygons
        .into_iter()
        .map(|p| MultiPolygon::new(vec![p]))
        .collect();

    while layer.len() > 1 {
        let mut next = Vec::with_capacity(layer.len() / 2 + 1);
        let mut parts = layer.into_iter();
        while let Some(a) = parts.next() {
            match parts.next() {
                Some(b) => next.push(a.union(&b)),
                None => next.push(a),
            }
        }
        layer = next;
    }
    layer.pop().unwrap_or_else(|| MultiPolygon::new(vec![]))
}

fn single_parts(geometry: &Geometry<Real>) -> Vec<Geometry<Real>> {
    match geometry {
        Geometry::MultiPolygon(mp) => mp.iter().cloned().map(Geometry::Polygon).collect(),
        Geometry::MultiLineString(mls) => mls.iter().cloned().map(Geometry::LineString).collect(),
        Geometry::MultiPoint(mp) => mp.iter().copied().map(Geometry::Point).collect(),
        Geometry::GeometryCollection(gc) => gc.iter().flat_map(single_parts).collect(),
        other => vec![other.clone()],
    }
}

fn clip_to_rect(geometry: &Geometry<Real>, rect: &Rect<Real>) -> Option<Geometry<Real>> {
    let window = rect.to_polygon();
    match geometry {
        Geometry::Polygon(_)
        | Geometry::MultiPolygon(_)
        | Geometry::Rect(_)
        | Geometry::Triangle(_) => {
            let areal = MultiPolygon::new(polygonal_parts(geometry));
            multi_polygon_to_geometry(areal.intersection(&window))
        },
        Geometry::Line(line) => clip_lines(&window, MultiLineString::new(vec![LineString::from(*line)])),
        Geometry::LineString(ls) => clip_lines(&window, MultiLineString::new(vec![ls.clone()])),
        Geometry::MultiLineString(mls) => clip_lines(&window, mls.clone()),
        Geometry::Point(p) => rect.intersects(p).then(|| Geometry::Point(*p)),
        Geometry::MultiPoint(mp) => {
            let inside: Vec<_> = mp.iter().filter(|p| rect.intersects(*p)).copied().collect();
            match inside.len() {
                0 => None,
                1 => Some(Geometry::Point(inside[0])),
                _ => Some(Geometry::MultiPoint(MultiPoint::new(inside))),
            }
        },
        Geometry::GeometryCollection(gc) => {
            let members: Vec<_> = gc.iter().filter_map(|g| clip_to_rect(g, rect)).collect();
            (!members.is_empty()).then(|| Geometry::GeometryCollection(GeometryCollection(members)))
        },
    }
}

fn clip_lines(window: &Polygon<Real>, lines: MultiLineString<Real>) -> Option<Geometry<Real>> {
    let mut clipped = window.clip(&lines, false);
    clipped.0.retain(|ls| ls.0.len() > 1);
    match clipped.0.len() {
        0 => None,
        1 => clipped.0.pop().map(Geometry::LineString),
        _ => Some(Geometry::MultiLineString(clipped)),
    }
}
