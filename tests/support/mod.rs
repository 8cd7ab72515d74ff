//! Test support library
//! Provides builders for simple geometries and a few geometric checks.
#![allow(dead_code)]

use geo::{Area, BooleanOps, Geometry, Intersects, MultiPolygon, Polygon, Rect, coord};
use geoutils::{Crs, Vector, float_types::Real};

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Axis-aligned square with its lower-left corner at `(x, y)`.
pub fn square(x: Real, y: Real, size: Real) -> Polygon<Real> {
    Rect::new(coord! { x: x, y: y }, coord! { x: x + size, y: y + size }).to_polygon()
}

/// Axis-aligned square centred on `(cx, cy)`.
pub fn centered_square(cx: Real, cy: Real, size: Real) -> Polygon<Real> {
    square(cx - size / 2.0, cy - size / 2.0, size)
}

/// A vector of polygons in a projected (metric) CRS.
pub fn planar(polygons: impl IntoIterator<Item = Polygon<Real>>) -> Vector {
    Vector::from_polygons(polygons, Crs::Epsg(32645))
}

/// Every polygon of a geometry.
pub fn parts(geometry: &Geometry<Real>) -> MultiPolygon<Real> {
    match geometry {
        Geometry::Polygon(p) => MultiPolygon::new(vec![p.clone()]),
        Geometry::MultiPolygon(mp) => mp.clone(),
        other => panic!("expected a polygonal geometry, got {other:?}"),
    }
}

/// Largest pairwise overlap area among the geometries of `vector`.
pub fn max_overlap(vector: &Vector) -> Real {
    let all: Vec<MultiPolygon<Real>> = vector.geometries().iter().map(parts).collect();
    let mut worst: Real = 0.0;
    for (i, a) in all.iter().enumerate() {
        for b in &all[i + 1..] {
            if a.intersects(b) {
                worst = worst.max(a.intersection(b).unsigned_area());
            }
        }
    }
    worst
}

/// Sum of the areas of all geometries of `vector`.
pub fn total_area(vector: &Vector) -> Real {
    vector.geometries().iter().map(|g| g.unsigned_area()).sum()
}

/// Fail unless no two geometries of `vector` overlap by more than a
/// millionth of the total area (boolean operations snap to a grid).
pub fn assert_no_overlap(vector: &Vector) {
    let overlap = max_overlap(vector);
    let limit = 1e-6 * total_area(vector);
    assert!(overlap <= limit, "buffers overlap by {overlap} (limit {limit})");
}
