mod support;

use geo::{Area, Geometry, LineString, Rect, coord};
use geoutils::float_types::tolerance;
use geoutils::projection::{CrsTransform, UtmProjection, default_transform};
use geoutils::{Crs, GeoError, Vector, latlon_to_utm, utm_to_epsg};
use support::{approx_eq, square};

/// A couple of fields around Kathmandu, in WGS84.
fn kathmandu() -> Vector {
    Vector::new(
        vec![
            Geometry::Polygon(
                Rect::new(coord! { x: 85.30, y: 27.70 }, coord! { x: 85.32, y: 27.72 }).to_polygon(),
            ),
            Geometry::LineString(LineString::from(vec![(85.33, 27.70), (85.35, 27.73)])),
        ],
        Crs::wgs84(),
    )
}

#[test]
fn reprojection_round_trip_is_lossless() {
    let vector = kathmandu();
    let utm = Crs::utm(45, true).unwrap();
    let there = vector.reproject(&utm, &UtmProjection).unwrap();
    assert_eq!(there.crs(), &utm);
    let back = there.reproject(&Crs::wgs84(), &UtmProjection).unwrap();

    for (a, b) in vector.geometries().iter().zip(back.geometries()) {
        let pairs = match (a, b) {
            (Geometry::Polygon(a), Geometry::Polygon(b)) => {
                a.exterior().coords().zip(b.exterior().coords()).collect::<Vec<_>>()
            },
            (Geometry::LineString(a), Geometry::LineString(b)) => a.coords().zip(b.coords()).collect(),
            other => panic!("geometry kind changed: {other:?}"),
        };
        for (p, q) in pairs {
            assert!(approx_eq(p.x, q.x, tolerance()) && approx_eq(p.y, q.y, tolerance()), "{p:?} -> {q:?}");
        }
    }
}

#[test]
fn same_crs_reprojection_is_a_clone() {
    let vector = kathmandu();
    assert_eq!(vector.reproject(&Crs::wgs84(), &UtmProjection).unwrap(), vector);
}

#[test]
fn local_utm_of_kathmandu_is_45n() {
    let vector = kathmandu();
    assert_eq!(vector.local_utm_crs(&UtmProjection).unwrap(), Crs::Epsg(32645));
    assert_eq!(latlon_to_utm(27.7, 85.3).unwrap(), "45N");
    assert_eq!(utm_to_epsg("45N").unwrap(), 32645);
    assert_eq!(utm_to_epsg("19S").unwrap(), 32719);
}

#[test]
fn projected_bounds_enclose_every_vertex() {
    let vector = kathmandu();
    let utm = Crs::Epsg(32645);
    let bounds = vector.get_bounds_projected(&utm, 50, &UtmProjection).unwrap();
    let projected = vector.reproject(&utm, &UtmProjection).unwrap();
    let exact = projected.bounds().unwrap();

    assert!(bounds.min().x <= exact.min().x + 1e-6 && bounds.min().y <= exact.min().y + 1e-6);
    assert!(bounds.max().x >= exact.max().x - 1e-6 && bounds.max().y >= exact.max().y - 1e-6);
    // roughly 5 km x 3.4 km, the grid is rotated against the meridians
    assert!(approx_eq(bounds.width(), 4_975.0, 50.0), "width {}", bounds.width());
    assert!(approx_eq(bounds.height(), 3_391.0, 50.0), "height {}", bounds.height());

    let polygon = Vector::from_bounds_projected(&vector, Some(&utm), 50, &UtmProjection).unwrap();
    assert_eq!(polygon.len(), 1);
    assert_eq!(polygon.crs(), &utm);
    let area = bounds.width() * bounds.height();
    assert!(approx_eq(polygon.geometries()[0].unsigned_area(), area, 1e-6 * area));
}

#[test]
fn crop_to_another_crs() {
    let vector = kathmandu();
    let window = Vector::from_polygons(
        [Rect::new(coord! { x: 330_000.0, y: 3_064_000.0 }, coord! { x: 332_500.0, y: 3_067_000.0 }).to_polygon()],
        Crs::Epsg(32645),
    );
    let cropped = vector.crop_to(&window, false, &UtmProjection).unwrap();
    assert_eq!(cropped.index(), &[0]);
    assert_eq!(cropped.crs(), &Crs::wgs84());
}

#[test]
fn metric_buffer_of_a_line() {
    let vector = kathmandu();
    let buffered = vector.buffer_metric(100.0, default_transform()).unwrap();
    assert_eq!(buffered.crs(), &Crs::wgs84());
    assert_eq!(buffered.index(), &[0, 1]);
    assert!(matches!(buffered.geometries()[1], Geometry::MultiPolygon(_)));
}

#[test]
fn unsupported_crs_pairs() {
    let vector = Vector::from_polygons([square(0.0, 0.0, 1.0)], Crs::Epsg(3857));
    let err = vector.reproject(&Crs::wgs84(), &UtmProjection).unwrap_err();
    assert!(matches!(err, GeoError::UnsupportedCrs(_)));
    assert!(UtmProjection
        .convert(&Crs::wgs84(), &Crs::Epsg(32645), coord! { x: 85.3, y: 95.0 })
        .is_err());
}

#[test]
fn empty_vector_has_no_bounds() {
    let empty = Vector::new(vec![], Crs::wgs84());
    assert!(empty.bounds().is_none());
    assert!(matches!(
        empty.get_bounds_projected(&Crs::Epsg(32645), 10, &UtmProjection),
        Err(GeoError::EmptyCollection)
    ));
    assert!(matches!(empty.local_utm_crs(&UtmProjection), Err(GeoError::EmptyCollection)));
}
