//! Pure-Rust WGS84 ⇄ UTM reprojection (Snyder 1987, USGS Prof. Paper 1395, pp. 61-64).
//!
//! Covers EPSG:4326 and the WGS84 / UTM zones EPSG:326xx (north) and
//! EPSG:327xx (south). Geographic coordinates are `x = longitude`,
//! `y = latitude`, in degrees.

use super::{CoordOperation, CrsTransform};
use crate::crs::Crs;
use crate::errors::{GeoError, Result};
use crate::float_types::{Real, UTM_K0, WGS84_A, WGS84_F};
use geo::Coord;

const E2: Real = 2.0 * WGS84_F - WGS84_F * WGS84_F;
const E_PRIME2: Real = E2 / (1.0 - E2);
const FALSE_EASTING: Real = 500_000.0;
const FALSE_NORTHING_SOUTH: Real = 10_000_000.0;

/// Built-in transverse Mercator for WGS84 and its UTM zones.
#[derive(Debug, Clone, Copy, Default)]
pub struct UtmProjection;

#[derive(Debug, Clone, Copy)]
enum Endpoint {
    Geographic,
    Utm { zone: u8, north: bool },
}

impl Endpoint {
    fn resolve(crs: &Crs) -> Result<Self> {
        if crs.epsg() == Some(4326) {
            return Ok(Endpoint::Geographic);
        }
        match crs.utm_zone() {
            Some((zone, north)) => Ok(Endpoint::Utm { zone, north }),
            None => Err(GeoError::UnsupportedCrs(crs.clone())),
        }
    }

    fn to_lonlat(self, coord: Coord<Real>) -> Result<Coord<Real>> {
        match self {
            Endpoint::Geographic => Ok(coord),
            Endpoint::Utm { zone, north } => utm_to_wgs84(coord, zone, north),
        }
    }

    fn project_lonlat(self, coord: Coord<Real>) -> Result<Coord<Real>> {
        match self {
            Endpoint::Geographic => Ok(coord),
            Endpoint::Utm { zone, north } => wgs84_to_utm(coord, zone, north),
        }
    }
}

impl CrsTransform for UtmProjection {
    fn operation<'a>(&'a self, from: &Crs, to: &Crs) -> Result<CoordOperation<'a>> {
        if from == to {
            return Ok(Box::new(Ok));
        }
        let source = Endpoint::resolve(from)?;
        let target = Endpoint::resolve(to)?;
        Ok(Box::new(move |coord: Coord<Real>| -> Result<Coord<Real>> {
            target.project_lonlat(source.to_lonlat(coord)?)
        }))
    }
}

/// Central meridian of a zone, in radians
fn central_meridian(zone: u8) -> Real {
    ((Real::from(zone) - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
}

/// Convert WGS84 (longitude, latitude) in degrees to UTM (easting, northing)
/// in metres for the given zone and hemisphere.
pub fn wgs84_to_utm(lonlat: Coord<Real>, zone: u8, north: bool) -> Result<Coord<Real>> {
    let Coord { x: lon_deg, y: lat_deg } = lonlat;
    if !lon_deg.is_finite() || !lat_deg.is_finite() || lat_deg.abs() > 90.0 {
        return Err(GeoError::Projection(format!(
            "({lon_deg}, {lat_deg}) is not a valid longitude/latitude"
        )));
    }
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let lon0 = central_meridian(zone);

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();

    let n = WGS84_A / (1.0 - E2 * sin_lat * sin_lat).sqrt();
    let t = tan_lat * tan_lat;
    let c = E_PRIME2 * cos_lat * cos_lat;
    let a = cos_lat * (lon - lon0);
    let m = meridional_arc(lat);

    let a2 = a * a;
    let a4 = a2 * a2;
    let a6 = a4 * a2;

    // Snyder eq. 8-9
    let easting = UTM_K0
        * n
        * (a
            + (1.0 - t + c) * a2 * a / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * E_PRIME2) * a4 * a / 120.0)
        + FALSE_EASTING;

    // Snyder eq. 8-10
    let northing = UTM_K0
        * (m + n
            * tan_lat
            * (a2 / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * E_PRIME2) * a6 / 720.0));

    let northing = if north { northing } else { northing + FALSE_NORTHING_SOUTH };
    Ok(Coord { x: easting, y: northing })
}

/// Convert UTM (easting, northing) in metres back to WGS84 (longitude, latitude) in degrees.
pub fn utm_to_wgs84(en: Coord<Real>, zone: u8, north: bool) -> Result<Coord<Real>> {
    if !en.x.is_finite() || !en.y.is_finite() {
        return Err(GeoError::Projection(format!(
            "({}, {}) is not a valid easting/northing",
            en.x, en.y
        )));
    }
    let x = en.x - FALSE_EASTING;
    let y = if north { en.y } else { en.y - FALSE_NORTHING_SOUTH };

    let e4 = E2 * E2;
    let e6 = e4 * E2;
    let m = y / UTM_K0;
    let mu = m / (WGS84_A * (1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

    // Footpoint latitude, Snyder eq. 3-26
    let root = (1.0 - E2).sqrt();
    let e1 = (1.0 - root) / (1.0 + root);
    let e1_2 = e1 * e1;
    let e1_3 = e1_2 * e1;
    let e1_4 = e1_3 * e1;
    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();
    let denominator = 1.0 - E2 * sin_phi1 * sin_phi1;

    let c1 = E_PRIME2 * cos_phi1 * cos_phi1;
    let t1 = tan_phi1 * tan_phi1;
    let n1 = WGS84_A / denominator.sqrt();
    let r1 = WGS84_A * (1.0 - E2) / denominator.powf(1.5);
    let d = x / (n1 * UTM_K0);

    let d2 = d * d;
    let d3 = d2 * d;
    let d4 = d2 * d2;
    let d5 = d4 * d;
    let d6 = d4 * d2;

    // Snyder eq. 8-17
    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d2 / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * E_PRIME2) * d4 / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                    - 252.0 * E_PRIME2
                    - 3.0 * c1 * c1)
                    * d6
                    / 720.0);

    // Snyder eq. 8-18
    let lon = central_meridian(zone)
        + (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * E_PRIME2 + 24.0 * t1 * t1)
                * d5
                / 120.0)
            / cos_phi1;

    Ok(Coord { x: lon.to_degrees(), y: lat.to_degrees() })
}

/// Meridional arc from equator to latitude `lat` (radians).
/// Snyder eq. 3-21.
fn meridional_arc(lat: Real) -> Real {
    let e4 = E2 * E2;
    let e6 = e4 * E2;

    WGS84_A
        * ((1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
            - (3.0 * E2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    fn assert_close(a: Real, b: Real, tol: Real, msg: &str) {
        let diff = (a - b).abs();
        assert!(
            diff < tol,
            "{msg}: expected {b}, got {a}, diff {diff} exceeds tolerance {tol}"
        );
    }

    // Reference values from PROJ 9:
    //   Transformer.from_crs(4326, 32630, always_xy=True).transform(-3.7037, 40.4168)
    #[test]
    fn madrid_to_utm30n() {
        let en = wgs84_to_utm(coord! { x: -3.7037, y: 40.4168 }, 30, true).unwrap();
        assert_close(en.x, 440_298.94, 1.0, "easting");
        assert_close(en.y, 4_474_257.31, 1.0, "northing");
    }

    #[test]
    fn buenos_aires_to_utm21s() {
        let en = wgs84_to_utm(coord! { x: -58.3816, y: -34.6037 }, 21, false).unwrap();
        assert_close(en.x, 373_317.50, 1.0, "easting");
        assert_close(en.y, 6_170_036.17, 1.0, "northing");
    }

    #[test]
    fn equator_central_meridian() {
        let en = wgs84_to_utm(coord! { x: -3.0, y: 0.0 }, 30, true).unwrap();
        assert_close(en.x, 500_000.0, 0.01, "easting at CM");
        assert_close(en.y, 0.0, 0.01, "northing at equator");
    }

    #[test]
    fn inverse_recovers_lonlat() {
        for (lon, lat, zone, north) in [
            (-3.7037, 40.4168, 30, true),
            (-58.3816, -34.6037, 21, false),
            (86.925, 27.988, 45, true),
            (1.9, 68.5, 31, true),
        ] {
            let en = wgs84_to_utm(coord! { x: lon, y: lat }, zone, north).unwrap();
            let back = utm_to_wgs84(en, zone, north).unwrap();
            assert_close(back.x, lon, 1e-7, "longitude");
            assert_close(back.y, lat, 1e-7, "latitude");
        }
    }

    #[test]
    fn invalid_input_is_rejected() {
        assert!(wgs84_to_utm(coord! { x: 0.0, y: 95.0 }, 31, true).is_err());
        assert!(wgs84_to_utm(coord! { x: Real::NAN, y: 0.0 }, 31, true).is_err());
        assert!(utm_to_wgs84(coord! { x: Real::INFINITY, y: 0.0 }, 31, true).is_err());
    }

    #[test]
    fn operation_between_zones() {
        let transform = UtmProjection;
        let lonlat = coord! { x: 6.0, y: 45.0 };
        let in_31 = transform.convert(&Crs::wgs84(), &Crs::Epsg(32631), lonlat).unwrap();
        let in_32 = transform.convert(&Crs::Epsg(32631), &Crs::Epsg(32632), in_31).unwrap();
        let back = transform.convert(&Crs::Epsg(32632), &Crs::wgs84(), in_32).unwrap();
        assert_close(back.x, lonlat.x, 1e-7, "longitude");
        assert_close(back.y, lonlat.y, 1e-7, "latitude");
    }

    #[test]
    fn unknown_crs_is_unsupported() {
        let transform = UtmProjection;
        let err = transform
            .convert(&Crs::Epsg(3857), &Crs::wgs84(), coord! { x: 0.0, y: 0.0 })
            .unwrap_err();
        assert!(matches!(err, GeoError::UnsupportedCrs(Crs::Epsg(3857))));
        // Identity never needs to resolve anything
        let same = transform
            .convert(&Crs::Epsg(3857), &Crs::Epsg(3857), coord! { x: 1.0, y: 2.0 })
            .unwrap();
        assert_eq!(same, coord! { x: 1.0, y: 2.0 });
    }
}
