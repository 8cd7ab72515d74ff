//! Coordinate reference system handling and UTM zone lookup

use crate::errors::{GeoError, Result};
use std::fmt;
use std::str::FromStr;

/// EPSG codes of the geographic (longitude/latitude) CRSs we recognise.
const GEOGRAPHIC_EPSG: [u32; 5] = [4326, 4258, 4269, 4267, 4979];

/// Coordinate Reference System of a [`Vector`](crate::vector::Vector).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Crs {
    /// Registered EPSG code
    Epsg(u32),
    /// Free-form definition (PROJ string or WKT) handed to the transform backend
    Definition(String),
}

impl Crs {
    /// WGS84 geographic CRS (EPSG:4326)
    pub const fn wgs84() -> Self {
        Crs::Epsg(4326)
    }

    /// WGS84 / UTM zone CRS (EPSG:326zz north, EPSG:327zz south)
    pub fn utm(zone: u8, north: bool) -> Result<Self> {
        if !(1..=60).contains(&zone) {
            return Err(GeoError::InvalidArgument(format!(
                "UTM zone must be between 1 and 60, got {zone}"
            )));
        }
        let base = if north { 32600 } else { 32700 };
        Ok(Crs::Epsg(base + u32::from(zone)))
    }

    /// EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        match self {
            Crs::Epsg(code) => Some(*code),
            Crs::Definition(_) => None,
        }
    }

    /// Whether coordinates are longitude/latitude degrees rather than planar units.
    pub fn is_geographic(&self) -> bool {
        match self {
            Crs::Epsg(code) => GEOGRAPHIC_EPSG.contains(code),
            Crs::Definition(definition) => {
                let lower = definition.to_ascii_lowercase();
                lower.contains("+proj=longlat")
                    || lower.contains("+proj=latlong")
                    || lower.starts_with("geogcs")
                    || lower.starts_with("geogcrs")
            },
        }
    }

    /// `(zone, is_north)` when this is a WGS84 / UTM CRS.
    pub fn utm_zone(&self) -> Option<(u8, bool)> {
        match self.epsg()? {
            code @ 32601..=32660 => Some(((code - 32600) as u8, true)),
            code @ 32701..=32760 => Some(((code - 32700) as u8, false)),
            _ => None,
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Epsg(code) => write!(f, "EPSG:{code}"),
            Crs::Definition(definition) => write!(f, "{definition}"),
        }
    }
}

impl FromStr for Crs {
    type Err = GeoError;

    /// Accepts `EPSG:xxxx` (any case), a bare EPSG number, or any other
    /// non-empty definition string.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(GeoError::InvalidArgument("empty CRS definition".into()));
        }
        let code = match trimmed.split_once(':') {
            Some((authority, code)) if authority.eq_ignore_ascii_case("epsg") => code,
            Some(_) => return Ok(Crs::Definition(trimmed.to_string())),
            None => trimmed,
        };
        match code.parse::<u32>() {
            Ok(code) => Ok(Crs::Epsg(code)),
            Err(_) if code.len() == trimmed.len() => Ok(Crs::Definition(trimmed.to_string())),
            Err(_) => Err(GeoError::InvalidArgument(format!("invalid EPSG code in {trimmed:?}"))),
        }
    }
}

impl From<u32> for Crs {
    fn from(code: u32) -> Self {
        Crs::Epsg(code)
    }
}

/// Name of the UTM zone containing a latitude/longitude pair, e.g. `"45N"`.
pub fn latlon_to_utm(lat: f64, lon: f64) -> Result<String> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(GeoError::InvalidArgument(format!(
            "latitude must be between -90 and 90, got {lat}"
        )));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(GeoError::InvalidArgument(format!(
            "longitude must be between -180 and 180, got {lon}"
        )));
    }
    // lon = 180 belongs to zone 60, not a 61st zone
    let zone = (((lon + 180.0) / 6.0).floor() as u8 + 1).min(60);
    let hemisphere = if lat >= 0.0 { 'N' } else { 'S' };
    Ok(format!("{zone}{hemisphere}"))
}

/// EPSG code of a WGS84 / UTM zone name such as `"45N"` or `"7S"`.
pub fn utm_to_epsg(utm: &str) -> Result<u32> {
    let utm = utm.trim();
    let invalid = || GeoError::InvalidArgument(format!("invalid UTM zone {utm:?}"));

    let hemisphere = utm.chars().last().ok_or_else(invalid)?;
    let north = match hemisphere.to_ascii_uppercase() {
        'N' => true,
        'S' => false,
        _ => return Err(invalid()),
    };
    let zone: u8 = utm[..utm.len() - 1].parse().map_err(|_| invalid())?;
    match Crs::utm(zone, north)? {
        Crs::Epsg(code) => Ok(code),
        Crs::Definition(_) => Err(invalid()),
    }
}
