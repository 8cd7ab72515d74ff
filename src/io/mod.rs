//! Reading and writing vectors.
//!
//! GeoJSON is the only supported format. It carries no CRS, so readers take
//! one from the caller (RFC 7946 mandates WGS84).

mod geojson;

pub use self::geojson::{read_geojson, write_geojson};
