//! Coordinate operations between reference systems.
//!
//! Everything that moves coordinates from one [`Crs`] to another goes through
//! the [`CrsTransform`] trait, so the vector operations never depend on a
//! particular projection engine:
//!
//! - [`UtmProjection`]: pure-Rust WGS84 ⇄ UTM (EPSG 4326, 326xx, 327xx),
//!   always available.
//! - `ProjTransformer`: any pair PROJ knows about, behind the `proj` feature.

use crate::crs::Crs;
use crate::errors::Result;
use crate::float_types::Real;
use geo::{Coord, Geometry, MapCoords};

pub mod utm;
pub use utm::UtmProjection;

#[cfg(feature = "proj")]
pub mod proj;
#[cfg(feature = "proj")]
pub use self::proj::ProjTransformer;

/// A ready-to-run coordinate operation from one CRS to another.
pub type CoordOperation<'a> = Box<dyn Fn(Coord<Real>) -> Result<Coord<Real>> + 'a>;

/// Capability to reproject coordinates between reference systems.
pub trait CrsTransform {
    /// Prepare the operation converting coordinates from `from` into `to`.
    fn operation<'a>(&'a self, from: &Crs, to: &Crs) -> Result<CoordOperation<'a>>;

    /// Convert a single coordinate.
    fn convert(&self, from: &Crs, to: &Crs, coord: Coord<Real>) -> Result<Coord<Real>> {
        let operation = self.operation(from, to)?;
        operation(coord)
    }
}

/// The transform used when the caller does not provide one: PROJ when the
/// `proj` feature is enabled, the built-in UTM projection otherwise.
pub fn default_transform() -> &'static dyn CrsTransform {
    #[cfg(feature = "proj")]
    {
        static TRANSFORM: ProjTransformer = ProjTransformer;
        &TRANSFORM
    }
    #[cfg(not(feature = "proj"))]
    {
        static TRANSFORM: UtmProjection = UtmProjection;
        &TRANSFORM
    }
}

/// Apply a prepared operation to every coordinate of a geometry.
pub fn transform_geometry(
    geometry: &Geometry<Real>,
    operation: &CoordOperation<'_>,
) -> Result<Geometry<Real>> {
    geometry.try_map_coords(|coord| operation(coord))
}
