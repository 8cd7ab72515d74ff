//! Buffering of vector geometries.
//!
//! A buffer of distance r around a geometry G is the Minkowski sum
//! ```text
//! G ⊕ D(r) = {g + d | g ∈ G, d ∈ D(r)}
//! ```
//! computed by `geo` with rounded joins. Points and lines grow into polygons;
//! a negative distance shrinks polygons.
//!
//! Distances are in the units of the vector's CRS. [`Vector::buffer_metric`]
//! first moves the vector into its local UTM zone so the distance is in metres.
use super::Vector;
use crate::errors::Result;
use crate::float_types::Real;
use crate::projection::CrsTransform;
use geo::{Buffer, Geometry};
use log::debug;
use std::sync::OnceLock;

impl Vector {
    /// Grows/shrinks every geometry by `distance`, in CRS units.
    ///
    /// Each geometry becomes a `MultiPolygon`; identities are kept.
    pub fn buffer(&self, distance: Real) -> Vector {
        let geometries = self
            .geometries
            .iter()
            .map(|geometry| Geometry::MultiPolygon(geometry.buffer(distance)))
            .collect();

        Vector {
            geometries,
            index: self.index.clone(),
            crs: self.crs.clone(),
            bounds: OnceLock::new(),
        }
    }

    /// Buffer the geometries in a local metric system (UTM only).
    ///
    /// The vector is projected to the UTM zone of its rough centroid, buffered
    /// by `buffer_size` metres, and reverted to the original CRS.
    pub fn buffer_metric(&self, buffer_size: Real, transform: &dyn CrsTransform) -> Result<Vector> {
        let utm = self.local_utm_crs(transform)?;
        debug!("buffer_metric: buffering {} geometries by {buffer_size} m in {utm}", self.len());

        let local = self.reproject(&utm, transform)?;
        local.buffer(buffer_size).reproject(self.crs(), transform)
    }
}
