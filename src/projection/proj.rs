//! Reprojection through PROJ (`proj` feature).

use super::{CoordOperation, CrsTransform};
use crate::crs::Crs;
use crate::errors::{GeoError, Result};
use crate::float_types::Real;
use geo::Coord;
use proj::Proj;

/// Transforms coordinates between any pair of CRSs PROJ can resolve.
///
/// Axis order is normalised to `x = longitude`, `y = latitude` for
/// geographic systems, like the rest of the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjTransformer;

impl CrsTransform for ProjTransformer {
    fn operation<'a>(&'a self, from: &Crs, to: &Crs) -> Result<CoordOperation<'a>> {
        if from == to {
            return Ok(Box::new(Ok));
        }
        let proj = Proj::new_known_crs(&from.to_string(), &to.to_string(), None)
            .map_err(|e| GeoError::Projection(format!("Failed to create projection: {e}")))?;

        Ok(Box::new(move |coord: Coord<Real>| -> Result<Coord<Real>> {
            let (x, y) = proj
                .convert((coord.x, coord.y))
                .map_err(|e| GeoError::Projection(format!("Transformation failed: {e}")))?;
            Ok(Coord { x, y })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    #[test]
    fn agrees_with_builtin_utm() {
        use crate::projection::UtmProjection;

        let lonlat = coord! { x: -3.7037, y: 40.4168 };
        let from_proj = ProjTransformer
            .convert(&Crs::wgs84(), &Crs::Epsg(32630), lonlat)
            .unwrap();
        let builtin = UtmProjection
            .convert(&Crs::wgs84(), &Crs::Epsg(32630), lonlat)
            .unwrap();
        assert!((from_proj.x - builtin.x).abs() < 0.01);
        assert!((from_proj.y - builtin.y).abs() < 0.01);
    }
}
