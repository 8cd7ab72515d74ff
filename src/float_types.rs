// Our Real scalar type. Tessellation and PROJ both work in double precision,
// so unlike mesh libraries there is no f32 build.
pub type Real = f64;

use core::str::FromStr;
use std::sync::OnceLock;

/// Lazily-initialized tolerance used across the crate, in the units of the
/// CRS being processed. Can be overridden:
///  1) **Build-time**: set env var `GEOUTILS_TOLERANCE` (e.g. `GEOUTILS_TOLERANCE=1e-4 cargo build`)
///  2) **Runtime**: call [`set_tolerance`] once before using the library
static TOLERANCE_CELL: OnceLock<Real> = OnceLock::new();

#[inline]
const fn default_tolerance() -> Real {
    1e-6
}

/// Returns the current tolerance.
/// If not set yet, it tries `GEOUTILS_TOLERANCE` (parsed as `Real`) and
/// falls back to `1e-6`.
pub fn tolerance() -> Real {
    *TOLERANCE_CELL.get_or_init(|| {
        if let Some(environment_variable) = option_env!("GEOUTILS_TOLERANCE") {
            if let Ok(value) = Real::from_str(environment_variable) {
                return value.max(Real::EPSILON);
            }
        }
        default_tolerance()
    })
}

/// Set the tolerance programmatically once (subsequent calls are ignored).
/// Call near program start: `geoutils::float_types::set_tolerance(1e-4);`
pub fn set_tolerance(value: Real) {
    let _ = TOLERANCE_CELL.set(value.max(Real::EPSILON));
}

/// Semi-major axis of the WGS84 ellipsoid (m)
pub const WGS84_A: Real = 6_378_137.0;
/// Flattening of the WGS84 ellipsoid
pub const WGS84_F: Real = 1.0 / 298.257_223_563;
/// UTM central scale factor
pub const UTM_K0: Real = 0.9996;
