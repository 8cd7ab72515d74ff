//! Error types

use crate::crs::Crs;

/// Everything that can go wrong while handling georeferenced vectors.
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    /// (UnsupportedGeometry) A geometry kind the operation cannot handle
    #[error("(UnsupportedGeometry) Geometry type {kind} at index {index} not implemented")]
    UnsupportedGeometry { index: usize, kind: &'static str },
    /// (DegenerateGeometry) No finite Voronoi cell can be built from the vertices
    #[error("(DegenerateGeometry) Invalid geometry, cannot generate finite Voronoi polygons: {0}")]
    DegenerateGeometry(String),
    /// (EmptyCollection) The vector holds no geometry
    #[error("(EmptyCollection) The vector does not contain any geometry")]
    EmptyCollection,
    /// (InvalidArgument) A caller-supplied value is out of range
    #[error("(InvalidArgument) {0}")]
    InvalidArgument(String),
    /// (UnsupportedCrs) No transformation is known for this CRS
    #[error("(UnsupportedCrs) No coordinate operation available for {0}")]
    UnsupportedCrs(Crs),
    /// (MetricUnavailable) The vector cannot be moved into its local UTM zone
    #[error(
        "(MetricUnavailable) No coordinate operation from {0} to its local UTM zone; \
         buffer in CRS units instead (metric = false, `--no-metric`) or build with features = [\"proj\"]"
    )]
    MetricUnavailable(Crs),
    /// (Projection) The coordinate operation failed
    #[error("(Projection) {0}")]
    Projection(String),
    /// (Tessellation) The tessellation backend rejected the point set
    #[error("(Tessellation) {0}")]
    Tessellation(String),
    /// (Diagnostics) A diagnostics observer could not render a stage
    #[error("(Diagnostics) {0}")]
    Diagnostics(String),
    #[error("std::io::Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

pub type Result<T> = std::result::Result<T, GeoError>;
