//! Georeferenced **vector** helpers built on [`geo`], centred on buffers that
//! do not overlap each other.
//!
//! A [`Vector`] is an ordered collection of geometries sharing one [`Crs`].
//! Besides cropping, reprojection and bounds handling, it offers
//! [`Vector::buffer_without_overlap`]: every geometry gets the part of a
//! uniform buffer that is closer to it than to any neighbour, found through a
//! Voronoi tessellation of all vertices.
//!
//! # Features
//! #### Default
//! - **svg-io**: write the intermediate stages of a buffer computation as SVG
//!
//! #### Optional
//! - **parallel**: use rayon for multithreading
//! - **proj**: reproject through [PROJ](https://proj.org) instead of the
//!   built-in WGS84/UTM projection

#![forbid(unsafe_code)]
#![deny(unused)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod buffer;
pub mod crs;
pub mod diagnostics;
pub mod errors;
pub mod float_types;
pub mod io;
pub mod projection;
pub mod vector;
pub mod voronoi;

pub use buffer::{BufferContext, BufferOptions, TieBreak};
pub use crs::{Crs, latlon_to_utm, utm_to_epsg};
pub use errors::{GeoError, Result};
pub use vector::{Vector, extract_vertices};
pub use voronoi::{generate_voronoi_polygons, generate_voronoi_with_bounds};
