//! Observers of the intermediate stages of
//! [`Vector::buffer_without_overlap`](crate::vector::Vector::buffer_without_overlap).
//!
//! Observers are a debugging aid only: what they do, or how they fail, has
//! no effect on the buffer result.

use crate::errors::Result;
use crate::vector::Vector;
use geo::Area;
use log::info;
use std::collections::BTreeSet;
use std::fmt;

/// Intermediate states of the overlap-free buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Voronoi cells clipped to the tessellation boundary
    Voronoi,
    /// Band pieces with every identity they matched, duplicates included
    Duplicated,
    /// Band pieces after keeping one identity each
    Deduplicated,
    /// One merged buffer per identity
    Final,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Voronoi, Stage::Duplicated, Stage::Deduplicated, Stage::Final];

    pub const fn title(self) -> &'static str {
        match self {
            Stage::Voronoi => "Voronoi polygons",
            Stage::Duplicated => "Buffer with duplicates",
            Stage::Deduplicated => "Buffer without duplicates",
            Stage::Final => "Final buffer",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Receives every intermediate [`Stage`] of a buffer computation, in order.
pub trait BufferObserver {
    fn observe(&mut self, stage: Stage, vector: &Vector) -> Result<()>;
}

/// Summarises each stage as an `info` log record.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl BufferObserver for LogObserver {
    fn observe(&mut self, stage: Stage, vector: &Vector) -> Result<()> {
        let area: f64 = vector.geometries().iter().map(|g| g.unsigned_area()).sum();
        let identities: BTreeSet<usize> = vector.index().iter().copied().collect();
        info!(
            "{stage}: {} geometries, {} identities, area {area:.3} ({})",
            vector.len(),
            identities.len(),
            vector.crs()
        );
        Ok(())
    }
}

/// Keeps a copy of every stage, mostly for tests and notebooks.
#[derive(Debug, Clone, Default)]
pub struct StageRecorder {
    pub stages: Vec<(Stage, Vector)>,
}

impl StageRecorder {
    pub fn get(&self, stage: Stage) -> Option<&Vector> {
        self.stages.iter().find(|(s, _)| *s == stage).map(|(_, v)| v)
    }
}

impl BufferObserver for StageRecorder {
    fn observe(&mut self, stage: Stage, vector: &Vector) -> Result<()> {
        self.stages.push((stage, vector.clone()));
        Ok(())
    }
}

#[cfg(feature = "svg-io")]
pub use plot::SvgPlotter;

#[cfg(feature = "svg-io")]
mod plot {
    use super::{BufferObserver, Stage};
    use crate::errors::{GeoError, Result};
    use crate::float_types::Real;
    use crate::vector::Vector;
    use geo::{BoundingRect, Coord, LineString, Polygon, Rect, coord};
    use std::path::PathBuf;
    use svg::Document;
    use svg::node::element::path::Data;
    use svg::node::element::{Group, Path, Text};

    const PANEL: Real = 400.0;
    const MARGIN: Real = 24.0;
    const PALETTE: [&str; 10] = [
        "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
        "#bcbd22", "#17becf",
    ];

    /// Draws the four stages side by side (2 x 2 panels) into one SVG file,
    /// written once the final stage arrives. Colors follow the identity.
    #[derive(Debug, Clone)]
    pub struct SvgPlotter {
        path: PathBuf,
        panels: Vec<(Stage, Vec<(usize, Polygon<Real>)>)>,
    }

    impl SvgPlotter {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            SvgPlotter {
                path: path.into(),
                panels: Vec::with_capacity(Stage::ALL.len()),
            }
        }

        /// Render the panels collected so far.
        pub fn document(&self) -> Document {
            let frame = self
                .panels
                .iter()
                .flat_map(|(_, polygons)| polygons.iter().filter_map(|(_, p)| p.bounding_rect()))
                .reduce(|a, b| {
                    Rect::new(
                        coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                        coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
                    )
                });

            let size = 2.0 * (PANEL + MARGIN);
            let mut document = Document::new()
                .set("viewBox", format!("0 0 {size} {size}"))
                .set("width", size)
                .set("height", size);

            for (slot, (stage, polygons)) in self.panels.iter().enumerate() {
                let origin = coord! {
                    x: (slot % 2) as Real * (PANEL + MARGIN),
                    y: (slot / 2) as Real * (PANEL + MARGIN) + MARGIN,
                };
                let mut group = Group::new().add(
                    Text::new(stage.title())
                        .set("x", origin.x + 4.0)
                        .set("y", origin.y - 6.0)
                        .set("font-size", 14),
                );
                if let Some(frame) = frame {
                    for (id, polygon) in polygons {
                        group = group.add(
                            Path::new()
                                .set("d", polygon_data(polygon, &frame, origin))
                                .set("fill", PALETTE[id % PALETTE.len()])
                                .set("fill-opacity", 0.5)
                                .set("fill-rule", "evenodd")
                                .set("stroke", "black")
                                .set("stroke-width", 0.5),
                        );
                    }
                }
                document = document.add(group);
            }
            document
        }
    }

    impl BufferObserver for SvgPlotter {
        fn observe(&mut self, stage: Stage, vector: &Vector) -> Result<()> {
            self.panels.push((stage, vector.polygons()));
            if stage == Stage::Final {
                svg::save(&self.path, &self.document())
                    .map_err(|e| GeoError::Diagnostics(format!("{}: {e}", self.path.display())))?;
            }
            Ok(())
        }
    }

    /// Fit `frame` into one panel, y axis pointing up.
    fn polygon_data(polygon: &Polygon<Real>, frame: &Rect<Real>, origin: Coord<Real>) -> Data {
        let scale = PANEL / frame.width().max(frame.height()).max(Real::EPSILON);
        // svg path parameters are single precision
        let to_panel = |c: &Coord<Real>| {
            (
                (origin.x + (c.x - frame.min().x) * scale) as f32,
                (origin.y + (frame.max().y - c.y) * scale) as f32,
            )
        };

        let mut data = Data::new();
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            data = ring_data(data, ring, &to_panel);
        }
        data
    }

    fn ring_data(mut data: Data, ring: &LineString<Real>, to_panel: &impl Fn(&Coord<Real>) -> (f32, f32)) -> Data {
        let mut coords = ring.coords();
        if let Some(first) = coords.next() {
            data = data.move_to(to_panel(first));
            for c in coords {
                data = data.line_to(to_panel(c));
            }
            data = data.close();
        }
        data
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::crs::Crs;

        #[test]
        fn writes_after_final_stage() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("stages.svg");
            let square = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 }).to_polygon();
            let vector = Vector::from_polygons([square], Crs::Epsg(32630));

            let mut plotter = SvgPlotter::new(&path);
            plotter.observe(Stage::Voronoi, &vector).unwrap();
            assert!(!path.exists());
            plotter.observe(Stage::Final, &vector).unwrap();

            let text = std::fs::read_to_string(&path).unwrap();
            assert!(text.contains("<svg"));
            assert!(text.contains("Final buffer"));
            assert_eq!(text.matches("<path").count(), 2);
        }

        #[test]
        fn unwritable_path_is_a_diagnostics_error() {
            let square = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 }).to_polygon();
            let vector = Vector::from_polygons([square], Crs::Epsg(32630));
            let mut plotter = SvgPlotter::new("/nonexistent-dir/stages.svg");
            let err = plotter.observe(Stage::Final, &vector).unwrap_err();
            assert!(matches!(err, GeoError::Diagnostics(_)));
        }
    }
}
