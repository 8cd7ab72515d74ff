use crate::crs::Crs;
use crate::errors::{GeoError, Result};
use crate::float_types::Real;
use crate::vector::Vector;
use geo::Geometry;
use geojson::{Feature, FeatureCollection, GeoJson};
use log::debug;
use std::fs;
use std::path::Path;

/// Property holding the identity of a feature.
const INDEX_PROPERTY: &str = "index";

/// Read a GeoJSON file (feature collection, single feature or bare geometry).
pub fn read_geojson(path: impl AsRef<Path>, crs: Crs) -> Result<Vector> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let vector = Vector::from_geojson_str(&text, crs)?;
    debug!("read {} geometries from {}", vector.len(), path.display());
    Ok(vector)
}

/// Write `vector` as a GeoJSON feature collection, identities in the
/// `index` property.
pub fn write_geojson(vector: &Vector, path: impl AsRef<Path>) -> Result<()> {
    fs::write(path, vector.to_geojson_string())?;
    Ok(())
}

impl Vector {
    /// Parse GeoJSON text.
    ///
    /// Identities are read from the `index` property when every feature has
    /// a non-negative integer one, and are positional otherwise. Repeated
    /// labels are an `InvalidArgument` error.
    pub fn from_geojson_str(text: &str, crs: Crs) -> Result<Vector> {
        let features = match text.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(collection) => collection.features,
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::Geometry(geometry) => vec![Feature::from(geometry)],
        };

        let mut geometries = Vec::with_capacity(features.len());
        let mut labels = Vec::with_capacity(features.len());
        for (position, feature) in features.into_iter().enumerate() {
            labels.push(
                feature
                    .property(INDEX_PROPERTY)
                    .and_then(|value| value.as_u64())
                    .and_then(|id| usize::try_from(id).ok()),
            );
            let geometry = feature.geometry.ok_or_else(|| {
                GeoError::InvalidArgument(format!("feature {position} has no geometry"))
            })?;
            geometries.push(Geometry::<Real>::try_from(geometry)?);
        }

        match labels.into_iter().collect::<Option<Vec<usize>>>() {
            Some(index) => Vector::with_index(geometries, index, crs),
            None => Ok(Vector::new(geometries, crs)),
        }
    }

    /// Serialize as a GeoJSON feature collection.
    pub fn to_geojson_string(&self) -> String {
        let features = self
            .iter()
            .map(|(id, geometry)| {
                let mut feature = Feature::from(geojson::Geometry::new(geojson::Value::from(geometry)));
                feature.set_property(INDEX_PROPERTY, serde_json::Value::from(id));
                feature
            })
            .collect();
        GeoJson::FeatureCollection(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Rect, coord};

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"index": 7, "name": "lake"},
                "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}
            },
            {
                "type": "Feature",
                "properties": {"index": 3},
                "geometry": {"type": "LineString", "coordinates": [[2, 2], [3, 3]]}
            }
        ]
    }"#;

    #[test]
    fn index_property_is_the_identity() {
        let vector = Vector::from_geojson_str(COLLECTION, Crs::wgs84()).unwrap();
        assert_eq!(vector.index(), &[7, 3]);
        assert!(matches!(vector.get(3), Some(Geometry::LineString(_))));
        assert_eq!(vector.crs(), &Crs::wgs84());
    }

    #[test]
    fn missing_labels_fall_back_to_positions() {
        let text = COLLECTION.replace(r#""index": 3"#, r#""index": -1"#);
        let vector = Vector::from_geojson_str(&text, Crs::wgs84()).unwrap();
        assert_eq!(vector.index(), &[0, 1]);

        let bare = r#"{"type": "Point", "coordinates": [1.5, 2.5]}"#;
        assert_eq!(Vector::from_geojson_str(bare, Crs::wgs84()).unwrap().len(), 1);
    }

    #[test]
    fn repeated_index_labels_are_rejected() {
        let text = COLLECTION.replace(r#""index": 3"#, r#""index": 7"#);
        assert!(matches!(
            Vector::from_geojson_str(&text, Crs::wgs84()),
            Err(GeoError::InvalidArgument(_))
        ));
    }

    #[test]
    fn write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.geojson");
        let vector = Vector::with_index(
            vec![
                Geometry::Polygon(Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 2.0, y: 1.0 }).to_polygon()),
                Geometry::LineString(LineString::from(vec![(5.0, 5.0), (6.0, 7.0)])),
            ],
            vec![4, 9],
            Crs::Epsg(32630),
        )
        .unwrap();

        write_geojson(&vector, &path).unwrap();
        let back = read_geojson(&path, Crs::Epsg(32630)).unwrap();
        assert_eq!(back, vector);
    }

    #[test]
    fn malformed_text_is_a_geojson_error() {
        assert!(matches!(
            Vector::from_geojson_str("{\"type\": \"Nope\"}", Crs::wgs84()),
            Err(GeoError::GeoJson(_))
        ));
    }
}
