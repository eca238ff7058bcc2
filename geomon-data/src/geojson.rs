//! GeoJSON FeatureCollection parsing.
//!
//! Walks the document structure directly: `features[*].geometry` becomes the
//! feature's shape and `features[*].properties` its attribute map. Supported
//! geometries are `Point`, `Polygon` (exterior ring only), and
//! `MultiPolygon`; entries carrying other geometry types are skipped with a
//! warning rather than failing the whole document.

use std::fs;
use std::path::{Path, PathBuf};

use geo::{Coord, Geometry, Intersects, LineString, MultiPolygon, Point, Polygon};
use geomon_core::{Attributes, Feature, FeatureQuery, FeatureSource, FeatureSourceError};
use log::warn;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised when reading or decoding a GeoJSON document.
#[derive(Debug, Error)]
pub enum GeoJsonError {
    /// The snapshot file could not be read from disk.
    #[error("failed to read GeoJSON from {path:?}")]
    Io {
        /// Location of the snapshot file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid JSON.
    #[error("failed to parse GeoJSON document")]
    Parse {
        /// Decoder error returned by `serde_json`.
        #[from]
        source: serde_json::Error,
    },
    /// The document parsed but its top level is not an object.
    #[error("GeoJSON document is not an object")]
    NotAnObject,
}

/// Read a GeoJSON FeatureCollection from disk.
///
/// # Errors
///
/// Fails when the file cannot be read or the document cannot be decoded;
/// see [`GeoJsonError`].
///
/// # Examples
/// ```no_run
/// use std::path::Path;
/// use geomon_data::load_features;
///
/// # fn main() -> Result<(), geomon_data::GeoJsonError> {
/// let features = load_features(Path::new("incidents.geojson"))?;
/// println!("loaded {} features", features.len());
/// # Ok(())
/// # }
/// ```
pub fn load_features(path: &Path) -> Result<Vec<Feature>, GeoJsonError> {
    let text = fs::read_to_string(path).map_err(|source| GeoJsonError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_features(&text)
}

/// Parse a GeoJSON FeatureCollection document.
///
/// Entries whose geometry is `null` or absent become features without a
/// geometry; entries whose geometry is present but unusable are dropped with
/// a warning. A document without usable features yields an empty batch.
///
/// # Errors
///
/// Fails when the text is not valid JSON or the top level is not an object.
pub fn parse_features(text: &str) -> Result<Vec<Feature>, GeoJsonError> {
    let document: Value = serde_json::from_str(text)?;
    let Value::Object(object) = document else {
        return Err(GeoJsonError::NotAnObject);
    };

    let mut parsed = Vec::new();
    let mut skipped = 0_usize;
    if let Some(entries) = object.get("features").and_then(Value::as_array) {
        for entry in entries {
            match parse_feature(entry) {
                Some(feature) => parsed.push(feature),
                None => skipped += 1,
            }
        }
    }
    if skipped > 0 {
        warn!("skipped {skipped} GeoJSON entries without usable geometry");
    }
    if parsed.is_empty() {
        warn!("no GeoJSON feature was added");
    }
    Ok(parsed)
}

fn parse_feature(entry: &Value) -> Option<Feature> {
    let object = entry.as_object()?;
    let attributes = object
        .get("properties")
        .and_then(Value::as_object)
        .map(attributes_from_properties)
        .unwrap_or_default();

    match object.get("geometry") {
        None | Some(Value::Null) => Some(Feature::without_geometry(attributes)),
        Some(value) => {
            let geometry = value.as_object().and_then(parse_geometry)?;
            Some(Feature::new(Some(geometry), attributes))
        }
    }
}

fn attributes_from_properties(properties: &Map<String, Value>) -> Attributes {
    properties
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

fn parse_geometry(geometry: &Map<String, Value>) -> Option<Geometry<f64>> {
    let kind = geometry.get("type").and_then(Value::as_str)?;
    let coordinates = geometry.get("coordinates").and_then(Value::as_array)?;
    match kind {
        "Point" => parse_position(coordinates).map(|coord| Geometry::Point(Point::from(coord))),
        "Polygon" => parse_polygon(coordinates).map(Geometry::Polygon),
        "MultiPolygon" => parse_multi_polygon(coordinates).map(Geometry::MultiPolygon),
        other => {
            warn!("skipped unsupported geometry type {other}");
            None
        }
    }
}

fn parse_position(position: &[Value]) -> Option<Coord<f64>> {
    let x = position.first().and_then(Value::as_f64)?;
    let y = position.get(1).and_then(Value::as_f64)?;
    Some(Coord { x, y })
}

/// Build a polygon from the exterior ring. Interior rings are not modelled;
/// their count is logged and they are dropped.
fn parse_polygon(rings: &[Value]) -> Option<Polygon<f64>> {
    let exterior = rings.first().and_then(Value::as_array)?;
    if rings.len() > 1 {
        warn!("{} interior rings are thrown away", rings.len() - 1);
    }

    let vertices: Vec<Coord<f64>> = exterior
        .iter()
        .filter_map(|vertex| vertex.as_array().and_then(|values| parse_position(values)))
        .collect();
    if vertices.is_empty() {
        return None;
    }
    Some(Polygon::new(LineString::from(vertices), Vec::new()))
}

fn parse_multi_polygon(polygons: &[Value]) -> Option<MultiPolygon<f64>> {
    let parsed: Vec<Polygon<f64>> = polygons
        .iter()
        .filter_map(|polygon| polygon.as_array().and_then(|rings| parse_polygon(rings)))
        .collect();
    if parsed.is_empty() {
        return None;
    }
    Some(MultiPolygon::new(parsed))
}

/// File-backed [`FeatureSource`] over a GeoJSON snapshot.
///
/// The file is re-read on every query so a monitor observes snapshot
/// updates. The source evaluates no filter expressions; any clause other
/// than the match-all default is rejected. The spatial filter is applied
/// with [`geo::Intersects`].
///
/// # Examples
/// ```no_run
/// use geomon_core::{FeatureQuery, FeatureSource};
/// use geomon_data::GeoJsonFileSource;
///
/// let source = GeoJsonFileSource::new("incidents.geojson");
/// let batch = source.query_features(&FeatureQuery::matching_all())?;
/// # Ok::<(), geomon_core::FeatureSourceError>(())
/// ```
#[derive(Debug, Clone)]
pub struct GeoJsonFileSource {
    path: PathBuf,
}

impl GeoJsonFileSource {
    /// Create a source reading the snapshot at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FeatureSource for GeoJsonFileSource {
    fn query_features(&self, query: &FeatureQuery) -> Result<Vec<Feature>, FeatureSourceError> {
        if !query.is_match_all() {
            return Err(FeatureSourceError::UnsupportedFilter {
                expression: query.where_clause.clone(),
            });
        }
        let features =
            load_features(&self.path).map_err(|error| FeatureSourceError::Query {
                message: error.to_string(),
            })?;
        Ok(match query.spatial_filter {
            Some(bbox) => features
                .into_iter()
                .filter(|feature| {
                    feature
                        .geometry
                        .as_ref()
                        .is_some_and(|geometry| bbox.intersects(geometry))
                })
                .collect(),
            None => features,
        })
    }
}
