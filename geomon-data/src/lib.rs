//! Data access for the geomon engine.
//!
//! Materialises [`geomon_core::Feature`] batches from GeoJSON snapshot
//! files so they can be reconciled without any service connection.

#![forbid(unsafe_code)]

mod geojson;

pub use geojson::{GeoJsonError, GeoJsonFileSource, load_features, parse_features};
