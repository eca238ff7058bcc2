//! Queried feature records and attribute access.

use std::collections::BTreeMap;

use geo::{Geometry, Point};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable per-feature identifier assigned by the external data source.
pub type ObjectId = i64;

/// Free-form attribute map carried by a feature.
///
/// Values keep the data source's typing. The engine interprets nothing here
/// beyond the configured id attribute.
pub type Attributes = BTreeMap<String, Value>;

/// Attribute consulted for feature identity when no other name is configured.
pub const DEFAULT_ID_ATTRIBUTE: &str = "OBJECTID";

/// A single queried feature: an optional geometry plus its attributes.
///
/// A feature without a geometry mirrors the empty geometries a feature
/// service may return. Such features still reconcile by identity but are
/// excluded from the usable-feature count.
///
/// # Examples
/// ```
/// use geomon_core::{Attributes, DEFAULT_ID_ATTRIBUTE, Feature};
/// use serde_json::json;
///
/// let feature = Feature::with_point(
///     8.68,
///     50.11,
///     Attributes::from([("OBJECTID".into(), json!(7))]),
/// );
///
/// assert!(feature.has_geometry());
/// assert_eq!(feature.object_id(DEFAULT_ID_ATTRIBUTE), Some(7));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Feature {
    /// Geospatial shape, `None` when the source reported an empty geometry.
    pub geometry: Option<Geometry<f64>>,
    /// Source attributes keyed by attribute name.
    pub attributes: Attributes,
}

impl Feature {
    /// Construct a feature from a geometry and its attributes.
    #[must_use]
    pub fn new(geometry: Option<Geometry<f64>>, attributes: Attributes) -> Self {
        Self {
            geometry,
            attributes,
        }
    }

    /// Construct a point feature. Coordinates are WGS84 with `x = longitude`
    /// and `y = latitude`.
    #[must_use]
    pub fn with_point(x: f64, y: f64, attributes: Attributes) -> Self {
        Self::new(Some(Geometry::Point(Point::new(x, y))), attributes)
    }

    /// Construct a feature whose geometry is empty.
    #[must_use]
    pub fn without_geometry(attributes: Attributes) -> Self {
        Self::new(None, attributes)
    }

    /// Report whether the feature carries a usable geometry.
    #[must_use]
    pub fn has_geometry(&self) -> bool {
        self.geometry.is_some()
    }

    /// Extract the feature's identifier from the named attribute.
    ///
    /// Returns `None` when the attribute is absent or its value is not an
    /// integral number.
    #[must_use]
    pub fn object_id(&self, attribute: &str) -> Option<ObjectId> {
        self.attributes.get(attribute).and_then(Value::as_i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn attributes(id: Value) -> Attributes {
        Attributes::from([("OBJECTID".into(), id)])
    }

    #[rstest]
    fn extracts_integral_object_id() {
        let feature = Feature::with_point(0.0, 0.0, attributes(json!(42)));
        assert_eq!(feature.object_id(DEFAULT_ID_ATTRIBUTE), Some(42));
    }

    #[rstest]
    fn missing_attribute_yields_no_id() {
        let feature = Feature::with_point(0.0, 0.0, Attributes::new());
        assert_eq!(feature.object_id(DEFAULT_ID_ATTRIBUTE), None);
    }

    #[rstest]
    #[case(json!("42"))]
    #[case(json!(4.2))]
    #[case(json!(null))]
    fn non_integral_attribute_yields_no_id(#[case] value: Value) {
        let feature = Feature::with_point(0.0, 0.0, attributes(value));
        assert_eq!(feature.object_id(DEFAULT_ID_ATTRIBUTE), None);
    }

    #[rstest]
    fn id_attribute_name_is_configurable() {
        let feature = Feature::without_geometry(Attributes::from([("FID".into(), json!(3))]));
        assert_eq!(feature.object_id("FID"), Some(3));
        assert_eq!(feature.object_id(DEFAULT_ID_ATTRIBUTE), None);
    }

    #[rstest]
    fn empty_geometry_is_reported() {
        let feature = Feature::without_geometry(attributes(json!(1)));
        assert!(!feature.has_geometry());
    }
}
