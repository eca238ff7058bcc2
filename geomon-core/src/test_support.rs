//! Test-only, in-memory collaborators used by unit and behaviour tests.

use geo::{Geometry, Intersects};

use crate::compare::{GeometryComparer, GeometryComparisonError};
use crate::feature::Feature;
use crate::source::{FeatureQuery, FeatureSource, FeatureSourceError};

/// In-memory `FeatureSource` used in tests.
///
/// The source performs a linear scan and is intended only for small
/// datasets. It evaluates no filter expressions: any clause other than the
/// match-all default is rejected with
/// [`FeatureSourceError::UnsupportedFilter`].
#[derive(Default, Debug, Clone)]
pub struct MemoryFeatureSource {
    features: Vec<Feature>,
}

impl MemoryFeatureSource {
    /// Create a source containing a single feature.
    #[must_use]
    pub fn with_feature(feature: Feature) -> Self {
        Self::with_features(std::iter::once(feature))
    }

    /// Create a source from a collection of features.
    pub fn with_features<I>(features: I) -> Self
    where
        I: IntoIterator<Item = Feature>,
    {
        Self {
            features: features.into_iter().collect(),
        }
    }
}

impl FeatureSource for MemoryFeatureSource {
    fn query_features(&self, query: &FeatureQuery) -> Result<Vec<Feature>, FeatureSourceError> {
        if !query.is_match_all() {
            return Err(FeatureSourceError::UnsupportedFilter {
                expression: query.where_clause.clone(),
            });
        }
        Ok(self
            .features
            .iter()
            .filter(|feature| match (&query.spatial_filter, &feature.geometry) {
                (Some(bbox), Some(geometry)) => bbox.intersects(geometry),
                (Some(_), None) => false,
                (None, _) => true,
            })
            .cloned()
            .collect())
    }
}

/// `GeometryComparer` that refuses every comparison, for abort-semantics
/// tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingComparer;

impl GeometryComparer for FailingComparer {
    fn equals(
        &self,
        _a: &Geometry<f64>,
        _b: &Geometry<f64>,
    ) -> Result<bool, GeometryComparisonError> {
        Err(GeometryComparisonError::new("comparer always fails"))
    }
}
