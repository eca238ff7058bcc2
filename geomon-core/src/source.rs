//! Query-executor seam and spatial re-query gating.
//!
//! The `FeatureSource` trait defines the boundary to whatever executes
//! filters against a named feature source — an SDK, a service client, or a
//! file. The engine treats the filter expression as opaque configuration
//! owned by the caller and never interprets it.

use geo::Rect;
use thiserror::Error;

use crate::feature::Feature;

/// Attribute filter matching every feature.
pub const MATCH_ALL_CLAUSE: &str = "1=1";

/// Coordinate tolerance in degrees below which two spatial filters are
/// treated as equivalent by [`RequeryGate`].
pub const WGS84_COORDINATE_TOLERANCE: f64 = 0.01;

/// Filter configuration for one query execution.
///
/// The where clause is owned and evaluated by the source; the optional
/// bounding box restricts results spatially. Coordinates are WGS84 with
/// `x = longitude` and `y = latitude`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureQuery {
    /// Attribute filter expression, opaque to the engine.
    pub where_clause: String,
    /// Optional bounding box restricting results spatially.
    pub spatial_filter: Option<Rect<f64>>,
}

impl FeatureQuery {
    /// Query matching every feature.
    #[must_use]
    pub fn matching_all() -> Self {
        Self {
            where_clause: MATCH_ALL_CLAUSE.into(),
            spatial_filter: None,
        }
    }

    /// Query with a caller-supplied attribute filter.
    #[must_use]
    pub fn with_where_clause(clause: impl Into<String>) -> Self {
        Self {
            where_clause: clause.into(),
            spatial_filter: None,
        }
    }

    /// Query matching every feature within the bounding box.
    #[must_use]
    pub fn within(bbox: Rect<f64>) -> Self {
        Self {
            where_clause: MATCH_ALL_CLAUSE.into(),
            spatial_filter: Some(bbox),
        }
    }

    /// Report whether the attribute filter is the match-all clause.
    #[must_use]
    pub fn is_match_all(&self) -> bool {
        self.where_clause == MATCH_ALL_CLAUSE
    }
}

impl Default for FeatureQuery {
    fn default() -> Self {
        Self::matching_all()
    }
}

/// Errors surfaced by a [`FeatureSource`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureSourceError {
    /// The source has no backing data to query yet.
    #[error("feature source is not loaded")]
    NotLoaded,
    /// The source cannot evaluate the requested filter expression.
    #[error("unsupported filter expression: {expression}")]
    UnsupportedFilter {
        /// The expression the source refused.
        expression: String,
    },
    /// Executing the query failed.
    #[error("feature query failed: {message}")]
    Query {
        /// Source-specific description of the failure.
        message: String,
    },
}

/// Execute a filter against a feature source and materialise the results.
///
/// Implementers own transport, retries, and cancellation. A cancelled or
/// failed query must simply never reach the cache; reconciliation is then
/// skipped for that attempt.
///
/// # Examples
///
/// ```rust
/// use geomon_core::{Feature, FeatureQuery, FeatureSource, FeatureSourceError};
///
/// struct EmptySource;
///
/// impl FeatureSource for EmptySource {
///     fn query_features(
///         &self,
///         _query: &FeatureQuery,
///     ) -> Result<Vec<Feature>, FeatureSourceError> {
///         Ok(Vec::new())
///     }
/// }
///
/// let batch = EmptySource.query_features(&FeatureQuery::matching_all())?;
/// assert!(batch.is_empty());
/// # Ok::<(), FeatureSourceError>(())
/// ```
pub trait FeatureSource {
    /// Return the features matching `query`.
    fn query_features(&self, query: &FeatureQuery) -> Result<Vec<Feature>, FeatureSourceError>;
}

/// Suppresses repeat spatial queries while the filter has barely moved.
///
/// Panning a map fires many viewpoint changes that would otherwise re-query
/// the same area. The gate accepts a bounding box only when some corner
/// coordinate differs from the last accepted box by more than the tolerance.
///
/// # Examples
/// ```
/// use geo::{Coord, Rect};
/// use geomon_core::RequeryGate;
///
/// let mut gate = RequeryGate::default();
/// let bbox = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
///
/// assert!(gate.should_requery(&bbox));
/// assert!(!gate.should_requery(&bbox));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RequeryGate {
    tolerance: f64,
    last: Option<Rect<f64>>,
}

impl RequeryGate {
    /// Create a gate with a caller-supplied coordinate tolerance in degrees.
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            last: None,
        }
    }

    /// Decide whether a query for `bbox` is worth executing.
    ///
    /// Returns `false` when the box is within tolerance of the last accepted
    /// one. An accepted box becomes the new reference.
    pub fn should_requery(&mut self, bbox: &Rect<f64>) -> bool {
        if let Some(last) = &self.last
            && within_tolerance(last, bbox, self.tolerance)
        {
            return false;
        }
        self.last = Some(*bbox);
        true
    }

    /// Forget the last accepted bounding box.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for RequeryGate {
    fn default() -> Self {
        Self::new(WGS84_COORDINATE_TOLERANCE)
    }
}

fn within_tolerance(a: &Rect<f64>, b: &Rect<f64>, tolerance: f64) -> bool {
    let close = |lhs: f64, rhs: f64| (lhs - rhs).abs() <= tolerance;
    close(a.min().x, b.min().x)
        && close(a.min().y, b.min().y)
        && close(a.max().x, b.max().x)
        && close(a.max().y, b.max().y)
}
