//! Geometry equality seam used by reconciliation.
//!
//! The `GeometryComparer` trait abstracts the equality predicate applied to
//! cached and incoming geometries. The default implementation compares
//! coordinates exactly; callers with topological requirements supply their
//! own comparer.

use geo::Geometry;
use thiserror::Error;

/// The equality predicate could not evaluate two geometries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to compare geometries: {reason}")]
pub struct GeometryComparisonError {
    /// Implementation-specific description of the failure.
    pub reason: String,
}

impl GeometryComparisonError {
    /// Build an error carrying the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Decide whether two geometries describe the same shape.
///
/// Implementations may be exact or topological and are free to fail on input
/// they cannot evaluate, e.g. malformed rings.
///
/// # Examples
///
/// ```rust
/// use geo::{Geometry, Point};
/// use geomon_core::{GeometryComparer, GeometryComparisonError};
///
/// struct AlwaysEqual;
///
/// impl GeometryComparer for AlwaysEqual {
///     fn equals(
///         &self,
///         _a: &Geometry<f64>,
///         _b: &Geometry<f64>,
///     ) -> Result<bool, GeometryComparisonError> {
///         Ok(true)
///     }
/// }
///
/// let a = Geometry::Point(Point::new(0.0, 0.0));
/// let b = Geometry::Point(Point::new(1.0, 1.0));
/// assert_eq!(AlwaysEqual.equals(&a, &b), Ok(true));
/// ```
pub trait GeometryComparer {
    /// Report whether `a` and `b` are equal.
    fn equals(&self, a: &Geometry<f64>, b: &Geometry<f64>)
    -> Result<bool, GeometryComparisonError>;
}

/// Coordinate-exact equality. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactGeometryComparer;

impl GeometryComparer for ExactGeometryComparer {
    fn equals(
        &self,
        a: &Geometry<f64>,
        b: &Geometry<f64>,
    ) -> Result<bool, GeometryComparisonError> {
        Ok(a == b)
    }
}
