//! Monitoring facade tying a feature source to the reconciliation cache.
//!
//! The surrounding application triggers reconciliation at two points: an
//! initial data-source load and a user-initiated spatial query. Both are
//! plain function calls here; no event machinery belongs in the engine.

use geo::Rect;
use log::debug;
use thiserror::Error;

use crate::cache::{FeatureCache, ReconcileError, ReconcileSummary};
use crate::compare::{ExactGeometryComparer, GeometryComparer};
use crate::source::{FeatureQuery, FeatureSource, FeatureSourceError, RequeryGate};

/// Errors surfaced when a monitor trigger runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    /// The upstream query failed; the cache was left untouched.
    #[error("feature query failed")]
    Source(#[from] FeatureSourceError),
    /// Reconciliation aborted part-way through the batch.
    #[error("reconciliation failed")]
    Reconcile(#[from] ReconcileError),
}

/// Drives a [`FeatureSource`] into a [`FeatureCache`].
///
/// The monitor owns the cache and exposes it read-only; external code cannot
/// mutate the entries directly. Each trigger queries the source, reconciles
/// the batch, and reports the summary. A failed query never reaches the
/// cache, which then stays at its last good state.
///
/// # Examples
/// ```
/// use geomon_core::{Attributes, Feature, FeatureMonitor};
/// use geomon_core::test_support::MemoryFeatureSource;
/// use serde_json::json;
///
/// # fn main() -> Result<(), geomon_core::MonitorError> {
/// let source = MemoryFeatureSource::with_features([Feature::with_point(
///     8.68,
///     50.11,
///     Attributes::from([("OBJECTID".into(), json!(1))]),
/// )]);
/// let mut monitor = FeatureMonitor::new(source);
///
/// let summary = monitor.refresh()?;
/// assert_eq!(summary.added(), 1);
/// assert_eq!(monitor.cache().len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FeatureMonitor<S, C = ExactGeometryComparer> {
    source: S,
    cache: FeatureCache<C>,
    gate: RequeryGate,
}

impl<S: FeatureSource> FeatureMonitor<S, ExactGeometryComparer> {
    /// Monitor the source with a fresh default cache.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::with_cache(source, FeatureCache::new())
    }
}

impl<S: FeatureSource, C: GeometryComparer> FeatureMonitor<S, C> {
    /// Monitor the source with a caller-configured cache.
    #[must_use]
    pub fn with_cache(source: S, cache: FeatureCache<C>) -> Self {
        Self {
            source,
            cache,
            gate: RequeryGate::default(),
        }
    }

    /// Load trigger: query every feature and reconcile the result.
    ///
    /// # Errors
    ///
    /// Propagates source and reconciliation failures as [`MonitorError`].
    pub fn refresh(&mut self) -> Result<ReconcileSummary, MonitorError> {
        self.run(&FeatureQuery::matching_all())
    }

    /// Refresh with a caller-supplied attribute filter.
    ///
    /// # Errors
    ///
    /// Propagates source and reconciliation failures as [`MonitorError`].
    pub fn query_where(
        &mut self,
        clause: impl Into<String>,
    ) -> Result<ReconcileSummary, MonitorError> {
        self.run(&FeatureQuery::with_where_clause(clause))
    }

    /// Spatial-query trigger, e.g. a map tap.
    ///
    /// Consults the re-query gate first: `Ok(None)` means the bounding box
    /// was within tolerance of the previously queried one and the query was
    /// suppressed.
    ///
    /// # Errors
    ///
    /// Propagates source and reconciliation failures as [`MonitorError`].
    pub fn query_within(
        &mut self,
        bbox: Rect<f64>,
    ) -> Result<Option<ReconcileSummary>, MonitorError> {
        if !self.gate.should_requery(&bbox) {
            debug!("spatial filter barely moved, query suppressed");
            return Ok(None);
        }
        self.run(&FeatureQuery::within(bbox)).map(Some)
    }

    /// Read access to the cached state.
    #[must_use]
    pub fn cache(&self) -> &FeatureCache<C> {
        &self.cache
    }

    fn run(&mut self, query: &FeatureQuery) -> Result<ReconcileSummary, MonitorError> {
        let batch = self.source.query_features(query)?;
        let summary = self.cache.reconcile(batch)?;
        debug!(
            "{} features with geometry in batch",
            summary.non_empty_geometries
        );
        debug!("{} features cached", summary.cache_size);
        Ok(summary)
    }
}
