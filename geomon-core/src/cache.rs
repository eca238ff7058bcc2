//! Last-seen feature cache and batch reconciliation.
//!
//! [`FeatureCache`] owns the mapping from object id to the most recently
//! observed distinct geometry for that id. [`FeatureCache::reconcile`]
//! ingests one query result at a time and classifies every feature against
//! the cached state, mutating the cache in place.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compare::{ExactGeometryComparer, GeometryComparer, GeometryComparisonError};
use crate::feature::{DEFAULT_ID_ATTRIBUTE, Feature, ObjectId};

/// How a reconciled feature relates to the cached state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ChangeKind {
    /// The id was not cached before; the feature was inserted.
    Added,
    /// The id was cached with an equal geometry; the cache was left untouched.
    Unchanged,
    /// The id was cached with a different geometry; the record was replaced.
    Updated,
}

/// Per-feature reconciliation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Classification {
    /// Identifier extracted from the feature's id attribute.
    pub id: ObjectId,
    /// Outcome for this feature.
    pub kind: ChangeKind,
}

/// Aggregate outcome of one [`FeatureCache::reconcile`] call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReconcileSummary {
    /// Features in the batch that carried a usable geometry.
    pub non_empty_geometries: usize,
    /// Cache size after the batch was applied.
    pub cache_size: usize,
    /// One entry per input feature, in input order.
    pub classifications: Vec<Classification>,
}

impl ReconcileSummary {
    /// Count of features classified as [`ChangeKind::Added`].
    #[must_use]
    pub fn added(&self) -> usize {
        self.count(ChangeKind::Added)
    }

    /// Count of features classified as [`ChangeKind::Unchanged`].
    #[must_use]
    pub fn unchanged(&self) -> usize {
        self.count(ChangeKind::Unchanged)
    }

    /// Count of features classified as [`ChangeKind::Updated`].
    #[must_use]
    pub fn updated(&self) -> usize {
        self.count(ChangeKind::Updated)
    }

    fn count(&self, kind: ChangeKind) -> usize {
        self.classifications
            .iter()
            .filter(|classification| classification.kind == kind)
            .count()
    }
}

/// Errors returned by [`FeatureCache::reconcile`].
///
/// Both variants abort the remaining batch. Features processed before the
/// failure stay applied; the cache is never rolled back and never left
/// structurally invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// A feature's identity could not be determined because the id attribute
    /// was missing or not an integral number.
    #[error("feature has no usable {attribute} attribute")]
    InvalidFeatureRecord {
        /// Name of the attribute consulted for identity.
        attribute: String,
    },
    /// The geometry comparer failed to evaluate the cached and incoming
    /// geometries for a feature.
    #[error("failed to compare geometries for feature {id}")]
    GeometryComparison {
        /// Identifier of the feature whose geometries were compared.
        id: ObjectId,
        /// Failure reported by the comparer.
        #[source]
        source: GeometryComparisonError,
    },
}

/// Authoritative last-seen state per feature id.
///
/// The cache starts empty, is mutated only by [`FeatureCache::reconcile`],
/// and lives for the session; nothing is persisted across runs. It holds
/// mutable state without internal locking, so callers serialise access —
/// `&mut self` enforces the single-writer discipline at compile time.
///
/// # Examples
/// ```
/// use geomon_core::{Attributes, ChangeKind, Feature, FeatureCache};
/// use serde_json::json;
///
/// # fn main() -> Result<(), geomon_core::ReconcileError> {
/// let mut cache = FeatureCache::new();
/// let feature = Feature::with_point(
///     8.68,
///     50.11,
///     Attributes::from([("OBJECTID".into(), json!(1))]),
/// );
///
/// let summary = cache.reconcile([feature.clone()])?;
/// assert_eq!(summary.classifications[0].kind, ChangeKind::Added);
///
/// let summary = cache.reconcile([feature])?;
/// assert_eq!(summary.classifications[0].kind, ChangeKind::Unchanged);
/// assert_eq!(cache.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FeatureCache<C = ExactGeometryComparer> {
    entries: HashMap<ObjectId, Feature>,
    id_attribute: String,
    comparer: C,
}

impl FeatureCache<ExactGeometryComparer> {
    /// Create an empty cache keyed by [`DEFAULT_ID_ATTRIBUTE`] and comparing
    /// geometries exactly.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id_attribute(DEFAULT_ID_ATTRIBUTE)
    }

    /// Create an empty cache keyed by the named id attribute.
    #[must_use]
    pub fn with_id_attribute(attribute: impl Into<String>) -> Self {
        Self::with_comparer(attribute, ExactGeometryComparer)
    }
}

impl Default for FeatureCache<ExactGeometryComparer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: GeometryComparer> FeatureCache<C> {
    /// Create an empty cache with a caller-supplied equality predicate.
    #[must_use]
    pub fn with_comparer(attribute: impl Into<String>, comparer: C) -> Self {
        Self {
            entries: HashMap::new(),
            id_attribute: attribute.into(),
            comparer,
        }
    }

    /// Reconcile one queried batch against the cached state.
    ///
    /// Features are processed in input order; duplicate ids within a batch
    /// each see the effect of the prior occurrence. For every feature the
    /// returned summary records exactly one classification:
    ///
    /// - id not cached → the feature is inserted, [`ChangeKind::Added`];
    /// - id cached with an equal geometry → cache untouched,
    ///   [`ChangeKind::Unchanged`];
    /// - id cached with a different geometry → record replaced,
    ///   [`ChangeKind::Updated`].
    ///
    /// Two empty geometries compare equal; an empty and a non-empty geometry
    /// differ.
    ///
    /// # Errors
    ///
    /// Fails with [`ReconcileError::InvalidFeatureRecord`] when a feature's
    /// id attribute is missing or non-integral, and with
    /// [`ReconcileError::GeometryComparison`] when the comparer cannot
    /// evaluate a pair. Either failure aborts the remaining batch; features
    /// processed before it stay applied.
    pub fn reconcile(
        &mut self,
        batch: impl IntoIterator<Item = Feature>,
    ) -> Result<ReconcileSummary, ReconcileError> {
        let mut summary = ReconcileSummary::default();
        for feature in batch {
            if feature.has_geometry() {
                summary.non_empty_geometries += 1;
            }

            let id = feature.object_id(&self.id_attribute).ok_or_else(|| {
                ReconcileError::InvalidFeatureRecord {
                    attribute: self.id_attribute.clone(),
                }
            })?;

            let kind = match self.entries.get(&id) {
                None => {
                    self.entries.insert(id, feature);
                    ChangeKind::Added
                }
                Some(cached) => {
                    if self.geometries_equal(id, cached, &feature)? {
                        ChangeKind::Unchanged
                    } else {
                        self.entries.insert(id, feature);
                        ChangeKind::Updated
                    }
                }
            };
            summary.classifications.push(Classification { id, kind });
        }
        summary.cache_size = self.entries.len();
        Ok(summary)
    }

    fn geometries_equal(
        &self,
        id: ObjectId,
        cached: &Feature,
        incoming: &Feature,
    ) -> Result<bool, ReconcileError> {
        match (cached.geometry.as_ref(), incoming.geometry.as_ref()) {
            (None, None) => Ok(true),
            (Some(a), Some(b)) => self
                .comparer
                .equals(a, b)
                .map_err(|source| ReconcileError::GeometryComparison { id, source }),
            _ => Ok(false),
        }
    }

    /// Number of cached features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Report whether the cache holds no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Report whether the id is cached.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Retrieve the cached record for an id.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&Feature> {
        self.entries.get(&id)
    }

    /// Iterate over the cached records in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Feature)> {
        self.entries.iter().map(|(id, feature)| (*id, feature))
    }

    /// Name of the attribute consulted for feature identity.
    #[must_use]
    pub fn id_attribute(&self) -> &str {
        &self.id_attribute
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Attributes;
    use crate::test_support::FailingComparer;
    use geo::{Geometry, Point};
    use rstest::rstest;
    use serde_json::json;

    fn point_feature(id: ObjectId, x: f64, y: f64) -> Feature {
        Feature::with_point(x, y, Attributes::from([("OBJECTID".into(), json!(id))]))
    }

    fn empty_feature(id: ObjectId) -> Feature {
        Feature::without_geometry(Attributes::from([("OBJECTID".into(), json!(id))]))
    }

    fn kinds(summary: &ReconcileSummary) -> Vec<ChangeKind> {
        summary
            .classifications
            .iter()
            .map(|classification| classification.kind)
            .collect()
    }

    #[rstest]
    fn first_batch_adds_every_feature() {
        let mut cache = FeatureCache::new();
        let summary = cache
            .reconcile([point_feature(1, 0.0, 0.0), point_feature(2, 1.0, 1.0)])
            .expect("reconcile succeeds");

        assert_eq!(kinds(&summary), vec![ChangeKind::Added, ChangeKind::Added]);
        assert_eq!(summary.cache_size, 2);
        assert_eq!(cache.len(), 2);
    }

    #[rstest]
    fn unchanged_and_moved_features_are_told_apart() {
        let mut cache = FeatureCache::new();
        cache
            .reconcile([point_feature(1, 0.0, 0.0), point_feature(2, 1.0, 1.0)])
            .expect("seed cache");

        let summary = cache
            .reconcile([point_feature(1, 0.0, 0.0), point_feature(2, 2.0, 2.0)])
            .expect("reconcile succeeds");

        assert_eq!(
            kinds(&summary),
            vec![ChangeKind::Unchanged, ChangeKind::Updated]
        );
        assert_eq!(
            cache.get(2).and_then(|feature| feature.geometry.clone()),
            Some(Geometry::Point(Point::new(2.0, 2.0)))
        );
        assert_eq!(summary.cache_size, 2);
    }

    #[rstest]
    fn later_duplicate_in_one_batch_wins() {
        let mut cache = FeatureCache::new();
        cache
            .reconcile([point_feature(1, 0.0, 0.0)])
            .expect("seed cache");

        let summary = cache
            .reconcile([point_feature(1, 0.0, 0.0), point_feature(1, 3.0, 3.0)])
            .expect("reconcile succeeds");

        assert_eq!(
            kinds(&summary),
            vec![ChangeKind::Unchanged, ChangeKind::Updated]
        );
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.get(1).and_then(|feature| feature.geometry.clone()),
            Some(Geometry::Point(Point::new(3.0, 3.0)))
        );
    }

    #[rstest]
    fn reconciling_same_batch_twice_is_idempotent() {
        let batch = vec![point_feature(1, 0.0, 0.0), point_feature(2, 1.0, 1.0)];
        let mut cache = FeatureCache::new();

        let first = cache.reconcile(batch.clone()).expect("first pass");
        let second = cache.reconcile(batch).expect("second pass");

        assert_eq!(first.added(), 2);
        assert_eq!(second.unchanged(), 2);
        assert_eq!(first.cache_size, second.cache_size);
    }

    #[rstest]
    fn cache_grows_by_exactly_the_added_count() {
        let mut cache = FeatureCache::new();
        cache
            .reconcile([point_feature(1, 0.0, 0.0)])
            .expect("seed cache");
        let before = cache.len();

        let summary = cache
            .reconcile([
                point_feature(1, 5.0, 5.0),
                point_feature(2, 1.0, 1.0),
                point_feature(3, 2.0, 2.0),
            ])
            .expect("reconcile succeeds");

        assert_eq!(cache.len(), before + summary.added());
    }

    #[rstest]
    fn empty_geometries_are_excluded_from_the_usable_count() {
        let mut cache = FeatureCache::new();
        let summary = cache
            .reconcile([
                point_feature(1, 0.0, 0.0),
                empty_feature(2),
                point_feature(3, 1.0, 1.0),
            ])
            .expect("reconcile succeeds");

        assert_eq!(summary.non_empty_geometries, 2);
        assert_eq!(summary.cache_size, 3);
    }

    #[rstest]
    fn empty_geometry_still_reconciles_by_identity() {
        let mut cache = FeatureCache::new();
        cache.reconcile([empty_feature(1)]).expect("seed cache");

        let unchanged = cache
            .reconcile([empty_feature(1)])
            .expect("reconcile succeeds");
        assert_eq!(kinds(&unchanged), vec![ChangeKind::Unchanged]);

        let updated = cache
            .reconcile([point_feature(1, 0.0, 0.0)])
            .expect("reconcile succeeds");
        assert_eq!(kinds(&updated), vec![ChangeKind::Updated]);
    }

    #[rstest]
    fn unresolvable_id_aborts_with_partial_state() {
        let mut cache = FeatureCache::new();
        let batch = [
            point_feature(1, 0.0, 0.0),
            point_feature(2, 1.0, 1.0),
            Feature::with_point(2.0, 2.0, Attributes::new()),
            point_feature(4, 3.0, 3.0),
        ];

        let error = cache.reconcile(batch).expect_err("missing id should fail");

        assert_eq!(
            error,
            ReconcileError::InvalidFeatureRecord {
                attribute: DEFAULT_ID_ATTRIBUTE.into(),
            }
        );
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(1));
        assert!(cache.contains(2));
        assert!(!cache.contains(4));
    }

    #[rstest]
    fn comparer_failure_aborts_with_partial_state() {
        let mut cache = FeatureCache::with_comparer(DEFAULT_ID_ATTRIBUTE, FailingComparer);
        cache
            .reconcile([point_feature(1, 0.0, 0.0)])
            .expect("additions never invoke the comparer");

        let error = cache
            .reconcile([point_feature(2, 1.0, 1.0), point_feature(1, 0.0, 0.0)])
            .expect_err("comparison should fail");

        assert!(matches!(
            error,
            ReconcileError::GeometryComparison { id: 1, .. }
        ));
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(2));
    }

    #[rstest]
    fn custom_id_attribute_is_honoured() {
        let mut cache = FeatureCache::with_id_attribute("FID");
        let feature = Feature::with_point(0.0, 0.0, Attributes::from([("FID".into(), json!(9))]));

        let summary = cache.reconcile([feature]).expect("reconcile succeeds");

        assert_eq!(summary.classifications[0].id, 9);
        assert!(cache.contains(9));
    }

    #[rstest]
    fn empty_batch_is_a_no_op() {
        let mut cache = FeatureCache::new();
        let summary = cache.reconcile([]).expect("reconcile succeeds");

        assert!(summary.classifications.is_empty());
        assert_eq!(summary.non_empty_geometries, 0);
        assert_eq!(summary.cache_size, 0);
        assert!(cache.is_empty());
    }

    #[rstest]
    fn accessors_reflect_cached_state() {
        let mut cache = FeatureCache::new();
        cache
            .reconcile([point_feature(1, 0.0, 0.0), point_feature(2, 1.0, 1.0)])
            .expect("seed cache");

        assert!(!cache.is_empty());
        assert_eq!(cache.id_attribute(), DEFAULT_ID_ATTRIBUTE);
        assert!(cache.get(1).is_some());
        assert!(cache.get(3).is_none());

        let mut ids: Vec<ObjectId> = cache.iter().map(|(id, _)| id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }
}
