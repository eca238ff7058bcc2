//! Core reconciliation logic for monitored geospatial features.
//!
//! The engine ingests batches of queried features, each identified by an
//! "OBJECTID"-style integer attribute, and keeps an authoritative cache of
//! the last-seen geometry per identifier. [`FeatureCache::reconcile`]
//! classifies every incoming feature as added, unchanged, or updated and
//! mutates the cache accordingly. Query execution stays behind the
//! [`FeatureSource`] seam so callers own the filter language, transport, and
//! cancellation.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod cache;
mod callout;
mod compare;
mod feature;
mod monitor;
mod source;
pub mod test_support;

pub use cache::{ChangeKind, Classification, FeatureCache, ReconcileError, ReconcileSummary};
pub use callout::CalloutData;
pub use compare::{ExactGeometryComparer, GeometryComparer, GeometryComparisonError};
pub use feature::{Attributes, DEFAULT_ID_ATTRIBUTE, Feature, ObjectId};
pub use monitor::{FeatureMonitor, MonitorError};
pub use source::{
    FeatureQuery, FeatureSource, FeatureSourceError, MATCH_ALL_CLAUSE, RequeryGate,
    WGS84_COORDINATE_TOLERANCE,
};
