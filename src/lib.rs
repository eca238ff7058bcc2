//! Facade crate for the geomon feature-monitoring engine.
//!
//! This crate re-exports the core domain types so applications can depend on
//! a single crate while the implementation lives in the workspace members.

#![forbid(unsafe_code)]

pub use geomon_core::{
    Attributes, CalloutData, ChangeKind, Classification, DEFAULT_ID_ATTRIBUTE,
    ExactGeometryComparer, Feature, FeatureCache, FeatureMonitor, FeatureQuery, FeatureSource,
    FeatureSourceError, GeometryComparer, GeometryComparisonError, MonitorError, ObjectId,
    ReconcileError, ReconcileSummary, RequeryGate,
};
