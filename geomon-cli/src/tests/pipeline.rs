//! End-to-end tests running the diff pipeline over snapshot files.

use super::*;
use rstest::rstest;
use std::path::PathBuf;

#[rstest]
fn diff_reports_baseline_and_update_counts() {
    let snapshots = helpers::SnapshotFiles::new();
    let config = DiffConfig {
        baseline: snapshots.baseline.clone(),
        updates: vec![snapshots.update.clone()],
        id_attribute: DEFAULT_ID_ATTRIBUTE.into(),
    };

    let report = run_diff(&config).expect("diff succeeds");
    let lines: Vec<&str> = report.lines().collect();

    assert_eq!(lines.len(), 2);
    assert!(
        lines[0].contains("2 added, 0 updated, 0 unchanged"),
        "baseline line was {:?}",
        lines[0]
    );
    assert!(
        lines[1].contains("0 added, 1 updated, 1 unchanged"),
        "update line was {:?}",
        lines[1]
    );
    assert!(lines[1].contains("2 cached"), "update line was {:?}", lines[1]);
}

#[rstest]
fn diff_without_updates_only_loads_the_baseline() {
    let snapshots = helpers::SnapshotFiles::new();
    let config = DiffConfig {
        baseline: snapshots.baseline.clone(),
        updates: Vec::new(),
        id_attribute: DEFAULT_ID_ATTRIBUTE.into(),
    };

    let report = run_diff(&config).expect("diff succeeds");

    assert_eq!(report.lines().count(), 1);
    assert!(report.contains("2 added"));
}

#[rstest]
fn diff_surfaces_unreadable_snapshots() {
    let config = DiffConfig {
        baseline: PathBuf::from("/non-existent/baseline.geojson"),
        updates: Vec::new(),
        id_attribute: DEFAULT_ID_ATTRIBUTE.into(),
    };

    let err = run_diff(&config).expect_err("missing snapshot should fail");
    assert!(matches!(err, CliError::Snapshot(_)));
}
