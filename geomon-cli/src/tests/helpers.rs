//! Test helpers composing GeoJSON snapshot files on disk.

use std::{fs, path::PathBuf};

use tempfile::TempDir;

pub(super) struct SnapshotFiles {
    _dir: TempDir,
    pub(super) baseline: PathBuf,
    pub(super) update: PathBuf,
}

impl SnapshotFiles {
    /// Write a baseline with two point features and an update where one of
    /// them has moved.
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let baseline = dir.path().join("baseline.geojson");
        let update = dir.path().join("update.geojson");
        fs::write(
            &baseline,
            snapshot(&[(1, 0.0, 0.0), (2, 5.0, 5.0)]),
        )
        .expect("write baseline snapshot");
        fs::write(&update, snapshot(&[(1, 0.0, 0.0), (2, 6.0, 6.0)]))
            .expect("write update snapshot");
        Self {
            _dir: dir,
            baseline,
            update,
        }
    }
}

fn snapshot(points: &[(i64, f64, f64)]) -> String {
    let features: Vec<serde_json::Value> = points
        .iter()
        .map(|(id, x, y)| {
            serde_json::json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [x, y] },
                "properties": { "OBJECTID": id },
            })
        })
        .collect();
    serde_json::json!({ "type": "FeatureCollection", "features": features }).to_string()
}
