// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Unitree `data.json` episodes.

mod common;

use common::*;
use robocurate::io::formats::JsonManifestAdapter;
use robocurate::{AdapterConfig, DatasetAdapter, DatasetType, ReaderFactory};
use tempfile::TempDir;

#[test]
fn test_episode_frames() {
    let dir = TempDir::new().unwrap();
    make_unitree_episode(dir.path(), 3, 15.0, true);

    let mut reader = ReaderFactory::open(dir.path()).unwrap();
    assert_eq!(reader.dataset_type(), DatasetType::JsonManifest);
    assert_eq!(reader.len(), 3);
    assert_eq!(reader.sensors(), &["color_0"]);
    assert_eq!(
        reader.downcast_ref::<JsonManifestAdapter>().unwrap().fps(),
        15.0
    );

    let frame = reader.frame(2).unwrap();
    assert!((frame.timestamp - 2.0 / 15.0).abs() < 1e-9);
    let img = frame.image("color_0").unwrap();
    assert_eq!((img.width(), img.height()), (8, 6));

    // left_arm comes before right_arm regardless of key order
    let qpos = frame.state("qpos").unwrap();
    assert_eq!(qpos.as_slice().unwrap(), &[2.0, 1.0, 2.5]);

    let tactile = frame.state("left_hand").unwrap();
    assert_eq!(tactile.shape(), &[2, 2]);
    assert!(tactile.iter().all(|v| *v == 2.0));
}

#[test]
fn test_missing_image_file_degrades_frame() {
    let dir = TempDir::new().unwrap();
    make_unitree_episode(dir.path(), 2, 30.0, false);
    std::fs::remove_file(dir.path().join("colors/000001_color_0.jpg")).unwrap();

    let mut reader = ReaderFactory::open(dir.path()).unwrap();
    assert!(reader.frame(0).unwrap().image("color_0").is_some());
    let frame = reader.frame(1).unwrap();
    assert!(frame.image("color_0").is_none());
    assert!(frame.state("qpos").is_some());
}

#[test]
fn test_default_fps_without_info() {
    let dir = TempDir::new().unwrap();
    write_file(
        &dir.path().join("data.json"),
        br#"{"data": [{"idx": 4, "colors": {}, "states": {}}]}"#,
    );
    let config = AdapterConfig {
        default_fps: 8.0,
        ..AdapterConfig::default()
    };
    let mut adapter = JsonManifestAdapter::new(&config);
    assert!(adapter.load(dir.path()));
    assert!(adapter.sensors().is_empty());
    let frame = adapter.frame(0).unwrap();
    assert!((frame.timestamp - 0.5).abs() < 1e-9);
    assert!(frame.is_empty());
}

#[test]
fn test_load_manifest_file_directly() {
    let dir = TempDir::new().unwrap();
    make_unitree_episode(dir.path(), 1, 30.0, false);
    let mut adapter = JsonManifestAdapter::new(&AdapterConfig::default());
    assert!(adapter.load(&dir.path().join("data.json")));
    assert_eq!(adapter.path(), Some(dir.path()));
    assert!(adapter.frame(0).unwrap().image("color_0").is_some());
}

#[test]
fn test_rejects_empty_or_invalid_manifest() {
    let dir = TempDir::new().unwrap();
    let mut adapter = JsonManifestAdapter::new(&AdapterConfig::default());

    write_file(&dir.path().join("data.json"), br#"{"data": []}"#);
    assert!(!adapter.load(dir.path()));

    write_file(&dir.path().join("data.json"), b"{ not json");
    assert!(!adapter.load(dir.path()));
    assert!(!adapter.is_loaded());
}

#[test]
fn test_null_sections_keep_other_channels() {
    let dir = TempDir::new().unwrap();
    write_image(&dir.path().join("colors/000000_color_0.jpg"), 8, 6, [0, 255, 0]);
    let doc = serde_json::json!({
        "data": [
            {
                "idx": 0,
                "colors": { "color_0": "colors/000000_color_0.jpg" },
                "states": {
                    "left_arm": { "qpos": [0.1, 0.2] },
                    "body": null,
                },
                "tactiles": null,
            },
            { "idx": 1, "colors": null, "states": null },
        ]
    });
    write_file(&dir.path().join("data.json"), doc.to_string().as_bytes());

    let mut reader = ReaderFactory::open(dir.path()).unwrap();
    assert_eq!(reader.sensors(), &["color_0"]);

    let frame = reader.frame(0).unwrap();
    assert!(frame.image("color_0").is_some());
    assert_eq!(frame.state("qpos").unwrap().as_slice().unwrap(), &[0.1, 0.2]);
    assert_eq!(frame.state.len(), 1);

    let frame = reader.frame(1).unwrap();
    assert!(frame.is_empty());
    assert!((frame.timestamp - 1.0 / 30.0).abs() < 1e-9);
}

#[test]
fn test_sweep_keeps_sensors_and_time_order() {
    let dir = TempDir::new().unwrap();
    make_unitree_episode(dir.path(), 4, 20.0, true);
    let mut reader = ReaderFactory::open(dir.path()).unwrap();
    let stamps = sweep_frames(&mut reader);
    assert_eq!(stamps.len(), 4);
}

#[cfg(target_os = "linux")]
#[test]
fn test_close_releases_handles() {
    let dir = TempDir::new().unwrap();
    make_unitree_episode(dir.path(), 2, 30.0, true);
    let mut reader = ReaderFactory::open(dir.path()).unwrap();
    reader.frame(1).unwrap();
    reader.close();
    assert_eq!(handles_under(dir.path()), 0);
    assert!(!reader.is_loaded());
}
