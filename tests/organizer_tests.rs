// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Grouping and quarantine on scanned trees.

mod common;

use std::fs;

use common::*;
use robocurate::curation::organizer::{group_dir_name, MANIFEST_NAME};
use robocurate::curation::write_cleaning_report;
use robocurate::{
    DatasetAdapter, DatasetInspector, DatasetOrganizer, DatasetType, ReaderFactory, ScanOptions,
};
use tempfile::TempDir;

#[test]
fn test_group_then_read_moved_dataset() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    make_unitree_episode(&root.join("incoming/ep_0"), 2, 30.0, false);
    write_file(&root.join("incoming/ep_1.hdf5"), b"x");

    let mut inspector = DatasetInspector::new(root);
    inspector.scan(&ScanOptions::default());
    assert_eq!(inspector.grouped().len(), 2);

    let organizer = DatasetOrganizer::new(root);
    let moved = organizer.group_by_type(inspector.grouped()).unwrap();
    let ep0 = root.join(group_dir_name(DatasetType::JsonManifest)).join("ep_0");
    assert_eq!(moved[&DatasetType::JsonManifest], vec![ep0.clone()]);
    assert!(root.join("grouped_HDF5/ep_1.hdf5").is_file());
    assert!(!root.join("incoming/ep_0").exists());

    // Relative paths inside the manifest still resolve after the move
    let mut reader = ReaderFactory::open(&ep0).unwrap();
    assert!(reader.frame(1).unwrap().image("color_0").is_some());

    // A second scan sees the grouped layout
    inspector.scan(&ScanOptions::default());
    assert_eq!(inspector.valid_paths().len(), 2);
    assert!(inspector.valid_paths().contains(&ep0));
}

#[test]
fn test_quarantine_and_report() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    make_unitree_episode(&root.join("good"), 1, 30.0, false);
    make_unitree_episode(&root.join("bad"), 1, 30.0, false);

    let organizer = DatasetOrganizer::new(root);
    let bad = vec![root.join("bad")];
    let quarantine = organizer.quarantine(&bad).unwrap();
    assert!(quarantine.join("bad/data.json").is_file());
    let manifest = fs::read_to_string(quarantine.join(MANIFEST_NAME)).unwrap();
    assert!(manifest.contains(&format!("Original Path: {}", root.join("bad").display())));

    let report = write_cleaning_report(root, &bad).unwrap();
    let text = fs::read_to_string(report).unwrap();
    assert!(text.ends_with(&format!("{}\n", root.join("bad").display())));

    // Quarantine folder and report stay out of the next scan
    let mut inspector = DatasetInspector::new(root);
    inspector.scan(&ScanOptions::default());
    assert_eq!(inspector.valid_paths(), vec![root.join("good")]);
    assert_eq!(inspector.unknown_count(), 0);
    assert!(inspector.check_consistency());

    // Only at the root: a nested report-like file is still an entry
    write_file(&root.join("notes/cleaning_report_x.txt"), b"x");
    inspector.scan(&ScanOptions::default());
    assert_eq!(inspector.unknown_count(), 1);
}
