// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Dataset format detection.
//!
//! Classifies a filesystem path into a [`DatasetType`] using a fixed,
//! ordered rule table. The first rule that matches wins, so a directory that
//! carries both `data.json` and `meta/info.json` is a JSON-manifest dataset.
//!
//! Detection only looks at shallow directory listings, except for the
//! scoped search for parquet shards below `data/`. It never opens files.
//!
//! # Example
//!
//! ```rust,no_run
//! use robocurate::io::detection::detect_type;
//! use robocurate::DatasetType;
//!
//! let ty = detect_type("episode_0.hdf5");
//! assert_eq!(ty, DatasetType::Table);
//! ```

use std::path::Path;

use walkdir::WalkDir;

use crate::DatasetType;

/// File extensions accepted as still images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// One entry of the detection table.
#[derive(Debug, Clone, Copy)]
pub struct DetectionRule {
    /// Short description, used in logs and tests
    pub name: &'static str,
    /// Type assigned when the rule matches
    pub dataset_type: DatasetType,
    matcher: fn(&Path) -> bool,
}

impl DetectionRule {
    /// Check whether this rule matches a path.
    pub fn matches(&self, path: &Path) -> bool {
        (self.matcher)(path)
    }
}

/// Ordered detection rules. First match wins.
pub const DETECTION_RULES: &[DetectionRule] = &[
    DetectionRule {
        name: "dir with data.json",
        dataset_type: DatasetType::JsonManifest,
        matcher: is_json_manifest_dir,
    },
    DetectionRule {
        name: "dir with meta/info.json or data/**/*.parquet",
        dataset_type: DatasetType::ColumnarMedia,
        matcher: is_columnar_dir,
    },
    DetectionRule {
        name: "dir with images",
        dataset_type: DatasetType::RawFolder,
        matcher: is_image_dir,
    },
    DetectionRule {
        name: "h5/hdf5/hdf file",
        dataset_type: DatasetType::Table,
        matcher: is_table_file,
    },
    DetectionRule {
        name: "bag/mcap file",
        dataset_type: DatasetType::TimeIndexedMessages,
        matcher: is_message_file,
    },
    DetectionRule {
        name: "parquet file",
        dataset_type: DatasetType::ColumnarMedia,
        matcher: is_parquet_file,
    },
];

/// Detect the dataset type of a path.
///
/// Never fails: paths that match no rule (including paths that do not
/// exist) are [`DatasetType::Unknown`].
pub fn detect_type<P: AsRef<Path>>(path: P) -> DatasetType {
    let path = path.as_ref();
    DETECTION_RULES
        .iter()
        .find(|rule| rule.matches(path))
        .map(|rule| rule.dataset_type)
        .unwrap_or(DatasetType::Unknown)
}

/// Lowercased file extension.
pub(crate) fn extension_lower(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

fn has_extension(path: &Path, exts: &[&str]) -> bool {
    extension_lower(path).is_some_and(|ext| exts.contains(&ext.as_str()))
}

/// Check if a path names a still image by extension.
pub fn is_image_path(path: &Path) -> bool {
    has_extension(path, IMAGE_EXTENSIONS)
}

fn is_json_manifest_dir(path: &Path) -> bool {
    path.is_dir() && path.join("data.json").is_file()
}

fn is_columnar_dir(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }
    if path.join("meta").join("info.json").is_file() {
        return true;
    }
    let data_dir = path.join("data");
    data_dir.is_dir() && contains_parquet(&data_dir)
}

fn contains_parquet(dir: &Path) -> bool {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .any(|e| e.file_type().is_file() && has_extension(e.path(), &["parquet"]))
}

fn is_image_dir(path: &Path) -> bool {
    path.is_dir() && (dir_has_image(path) || dir_has_image(&path.join("colors")))
}

fn dir_has_image(dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries
        .filter_map(|e| e.ok())
        .any(|e| e.path().is_file() && is_image_path(&e.path()))
}

fn is_table_file(path: &Path) -> bool {
    path.is_file() && has_extension(path, &["h5", "hdf5", "hdf"])
}

fn is_message_file(path: &Path) -> bool {
    path.is_file() && has_extension(path, &["bag", "mcap"])
}

fn is_parquet_file(path: &Path) -> bool {
    path.is_file() && has_extension(path, &["parquet"])
}

/// Format detector.
///
/// This trait can be implemented for custom detection logic.
pub trait FormatDetector: Send + Sync {
    /// Detect the dataset type of a path.
    fn detect(&self, path: &Path) -> DatasetType;
}

/// Default detector backed by [`DETECTION_RULES`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatDetector;

impl FormatDetector for DefaultFormatDetector {
    fn detect(&self, path: &Path) -> DatasetType {
        detect_type(path)
    }
}
