// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Unitree JSON-manifest adapter.
//!
//! An episode directory holds `data.json` plus the image and tactile files
//! it references:
//!
//! ```json
//! {
//!   "info": { "image": { "fps": 30 } },
//!   "data": [
//!     {
//!       "idx": 0,
//!       "colors": { "color_0": "colors/000000_color_0.jpg" },
//!       "states": { "left_arm": { "qpos": [0.1, 0.2] } },
//!       "tactiles": { "left_hand": "tactiles/000000_left_hand.npy" }
//!     }
//!   ]
//! }
//! ```
//!
//! Records are kept as JSON values after load and read section by section
//! on access. A null or malformed section (`"body": null`,
//! `"tactiles": null`) only drops the channels it would have produced.

use std::any::Any;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::frame::state_vec;
use crate::io::npy::read_npy;
use crate::io::traits::{check_index, DatasetAdapter};
use crate::{AdapterConfig, DatasetType, Frame, Result};

const ADAPTER: &str = "JsonManifestAdapter";

/// Body parts concatenated into `qpos`, in order.
pub const QPOS_PART_ORDER: [&str; 6] = [
    "left_arm",
    "right_arm",
    "left_ee",
    "right_ee",
    "head",
    "body",
];

/// Non-empty string entries of an object section such as `colors`.
///
/// A missing, null or non-object section yields nothing.
fn path_entries<'a>(record: &'a Value, section: &str) -> impl Iterator<Item = (&'a str, &'a str)> {
    record
        .get(section)
        .and_then(Value::as_object)
        .into_iter()
        .flatten()
        .filter_map(|(key, value)| {
            let rel = value.as_str().filter(|rel| !rel.is_empty())?;
            Some((key.as_str(), rel))
        })
}

/// Joint positions concatenated in [`QPOS_PART_ORDER`].
///
/// Parts that are null, lack `qpos` or hold non-numeric values are skipped.
fn record_qpos(record: &Value) -> Vec<f64> {
    let Some(states) = record.get("states").and_then(Value::as_object) else {
        return Vec::new();
    };
    QPOS_PART_ORDER
        .iter()
        .filter_map(|part| states.get(*part))
        .filter_map(|state| state.get("qpos").and_then(Value::as_array))
        .filter_map(|qpos| qpos.iter().map(Value::as_f64).collect::<Option<Vec<f64>>>())
        .flatten()
        .collect()
}

/// Locate the per-frame record list inside a manifest document.
fn find_records(doc: Value) -> Option<Vec<Value>> {
    match doc {
        Value::Array(list) => Some(list),
        Value::Object(mut map) => {
            if let Some(Value::Array(list)) = map.remove("data") {
                return Some(list);
            }
            map.into_iter().find_map(|(_, v)| match v {
                Value::Array(list) if looks_like_records(&list) => Some(list),
                _ => None,
            })
        }
        _ => None,
    }
}

fn looks_like_records(list: &[Value]) -> bool {
    list.first()
        .and_then(Value::as_object)
        .is_some_and(|first| first.contains_key("colors") || first.contains_key("states"))
}

fn manifest_fps(doc: &Value) -> Option<f64> {
    doc.pointer("/info/image/fps")?.as_f64()
}

/// Adapter over a `data.json` manifest.
pub struct JsonManifestAdapter {
    default_fps: f64,
    fps: f64,
    root: Option<PathBuf>,
    records: Vec<Value>,
    sensors: Vec<String>,
}

impl JsonManifestAdapter {
    /// Create an adapter; `config.default_fps` applies when the manifest
    /// declares no frame rate.
    pub fn new(config: &AdapterConfig) -> Self {
        Self {
            default_fps: config.default_fps,
            fps: config.default_fps,
            root: None,
            records: Vec::new(),
            sensors: Vec::new(),
        }
    }

    /// Frame rate in effect for the loaded manifest.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    fn load_manifest(&mut self, path: &Path) -> std::result::Result<(), String> {
        let (json_file, root) = if path.is_dir() {
            (path.join("data.json"), path.to_path_buf())
        } else {
            let parent = path.parent().unwrap_or(Path::new(".")).to_path_buf();
            (path.to_path_buf(), parent)
        };
        let text = std::fs::read_to_string(&json_file)
            .map_err(|e| format!("cannot read {}: {e}", json_file.display()))?;
        let doc: Value = serde_json::from_str(&text).map_err(|e| format!("invalid JSON: {e}"))?;

        let fps = manifest_fps(&doc).filter(|f| *f > 0.0).unwrap_or(self.default_fps);
        let records = find_records(doc).ok_or("no per-frame record list")?;
        if records.is_empty() {
            return Err("record list is empty".to_string());
        }

        // Ordered union of color keys over all records.
        let mut sensors: Vec<String> = Vec::new();
        for record in &records {
            if let Some(colors) = record.get("colors").and_then(Value::as_object) {
                for key in colors.keys() {
                    if !sensors.contains(key) {
                        sensors.push(key.clone());
                    }
                }
            }
        }

        self.fps = fps;
        self.records = records;
        self.sensors = sensors;
        self.root = Some(root);
        Ok(())
    }
}

impl DatasetAdapter for JsonManifestAdapter {
    fn load(&mut self, path: &Path) -> bool {
        self.close();
        match self.load_manifest(path) {
            Ok(()) => {
                info!(
                    context = ADAPTER,
                    path = %path.display(),
                    frames = self.records.len(),
                    fps = self.fps,
                    sensors = ?self.sensors,
                    "Loaded manifest"
                );
                true
            }
            Err(reason) => {
                warn!(
                    context = ADAPTER,
                    path = %path.display(),
                    reason = %reason,
                    "Failed to load manifest"
                );
                self.close();
                false
            }
        }
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn sensors(&self) -> &[String] {
        &self.sensors
    }

    fn frame(&mut self, index: usize) -> Result<Frame> {
        check_index(self.root.is_some(), ADAPTER, index, self.len())?;
        let root = self.root.as_deref().unwrap_or(Path::new("."));

        let record = &self.records[index];
        let idx = record
            .get("idx")
            .and_then(Value::as_f64)
            .unwrap_or(index as f64);
        let mut frame = Frame::new(idx / self.fps);

        for (sensor, rel) in path_entries(record, "colors") {
            let full = root.join(rel);
            match image::open(&full) {
                Ok(img) => {
                    frame.images.insert(sensor.to_string(), img.to_rgb8());
                }
                Err(e) => debug!(
                    context = ADAPTER,
                    path = %full.display(),
                    error = %e,
                    "Image unavailable"
                ),
            }
        }

        let qpos = record_qpos(record);
        if !qpos.is_empty() {
            frame.state.insert("qpos".to_string(), state_vec(qpos));
        }

        for (name, rel) in path_entries(record, "tactiles") {
            let full = root.join(rel);
            if !full.is_file() {
                continue;
            }
            match read_npy(&full) {
                Ok(arr) => {
                    frame.state.insert(name.to_string(), arr);
                }
                Err(e) => warn!(
                    context = ADAPTER,
                    path = %full.display(),
                    error = %e,
                    "Failed to read tactile array"
                ),
            }
        }

        Ok(frame)
    }

    fn close(&mut self) {
        self.root = None;
        self.records.clear();
        self.sensors.clear();
        self.fps = self.default_fps;
    }

    fn dataset_type(&self) -> DatasetType {
        DatasetType::JsonManifest
    }

    fn path(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
