// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Raw image folder adapter.
//!
//! Frames are reconstructed from files named `<index>_<sensor>.<ext>`
//! (`000012_color_0.jpg`) lying directly in the root or in `colors/`.
//! Indices that have no file are simply absent; there is no gap filling.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::io::traits::{check_index, DatasetAdapter};
use crate::{AdapterConfig, DatasetType, Frame, Result};

const ADAPTER: &str = "RawFolderAdapter";

fn file_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(\d+)_+(.*)\.(jpg|jpeg|png)$").expect("static regex"))
}

/// Split `000012_color_0.jpg` into `(12, "color_0")`.
pub fn parse_frame_file_name(name: &str) -> Option<(u64, String)> {
    let caps = file_name_pattern().captures(name)?;
    let index = caps.get(1)?.as_str().parse().ok()?;
    let sensor = caps.get(2)?.as_str();
    if sensor.is_empty() {
        return None;
    }
    Some((index, sensor.to_string()))
}

/// Adapter over a folder of indexed image files.
pub struct RawFolderAdapter {
    fps: f64,
    root: Option<PathBuf>,
    /// file index -> sensor -> path
    index: BTreeMap<u64, BTreeMap<String, PathBuf>>,
    /// Position -> file index
    frame_ids: Vec<u64>,
    sensors: Vec<String>,
}

impl RawFolderAdapter {
    /// Create an adapter using the configured default frame rate.
    pub fn new(config: &AdapterConfig) -> Self {
        Self {
            fps: config.default_fps,
            root: None,
            index: BTreeMap::new(),
            frame_ids: Vec::new(),
            sensors: Vec::new(),
        }
    }

    /// File index of frame `i` (file indices may have gaps).
    pub fn file_index(&self, i: usize) -> Option<u64> {
        self.frame_ids.get(i).copied()
    }

    fn scan_dir(dir: &Path, index: &mut BTreeMap<u64, BTreeMap<String, PathBuf>>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        let mut names: Vec<(String, PathBuf)> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter_map(|e| Some((e.file_name().into_string().ok()?, e.path())))
            .collect();
        names.sort();
        for (name, path) in names {
            match parse_frame_file_name(&name) {
                Some((idx, sensor)) => {
                    index.entry(idx).or_default().entry(sensor).or_insert(path);
                }
                None => debug!(context = ADAPTER, file = %name, "Skipping unindexed file"),
            }
        }
    }
}

impl DatasetAdapter for RawFolderAdapter {
    fn load(&mut self, path: &Path) -> bool {
        self.close();
        if !path.is_dir() {
            return false;
        }

        let mut index = BTreeMap::new();
        Self::scan_dir(path, &mut index);
        Self::scan_dir(&path.join("colors"), &mut index);
        if index.is_empty() {
            warn!(
                context = ADAPTER,
                path = %path.display(),
                "No <index>_<sensor> image files found"
            );
            return false;
        }

        let sensors: BTreeSet<&String> = index.values().flat_map(|m| m.keys()).collect();
        self.sensors = sensors.into_iter().cloned().collect();
        self.frame_ids = index.keys().copied().collect();
        self.index = index;
        self.root = Some(path.to_path_buf());

        info!(
            context = ADAPTER,
            path = %path.display(),
            frames = self.frame_ids.len(),
            sensors = ?self.sensors,
            "Indexed image folder"
        );
        true
    }

    fn len(&self) -> usize {
        self.frame_ids.len()
    }

    fn sensors(&self) -> &[String] {
        &self.sensors
    }

    fn frame(&mut self, index: usize) -> Result<Frame> {
        check_index(self.root.is_some(), ADAPTER, index, self.len())?;
        let file_index = self.frame_ids[index];
        let mut frame = Frame::new(file_index as f64 / self.fps);

        if let Some(files) = self.index.get(&file_index) {
            for (sensor, path) in files {
                match image::open(path) {
                    Ok(img) => {
                        frame.images.insert(sensor.clone(), img.to_rgb8());
                    }
                    Err(e) => warn!(
                        context = ADAPTER,
                        path = %path.display(),
                        error = %e,
                        "Failed to decode image"
                    ),
                }
            }
        }
        Ok(frame)
    }

    fn close(&mut self) {
        self.root = None;
        self.index.clear();
        self.frame_ids.clear();
        self.sensors.clear();
    }

    fn dataset_type(&self) -> DatasetType {
        DatasetType::RawFolder
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_file_name() {
        assert_eq!(
            parse_frame_file_name("000012_color_0.jpg"),
            Some((12, "color_0".to_string()))
        );
        assert_eq!(
            parse_frame_file_name("7__depth.PNG"),
            Some((7, "depth".to_string()))
        );
        assert_eq!(parse_frame_file_name("color_0.jpg"), None);
        assert_eq!(parse_frame_file_name("000001_.jpg"), None);
        assert_eq!(parse_frame_file_name("000001_cam.bmp"), None);
    }

    #[test]
    fn test_frame_before_load() {
        let mut adapter = RawFolderAdapter::new(&AdapterConfig::default());
        assert_eq!(adapter.len(), 0);
        assert!(adapter.frame(0).is_err());
    }

    #[test]
    fn test_load_rejects_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("x.jpg");
        std::fs::write(&file, b"x").unwrap();
        let mut adapter = RawFolderAdapter::new(&AdapterConfig::default());
        assert!(!adapter.load(&file));
        assert!(!adapter.load(dir.path().join("missing").as_path()));
    }
}
