// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Hierarchical array container adapter (HDF5 episodes).
//!
//! Layout:
//!
//! ```text
//! action                      (N, A)
//! qpos | observations/qpos    (N, J)
//! timestamp                   (N,)      optional
//! observations/images/<cam>   (N, L) encoded blobs, or (N, H, W, C) / (N, C, H, W)
//! ```
//!
//! The adapter only talks to a [`TableSource`]; the HDF5 binding lives
//! behind the `hdf5` cargo feature.

#[cfg(feature = "hdf5")]
pub mod hdf5;

use std::any::Any;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::frame::state_vec;
use crate::io::media::{decode_compressed, tensor_to_rgb};
use crate::io::traits::{check_index, DatasetAdapter};
use crate::{AdapterConfig, CurateError, DatasetType, Frame, Result};

const ADAPTER: &str = "TableAdapter";

/// Arrays that define the frame count, highest priority first.
pub const PRIMARY_ARRAYS: [&str; 3] = ["action", "qpos", "observations/qpos"];

/// Group holding one array per camera.
pub const IMAGE_GROUP: &str = "observations/images";

/// Optional per-frame time array, in seconds.
pub const TIMESTAMP_ARRAY: &str = "timestamp";

/// State channel -> candidate arrays.
const STATE_ARRAYS: [(&str, &[&str]); 2] = [
    ("qpos", &["qpos", "observations/qpos"]),
    ("action", &["action"]),
];

/// One row of an array with its per-row shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow<T> {
    pub shape: Vec<usize>,
    pub data: Vec<T>,
}

/// Read access to a hierarchical array container.
///
/// Array paths are `/`-separated and relative to the container root.
pub trait TableSource: Send {
    /// Names of the arrays (not groups) at the root, in container order.
    fn root_arrays(&self) -> Vec<String>;

    /// Leading dimension of an array, `None` if there is no such array.
    fn array_len(&self, path: &str) -> Option<usize>;

    /// Names of the arrays directly inside a group, sorted.
    fn group_members(&self, group: &str) -> Vec<String>;

    /// Row `index` of an array as bytes.
    fn read_bytes(&self, path: &str, index: usize) -> Result<TableRow<u8>>;

    /// Row `index` of a numeric array as `f64`.
    fn read_f64(&self, path: &str, index: usize) -> Result<TableRow<f64>>;
}

#[cfg(feature = "hdf5")]
fn open_source(path: &Path) -> Result<Box<dyn TableSource>> {
    Ok(Box::new(hdf5::Hdf5Source::open(path)?))
}

#[cfg(not(feature = "hdf5"))]
fn open_source(path: &Path) -> Result<Box<dyn TableSource>> {
    Err(CurateError::config(format!(
        "cannot open '{}': built without the `hdf5` feature",
        path.display()
    )))
}

/// Frame count array: the first primary array present, else the first root array.
fn primary_array(source: &dyn TableSource) -> Option<String> {
    PRIMARY_ARRAYS
        .iter()
        .find(|name| source.array_len(name).is_some())
        .map(|name| name.to_string())
        .or_else(|| source.root_arrays().into_iter().next())
}

/// Decode one image row: 1-D rows are encoded blobs, anything else a pixel tensor.
pub fn decode_image_row(row: &TableRow<u8>) -> Result<image::RgbImage> {
    if row.shape.len() == 1 {
        decode_compressed(&row.data)
    } else {
        tensor_to_rgb(&row.shape, &row.data)
    }
}

/// Adapter over a table container.
pub struct TableAdapter {
    path: Option<PathBuf>,
    source: Option<Box<dyn TableSource>>,
    len: usize,
    primary: Option<String>,
    /// (sensor, array path)
    images: Vec<(String, String)>,
    /// (state channel, array path)
    states: Vec<(String, String)>,
    timestamps: Option<String>,
    sensors: Vec<String>,
}

impl Default for TableAdapter {
    fn default() -> Self {
        Self::new(&AdapterConfig::default())
    }
}

impl TableAdapter {
    /// Create an adapter.
    pub fn new(_config: &AdapterConfig) -> Self {
        Self {
            path: None,
            source: None,
            len: 0,
            primary: None,
            images: Vec::new(),
            states: Vec::new(),
            timestamps: None,
            sensors: Vec::new(),
        }
    }

    /// Array whose length defines the frame count.
    pub fn primary_array(&self) -> Option<&str> {
        self.primary.as_deref()
    }

    /// Index an already opened source.
    pub fn load_source(&mut self, path: &Path, source: Box<dyn TableSource>) -> Result<()> {
        let primary = primary_array(source.as_ref())
            .ok_or_else(|| CurateError::missing_metadata(path, "a top-level array"))?;
        let len = source.array_len(&primary).unwrap_or(0);

        let images: Vec<(String, String)> = source
            .group_members(IMAGE_GROUP)
            .into_iter()
            .map(|cam| {
                let array = format!("{IMAGE_GROUP}/{cam}");
                (cam, array)
            })
            .collect();
        if images.is_empty() {
            debug!(
                context = ADAPTER,
                path = %path.display(),
                "No arrays under {IMAGE_GROUP}"
            );
        }

        let states = STATE_ARRAYS
            .iter()
            .filter_map(|(channel, candidates)| {
                let array = candidates.iter().find(|a| source.array_len(a).is_some())?;
                Some((channel.to_string(), array.to_string()))
            })
            .collect();

        self.timestamps = source
            .array_len(TIMESTAMP_ARRAY)
            .map(|_| TIMESTAMP_ARRAY.to_string());
        self.sensors = images.iter().map(|(cam, _)| cam.clone()).collect();
        self.images = images;
        self.states = states;
        self.len = len;
        self.primary = Some(primary);
        self.source = Some(source);
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn build_index(&mut self, path: &Path) -> Result<()> {
        let source = open_source(path)?;
        self.load_source(path, source)
    }

    fn timestamp(source: &dyn TableSource, array: Option<&str>, index: usize) -> f64 {
        array
            .and_then(|a| source.read_f64(a, index).ok())
            .and_then(|row| row.data.first().copied())
            .unwrap_or(index as f64)
    }
}

impl DatasetAdapter for TableAdapter {
    fn load(&mut self, path: &Path) -> bool {
        self.close();
        match self.build_index(path) {
            Ok(()) => {
                info!(
                    context = ADAPTER,
                    path = %path.display(),
                    frames = self.len,
                    primary = self.primary.as_deref().unwrap_or_default(),
                    sensors = ?self.sensors,
                    "Indexed table file"
                );
                true
            }
            Err(e) => {
                warn!(
                    context = ADAPTER,
                    path = %path.display(),
                    error = %e,
                    "Failed to load table file"
                );
                self.close();
                false
            }
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn sensors(&self) -> &[String] {
        &self.sensors
    }

    fn frame(&mut self, index: usize) -> Result<Frame> {
        check_index(self.source.is_some(), ADAPTER, index, self.len)?;
        let source = self
            .source
            .as_deref()
            .ok_or_else(|| CurateError::not_loaded(ADAPTER))?;

        let mut frame = Frame::new(Self::timestamp(source, self.timestamps.as_deref(), index));

        for (sensor, array) in &self.images {
            match source
                .read_bytes(array, index)
                .and_then(|row| decode_image_row(&row))
            {
                Ok(img) => {
                    frame.images.insert(sensor.clone(), img);
                }
                Err(e) => warn!(
                    context = ADAPTER,
                    array = %array,
                    frame = index,
                    error = %e,
                    "Failed to decode image row"
                ),
            }
        }

        for (channel, array) in &self.states {
            match source.read_f64(array, index) {
                Ok(row) => {
                    frame.state.insert(channel.clone(), state_vec(row.data));
                }
                Err(e) => debug!(
                    context = ADAPTER,
                    array = %array,
                    frame = index,
                    error = %e,
                    "Missing state row"
                ),
            }
        }
        Ok(frame)
    }

    fn close(&mut self) {
        self.source = None;
        self.path = None;
        self.len = 0;
        self.primary = None;
        self.images.clear();
        self.states.clear();
        self.timestamps = None;
        self.sensors.clear();
    }

    fn dataset_type(&self) -> DatasetType {
        DatasetType::Table
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
