// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! LeRobot columnar-plus-media adapter.
//!
//! Layout:
//!
//! ```text
//! root/
//!   meta/info.json
//!   data/chunk-000/episode_000000.parquet
//!   videos/chunk-000/observation.images.top/episode_000000.mp4
//!   images/observation.images.wrist/episode_000000/frame_000000.png
//! ```
//!
//! Rows of every shard are concatenated in path order. Per-sensor images
//! are resolved through the `image_path` template first; when that still
//! image is absent the frame is decoded from the episode video.

pub mod info;
pub mod shards;

use std::any::Any;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use parquet::file::reader::SerializedFileReader;
use parquet::record::Row;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::frame::state_vec;
use crate::io::traits::{check_index, DatasetAdapter};
use crate::io::video::{FfmpegTools, VideoDecoderCache};
use crate::{AdapterConfig, CurateError, DatasetType, Frame, Result};

pub use info::{format_template, DatasetInfo, ImageFeature, TemplateValue};
pub use shards::{find_shards, RowLocation, ShardIndex};

const ADAPTER: &str = "ColumnarMediaAdapter";

/// How far above a single shard file to look for `meta/info.json`.
const MAX_ROOT_SEARCH_DEPTH: usize = 3;

/// Columns mapped into frame state.
const STATE_COLUMNS: [(&str, &str); 2] = [("action", "action"), ("observation.state", "qpos")];

/// Nearest ancestor of `file` holding `meta/info.json`.
fn find_root_for_shard(file: &Path) -> Option<PathBuf> {
    file.ancestors()
        .skip(1)
        .take(MAX_ROOT_SEARCH_DEPTH)
        .find(|dir| dir.join("meta").join("info.json").is_file())
        .map(Path::to_path_buf)
}

/// Row fields the adapter needs, pulled out of a parquet row.
#[derive(Debug, Clone, Default, PartialEq)]
struct RowValues {
    episode_index: Option<i64>,
    frame_index: Option<i64>,
    timestamp: Option<f64>,
    state: Vec<(&'static str, Vec<f64>)>,
}

impl RowValues {
    fn from_row(row: &Row) -> Self {
        let scalar = |name: &str| shards::row_field(row, name).and_then(shards::field_as_f64);
        let state = STATE_COLUMNS
            .iter()
            .filter_map(|(column, channel)| {
                let values = shards::field_as_vec(shards::row_field(row, column)?)?;
                Some((*channel, values))
            })
            .collect();
        Self {
            episode_index: scalar("episode_index").map(|v| v as i64),
            frame_index: scalar("frame_index").map(|v| v as i64),
            timestamp: scalar("timestamp"),
            state,
        }
    }
}

/// Adapter over a LeRobot dataset root.
pub struct ColumnarMediaAdapter {
    default_fps: f64,
    root: Option<PathBuf>,
    info: Option<DatasetInfo>,
    fps: f64,
    index: ShardIndex,
    features: Vec<ImageFeature>,
    sensors: Vec<String>,
    /// Last opened shard reader
    open_shard: Option<(usize, SerializedFileReader<File>)>,
    videos: VideoDecoderCache,
    /// (feature key, episode) -> located video file
    video_paths: HashMap<(String, i64), Option<PathBuf>>,
}

impl ColumnarMediaAdapter {
    /// Create an adapter.
    pub fn new(config: &AdapterConfig) -> Self {
        let tools = FfmpegTools {
            ffmpeg: config.ffmpeg_bin.clone(),
            ffprobe: config.ffprobe_bin.clone(),
        };
        Self {
            default_fps: config.default_fps,
            videos: VideoDecoderCache::new(tools),
            root: None,
            info: None,
            fps: config.default_fps,
            index: ShardIndex::default(),
            features: Vec::new(),
            sensors: Vec::new(),
            open_shard: None,
            video_paths: HashMap::new(),
        }
    }

    /// Frame rate declared by `info.json` (or the default).
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Row index over all shards.
    pub fn shard_index(&self) -> &ShardIndex {
        &self.index
    }

    /// Number of cached video decoders.
    pub fn open_video_count(&self) -> usize {
        self.videos.len()
    }

    fn build_index(&mut self, path: &Path) -> Result<()> {
        let (root, shard_paths) = if path.is_file() {
            let root = find_root_for_shard(path).ok_or_else(|| {
                CurateError::missing_metadata(path, "meta/info.json in an ancestor directory")
            })?;
            (root, vec![path.to_path_buf()])
        } else {
            (path.to_path_buf(), find_shards(path))
        };

        let info_path = root.join("meta").join("info.json");
        if !info_path.is_file() {
            return Err(CurateError::missing_metadata(&root, "meta/info.json"));
        }
        let info = DatasetInfo::from_file(&info_path)?;
        if shard_paths.is_empty() {
            return Err(CurateError::missing_metadata(&root, "parquet shards"));
        }

        self.index = ShardIndex::build(&shard_paths)?;
        self.fps = info.fps.filter(|f| *f > 0.0).unwrap_or(self.default_fps);
        self.features = info.image_features();
        self.sensors = self.features.iter().map(|f| f.sensor.clone()).collect();
        self.info = Some(info);
        self.root = Some(root);
        Ok(())
    }

    fn read_row(&mut self, loc: RowLocation) -> Result<Row> {
        if self.open_shard.as_ref().map(|(i, _)| *i) != Some(loc.shard) {
            let shard = &self.index.shards()[loc.shard];
            let reader = shards::open_reader(&shard.path)?;
            self.open_shard = Some((loc.shard, reader));
        }
        match &self.open_shard {
            Some((_, reader)) => shards::read_row(reader, loc.row_group, loc.row),
            None => Err(CurateError::not_loaded(ADAPTER)),
        }
    }

    fn template_values(
        &self,
        key: &str,
        episode: i64,
        frame_index: i64,
    ) -> HashMap<&'static str, TemplateValue> {
        let chunk = self.info.as_ref().map_or(0, |i| i.episode_chunk(episode));
        HashMap::from([
            ("image_key", TemplateValue::from(key)),
            ("video_key", TemplateValue::from(key)),
            ("episode_index", TemplateValue::Int(episode)),
            ("frame_index", TemplateValue::Int(frame_index)),
            ("episode_chunk", TemplateValue::Int(chunk)),
        ])
    }

    fn still_image_path(&self, root: &Path, key: &str, episode: i64, frame: i64) -> Option<PathBuf> {
        let template = self.info.as_ref()?.image_path.as_deref()?;
        let rel = format_template(template, &self.template_values(key, episode, frame))?;
        Some(root.join(rel))
    }

    fn locate_video(&mut self, root: &Path, key: &str, episode: i64) -> Option<PathBuf> {
        let cache_key = (key.to_string(), episode);
        if let Some(found) = self.video_paths.get(&cache_key) {
            return found.clone();
        }

        let templated = self
            .info
            .as_ref()
            .and_then(|i| i.video_path.as_deref())
            .and_then(|t| format_template(t, &self.template_values(key, episode, 0)))
            .map(|rel| root.join(rel))
            .filter(|p| p.is_file());

        let found = templated.or_else(|| {
            let suffix = format!("episode_{episode:06}.mp4");
            WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .find(|e| {
                    e.file_type().is_file()
                        && e.file_name().to_string_lossy().ends_with(&suffix)
                        && e.path()
                            .parent()
                            .and_then(Path::file_name)
                            .is_some_and(|d| d.to_string_lossy() == key)
                })
                .map(|e| e.into_path())
        });

        if found.is_none() {
            debug!(context = ADAPTER, key, episode, "No video found for feature");
        }
        self.video_paths.insert(cache_key, found.clone());
        found
    }

    fn load_image(&mut self, root: &Path, feature: &ImageFeature, episode: i64, frame: i64) -> Option<image::RgbImage> {
        if let Some(still) = self.still_image_path(root, &feature.key, episode, frame) {
            if still.is_file() {
                match image::open(&still) {
                    Ok(img) => return Some(img.to_rgb8()),
                    Err(e) => warn!(
                        context = ADAPTER,
                        path = %still.display(),
                        error = %e,
                        "Failed to decode still image"
                    ),
                }
            }
        }

        let video = self.locate_video(root, &feature.key, episode)?;
        match self.videos.frame(&video, frame.max(0) as usize) {
            Ok(img) => Some(img),
            Err(e) => {
                warn!(
                    context = ADAPTER,
                    path = %video.display(),
                    frame,
                    error = %e,
                    "Failed to decode video frame"
                );
                None
            }
        }
    }
}

impl DatasetAdapter for ColumnarMediaAdapter {
    fn load(&mut self, path: &Path) -> bool {
        self.close();
        match self.build_index(path) {
            Ok(()) => {
                info!(
                    context = ADAPTER,
                    path = %path.display(),
                    frames = self.index.total_rows(),
                    shards = self.index.shards().len(),
                    sensors = ?self.sensors,
                    "Indexed LeRobot dataset"
                );
                true
            }
            Err(e) => {
                warn!(
                    context = ADAPTER,
                    path = %path.display(),
                    error = %e,
                    "Failed to index dataset"
                );
                self.close();
                false
            }
        }
    }

    fn len(&self) -> usize {
        self.index.total_rows()
    }

    fn sensors(&self) -> &[String] {
        &self.sensors
    }

    fn frame(&mut self, index: usize) -> Result<Frame> {
        check_index(self.root.is_some(), ADAPTER, index, self.len())?;
        let loc = self
            .index
            .locate(index)
            .ok_or_else(|| CurateError::out_of_range(index, self.len()))?;
        let values = RowValues::from_row(&self.read_row(loc)?);

        let episode = values.episode_index.unwrap_or(0);
        let frame_index = values.frame_index.unwrap_or(index as i64);
        let timestamp = values.timestamp.unwrap_or(index as f64 / self.fps);
        let mut frame = Frame::new(timestamp);

        for (channel, data) in values.state {
            frame.state.insert(channel.to_string(), state_vec(data));
        }

        let root = self.root.clone().unwrap_or_default();
        for feature in self.features.clone() {
            if let Some(img) = self.load_image(&root, &feature, episode, frame_index) {
                frame.images.insert(feature.sensor.clone(), img);
            }
        }
        Ok(frame)
    }

    fn close(&mut self) {
        self.videos.clear();
        self.open_shard = None;
        self.video_paths.clear();
        self.root = None;
        self.info = None;
        self.index = ShardIndex::default();
        self.features.clear();
        self.sensors.clear();
        self.fps = self.default_fps;
    }

    fn dataset_type(&self) -> DatasetType {
        DatasetType::ColumnarMedia
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
