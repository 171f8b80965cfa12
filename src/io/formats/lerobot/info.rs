// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! `meta/info.json` parsing and path template formatting.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::{CurateError, Result};

/// Default number of episodes per chunk directory.
pub const DEFAULT_CHUNKS_SIZE: u64 = 1000;

fn default_chunks_size() -> u64 {
    DEFAULT_CHUNKS_SIZE
}

/// Subset of `meta/info.json` the adapter relies on.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetInfo {
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub video_path: Option<String>,
    #[serde(default = "default_chunks_size")]
    pub chunks_size: u64,
    #[serde(default)]
    pub features: serde_json::Map<String, Value>,
}

/// An image-producing feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFeature {
    /// Last dot-separated segment, used as the sensor name
    pub sensor: String,
    /// Full feature key (`observation.images.top`)
    pub key: String,
    /// Stored as a video rather than still images
    pub is_video: bool,
}

impl DatasetInfo {
    /// Read and parse an `info.json` file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CurateError::io(format!("reading '{}'", path.display()), e.to_string()))?;
        serde_json::from_str(&text)
            .map_err(|e| CurateError::decode("info.json", e.to_string()))
    }

    /// Image and video features in key order.
    pub fn image_features(&self) -> Vec<ImageFeature> {
        self.features
            .iter()
            .filter_map(|(key, feature)| {
                let dtype = feature.get("dtype")?.as_str()?;
                let is_video = match dtype {
                    "image" => false,
                    "video" => true,
                    _ => return None,
                };
                let sensor = key.rsplit('.').next().unwrap_or(key).to_string();
                Some(ImageFeature {
                    sensor,
                    key: key.clone(),
                    is_video,
                })
            })
            .collect()
    }

    /// Chunk directory index of an episode.
    pub fn episode_chunk(&self, episode_index: i64) -> i64 {
        let size = self.chunks_size.max(1) as i64;
        episode_index.max(0) / size
    }
}

/// Value bound to a template placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateValue {
    Int(i64),
    Str(String),
}

impl From<i64> for TemplateValue {
    fn from(v: i64) -> Self {
        TemplateValue::Int(v)
    }
}

impl From<&str> for TemplateValue {
    fn from(v: &str) -> Self {
        TemplateValue::Str(v.to_string())
    }
}

fn placeholder_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{(\w+)(?::(0?)(\d+)d)?\}").expect("static regex"))
}

/// Substitute `{name}`, `{name:6d}` and `{name:06d}` placeholders.
///
/// Widths follow Python: space padding unless the width starts with `0`.
///
/// Returns `None` when the template names a placeholder with no value.
pub fn format_template(template: &str, values: &HashMap<&str, TemplateValue>) -> Option<String> {
    let mut out = String::with_capacity(template.len() + 16);
    let mut last = 0;
    for caps in placeholder_pattern().captures_iter(template) {
        let whole = caps.get(0)?;
        out.push_str(&template[last..whole.start()]);
        let name = caps.get(1)?.as_str();
        let zero_pad = caps.get(2).is_some_and(|z| !z.as_str().is_empty());
        let width: usize = caps
            .get(3)
            .and_then(|w| w.as_str().parse().ok())
            .unwrap_or(0);
        match values.get(name)? {
            TemplateValue::Int(v) if zero_pad => out.push_str(&format!("{v:0width$}")),
            TemplateValue::Int(v) => out.push_str(&format!("{v:width$}")),
            TemplateValue::Str(s) => out.push_str(s),
        }
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Some(out)
}
