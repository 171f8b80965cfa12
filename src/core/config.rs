// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Adapter configuration.
//!
//! All fields are optional in the TOML file:
//!
//! ```toml
//! sync_window_ms = 50
//! default_fps = 30.0
//! primary_topic = "/camera/color/image_raw"
//! ffmpeg_bin = "ffmpeg"
//! ffprobe_bin = "ffprobe"
//! ```

use std::path::Path;

use serde::Deserialize;

use super::{CurateError, Result};

/// Tunables shared by the format adapters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdapterConfig {
    /// Half-width of the timestamp join window for message recordings
    pub sync_window_ms: u64,
    /// Frame rate used when a dataset does not declare one
    pub default_fps: f64,
    /// Image topic whose timestamps drive the frame index
    pub primary_topic: Option<String>,
    /// ffmpeg binary used for video frame decoding
    pub ffmpeg_bin: String,
    /// ffprobe binary used to probe video dimensions
    pub ffprobe_bin: String,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            sync_window_ms: 50,
            default_fps: 30.0,
            primary_topic: None,
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
        }
    }
}

impl AdapterConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AdapterConfig =
            toml::from_str(text).map_err(|e| CurateError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            CurateError::io(format!("reading config '{}'", path.display()), e.to_string())
        })?;
        Self::from_toml_str(&text)
    }

    /// Reject values no adapter can work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.default_fps.is_finite() && self.default_fps > 0.0) {
            return Err(CurateError::config(format!(
                "default_fps must be positive, got {}",
                self.default_fps
            )));
        }
        Ok(())
    }

    /// Join window in nanoseconds.
    pub fn sync_window_ns(&self) -> u64 {
        self.sync_window_ms.saturating_mul(1_000_000)
    }
}
