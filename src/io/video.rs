// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Frame-indexed video decoding through the `ffmpeg` CLI.
//!
//! Each [`VideoDecoder`] owns one `ffmpeg` child process that streams the
//! whole video as raw `rgb24` on stdout. Reading forward just consumes the
//! pipe; seeking backward restarts the process. [`VideoDecoderCache`]
//! keeps one decoder per video path so sequential frame access over an
//! episode decodes each frame once.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use image::RgbImage;
use tracing::debug;

use crate::CurateError;

/// Errors from the video subsystem.
#[derive(thiserror::Error, Debug)]
pub enum VideoError {
    #[error("Failed to start {bin}: {source}")]
    FailedToStart {
        bin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ffprobe failed for '{path}': {message}")]
    Probe { path: PathBuf, message: String },

    #[error("Failed to get stdout handle of ffmpeg")]
    NoStdout,

    #[error("Frame {index} is past the end of '{path}'")]
    EndOfStream { path: PathBuf, index: usize },

    #[error("Failed to read from ffmpeg: {0}")]
    Read(#[from] std::io::Error),
}

impl From<VideoError> for CurateError {
    fn from(err: VideoError) -> Self {
        CurateError::decode("video", err.to_string())
    }
}

/// Binaries used for decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegTools {
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for FfmpegTools {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

/// Parse ffprobe's `WIDTHxHEIGHT` output.
fn parse_dimensions(output: &str) -> Option<(u32, u32)> {
    let line = output.lines().map(str::trim).find(|l| !l.is_empty())?;
    let (w, h) = line.split_once('x')?;
    let (w, h) = (w.trim().parse().ok()?, h.trim().parse().ok()?);
    (w > 0 && h > 0).then_some((w, h))
}

fn probe_dimensions(tools: &FfmpegTools, path: &Path) -> Result<(u32, u32), VideoError> {
    let output = Command::new(&tools.ffprobe)
        .args(["-v", "error", "-select_streams", "v:0"])
        .args(["-show_entries", "stream=width,height"])
        .args(["-of", "csv=p=0:s=x"])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| VideoError::FailedToStart {
            bin: tools.ffprobe.clone(),
            source,
        })?;
    if !output.status.success() {
        return Err(VideoError::Probe {
            path: path.to_path_buf(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    parse_dimensions(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| VideoError::Probe {
        path: path.to_path_buf(),
        message: "no video stream dimensions".to_string(),
    })
}

/// Sequential raw-frame reader over one video file.
pub struct VideoDecoder {
    path: PathBuf,
    tools: FfmpegTools,
    width: u32,
    height: u32,
    process: Option<(Child, ChildStdout)>,
    /// Index of the frame the pipe will yield next
    next_index: usize,
}

impl VideoDecoder {
    /// Read the video dimensions with ffprobe; the decoding process is spawned on first read.
    pub fn open(path: &Path, tools: &FfmpegTools) -> Result<Self, VideoError> {
        let (width, height) = probe_dimensions(tools, path)?;
        debug!(
            context = "video",
            path = %path.display(),
            width,
            height,
            "Opened video"
        );
        Ok(Self {
            path: path.to_path_buf(),
            tools: tools.clone(),
            width,
            height,
            process: None,
            next_index: 0,
        })
    }

    /// Frame dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    fn spawn(&mut self) -> Result<(), VideoError> {
        self.kill();
        let mut child = Command::new(&self.tools.ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-nostdin", "-i"])
            .arg(&self.path)
            .args(["-vsync", "0", "-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| VideoError::FailedToStart {
                bin: self.tools.ffmpeg.clone(),
                source,
            })?;
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(VideoError::NoStdout);
        };
        self.process = Some((child, stdout));
        self.next_index = 0;
        Ok(())
    }

    /// Read one frame into `buf`. `Ok(false)` at end of stream.
    fn read_next(&mut self, buf: &mut [u8]) -> Result<bool, VideoError> {
        let Some((_, stdout)) = self.process.as_mut() else {
            return Ok(false);
        };
        let mut filled = 0;
        while filled < buf.len() {
            match stdout.read(&mut buf[filled..])? {
                0 => return Ok(false),
                n => filled += n,
            }
        }
        self.next_index += 1;
        Ok(true)
    }

    /// Decode frame `index`.
    pub fn frame(&mut self, index: usize) -> Result<RgbImage, VideoError> {
        if self.process.is_none() || index < self.next_index {
            self.spawn()?;
        }
        let mut buf = vec![0u8; self.frame_size()];
        while self.next_index <= index {
            if !self.read_next(&mut buf)? {
                self.kill();
                return Err(VideoError::EndOfStream {
                    path: self.path.clone(),
                    index,
                });
            }
        }
        RgbImage::from_raw(self.width, self.height, buf).ok_or_else(|| VideoError::Probe {
            path: self.path.clone(),
            message: "frame buffer does not match probed dimensions".to_string(),
        })
    }

    fn kill(&mut self) {
        if let Some((mut child, stdout)) = self.process.take() {
            drop(stdout);
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    /// Stop the decoding process.
    pub fn close(&mut self) {
        self.kill();
        self.next_index = 0;
    }
}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        self.kill();
    }
}

/// One decoder per distinct video path, populated lazily.
#[derive(Default)]
pub struct VideoDecoderCache {
    tools: FfmpegTools,
    decoders: HashMap<PathBuf, VideoDecoder>,
}

impl VideoDecoderCache {
    /// Create an empty cache.
    pub fn new(tools: FfmpegTools) -> Self {
        Self {
            tools,
            decoders: HashMap::new(),
        }
    }

    /// Decode frame `index` of the video at `path`.
    pub fn frame(&mut self, path: &Path, index: usize) -> Result<RgbImage, VideoError> {
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let decoder = match self.decoders.entry(key) {
            std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::hash_map::Entry::Vacant(e) => {
                let decoder = VideoDecoder::open(e.key(), &self.tools)?;
                e.insert(decoder)
            }
        };
        decoder.frame(index)
    }

    /// Number of open decoders.
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Check if no decoder is open.
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Close and drop every decoder.
    pub fn clear(&mut self) {
        for (_, mut decoder) in self.decoders.drain() {
            decoder.close();
        }
    }
}
