// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Builder pattern for creating dataset readers.
//!
//! The `ReaderBuilder` provides a fluent API for choosing the adapter
//! configuration and the detector before opening a dataset.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::io::detection::{DefaultFormatDetector, FormatDetector};
use crate::io::traits::DatasetAdapter;
use crate::{AdapterConfig, CurateError, DatasetType, Result};

use super::{DatasetReader, ReaderFactory};

/// Builder for creating dataset readers.
///
/// # Example
///
/// ```rust,no_run
/// use robocurate::io::ReaderBuilder;
/// use robocurate::AdapterConfig;
///
/// let config = AdapterConfig {
///     sync_window_ms: 20,
///     ..AdapterConfig::default()
/// };
/// let reader = ReaderBuilder::new()
///     .path("run_01.mcap")
///     .config(config)
///     .build()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct ReaderBuilder {
    path: PathBuf,
    config: AdapterConfig,
    detector: Arc<dyn FormatDetector>,
    load: bool,
}

impl Default for ReaderBuilder {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            config: AdapterConfig::default(),
            detector: Arc::new(DefaultFormatDetector),
            load: true,
        }
    }
}

impl std::fmt::Debug for ReaderBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderBuilder")
            .field("path", &self.path)
            .field("config", &self.config)
            .field("load", &self.load)
            .finish_non_exhaustive()
    }
}

impl ReaderBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dataset path.
    pub fn path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }

    /// Set the adapter configuration.
    pub fn config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the format detector.
    pub fn detector(mut self, detector: impl FormatDetector + 'static) -> Self {
        self.detector = Arc::new(detector);
        self
    }

    /// Skip loading; `build` returns an unloaded reader.
    pub fn lazy(mut self) -> Self {
        self.load = false;
        self
    }

    /// Build the reader.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The path is not set or does not exist
    /// - The configuration is invalid
    /// - The detector reports an unknown format
    /// - Loading fails (unless [`lazy`](Self::lazy) was requested)
    pub fn build(self) -> Result<DatasetReader> {
        let path = &self.path;
        if path.as_os_str().is_empty() {
            return Err(CurateError::config("path is not set"));
        }
        if !path.exists() {
            return Err(CurateError::io(
                "ReaderBuilder",
                format!("not found: {}", path.display()),
            ));
        }
        self.config.validate()?;

        let dataset_type = self.detector.detect(path);
        let inner = ReaderFactory::adapter_for(dataset_type, &self.config)
            .ok_or_else(|| CurateError::unrecognized(path))?;
        let mut reader = DatasetReader::new(inner);

        if self.load && !reader.load(path) {
            return Err(CurateError::missing_metadata(
                path,
                format!("{dataset_type} dataset markers"),
            ));
        }
        Ok(reader)
    }
}

/// Detector that always reports one type.
#[derive(Debug, Clone, Copy)]
pub struct FixedDetector(pub DatasetType);

impl FormatDetector for FixedDetector {
    fn detect(&self, _path: &Path) -> DatasetType {
        self.0
    }
}
