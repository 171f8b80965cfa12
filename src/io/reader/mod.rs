// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Reader factory with automatic format detection.
//!
//! [`ReaderFactory`] maps a detected [`DatasetType`] to the adapter for that
//! layout. [`DatasetReader`] wraps the boxed adapter so callers get one
//! concrete type regardless of format.
//!
//! # Example
//!
//! ```rust,no_run
//! use robocurate::io::{DatasetAdapter, ReaderFactory};
//!
//! let mut reader = ReaderFactory::open("episode_0.hdf5")?;
//! for i in 0..reader.len() {
//!     let frame = reader.frame(i)?;
//!     println!("{:.3}s: {} images", frame.timestamp, frame.images.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;

pub use builder::ReaderBuilder;

use std::any::Any;
use std::path::Path;

use crate::io::detection::detect_type;
use crate::io::formats::{
    ColumnarMediaAdapter, JsonManifestAdapter, RawFolderAdapter, TableAdapter,
    TimeIndexedMessagesAdapter,
};
use crate::io::traits::DatasetAdapter;
use crate::{AdapterConfig, CurateError, DatasetType, Frame, Result};

/// Creates adapters for detected dataset types.
pub struct ReaderFactory;

impl ReaderFactory {
    /// Unloaded adapter for a dataset type.
    ///
    /// `Unknown` is the only type without an adapter.
    pub fn adapter_for(
        dataset_type: DatasetType,
        config: &AdapterConfig,
    ) -> Option<Box<dyn DatasetAdapter>> {
        let adapter: Box<dyn DatasetAdapter> = match dataset_type {
            DatasetType::Table => Box::new(TableAdapter::new(config)),
            DatasetType::TimeIndexedMessages => Box::new(TimeIndexedMessagesAdapter::new(config)),
            DatasetType::ColumnarMedia => Box::new(ColumnarMediaAdapter::new(config)),
            DatasetType::JsonManifest => Box::new(JsonManifestAdapter::new(config)),
            DatasetType::RawFolder => Box::new(RawFolderAdapter::new(config)),
            DatasetType::Unknown => return None,
        };
        Some(adapter)
    }

    /// Detect the type of `path` and create an unloaded reader for it.
    ///
    /// # Errors
    ///
    /// `UnrecognizedFormat` when no detection rule matches.
    pub fn create<P: AsRef<Path>>(path: P, config: &AdapterConfig) -> Result<DatasetReader> {
        let path = path.as_ref();
        let dataset_type = detect_type(path);
        let inner = Self::adapter_for(dataset_type, config)
            .ok_or_else(|| CurateError::unrecognized(path))?;
        Ok(DatasetReader { inner })
    }

    /// Detect, create and load with the default configuration.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<DatasetReader> {
        Self::open_with_config(path, &AdapterConfig::default())
    }

    /// Detect, create and load.
    ///
    /// # Errors
    ///
    /// `UnrecognizedFormat` from detection, `MissingMetadata` when the
    /// adapter rejects the path.
    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        config: &AdapterConfig,
    ) -> Result<DatasetReader> {
        let path = path.as_ref();
        let mut reader = Self::create(path, config)?;
        if !reader.load(path) {
            return Err(CurateError::missing_metadata(
                path,
                format!("{} dataset markers", reader.dataset_type()),
            ));
        }
        Ok(reader)
    }
}

/// Format-independent dataset reader.
pub struct DatasetReader {
    inner: Box<dyn DatasetAdapter>,
}

impl DatasetReader {
    /// Wrap an adapter.
    pub fn new(inner: Box<dyn DatasetAdapter>) -> Self {
        Self { inner }
    }

    /// Downcast to the inner adapter for format-specific operations.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use robocurate::io::ReaderFactory;
    /// # use robocurate::io::formats::ColumnarMediaAdapter;
    /// # fn test() -> Result<(), Box<dyn std::error::Error>> {
    /// let reader = ReaderFactory::open("lerobot_dataset")?;
    /// if let Some(lerobot) = reader.downcast_ref::<ColumnarMediaAdapter>() {
    ///     println!("fps {}", lerobot.fps());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }

    /// Downcast mutably to the inner adapter.
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.inner.as_any_mut().downcast_mut::<T>()
    }

    /// Unwrap the boxed adapter.
    pub fn into_inner(self) -> Box<dyn DatasetAdapter> {
        self.inner
    }
}

impl DatasetAdapter for DatasetReader {
    fn load(&mut self, path: &Path) -> bool {
        self.inner.load(path)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn sensors(&self) -> &[String] {
        self.inner.sensors()
    }

    fn frame(&mut self, index: usize) -> Result<Frame> {
        self.inner.frame(index)
    }

    fn close(&mut self) {
        self.inner.close()
    }

    fn dataset_type(&self) -> DatasetType {
        self.inner.dataset_type()
    }

    fn path(&self) -> Option<&Path> {
        self.inner.path()
    }

    fn as_any(&self) -> &dyn Any {
        self.inner.as_any()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self.inner.as_any_mut()
    }
}
