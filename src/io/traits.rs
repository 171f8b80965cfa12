// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core trait for unified dataset access.
//!
//! Every on-disk layout (HDF5 tables, ROS recordings, LeRobot stores,
//! Unitree manifests, raw image folders) is exposed through
//! [`DatasetAdapter`], so the curation pipeline and frame consumers never
//! branch on format.

use std::any::Any;
use std::path::Path;

use crate::{DatasetType, Frame, Result};

/// Random-access frame reader over one dataset layout.
///
/// Lifecycle: `load` builds the frame index from metadata only, any number
/// of queries follow, `close` releases every held handle. `close` is
/// idempotent and adapters also release on drop.
///
/// # Example
///
/// ```no_run
/// use robocurate::io::traits::DatasetAdapter;
///
/// fn describe(adapter: &dyn DatasetAdapter) {
///     println!("{} frames, sensors {:?}", adapter.len(), adapter.sensors());
/// }
/// ```
pub trait DatasetAdapter: Send {
    /// Build the frame index for `path`.
    ///
    /// Returns `false` when required markers are absent or unreadable.
    /// Never panics. Image and media payloads are not decoded here.
    fn load(&mut self, path: &Path) -> bool;

    /// Number of indexed frames, 0 before a successful load.
    fn len(&self) -> usize;

    /// Check if no frames are indexed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ordered sensor names, stable after load.
    fn sensors(&self) -> &[String];

    /// Read and decode frame `index`.
    ///
    /// Fails with `OutOfRange` outside `[0, len)` and with `NotLoaded`
    /// before a successful load or after `close`. Sensors whose payload
    /// cannot be decoded are omitted from the returned frame.
    fn frame(&mut self, index: usize) -> Result<Frame>;

    /// Release all held files, streams and decoders.
    fn close(&mut self);

    /// Dataset type this adapter reads.
    fn dataset_type(&self) -> DatasetType;

    /// Dataset root resolved by the last successful `load`.
    fn path(&self) -> Option<&Path>;

    /// Check if the adapter currently holds a loaded index.
    fn is_loaded(&self) -> bool {
        self.path().is_some()
    }

    /// Downcast to `Any` for accessing format-specific functionality.
    fn as_any(&self) -> &dyn Any;

    /// Downcast mutably to `Any` for accessing format-specific functionality.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Shared bounds check used by every adapter's `frame`.
pub(crate) fn check_index(loaded: bool, adapter: &str, index: usize, len: usize) -> Result<()> {
    if !loaded {
        return Err(crate::CurateError::not_loaded(adapter));
    }
    if index >= len {
        return Err(crate::CurateError::out_of_range(index, len));
    }
    Ok(())
}
