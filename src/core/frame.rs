// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! The normalized frame produced by every dataset adapter.

use std::collections::BTreeMap;

use image::RgbImage;
use ndarray::ArrayD;

/// Numeric state channel (joint positions, tactile pads, ...).
pub type StateArray = ArrayD<f64>;

/// One timestep's synchronized snapshot of a dataset.
///
/// Images are always 8-bit RGB, row-major, top row first. A sensor whose
/// payload could not be decoded is absent from `images`; it is never
/// replaced by a placeholder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    /// Timestamp in seconds
    pub timestamp: f64,
    /// Decoded images keyed by sensor name
    pub images: BTreeMap<String, RgbImage>,
    /// State channels keyed by channel name (e.g. `qpos`)
    pub state: BTreeMap<String, StateArray>,
}

impl Frame {
    /// Create an empty frame at the given timestamp.
    pub fn new(timestamp: f64) -> Self {
        Self {
            timestamp,
            ..Self::default()
        }
    }

    /// Add an image.
    pub fn with_image(mut self, sensor: impl Into<String>, image: RgbImage) -> Self {
        self.images.insert(sensor.into(), image);
        self
    }

    /// Add a one-dimensional state vector.
    pub fn with_state_vec(mut self, channel: impl Into<String>, values: Vec<f64>) -> Self {
        self.state.insert(channel.into(), state_vec(values));
        self
    }

    /// Get an image by sensor name.
    pub fn image(&self, sensor: &str) -> Option<&RgbImage> {
        self.images.get(sensor)
    }

    /// Get a state channel by name.
    pub fn state(&self, channel: &str) -> Option<&StateArray> {
        self.state.get(channel)
    }

    /// Check if the frame carries neither images nor state.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.state.is_empty()
    }
}

/// Build a one-dimensional state array from a vector.
pub(crate) fn state_vec(values: Vec<f64>) -> StateArray {
    let len = values.len();
    // A flat vector always matches its own length.
    ArrayD::from_shape_vec(vec![len], values).unwrap_or_else(|_| ArrayD::zeros(vec![0]))
}
