// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout robocurate.
//!
//! This module provides the foundational types for the library:
//! - [`CurateError`] - Error handling
//! - [`Frame`] - The normalized unit every adapter produces
//! - [`AdapterConfig`] - Tunables shared by the format adapters
//! - [`DatasetType`] - Detected dataset format tag

pub mod config;
pub mod error;
pub mod frame;

pub use config::AdapterConfig;
pub use error::{CurateError, Result};
pub use frame::{Frame, StateArray};

/// Detected dataset format.
///
/// The ordering of the variants is the order in which grouped results are
/// reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DatasetType {
    /// Table container (HDF5)
    Table,
    /// Time-indexed message recording (ROS1 bag, MCAP)
    TimeIndexedMessages,
    /// Columnar shards plus media files (LeRobot)
    ColumnarMedia,
    /// JSON manifest plus image tree (Unitree)
    JsonManifest,
    /// Bare folder of `<index>_<sensor>.<ext>` images
    RawFolder,
    /// Nothing matched
    Unknown,
}

/// Error returned when parsing a `DatasetType` from string fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseDatasetTypeError {
    _private: (),
}

impl std::fmt::Display for ParseDatasetTypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid dataset type, expected one of 'HDF5', 'ROS', 'LeRobot', 'Unitree', 'RawFolder', 'Unknown'"
        )
    }
}

impl std::error::Error for ParseDatasetTypeError {}

impl std::str::FromStr for DatasetType {
    type Err = ParseDatasetTypeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hdf5" | "table" => Ok(DatasetType::Table),
            "ros" | "timeindexedmessages" => Ok(DatasetType::TimeIndexedMessages),
            "lerobot" | "columnarmedia" => Ok(DatasetType::ColumnarMedia),
            "unitree" | "jsonmanifest" => Ok(DatasetType::JsonManifest),
            "rawfolder" => Ok(DatasetType::RawFolder),
            "unknown" => Ok(DatasetType::Unknown),
            _ => Err(ParseDatasetTypeError { _private: () }),
        }
    }
}

impl std::fmt::Display for DatasetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DatasetType {
    /// All recognized types, in reporting order.
    pub const ALL: [DatasetType; 6] = [
        DatasetType::Table,
        DatasetType::TimeIndexedMessages,
        DatasetType::ColumnarMedia,
        DatasetType::JsonManifest,
        DatasetType::RawFolder,
        DatasetType::Unknown,
    ];

    /// Canonical tag, used for display and for `grouped_<tag>` folders.
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetType::Table => "HDF5",
            DatasetType::TimeIndexedMessages => "ROS",
            DatasetType::ColumnarMedia => "LeRobot",
            DatasetType::JsonManifest => "Unitree",
            DatasetType::RawFolder => "RawFolder",
            DatasetType::Unknown => "Unknown",
        }
    }

    /// Check if nothing matched.
    pub fn is_unknown(&self) -> bool {
        matches!(self, DatasetType::Unknown)
    }

    /// Check if a directory of this type is an atomic dataset root.
    ///
    /// Raw image folders are readable but are not treated as roots while
    /// scanning, so the inspector keeps descending into them.
    pub fn is_dataset_root(&self) -> bool {
        !matches!(self, DatasetType::Unknown | DatasetType::RawFolder)
    }
}
