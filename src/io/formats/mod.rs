// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Format adapters, one per on-disk layout:
//! - [`table`]: HDF5 episode files
//! - [`ros`]: ROS1 bag and MCAP recordings
//! - [`lerobot`]: LeRobot parquet shards plus images/videos
//! - [`unitree`]: Unitree `data.json` manifests
//! - [`folder`]: raw `<index>_<sensor>` image folders

pub mod folder;
pub mod lerobot;
pub mod ros;
pub mod table;
pub mod unitree;

pub use folder::RawFolderAdapter;
pub use lerobot::ColumnarMediaAdapter;
pub use ros::TimeIndexedMessagesAdapter;
pub use table::TableAdapter;
pub use unitree::JsonManifestAdapter;
