// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Robocurate
//!
//! Unified random-access reader and curation pipeline for robot
//! demonstration datasets.
//!
//! Every supported layout is read through one adapter contract
//! ([`DatasetAdapter`]) that yields normalized [`Frame`]s:
//! - **HDF5** episode files in [`io::formats::table`]
//! - **ROS1 bag / MCAP** recordings in [`io::formats::ros`]
//! - **LeRobot** parquet + image/video stores in [`io::formats::lerobot`]
//! - **Unitree** `data.json` manifests in [`io::formats::unitree`]
//! - **Raw image folders** in [`io::formats::folder`]
//!
//! On top of the readers, [`curation`] scans a directory tree, checks that
//! it only holds recognizable datasets, groups datasets by type and
//! quarantines rejected ones.
//!
//! ## Example: reading frames
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use robocurate::{DatasetAdapter, ReaderFactory};
//!
//! let mut reader = ReaderFactory::open("datasets/episode_0.hdf5")?;
//! println!("{} frames from {:?}", reader.len(), reader.sensors());
//! let frame = reader.frame(0)?;
//! for (sensor, image) in &frame.images {
//!     println!("{sensor}: {}x{}", image.width(), image.height());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: curating a directory
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use robocurate::curation::{DatasetInspector, ScanOptions};
//!
//! let mut inspector = DatasetInspector::new("datasets");
//! inspector.scan(&ScanOptions::default());
//! if inspector.check_consistency() {
//!     println!("valid: {:?}", inspector.valid_paths());
//! }
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

// Re-export core types for convenience
pub use core::{AdapterConfig, CurateError, DatasetType, Frame, Result, StateArray};

// Detection, adapters, media helpers and the reader factory
pub mod io;

// Re-export key I/O types
pub use io::detection::detect_type;
pub use io::traits::DatasetAdapter;
pub use io::{DatasetReader, ReaderBuilder, ReaderFactory};

// Scanning, grouping and quarantine
pub mod curation;

pub use curation::{
    ConsistencyPolicy, DatasetInspector, DatasetOrganizer, ScanOptions, ScanRecord, ScanStatus,
};
