// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! I/O layer for robot demonstration datasets.
//!
//! Detection classifies paths, adapters expose each layout as random-access
//! frames, and the reader factory ties the two together.

pub mod detection;
pub mod formats;
pub mod media;
pub mod npy;
pub mod video;

pub use detection::{detect_type, DefaultFormatDetector, FormatDetector};

// Adapter contract
pub mod traits;
pub use traits::DatasetAdapter;

// Factory with auto-detection
pub mod reader;
pub use reader::{DatasetReader, ReaderBuilder, ReaderFactory};
