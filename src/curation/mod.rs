// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Curation pipeline: scan, check, group, quarantine, report.
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use robocurate::curation::{DatasetInspector, DatasetOrganizer, ScanOptions};
//!
//! let mut inspector = DatasetInspector::new("datasets");
//! inspector.scan(&ScanOptions::default());
//! if inspector.check_consistency() && inspector.grouped().len() > 1 {
//!     DatasetOrganizer::new("datasets").group_by_type(inspector.grouped())?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod inspector;
pub mod organizer;
pub mod report;

pub use inspector::{
    Consistency, ConsistencyPolicy, DatasetInspector, ScanOptions, ScanRecord, ScanStatus,
};
pub use organizer::{group_by_type, quarantine, DatasetOrganizer};
pub use report::write_cleaning_report;
