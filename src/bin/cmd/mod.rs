// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CLI subcommands.

mod curate;
mod frame;
mod info;
mod organize;
mod quarantine;
mod scan;

pub use curate::CurateCmd;
pub use frame::FrameCmd;
pub use info::InfoCmd;
pub use organize::OrganizeCmd;
pub use quarantine::QuarantineCmd;
pub use scan::ScanCmd;

use std::path::Path;

use robocurate::curation::{Consistency, DatasetInspector, ScanOptions, ScanRecord};
use robocurate::{AdapterConfig, ConsistencyPolicy};

use crate::common::ProgressBar;

/// Run a scan with a spinner on the terminal.
pub(crate) fn scan_root(root: &Path, options: &ScanOptions) -> DatasetInspector {
    let spinner = ProgressBar::spinner(format!("Scanning {}", root.display()));
    let mut inspector = DatasetInspector::new(root);
    inspector.scan(options);
    spinner.finish_and_clear();
    inspector
}

pub(crate) fn scan_options(verify: bool, strict: bool, config: &AdapterConfig) -> ScanOptions {
    ScanOptions {
        verify,
        policy: if strict {
            ConsistencyPolicy::SingleType
        } else {
            ConsistencyPolicy::Relaxed
        },
        config: config.clone(),
    }
}

/// Print the scan table and the grouped summary.
pub(crate) fn print_scan(inspector: &DatasetInspector) {
    println!("=== {} ===", inspector.root().display());
    for ScanRecord {
        name,
        dataset_type,
        status,
        ..
    } in inspector.records()
    {
        println!("  {:<40} {:<10} {}", name, dataset_type.as_str(), status);
    }

    println!();
    println!("Grouped:");
    for (dataset_type, paths) in inspector.grouped() {
        println!("  {}: {}", dataset_type, paths.len());
    }
    if inspector.unknown_count() > 0 {
        println!("  Unknown: {}", inspector.unknown_count());
    }
}

pub(crate) fn print_verdict(verdict: &Consistency) {
    println!();
    println!("Consistency: {verdict}");
    if let Consistency::UnknownEntries { paths } = verdict {
        for path in paths {
            println!("  ? {}", path.display());
        }
    }
}
