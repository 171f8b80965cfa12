// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Scan command - classify every entry under a root.

use std::path::PathBuf;

use clap::Args;
use robocurate::AdapterConfig;

use super::{print_scan, print_verdict, scan_options, scan_root};
use crate::common::Result;

/// Scan a directory.
#[derive(Args, Clone, Debug)]
pub struct ScanCmd {
    /// Directory to scan
    #[arg(value_name = "ROOT")]
    root: PathBuf,

    /// Open every candidate to confirm it loads
    #[arg(long)]
    verify: bool,

    /// Require all datasets to share one type
    #[arg(long)]
    strict: bool,
}

impl ScanCmd {
    pub fn run(self, config: &AdapterConfig) -> Result<()> {
        if !self.root.is_dir() {
            anyhow::bail!("not a directory: {}", self.root.display());
        }
        let inspector = scan_root(&self.root, &scan_options(self.verify, self.strict, config));
        print_scan(&inspector);

        let verdict = inspector.consistency();
        print_verdict(&verdict);
        if !inspector.check_consistency() {
            anyhow::bail!("consistency check failed: {verdict}");
        }
        Ok(())
    }
}
