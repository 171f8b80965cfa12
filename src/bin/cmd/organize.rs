// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Organize command - group datasets by type.

use std::path::PathBuf;

use clap::Args;
use robocurate::curation::group_by_type;
use robocurate::AdapterConfig;

use super::{scan_options, scan_root};
use crate::common::Result;

/// Move each valid dataset into `grouped_<TYPE>/`.
#[derive(Args, Clone, Debug)]
pub struct OrganizeCmd {
    /// Directory to organize
    #[arg(value_name = "ROOT")]
    root: PathBuf,

    /// Where the grouped folders are created (defaults to ROOT)
    #[arg(short, long, value_name = "DIR")]
    target: Option<PathBuf>,

    /// Only move datasets that load
    #[arg(long)]
    verify: bool,
}

impl OrganizeCmd {
    pub fn run(self, config: &AdapterConfig) -> Result<()> {
        if !self.root.is_dir() {
            anyhow::bail!("not a directory: {}", self.root.display());
        }
        let inspector = scan_root(&self.root, &scan_options(self.verify, false, config));
        let target = self.target.as_deref().unwrap_or(&self.root);

        let moved = group_by_type(inspector.grouped(), target)?;
        if moved.is_empty() {
            println!("No datasets to organize.");
            return Ok(());
        }
        for (dataset_type, paths) in &moved {
            println!("{}: {} datasets", dataset_type, paths.len());
            for path in paths {
                println!("  {}", path.display());
            }
        }
        Ok(())
    }
}
