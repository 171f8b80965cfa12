// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Quarantine command - isolate rejected datasets.

use std::path::PathBuf;

use clap::Args;
use robocurate::DatasetOrganizer;

use crate::common::{read_path_list, Result};

/// Move datasets into a timestamped quarantine folder.
#[derive(Args, Clone, Debug)]
pub struct QuarantineCmd {
    /// Root the quarantine folder is created under
    #[arg(value_name = "ROOT")]
    root: PathBuf,

    /// Datasets to quarantine
    #[arg(value_name = "PATHS", required_unless_present = "list", conflicts_with = "list")]
    paths: Vec<PathBuf>,

    /// Read the datasets from a file, one path per line
    #[arg(short, long, value_name = "FILE")]
    list: Option<PathBuf>,
}

impl QuarantineCmd {
    pub fn run(self) -> Result<()> {
        let paths = match &self.list {
            Some(list) => read_path_list(list)?,
            None => self.paths,
        };
        if paths.is_empty() {
            println!("Nothing to quarantine.");
            return Ok(());
        }

        let dir = DatasetOrganizer::new(&self.root).quarantine(&paths)?;
        println!("Quarantined {} datasets into {}", paths.len(), dir.display());
        Ok(())
    }
}
