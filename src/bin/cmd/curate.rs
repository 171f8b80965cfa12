// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Curate command - the full cleaning pass.
//!
//! 1. Scan the root and run the consistency check (stop on failure).
//! 2. Group by type when more than one type is present.
//! 3. Quarantine the datasets named in the bad list.
//! 4. Write the cleaning report.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use clap::Args;
use robocurate::curation::write_cleaning_report;
use robocurate::{AdapterConfig, DatasetOrganizer, DatasetType};
use tracing::warn;

use super::{print_scan, print_verdict, scan_options, scan_root};
use crate::common::{read_path_list, Result};

/// Run the full curation pass over a directory.
#[derive(Args, Clone, Debug)]
pub struct CurateCmd {
    /// Directory to curate
    #[arg(value_name = "ROOT")]
    root: PathBuf,

    /// Reviewed list of bad datasets, one path per line
    #[arg(long, value_name = "FILE")]
    bad_list: Option<PathBuf>,

    /// Open every candidate to confirm it loads
    #[arg(long)]
    verify: bool,

    /// Require all datasets to share one type
    #[arg(long)]
    strict: bool,
}

/// Original path to new path for every dataset moved by grouping.
///
/// `group_by_type` keeps the per-type order of its input.
fn moved_paths(
    before: &BTreeMap<DatasetType, Vec<PathBuf>>,
    after: &BTreeMap<DatasetType, Vec<PathBuf>>,
) -> HashMap<PathBuf, PathBuf> {
    before
        .iter()
        .filter_map(|(ty, olds)| after.get(ty).map(|news| olds.iter().zip(news)))
        .flatten()
        .map(|(old, new)| (old.clone(), new.clone()))
        .collect()
}

/// Locate a listed bad dataset among the valid paths.
///
/// A listed path matches either a valid path exactly or, after grouping,
/// the original location of a moved dataset. Nothing is matched by name.
fn resolve_bad(
    listed: &Path,
    valid: &[PathBuf],
    moved: &HashMap<PathBuf, PathBuf>,
) -> Option<PathBuf> {
    if let Some(found) = valid.iter().find(|p| p.as_path() == listed) {
        return Some(found.clone());
    }
    moved.get(listed).cloned()
}

impl CurateCmd {
    pub fn run(self, config: &AdapterConfig) -> Result<()> {
        if !self.root.is_dir() {
            anyhow::bail!("not a directory: {}", self.root.display());
        }

        // 1. scan
        let inspector = scan_root(&self.root, &scan_options(self.verify, self.strict, config));
        print_scan(&inspector);
        let verdict = inspector.consistency();
        print_verdict(&verdict);
        if !inspector.check_consistency() {
            anyhow::bail!("consistency check failed: {verdict}");
        }

        // 2. group
        let organizer = DatasetOrganizer::new(&self.root);
        let (valid, moved) = if inspector.grouped().len() > 1 {
            println!();
            println!("Grouping {} dataset types", inspector.grouped().len());
            let grouped = organizer.group_by_type(inspector.grouped())?;
            let moved = moved_paths(inspector.grouped(), &grouped);
            let mut paths: Vec<PathBuf> = grouped.into_values().flatten().collect();
            paths.sort();
            (paths, moved)
        } else {
            (inspector.valid_paths(), HashMap::new())
        };
        println!("Valid datasets: {}", valid.len());

        // 3. quarantine
        let listed = match &self.bad_list {
            Some(list) => read_path_list(list)?,
            None => Vec::new(),
        };
        let mut bad = Vec::with_capacity(listed.len());
        for path in &listed {
            match resolve_bad(path, &valid, &moved) {
                Some(found) if !bad.contains(&found) => bad.push(found),
                Some(_) => {}
                None => warn!(path = %path.display(), "Listed dataset not found among valid datasets"),
            }
        }
        if !bad.is_empty() {
            let dir = organizer.quarantine(&bad)?;
            println!("Quarantined {} datasets into {}", bad.len(), dir.display());
        }
        println!("Remaining datasets: {}", valid.len() - bad.len());

        // 4. report
        let report = write_cleaning_report(&self.root, &bad)?;
        println!("Report: {}", report.display());
        Ok(())
    }
}
