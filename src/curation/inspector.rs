// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Directory scanning and the consistency gate.
//!
//! The walk is depth-first in file-name order. A directory that detects as a
//! dataset root is recorded whole and not descended; every other directory
//! is descended and the plain files directly inside it are recorded, including
//! files no rule recognizes. Hidden entries are skipped along with their
//! subtrees, as are the quarantine folders and cleaning reports a previous
//! curation left in the root. Still images lying in a raw image folder are
//! frame payloads and are not recorded.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use super::organizer::QUARANTINE_PREFIX;
use super::report::REPORT_PREFIX;
use crate::io::detection::{detect_type, is_image_path};
use crate::io::traits::DatasetAdapter;
use crate::io::ReaderFactory;
use crate::{AdapterConfig, DatasetType};

/// Outcome for one scanned path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanStatus {
    /// Recognized (and loadable, when verified)
    Ok,
    /// No detection rule matched
    Unknown,
    /// Recognized but the adapter rejected it
    Problem,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScanStatus::Ok => "OK",
            ScanStatus::Unknown => "Unknown",
            ScanStatus::Problem => "Problem",
        })
    }
}

/// One scanned path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRecord {
    pub name: String,
    pub path: PathBuf,
    pub dataset_type: DatasetType,
    pub status: ScanStatus,
}

/// How mixed dataset types are judged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsistencyPolicy {
    /// Any mix of recognized types passes
    #[default]
    Relaxed,
    /// All valid datasets must share one type
    SingleType,
}

/// Scan settings.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Open and close every candidate through the reader factory
    pub verify: bool,
    pub policy: ConsistencyPolicy,
    /// Adapter settings used when verifying
    pub config: AdapterConfig,
}

/// Result of the consistency check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consistency {
    /// Distinct valid types found
    Passed { types: Vec<DatasetType> },
    /// Unrecognized entries exist
    UnknownEntries { paths: Vec<PathBuf> },
    /// Nothing valid was found
    NoValidData,
    /// More than one type under [`ConsistencyPolicy::SingleType`]
    MixedTypes { types: Vec<DatasetType> },
}

impl Consistency {
    pub fn is_ok(&self) -> bool {
        matches!(self, Consistency::Passed { .. })
    }
}

impl fmt::Display for Consistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags = |types: &[DatasetType]| {
            types
                .iter()
                .map(DatasetType::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self {
            Consistency::Passed { types } => write!(f, "passed, types: {}", tags(types)),
            Consistency::UnknownEntries { paths } => {
                write!(f, "failed, {} unrecognized entries", paths.len())
            }
            Consistency::NoValidData => f.write_str("failed, no valid datasets"),
            Consistency::MixedTypes { types } => {
                write!(f, "failed, mixed types: {}", tags(types))
            }
        }
    }
}

/// Scans a root directory for datasets.
#[derive(Debug, Clone)]
pub struct DatasetInspector {
    root: PathBuf,
    policy: ConsistencyPolicy,
    records: Vec<ScanRecord>,
    grouped: BTreeMap<DatasetType, Vec<PathBuf>>,
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Quarantine folder or cleaning report written directly into the root.
fn is_curation_output(entry: &DirEntry) -> bool {
    if entry.depth() != 1 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    if entry.file_type().is_dir() {
        name.starts_with(QUARANTINE_PREFIX)
    } else {
        name.starts_with(REPORT_PREFIX) && name.ends_with(".txt")
    }
}

impl DatasetInspector {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            policy: ConsistencyPolicy::default(),
            records: Vec::new(),
            grouped: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the root, replacing the results of any previous scan.
    pub fn scan(&mut self, options: &ScanOptions) -> &[ScanRecord] {
        self.records.clear();
        self.grouped.clear();
        self.policy = options.policy;
        info!(root = %self.root.display(), verify = options.verify, "Scanning");

        // Directory -> whether it is a raw image folder
        let mut raw_dirs: HashMap<PathBuf, bool> = HashMap::new();

        let mut walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !(is_hidden(e.file_name()) || is_curation_output(e))
            });

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();

            if entry.file_type().is_dir() {
                let dataset_type = detect_type(path);
                if dataset_type.is_dataset_root() {
                    self.add_record(path, dataset_type, options);
                    walker.skip_current_dir();
                } else {
                    raw_dirs.insert(path.to_path_buf(), dataset_type == DatasetType::RawFolder);
                }
                continue;
            }
            if !path.is_file() {
                continue;
            }

            let in_raw_folder = path
                .parent()
                .and_then(|p| raw_dirs.get(p).copied())
                .unwrap_or(false);
            if in_raw_folder && is_image_path(path) {
                continue;
            }
            self.add_record(path, detect_type(path), options);
        }

        info!(
            root = %self.root.display(),
            entries = self.records.len(),
            unknown = self.unknown_count(),
            "Scan complete"
        );
        &self.records
    }

    fn add_record(&mut self, path: &Path, dataset_type: DatasetType, options: &ScanOptions) {
        let status = if dataset_type.is_unknown() {
            ScanStatus::Unknown
        } else if options.verify && !Self::verify(path, &options.config) {
            ScanStatus::Problem
        } else {
            ScanStatus::Ok
        };
        debug!(path = %path.display(), dataset_type = %dataset_type, status = %status, "Scanned");

        if status == ScanStatus::Ok {
            self.grouped
                .entry(dataset_type)
                .or_default()
                .push(path.to_path_buf());
        }
        self.records.push(ScanRecord {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            path: path.to_path_buf(),
            dataset_type,
            status,
        });
    }

    /// Open and close a candidate.
    fn verify(path: &Path, config: &AdapterConfig) -> bool {
        match ReaderFactory::create(path, config) {
            Ok(mut reader) => {
                let ok = reader.load(path);
                reader.close();
                ok
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Verification failed");
                false
            }
        }
    }

    /// All records of the last scan, in walk order.
    pub fn records(&self) -> &[ScanRecord] {
        &self.records
    }

    /// Valid paths by type.
    pub fn grouped(&self) -> &BTreeMap<DatasetType, Vec<PathBuf>> {
        &self.grouped
    }

    /// Record count per detected type, any status.
    pub fn counts(&self) -> BTreeMap<DatasetType, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.dataset_type).or_insert(0) += 1;
        }
        counts
    }

    pub fn unknown_count(&self) -> usize {
        self.records_with(ScanStatus::Unknown).count()
    }

    /// Records with a given status.
    pub fn records_with(&self, status: ScanStatus) -> impl Iterator<Item = &ScanRecord> {
        self.records.iter().filter(move |r| r.status == status)
    }

    /// Sorted flat list of valid paths.
    pub fn valid_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.grouped.values().flatten().cloned().collect();
        paths.sort();
        paths
    }

    /// Judge the last scan.
    pub fn consistency(&self) -> Consistency {
        let unknown: Vec<PathBuf> = self
            .records_with(ScanStatus::Unknown)
            .map(|r| r.path.clone())
            .collect();
        if !unknown.is_empty() {
            return Consistency::UnknownEntries { paths: unknown };
        }
        let types: Vec<DatasetType> = self.grouped.keys().copied().collect();
        if types.is_empty() {
            return Consistency::NoValidData;
        }
        if self.policy == ConsistencyPolicy::SingleType && types.len() > 1 {
            return Consistency::MixedTypes { types };
        }
        Consistency::Passed { types }
    }

    /// Judge the last scan and log the verdict.
    pub fn check_consistency(&self) -> bool {
        let verdict = self.consistency();
        for record in self.records_with(ScanStatus::Problem) {
            warn!(
                path = %record.path.display(),
                dataset_type = %record.dataset_type,
                "Dataset failed to load"
            );
        }
        match &verdict {
            Consistency::Passed { .. } => info!(
                datasets = self.grouped.values().map(Vec::len).sum::<usize>(),
                "Consistency check {verdict}"
            ),
            Consistency::UnknownEntries { paths } => {
                for path in paths {
                    warn!(path = %path.display(), "Unrecognized entry");
                }
                warn!("Consistency check {verdict}");
            }
            _ => warn!("Consistency check {verdict}"),
        }
        verdict.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    fn scan(root: &Path) -> DatasetInspector {
        let mut inspector = DatasetInspector::new(root);
        inspector.scan(&ScanOptions::default());
        inspector
    }

    #[test]
    fn test_table_files_and_unknown_file() {
        let dir = TempDir::new().unwrap();
        for i in 0..3 {
            touch(&dir.path().join(format!("episode_{i}.hdf5")));
        }
        touch(&dir.path().join("notes.txt"));

        let inspector = scan(dir.path());
        assert_eq!(inspector.records().len(), 4);
        assert_eq!(inspector.unknown_count(), 1);
        assert_eq!(
            inspector.consistency(),
            Consistency::UnknownEntries {
                paths: vec![dir.path().join("notes.txt")]
            }
        );
        assert!(!inspector.check_consistency());

        fs::remove_file(dir.path().join("notes.txt")).unwrap();
        let inspector = scan(dir.path());
        assert!(inspector.check_consistency());
        assert_eq!(inspector.grouped().len(), 1);
        assert_eq!(inspector.grouped()[&DatasetType::Table].len(), 3);
    }

    #[test]
    fn test_nested_root_not_descended() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/unitree_ep");
        touch(&nested.join("data.json"));
        touch(&nested.join("colors/0_top.jpg"));
        touch(&nested.join("junk.bin"));
        touch(&dir.path().join("loose.xyz"));

        let inspector = scan(dir.path());
        assert_eq!(inspector.records().len(), 2);
        assert_eq!(inspector.unknown_count(), 1);
        assert_eq!(inspector.grouped()[&DatasetType::JsonManifest], vec![nested]);
        assert!(!inspector.check_consistency());
    }

    #[test]
    fn test_hidden_entries_skipped() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join(".cache/stuff.txt"));
        touch(&dir.path().join(".hidden.txt"));
        touch(&dir.path().join("run.mcap"));

        let inspector = scan(dir.path());
        assert_eq!(inspector.records().len(), 1);
        assert!(inspector.check_consistency());
    }

    #[test]
    fn test_empty_root_has_no_valid_data() {
        let dir = TempDir::new().unwrap();
        let inspector = scan(dir.path());
        assert_eq!(inspector.consistency(), Consistency::NoValidData);
    }

    #[test]
    fn test_mixed_types_policy() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a.hdf5"));
        touch(&dir.path().join("b.bag"));

        let inspector = scan(dir.path());
        assert_eq!(
            inspector.consistency(),
            Consistency::Passed {
                types: vec![DatasetType::Table, DatasetType::TimeIndexedMessages]
            }
        );

        let mut strict = DatasetInspector::new(dir.path());
        strict.scan(&ScanOptions {
            policy: ConsistencyPolicy::SingleType,
            ..ScanOptions::default()
        });
        assert!(matches!(
            strict.consistency(),
            Consistency::MixedTypes { .. }
        ));
    }

    #[test]
    fn test_raw_folder_images_not_recorded() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("cams/000000_top.jpg"));
        touch(&dir.path().join("cams/colors/000001_top.jpg"));
        touch(&dir.path().join("ep.h5"));

        let inspector = scan(dir.path());
        assert_eq!(inspector.records().len(), 1);
        assert_eq!(inspector.unknown_count(), 0);
    }

    #[test]
    fn test_verify_marks_problem() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("broken");
        fs::create_dir_all(&bad).unwrap();
        fs::write(bad.join("data.json"), b"{ not json").unwrap();
        touch(&dir.path().join("ok.mcap"));

        let mut inspector = DatasetInspector::new(dir.path());
        inspector.scan(&ScanOptions {
            verify: true,
            ..ScanOptions::default()
        });
        let problems: Vec<_> = inspector.records_with(ScanStatus::Problem).collect();
        // The fake mcap fails to load too.
        assert_eq!(problems.len(), 2);
        assert!(inspector.grouped().is_empty());
        assert_eq!(inspector.counts()[&DatasetType::JsonManifest], 1);
        assert_eq!(inspector.consistency(), Consistency::NoValidData);
    }

    #[test]
    fn test_valid_paths_sorted() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("z.bag"));
        touch(&dir.path().join("a.h5"));
        let inspector = scan(dir.path());
        assert_eq!(
            inspector.valid_paths(),
            vec![dir.path().join("a.h5"), dir.path().join("z.bag")]
        );
    }
}
