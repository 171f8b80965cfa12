// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Moving datasets: grouping by type and quarantining rejected ones.
//!
//! Both operations are destructive on name collisions: an existing
//! destination with the same name is removed before the move.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{CurateError, DatasetType, Result};

/// Prefix of quarantine directories.
pub const QUARANTINE_PREFIX: &str = "_QUARANTINE_";

/// File listing every quarantined item.
pub const MANIFEST_NAME: &str = "manifest.txt";

/// Separator line between manifest entries.
pub const MANIFEST_SEPARATOR: &str = "--------------------------------------------------";

/// Folder name holding datasets of one type.
pub fn group_dir_name(dataset_type: DatasetType) -> String {
    format!("grouped_{}", dataset_type.as_str())
}

fn remove_existing(path: &Path) -> Result<()> {
    let Ok(meta) = fs::symlink_metadata(path) else {
        return Ok(());
    };
    let removed = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    removed.map_err(|e| CurateError::io(format!("removing '{}'", path.display()), e.to_string()))
}

fn copy_recursive(from: &Path, to: &Path) -> std::io::Result<()> {
    if fs::symlink_metadata(from)?.is_dir() {
        fs::create_dir_all(to)?;
        for entry in fs::read_dir(from)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &to.join(entry.file_name()))?;
        }
    } else {
        fs::copy(from, to)?;
    }
    Ok(())
}

/// Move a file or directory, falling back to copy-then-delete across
/// filesystems.
pub fn move_path(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(libc::EXDEV) => {
            debug!(from = %from.display(), to = %to.display(), "Cross-device move, copying");
            copy_recursive(from, to)
                .and_then(|()| {
                    if from.is_dir() {
                        fs::remove_dir_all(from)
                    } else {
                        fs::remove_file(from)
                    }
                })
                .map_err(|e| CurateError::move_failed(from, to, e.to_string()))
        }
        Err(e) => Err(CurateError::move_failed(from, to, e.to_string())),
    }
}

/// Move `src` into `dir`, replacing a same-named entry. Returns the new path.
fn move_into(src: &Path, dir: &Path) -> Result<PathBuf> {
    let name = src
        .file_name()
        .ok_or_else(|| CurateError::move_failed(src, dir, "path has no file name"))?;
    let dst = dir.join(name);
    if dst == src {
        return Ok(dst);
    }
    remove_existing(&dst)?;
    info!(from = %src.display(), to = %dst.display(), "Moving");
    move_path(src, &dst)?;
    Ok(dst)
}

/// Move each dataset into `target_root/grouped_<TAG>/`.
///
/// Returns the new paths by type. Types with no paths are skipped.
pub fn group_by_type(
    grouped: &BTreeMap<DatasetType, Vec<PathBuf>>,
    target_root: &Path,
) -> Result<BTreeMap<DatasetType, Vec<PathBuf>>> {
    let mut moved = BTreeMap::new();
    for (dataset_type, paths) in grouped {
        if paths.is_empty() {
            continue;
        }
        let type_dir = target_root.join(group_dir_name(*dataset_type));
        fs::create_dir_all(&type_dir).map_err(|e| {
            CurateError::io(format!("creating '{}'", type_dir.display()), e.to_string())
        })?;

        let mut new_paths = Vec::with_capacity(paths.len());
        for src in paths {
            new_paths.push(move_into(src, &type_dir)?);
        }
        moved.insert(*dataset_type, new_paths);
    }
    Ok(moved)
}

/// Create a fresh `_QUARANTINE_<YYYYMMDD_HHMMSS>[_N]` directory under `root`.
fn create_quarantine_dir(root: &Path) -> Result<PathBuf> {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let base = format!("{QUARANTINE_PREFIX}{stamp}");
    for attempt in 0u32.. {
        let name = if attempt == 0 {
            base.clone()
        } else {
            format!("{base}_{attempt}")
        };
        let dir = root.join(name);
        match fs::create_dir(&dir) {
            Ok(()) => return Ok(dir),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(CurateError::io(
                    format!("creating '{}'", dir.display()),
                    e.to_string(),
                ))
            }
        }
    }
    Err(CurateError::io("quarantine", "no free directory name"))
}

/// Move `bad_paths` into a new quarantine directory under `root`.
///
/// `manifest.txt` gets one entry per moved item, written after the move.
/// A failed move aborts the batch; the manifest then lists exactly the
/// items moved before it.
pub fn quarantine<P: AsRef<Path>>(bad_paths: &[P], root: &Path) -> Result<PathBuf> {
    let dir = create_quarantine_dir(root)?;
    let manifest_path = dir.join(MANIFEST_NAME);
    let io_err = |e: std::io::Error| {
        CurateError::io(format!("writing '{}'", manifest_path.display()), e.to_string())
    };
    let mut manifest = BufWriter::new(File::create(&manifest_path).map_err(io_err)?);

    for path in bad_paths {
        let src = path.as_ref();
        let dst = move_into(src, &dir)?;
        writeln!(manifest, "Original Path: {}", src.display()).map_err(io_err)?;
        writeln!(manifest, "Moved to: {}", dst.display()).map_err(io_err)?;
        writeln!(manifest, "{MANIFEST_SEPARATOR}").map_err(io_err)?;
        manifest.flush().map_err(io_err)?;
    }
    info!(dir = %dir.display(), count = bad_paths.len(), "Quarantined");
    Ok(dir)
}

/// Organizer bound to a dataset root.
#[derive(Debug, Clone)]
pub struct DatasetOrganizer {
    root: PathBuf,
}

impl DatasetOrganizer {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Group datasets into `grouped_<TAG>` folders under the root.
    pub fn group_by_type(
        &self,
        grouped: &BTreeMap<DatasetType, Vec<PathBuf>>,
    ) -> Result<BTreeMap<DatasetType, Vec<PathBuf>>> {
        group_by_type(grouped, &self.root)
    }

    /// Quarantine datasets under the root.
    pub fn quarantine<P: AsRef<Path>>(&self, bad_paths: &[P]) -> Result<PathBuf> {
        quarantine(bad_paths, &self.root)
    }
}
