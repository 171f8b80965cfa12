// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Cleaning report listing rejected datasets.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::{CurateError, Result};

/// File-name prefix of cleaning reports.
pub const REPORT_PREFIX: &str = "cleaning_report_";

/// Write `cleaning_report_<YYYYMMDD_HHMMSS>.txt` under `root`.
///
/// The file starts with `#` comment lines (title, date, count) followed by
/// one path per line. Returns the report path.
pub fn write_cleaning_report<P: AsRef<Path>>(root: &Path, bad_paths: &[P]) -> Result<PathBuf> {
    let now = chrono::Local::now();
    let path = root.join(format!("{REPORT_PREFIX}{}.txt", now.format("%Y%m%d_%H%M%S")));
    let io_err =
        |e: std::io::Error| CurateError::io(format!("writing '{}'", path.display()), e.to_string());

    let mut out = BufWriter::new(File::create(&path).map_err(io_err)?);
    writeln!(out, "# Bad Datasets Report").map_err(io_err)?;
    writeln!(out, "# Date: {}", now.format("%Y-%m-%d %H:%M:%S")).map_err(io_err)?;
    writeln!(out, "# Count: {}", bad_paths.len()).map_err(io_err)?;
    for bad in bad_paths {
        writeln!(out, "{}", bad.as_ref().display()).map_err(io_err)?;
    }
    out.flush().map_err(io_err)?;

    info!(path = %path.display(), count = bad_paths.len(), "Wrote cleaning report");
    Ok(path)
}
