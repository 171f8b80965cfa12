// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Row index over concatenated parquet shards.
//!
//! Row counts come from the parquet footer only; no column data is read
//! while indexing.

use std::fs::File;
use std::path::{Path, PathBuf};

use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::{Field, Row};
use walkdir::WalkDir;

use crate::io::detection::extension_lower;
use crate::{CurateError, Result};

/// Row layout of one shard.
#[derive(Debug, Clone)]
pub struct Shard {
    pub path: PathBuf,
    /// Rows per row group
    pub row_groups: Vec<usize>,
    /// Global index of this shard's first row
    pub first_row: usize,
}

impl Shard {
    pub fn num_rows(&self) -> usize {
        self.row_groups.iter().sum()
    }
}

/// Position of a global row inside the shard set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLocation {
    pub shard: usize,
    pub row_group: usize,
    pub row: usize,
}

/// Shard files of a dataset root: `data/**/*.parquet`, else `*.parquet`
/// in the root, sorted by relative path.
pub fn find_shards(root: &Path) -> Vec<PathBuf> {
    let is_parquet =
        |p: &Path| p.is_file() && extension_lower(p).is_some_and(|e| e == "parquet");

    let data_dir = root.join("data");
    let mut shards: Vec<PathBuf> = if data_dir.is_dir() {
        WalkDir::new(&data_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| is_parquet(p))
            .collect()
    } else {
        Vec::new()
    };
    if shards.is_empty() {
        shards = std::fs::read_dir(root)
            .into_iter()
            .flatten()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| is_parquet(p))
            .collect();
    }
    shards.sort();
    shards
}

/// Concatenated row index.
#[derive(Debug, Clone, Default)]
pub struct ShardIndex {
    shards: Vec<Shard>,
    total_rows: usize,
}

impl ShardIndex {
    /// Build the index from shard footers.
    pub fn build(paths: &[PathBuf]) -> Result<Self> {
        let mut shards = Vec::with_capacity(paths.len());
        let mut total_rows = 0usize;
        for path in paths {
            let reader = open_reader(path)?;
            let row_groups: Vec<usize> = reader
                .metadata()
                .row_groups()
                .iter()
                .map(|rg| rg.num_rows().max(0) as usize)
                .collect();
            let shard = Shard {
                path: path.clone(),
                row_groups,
                first_row: total_rows,
            };
            total_rows += shard.num_rows();
            shards.push(shard);
        }
        Ok(Self { shards, total_rows })
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn shards(&self) -> &[Shard] {
        &self.shards
    }

    /// Locate a global row.
    pub fn locate(&self, global_row: usize) -> Option<RowLocation> {
        if global_row >= self.total_rows {
            return None;
        }
        // Last shard whose first row is <= global_row.
        let shard_idx = self
            .shards
            .partition_point(|s| s.first_row <= global_row)
            .checked_sub(1)?;
        let shard = &self.shards[shard_idx];
        let mut row = global_row - shard.first_row;
        for (rg, &count) in shard.row_groups.iter().enumerate() {
            if row < count {
                return Some(RowLocation {
                    shard: shard_idx,
                    row_group: rg,
                    row,
                });
            }
            row -= count;
        }
        None
    }
}

pub(crate) fn open_reader(path: &Path) -> Result<SerializedFileReader<File>> {
    let file = File::open(path)
        .map_err(|e| CurateError::io(format!("opening '{}'", path.display()), e.to_string()))?;
    SerializedFileReader::new(file).map_err(|e| CurateError::decode("parquet", e.to_string()))
}

/// Read one row of an open shard.
pub(crate) fn read_row(
    reader: &SerializedFileReader<File>,
    row_group: usize,
    row: usize,
) -> Result<Row> {
    let group = reader
        .get_row_group(row_group)
        .map_err(|e| CurateError::decode("parquet", e.to_string()))?;
    let mut rows = group
        .get_row_iter(None)
        .map_err(|e| CurateError::decode("parquet", e.to_string()))?;
    match rows.nth(row) {
        Some(Ok(r)) => Ok(r),
        Some(Err(e)) => Err(CurateError::decode("parquet", e.to_string())),
        None => Err(CurateError::decode(
            "parquet",
            format!("row {row} missing from row group {row_group}"),
        )),
    }
}

/// Numeric scalar value of a field.
pub fn field_as_f64(field: &Field) -> Option<f64> {
    Some(match field {
        Field::Bool(b) => f64::from(u8::from(*b)),
        Field::Byte(v) => f64::from(*v),
        Field::Short(v) => f64::from(*v),
        Field::Int(v) => f64::from(*v),
        Field::Long(v) => *v as f64,
        Field::UByte(v) => f64::from(*v),
        Field::UShort(v) => f64::from(*v),
        Field::UInt(v) => f64::from(*v),
        Field::ULong(v) => *v as f64,
        Field::Float(v) => f64::from(*v),
        Field::Double(v) => *v,
        _ => return None,
    })
}

/// Flatten a scalar or (nested) list field into numbers.
pub fn field_as_vec(field: &Field) -> Option<Vec<f64>> {
    match field {
        Field::ListInternal(list) => {
            let mut out = Vec::with_capacity(list.elements().len());
            for element in list.elements() {
                match element {
                    Field::ListInternal(_) => out.extend(field_as_vec(element)?),
                    other => out.push(field_as_f64(other)?),
                }
            }
            Some(out)
        }
        other => field_as_f64(other).map(|v| vec![v]),
    }
}

/// Look up a column of a row by name.
pub fn row_field<'a>(row: &'a Row, name: &str) -> Option<&'a Field> {
    row.get_column_iter()
        .find(|(col, _)| col.as_str() == name)
        .map(|(_, field)| field)
}
