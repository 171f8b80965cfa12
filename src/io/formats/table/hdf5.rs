// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! HDF5 binding for [`TableSource`] (`hdf5` feature, needs libhdf5).

use std::path::Path;

use hdf5_metno as h5;
use ndarray::{IxDyn, SliceInfo, SliceInfoElem};

use super::{TableRow, TableSource};
use crate::{CurateError, Result};

fn h5_error(e: h5::Error) -> CurateError {
    CurateError::decode("hdf5", e.to_string())
}

/// Open HDF5 file.
pub struct Hdf5Source {
    file: h5::File,
}

impl Hdf5Source {
    /// Open a file read-only.
    pub fn open(path: &Path) -> Result<Self> {
        let file = h5::File::open(path).map_err(h5_error)?;
        Ok(Self { file })
    }

    fn read_row<T: h5::H5Type>(&self, path: &str, index: usize) -> Result<TableRow<T>> {
        let dataset = self.file.dataset(path).map_err(h5_error)?;
        let shape = dataset.shape();
        if shape.is_empty() {
            return Err(CurateError::decode("hdf5", format!("'{path}' is a scalar")));
        }
        if index >= shape[0] {
            return Err(CurateError::out_of_range(index, shape[0]));
        }

        let mut elems = vec![SliceInfoElem::Index(index as isize)];
        elems.extend(std::iter::repeat(SliceInfoElem::from(..)).take(shape.len() - 1));
        let selection = SliceInfo::<Vec<SliceInfoElem>, IxDyn, IxDyn>::try_from(elems)
            .map_err(|e| CurateError::decode("hdf5", e.to_string()))?;

        let row = dataset
            .read_slice::<T, _, IxDyn>(selection)
            .map_err(h5_error)?;
        let row_shape = shape[1..].to_vec();
        Ok(TableRow {
            shape: row_shape,
            data: row.iter().cloned().collect(),
        })
    }
}

impl TableSource for Hdf5Source {
    fn root_arrays(&self) -> Vec<String> {
        self.file
            .member_names()
            .unwrap_or_default()
            .into_iter()
            .filter(|name| self.file.dataset(name).is_ok())
            .collect()
    }

    fn array_len(&self, path: &str) -> Option<usize> {
        if !self.file.link_exists(path) {
            return None;
        }
        let dataset = self.file.dataset(path).ok()?;
        dataset.shape().first().copied()
    }

    fn group_members(&self, group: &str) -> Vec<String> {
        if !self.file.link_exists(group) {
            return Vec::new();
        }
        let Ok(group) = self.file.group(group) else {
            return Vec::new();
        };
        let mut names: Vec<String> = group
            .member_names()
            .unwrap_or_default()
            .into_iter()
            .filter(|name| group.dataset(name).is_ok())
            .collect();
        names.sort();
        names
    }

    fn read_bytes(&self, path: &str, index: usize) -> Result<TableRow<u8>> {
        self.read_row::<u8>(path, index)
    }

    fn read_f64(&self, path: &str, index: usize) -> Result<TableRow<f64>> {
        self.read_row::<f64>(path, index)
    }
}
