// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! NumPy `.npy` arrays as [`StateArray`]s.
//!
//! Numeric dtypes (float, signed and unsigned integers, bool) of either
//! byte order and both C and Fortran element order are accepted. Every
//! array is widened to `f64`.

use std::io::{self, Cursor};
use std::path::Path;

use ndarray::{ArrayD, IxDyn, ShapeBuilder};
use npyz::{DType, NpyFile, Order, TypeChar, WriterBuilder};

use crate::{CurateError, Result, StateArray};

fn decode_err(e: impl std::fmt::Display) -> CurateError {
    CurateError::decode("npy", e.to_string())
}

fn widen<T: Copy + Into<f64>>(values: Vec<T>) -> Vec<f64> {
    values.into_iter().map(Into::into).collect()
}

fn read_values<R: io::Read>(npy: NpyFile<R>) -> Result<Vec<f64>> {
    let DType::Plain(type_str) = npy.dtype() else {
        return Err(decode_err("structured dtypes are not supported"));
    };
    let values = match (type_str.type_char(), type_str.size_field()) {
        (TypeChar::Float, 4) => widen(npy.into_vec::<f32>().map_err(decode_err)?),
        (TypeChar::Float, 8) => npy.into_vec::<f64>().map_err(decode_err)?,
        (TypeChar::Int, 1) => widen(npy.into_vec::<i8>().map_err(decode_err)?),
        (TypeChar::Int, 2) => widen(npy.into_vec::<i16>().map_err(decode_err)?),
        (TypeChar::Int, 4) => widen(npy.into_vec::<i32>().map_err(decode_err)?),
        (TypeChar::Int, 8) => npy
            .into_vec::<i64>()
            .map_err(decode_err)?
            .into_iter()
            .map(|v| v as f64)
            .collect(),
        (TypeChar::Uint, 1) => widen(npy.into_vec::<u8>().map_err(decode_err)?),
        (TypeChar::Uint, 2) => widen(npy.into_vec::<u16>().map_err(decode_err)?),
        (TypeChar::Uint, 4) => widen(npy.into_vec::<u32>().map_err(decode_err)?),
        (TypeChar::Uint, 8) => npy
            .into_vec::<u64>()
            .map_err(decode_err)?
            .into_iter()
            .map(|v| v as f64)
            .collect(),
        (TypeChar::Bool, 1) => npy
            .into_vec::<bool>()
            .map_err(decode_err)?
            .into_iter()
            .map(|b| if b { 1.0 } else { 0.0 })
            .collect(),
        _ => return Err(decode_err(format!("unsupported dtype '{type_str}'"))),
    };
    Ok(values)
}

/// Parse an in-memory `.npy` buffer.
pub fn parse_npy(bytes: &[u8]) -> Result<StateArray> {
    let npy = NpyFile::new(bytes).map_err(decode_err)?;
    let shape: Vec<usize> = npy.shape().iter().map(|&d| d as usize).collect();
    let fortran = matches!(npy.order(), Order::Fortran);
    let values = read_values(npy)?;

    let expected: usize = shape.iter().product();
    if values.len() != expected {
        return Err(decode_err(format!(
            "array data is truncated: {} of {expected} values",
            values.len()
        )));
    }
    let array = if fortran {
        ArrayD::from_shape_vec(IxDyn(&shape).f(), values)
    } else {
        ArrayD::from_shape_vec(IxDyn(&shape), values)
    };
    array.map_err(decode_err)
}

/// Read a `.npy` file.
pub fn read_npy<P: AsRef<Path>>(path: P) -> Result<StateArray> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| CurateError::io(format!("reading '{}'", path.display()), e.to_string()))?;
    parse_npy(&bytes)
}

/// Serialize an array as C-order `<f8`.
pub fn to_npy_bytes(array: &StateArray) -> Result<Vec<u8>> {
    let shape: Vec<u64> = array.shape().iter().map(|&d| d as u64).collect();
    let mut out = Cursor::new(Vec::new());
    let mut writer = npyz::WriteOptions::<f64>::new()
        .default_dtype()
        .shape(&shape)
        .writer(&mut out)
        .begin_nd()
        .map_err(decode_err)?;
    writer.extend(array.iter().copied()).map_err(decode_err)?;
    writer.finish().map_err(decode_err)?;
    Ok(out.into_inner())
}
