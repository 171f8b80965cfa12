// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Cursor over serialized ROS messages.
//!
//! Two wire layouts are supported:
//! - CDR (ROS2, MCAP `cdr` channels): 4-byte encapsulation header whose
//!   second byte selects endianness; primitives are aligned to their size,
//!   relative to the end of the header.
//! - ROS1 serialization: little-endian, no header, no alignment.

use crate::{CurateError, Result};

/// Size of the CDR encapsulation header (4 bytes).
pub const CDR_HEADER_SIZE: usize = 4;

/// Wire layout of a message buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    Cdr,
    Ros1,
}

/// Read cursor tracking position and alignment origin.
///
/// Alignment is computed as `(offset - origin) % size`, not `offset % size`.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use robocurate::io::formats::ros::cursor::MessageCursor;
///
/// let data = vec![0x00, 0x01, 0x00, 0x00, 0x2A, 0x00, 0x00, 0x00]; // CDR header + value
/// let mut cursor = MessageCursor::new_cdr(&data)?;
/// assert_eq!(cursor.read_u32()?, 42);
/// # Ok(())
/// # }
/// ```
pub struct MessageCursor<'a> {
    data: &'a [u8],
    offset: usize,
    origin: usize,
    little_endian: bool,
    format: WireFormat,
}

fn too_short(needed: usize, available: usize, offset: usize) -> CurateError {
    CurateError::decode(
        "message",
        format!("buffer too short: need {needed} bytes at offset {offset}, {available} left"),
    )
}

impl<'a> MessageCursor<'a> {
    /// Create a cursor over CDR data (including the 4-byte header).
    ///
    /// Byte 1 of the header is the encapsulation kind: odd values are
    /// little endian.
    pub fn new_cdr(data: &'a [u8]) -> Result<Self> {
        if data.len() < CDR_HEADER_SIZE {
            return Err(CurateError::decode(
                "message",
                format!(
                    "Invalid CDR data size {}, must contain at least a 4-byte header",
                    data.len()
                ),
            ));
        }
        Ok(Self {
            data,
            offset: CDR_HEADER_SIZE,
            origin: CDR_HEADER_SIZE,
            little_endian: data[1] & 1 == 1,
            format: WireFormat::Cdr,
        })
    }

    /// Create a cursor over ROS1-serialized data.
    pub fn new_ros1(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            origin: 0,
            little_endian: true,
            format: WireFormat::Ros1,
        }
    }

    /// Create a cursor for the given wire format.
    pub fn new(data: &'a [u8], format: WireFormat) -> Result<Self> {
        match format {
            WireFormat::Cdr => Self::new_cdr(data),
            WireFormat::Ros1 => Ok(Self::new_ros1(data)),
        }
    }

    /// Wire layout being read.
    pub fn format(&self) -> WireFormat {
        self.format
    }

    /// Current read position.
    #[inline]
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Remaining bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    /// Align to `size` relative to the origin. No-op for ROS1.
    pub fn align(&mut self, size: usize) -> Result<()> {
        if self.format == WireFormat::Ros1 {
            return Ok(());
        }
        let alignment = (self.offset - self.origin) % size;
        if alignment > 0 {
            let padding = size - alignment;
            if padding > self.remaining() {
                return Err(too_short(padding, self.remaining(), self.offset));
            }
            self.offset += padding;
        }
        Ok(())
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.align(N)?;
        if N > self.remaining() {
            return Err(too_short(N, self.remaining(), self.offset));
        }
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.data[self.offset..self.offset + N]);
        self.offset += N;
        Ok(bytes)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    /// Read a u32 value.
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take::<4>()?;
        Ok(if self.little_endian {
            u32::from_le_bytes(bytes)
        } else {
            u32::from_be_bytes(bytes)
        })
    }

    /// Read an i32 value.
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    /// Read an f64 value.
    pub fn read_f64(&mut self) -> Result<f64> {
        let bytes = self.take::<8>()?;
        Ok(if self.little_endian {
            f64::from_le_bytes(bytes)
        } else {
            f64::from_be_bytes(bytes)
        })
    }

    /// Read a byte slice.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(too_short(count, self.remaining(), self.offset));
        }
        let start = self.offset;
        self.offset += count;
        Ok(&self.data[start..self.offset])
    }

    /// Read a sequence length prefix.
    pub fn read_len(&mut self) -> Result<usize> {
        Ok(self.read_u32()? as usize)
    }

    /// Read a string. CDR strings carry a trailing NUL that is stripped.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_len()?;
        let mut bytes = self.read_bytes(len)?;
        if let Some((0, rest)) = bytes.split_last() {
            bytes = rest;
        }
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a `uint8[]` sequence.
    pub fn read_byte_seq(&mut self) -> Result<&'a [u8]> {
        let len = self.read_len()?;
        self.read_bytes(len)
    }

    /// Read a `float64[]` sequence.
    pub fn read_f64_seq(&mut self) -> Result<Vec<f64>> {
        let len = self.read_len()?;
        if len.saturating_mul(8) > self.remaining() + 7 {
            return Err(too_short(len * 8, self.remaining(), self.offset));
        }
        (0..len).map(|_| self.read_f64()).collect()
    }

    /// Skip a `string[]` sequence.
    pub fn skip_string_seq(&mut self) -> Result<()> {
        let len = self.read_len()?;
        for _ in 0..len {
            self.read_string()?;
        }
        Ok(())
    }
}
