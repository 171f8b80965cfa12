// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Decoding of the `sensor_msgs` types the adapter consumes.

use image::RgbImage;

use super::cursor::{MessageCursor, WireFormat};
use crate::io::media::{decode_compressed, raw_to_rgb};
use crate::Result;

/// Message types with a known decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    Image,
    CompressedImage,
    JointState,
}

impl MessageKind {
    /// Classify a ROS1 (`sensor_msgs/Image`) or ROS2
    /// (`sensor_msgs/msg/Image`) type name.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name.rsplit('/').next()? {
            "Image" => Some(MessageKind::Image),
            "CompressedImage" => Some(MessageKind::CompressedImage),
            "JointState" => Some(MessageKind::JointState),
            _ => None,
        }
    }

    /// Check if messages of this kind carry an image.
    pub fn is_image(self) -> bool {
        matches!(self, MessageKind::Image | MessageKind::CompressedImage)
    }
}

/// Skip `std_msgs/Header`.
fn skip_header(cur: &mut MessageCursor<'_>) -> Result<()> {
    if cur.format() == WireFormat::Ros1 {
        cur.read_u32()?; // seq
    }
    cur.read_i32()?; // stamp.sec
    cur.read_u32()?; // stamp.nanosec
    cur.read_string()?; // frame_id
    Ok(())
}

/// Decoded `sensor_msgs/Image` fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage<'a> {
    pub height: u32,
    pub width: u32,
    pub encoding: String,
    pub is_bigendian: bool,
    pub step: u32,
    pub data: &'a [u8],
}

/// Parse a `sensor_msgs/Image` without converting pixels.
pub fn parse_image(data: &[u8], format: WireFormat) -> Result<RawImage<'_>> {
    let mut cur = MessageCursor::new(data, format)?;
    skip_header(&mut cur)?;
    let height = cur.read_u32()?;
    let width = cur.read_u32()?;
    let encoding = cur.read_string()?;
    let is_bigendian = cur.read_u8()? != 0;
    let step = cur.read_u32()?;
    let data = cur.read_byte_seq()?;
    Ok(RawImage {
        height,
        width,
        encoding,
        is_bigendian,
        step,
        data,
    })
}

/// Parse a `sensor_msgs/CompressedImage`, returning `(format, data)`.
pub fn parse_compressed_image(data: &[u8], format: WireFormat) -> Result<(String, &[u8])> {
    let mut cur = MessageCursor::new(data, format)?;
    skip_header(&mut cur)?;
    let image_format = cur.read_string()?;
    let payload = cur.read_byte_seq()?;
    Ok((image_format, payload))
}

/// Parse the `position` vector of a `sensor_msgs/JointState`.
pub fn parse_joint_positions(data: &[u8], format: WireFormat) -> Result<Vec<f64>> {
    let mut cur = MessageCursor::new(data, format)?;
    skip_header(&mut cur)?;
    cur.skip_string_seq()?; // name
    cur.read_f64_seq()
}

/// Decode an image message of either kind to RGB8.
pub fn decode_image(kind: MessageKind, data: &[u8], format: WireFormat) -> Result<RgbImage> {
    match kind {
        MessageKind::CompressedImage => {
            let (_, payload) = parse_compressed_image(data, format)?;
            decode_compressed(payload)
        }
        _ => {
            let img = parse_image(data, format)?;
            raw_to_rgb(
                img.data,
                img.width,
                img.height,
                img.step as usize,
                &img.encoding,
                img.is_bigendian,
            )
        }
    }
}
