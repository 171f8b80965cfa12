// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Image payload conversion to RGB8.
//!
//! Three entry points cover every payload the adapters meet:
//! - [`decode_compressed`]: format-sniffing decode of JPEG/PNG/... blobs
//! - [`raw_to_rgb`]: raw pixel buffers with a declared encoding
//!   (ROS `sensor_msgs/Image` style)
//! - [`tensor_to_rgb`]: dense `u8` tensors in HW, HWC or CHW layout

use image::{Rgb, RgbImage};

use crate::{CurateError, Result};

/// Decode a compressed image blob, sniffing its container format.
pub fn decode_compressed(bytes: &[u8]) -> Result<RgbImage> {
    let format = image::guess_format(bytes)
        .map_err(|e| CurateError::decode("compressed image", e.to_string()))?;
    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| CurateError::decode("compressed image", e.to_string()))?;
    Ok(img.to_rgb8())
}

/// 2x2 Bayer mosaic layout, named by the top-left block in reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BayerPattern {
    Rggb,
    Bggr,
    Gbrg,
    Grbg,
}

impl BayerPattern {
    /// Channel (0=R, 1=G, 2=B) at block offset `(dx, dy)`.
    fn channel_at(self, dx: usize, dy: usize) -> usize {
        let layout: [usize; 4] = match self {
            BayerPattern::Rggb => [0, 1, 1, 2],
            BayerPattern::Bggr => [2, 1, 1, 0],
            BayerPattern::Gbrg => [1, 2, 0, 1],
            BayerPattern::Grbg => [1, 0, 2, 1],
        };
        layout[dy * 2 + dx]
    }
}

/// Declared pixel encoding of a raw buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelEncoding {
    Rgb8,
    Rgba8,
    Bgr8,
    Bgra8,
    Mono8,
    Mono16,
    Rgb16,
    Bgr16,
    Bayer8(BayerPattern),
    Bayer16(BayerPattern),
}

impl PixelEncoding {
    /// Parse a ROS image encoding string.
    pub fn parse(encoding: &str) -> Option<Self> {
        let enc = encoding.trim().to_lowercase();
        let parsed = match enc.as_str() {
            "rgb8" => PixelEncoding::Rgb8,
            "rgba8" => PixelEncoding::Rgba8,
            "bgr8" | "8uc3" => PixelEncoding::Bgr8,
            "bgra8" | "8uc4" => PixelEncoding::Bgra8,
            "mono8" | "8uc1" => PixelEncoding::Mono8,
            "mono16" | "16uc1" => PixelEncoding::Mono16,
            "rgb16" => PixelEncoding::Rgb16,
            "bgr16" | "16uc3" => PixelEncoding::Bgr16,
            _ => {
                let rest = enc.strip_prefix("bayer_")?;
                let (pattern, depth) = rest.split_at(rest.len().min(4));
                let pattern = match pattern {
                    "rggb" => BayerPattern::Rggb,
                    "bggr" => BayerPattern::Bggr,
                    "gbrg" => BayerPattern::Gbrg,
                    "grbg" => BayerPattern::Grbg,
                    _ => return None,
                };
                match depth {
                    "8" => PixelEncoding::Bayer8(pattern),
                    "16" => PixelEncoding::Bayer16(pattern),
                    _ => return None,
                }
            }
        };
        Some(parsed)
    }

    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelEncoding::Mono8 | PixelEncoding::Bayer8(_) => 1,
            PixelEncoding::Mono16 | PixelEncoding::Bayer16(_) => 2,
            PixelEncoding::Rgb8 | PixelEncoding::Bgr8 => 3,
            PixelEncoding::Rgba8 | PixelEncoding::Bgra8 => 4,
            PixelEncoding::Rgb16 | PixelEncoding::Bgr16 => 6,
        }
    }

    fn is_sixteen_bit(self) -> bool {
        matches!(
            self,
            PixelEncoding::Mono16
                | PixelEncoding::Rgb16
                | PixelEncoding::Bgr16
                | PixelEncoding::Bayer16(_)
        )
    }
}

/// Convert a raw pixel buffer to RGB8.
///
/// `step` is the row stride in bytes; 0 means tightly packed. Sixteen-bit
/// samples are scaled to eight bits by dropping the low byte.
pub fn raw_to_rgb(
    data: &[u8],
    width: u32,
    height: u32,
    step: usize,
    encoding: &str,
    big_endian: bool,
) -> Result<RgbImage> {
    let enc = PixelEncoding::parse(encoding)
        .ok_or_else(|| CurateError::decode("raw image", format!("unsupported encoding '{encoding}'")))?;
    let (w, h) = (width as usize, height as usize);
    let bytes_per_row = w * enc.bytes_per_pixel();
    let stride = if step > 0 { step } else { bytes_per_row };
    if stride < bytes_per_row || data.len() < stride * h.saturating_sub(1) + bytes_per_row {
        return Err(CurateError::decode(
            "raw image",
            format!(
                "buffer of {} bytes too small for {w}x{h} {encoding} (step {stride})",
                data.len()
            ),
        ));
    }

    // Normalize to one 8-bit sample per channel, tightly packed.
    let channels = enc.bytes_per_pixel() / if enc.is_sixteen_bit() { 2 } else { 1 };
    let mut samples = Vec::with_capacity(w * h * channels);
    for row in 0..h {
        let line = &data[row * stride..row * stride + bytes_per_row];
        if enc.is_sixteen_bit() {
            for pair in line.chunks_exact(2) {
                let v = if big_endian {
                    u16::from_be_bytes([pair[0], pair[1]])
                } else {
                    u16::from_le_bytes([pair[0], pair[1]])
                };
                samples.push((v >> 8) as u8);
            }
        } else {
            samples.extend_from_slice(line);
        }
    }

    let img = match enc {
        PixelEncoding::Rgb8 | PixelEncoding::Rgb16 => interleaved(&samples, w, h, 3, [0, 1, 2]),
        PixelEncoding::Rgba8 => interleaved(&samples, w, h, 4, [0, 1, 2]),
        PixelEncoding::Bgr8 | PixelEncoding::Bgr16 => interleaved(&samples, w, h, 3, [2, 1, 0]),
        PixelEncoding::Bgra8 => interleaved(&samples, w, h, 4, [2, 1, 0]),
        PixelEncoding::Mono8 | PixelEncoding::Mono16 => interleaved(&samples, w, h, 1, [0, 0, 0]),
        PixelEncoding::Bayer8(p) | PixelEncoding::Bayer16(p) => demosaic(&samples, w, h, p),
    };
    Ok(img)
}

fn interleaved(samples: &[u8], w: usize, h: usize, channels: usize, order: [usize; 3]) -> RgbImage {
    RgbImage::from_fn(w as u32, h as u32, |x, y| {
        let base = (y as usize * w + x as usize) * channels;
        Rgb([
            samples[base + order[0]],
            samples[base + order[1]],
            samples[base + order[2]],
        ])
    })
}

/// Block demosaic: every pixel of a 2x2 cell gets the cell's R, mean G and B.
fn demosaic(samples: &[u8], w: usize, h: usize, pattern: BayerPattern) -> RgbImage {
    RgbImage::from_fn(w as u32, h as u32, |x, y| {
        let (x0, y0) = ((x as usize) & !1, (y as usize) & !1);
        let mut sum = [0u16; 3];
        let mut count = [0u16; 3];
        for dy in 0..2 {
            for dx in 0..2 {
                let (sx, sy) = (x0 + dx, y0 + dy);
                if sx >= w || sy >= h {
                    continue;
                }
                let ch = pattern.channel_at(dx, dy);
                sum[ch] += samples[sy * w + sx] as u16;
                count[ch] += 1;
            }
        }
        let avg = |c: usize| if count[c] == 0 { 0 } else { (sum[c] / count[c]) as u8 };
        Rgb([avg(0), avg(1), avg(2)])
    })
}

/// Convert a dense `u8` tensor to RGB8.
///
/// Accepts HW (grayscale), HWC and CHW with 1, 3 or 4 channels. A 3-D
/// tensor whose leading dimension is a channel count while its trailing
/// dimension is not is treated as CHW and transposed. Alpha is dropped.
pub fn tensor_to_rgb(shape: &[usize], data: &[u8]) -> Result<RgbImage> {
    let expected: usize = shape.iter().product();
    if data.len() != expected {
        return Err(CurateError::decode(
            "image tensor",
            format!("shape {shape:?} needs {expected} bytes, got {}", data.len()),
        ));
    }
    let is_channel_count = |n: usize| matches!(n, 1 | 3 | 4);
    match *shape {
        [h, w] => Ok(interleaved(data, w, h, 1, [0, 0, 0])),
        [c, h, w] if is_channel_count(c) && !is_channel_count(w) => {
            let plane = h * w;
            let (g, b) = if c == 1 { (0, 0) } else { (plane, 2 * plane) };
            Ok(RgbImage::from_fn(w as u32, h as u32, |x, y| {
                let i = y as usize * w + x as usize;
                Rgb([data[i], data[g + i], data[b + i]])
            }))
        }
        [h, w, c] if is_channel_count(c) => {
            let order = if c == 1 { [0, 0, 0] } else { [0, 1, 2] };
            Ok(interleaved(data, w, h, c, order))
        }
        _ => Err(CurateError::decode(
            "image tensor",
            format!("unsupported image shape {shape:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(img: &RgbImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageOutputFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let img = RgbImage::from_pixel(3, 2, Rgb([10, 20, 30]));
        let decoded = decode_compressed(&png_bytes(&img)).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_compressed(b"not an image").is_err());
    }

    #[test]
    fn test_parse_encodings() {
        assert_eq!(PixelEncoding::parse("RGB8"), Some(PixelEncoding::Rgb8));
        assert_eq!(PixelEncoding::parse("16UC1"), Some(PixelEncoding::Mono16));
        assert_eq!(
            PixelEncoding::parse("bayer_grbg16"),
            Some(PixelEncoding::Bayer16(BayerPattern::Grbg))
        );
        assert_eq!(PixelEncoding::parse("32FC1"), None);
        assert_eq!(PixelEncoding::parse("bayer_xxxx8"), None);
    }

    #[test]
    fn test_bgr8_swapped() {
        let img = raw_to_rgb(&[1, 2, 3, 4, 5, 6], 2, 1, 0, "bgr8", false).unwrap();
        assert_eq!(img.get_pixel(0, 0), &Rgb([3, 2, 1]));
        assert_eq!(img.get_pixel(1, 0), &Rgb([6, 5, 4]));
    }

    #[test]
    fn test_rgba8_drops_alpha() {
        let img = raw_to_rgb(&[1, 2, 3, 255], 1, 1, 0, "rgba8", false).unwrap();
        assert_eq!(img.get_pixel(0, 0), &Rgb([1, 2, 3]));
    }

    #[test]
    fn test_mono16_endianness() {
        let le = raw_to_rgb(&[0x00, 0xAB], 1, 1, 0, "mono16", false).unwrap();
        assert_eq!(le.get_pixel(0, 0), &Rgb([0xAB, 0xAB, 0xAB]));
        let be = raw_to_rgb(&[0xAB, 0x00], 1, 1, 0, "mono16", true).unwrap();
        assert_eq!(be.get_pixel(0, 0), &Rgb([0xAB, 0xAB, 0xAB]));
    }

    #[test]
    fn test_row_padding_is_skipped() {
        // 1x2 mono8 with a 4-byte stride.
        let img = raw_to_rgb(&[7, 0, 0, 0, 9, 0, 0, 0], 1, 2, 4, "mono8", false).unwrap();
        assert_eq!(img.get_pixel(0, 0), &Rgb([7, 7, 7]));
        assert_eq!(img.get_pixel(0, 1), &Rgb([9, 9, 9]));
    }

    #[test]
    fn test_short_buffer_fails() {
        assert!(raw_to_rgb(&[1, 2], 2, 2, 0, "rgb8", false).is_err());
    }

    #[test]
    fn test_bayer_rggb_block() {
        // R=200, G=100/50, B=10
        let img = raw_to_rgb(&[200, 100, 50, 10], 2, 2, 0, "bayer_rggb8", false).unwrap();
        for (_, _, px) in img.enumerate_pixels() {
            assert_eq!(px, &Rgb([200, 75, 10]));
        }
    }

    #[test]
    fn test_tensor_hwc() {
        let data = [1, 2, 3, 4, 5, 6];
        let img = tensor_to_rgb(&[1, 2, 3], &data).unwrap();
        assert_eq!(img.dimensions(), (2, 1));
        assert_eq!(img.get_pixel(1, 0), &Rgb([4, 5, 6]));
    }

    #[test]
    fn test_tensor_chw_transposed() {
        // 3 planes of 2x5
        let mut data = vec![0u8; 30];
        data[0] = 11; // R at (0,0)
        data[10] = 22; // G at (0,0)
        data[20] = 33; // B at (0,0)
        let img = tensor_to_rgb(&[3, 2, 5], &data).unwrap();
        assert_eq!(img.dimensions(), (5, 2));
        assert_eq!(img.get_pixel(0, 0), &Rgb([11, 22, 33]));
    }

    #[test]
    fn test_tensor_grayscale() {
        let img = tensor_to_rgb(&[2, 2], &[0, 1, 2, 3]).unwrap();
        assert_eq!(img.get_pixel(1, 1), &Rgb([3, 3, 3]));
    }

    #[test]
    fn test_tensor_shape_mismatch() {
        assert!(tensor_to_rgb(&[2, 2, 3], &[0; 5]).is_err());
        assert!(tensor_to_rgb(&[2, 2, 2, 3], &[0; 24]).is_err());
    }
}
