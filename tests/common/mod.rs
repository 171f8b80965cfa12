// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Fixture builders shared by the integration tests.
//!
//! Every fixture is generated into a temporary directory: still images,
//! LeRobot parquet shards, MCAP and ROS1 bag recordings, npy arrays and
//! Unitree manifests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use image::{Rgb, RgbImage};
use robocurate::io::formats::ros::WireFormat;
use robocurate::{DatasetAdapter, StateArray};

// ============================================================================
// Files and images
// ============================================================================

/// Write `bytes` to `path`, creating parent directories.
pub fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, bytes).unwrap();
}

/// Solid-color RGB image.
pub fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(color))
}

/// Save a solid-color image; the format follows the extension.
pub fn write_image(path: &Path, width: u32, height: u32, color: [u8; 3]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    solid(width, height, color).save(path).unwrap();
}

/// PNG bytes of a solid-color image.
pub fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    solid(width, height, color)
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Write an `.npy` file.
pub fn write_npy(path: &Path, array: &StateArray) {
    write_file(path, &robocurate::io::npy::to_npy_bytes(array).unwrap());
}

// ============================================================================
// Adapter checks
// ============================================================================

/// Read every frame backwards, then forwards, and return the timestamps in
/// index order.
///
/// Asserts that the sensor list is unchanged by the reads and that the
/// timestamps never decrease.
pub fn sweep_frames(reader: &mut dyn DatasetAdapter) -> Vec<f64> {
    let sensors = reader.sensors().to_vec();
    let len = reader.len();
    for i in (0..len).rev() {
        reader.frame(i).unwrap();
    }
    let stamps: Vec<f64> = (0..len).map(|i| reader.frame(i).unwrap().timestamp).collect();
    assert_eq!(reader.sensors(), sensors.as_slice());
    for pair in stamps.windows(2) {
        assert!(pair[0] <= pair[1], "timestamps decrease: {stamps:?}");
    }
    stamps
}

/// Open file descriptors and memory mappings of this process that point at
/// `path` or anything below it.
///
/// Tests run in parallel threads, so callers pass their own temp directory
/// and never compare process-wide totals.
pub fn handles_under(path: &Path) -> usize {
    let root = fs::canonicalize(path).unwrap();
    let fds = fs::read_dir("/proc/self/fd")
        .unwrap()
        .filter_map(|e| e.ok())
        .filter_map(|e| fs::read_link(e.path()).ok())
        .filter(|target| target.starts_with(&root))
        .count();
    let maps = fs::read_to_string("/proc/self/maps")
        .unwrap()
        .lines()
        .filter_map(|line| line.split_whitespace().nth(5))
        .filter(|mapped| Path::new(mapped).starts_with(&root))
        .count();
    fds + maps
}

// ============================================================================
// Raw image folders and Unitree manifests
// ============================================================================

/// Raw folder with `<index>_<sensor>.png` files.
pub fn make_raw_folder(dir: &Path, indices: &[u64], sensors: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    for &i in indices {
        for (s, sensor) in sensors.iter().enumerate() {
            write_image(
                &dir.join(format!("{i:06}_{sensor}.png")),
                4,
                3,
                [i as u8, s as u8 * 40, 200],
            );
        }
    }
}

/// Unitree episode with `frames` records, one color camera, two arm
/// states and an optional tactile array per record.
pub fn make_unitree_episode(dir: &Path, frames: usize, fps: f64, tactile: bool) {
    let mut records = Vec::with_capacity(frames);
    for i in 0..frames {
        let color = format!("colors/{i:06}_color_0.jpg");
        write_image(&dir.join(&color), 8, 6, [255, 0, 0]);
        let mut record = serde_json::json!({
            "idx": i,
            "colors": { "color_0": color },
            "states": {
                "right_arm": { "qpos": [i as f64 + 0.5] },
                "left_arm": { "qpos": [i as f64, 1.0] },
            },
        });
        if tactile {
            let rel = format!("tactiles/{i:06}_left_hand.npy");
            let array = StateArray::from_shape_vec(vec![2, 2], vec![i as f64; 4]).unwrap();
            write_npy(&dir.join(&rel), &array);
            record["tactiles"] = serde_json::json!({ "left_hand": rel });
        }
        records.push(record);
    }
    let doc = serde_json::json!({
        "info": { "image": { "fps": fps } },
        "data": records,
    });
    write_file(&dir.join("data.json"), doc.to_string().as_bytes());
}

// ============================================================================
// LeRobot
// ============================================================================

/// One LeRobot row.
#[derive(Debug, Clone)]
pub struct LeRobotRow {
    pub episode: i64,
    pub frame: i64,
    pub timestamp: f64,
    pub state: Vec<f64>,
}

impl LeRobotRow {
    pub fn new(episode: i64, frame: i64, timestamp: f64, state: Vec<f64>) -> Self {
        Self {
            episode,
            frame,
            timestamp,
            state,
        }
    }
}

const LEROBOT_SCHEMA: &str = "
message schema {
  REQUIRED INT64 episode_index;
  REQUIRED INT64 frame_index;
  REQUIRED DOUBLE timestamp;
  REQUIRED group observation.state (LIST) {
    REPEATED group list {
      REQUIRED DOUBLE element;
    }
  }
}
";

/// Write one parquet shard, one row group per `row_groups` entry.
pub fn write_lerobot_shard(path: &Path, row_groups: &[&[LeRobotRow]]) {
    use parquet::data_type::{DoubleType, Int64Type};
    use parquet::file::properties::WriterProperties;
    use parquet::file::writer::SerializedFileWriter;
    use parquet::schema::parser::parse_message_type;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let schema = Arc::new(parse_message_type(LEROBOT_SCHEMA).unwrap());
    let props = Arc::new(WriterProperties::builder().build());
    let file = fs::File::create(path).unwrap();
    let mut writer = SerializedFileWriter::new(file, schema, props).unwrap();

    for rows in row_groups {
        let episodes: Vec<i64> = rows.iter().map(|r| r.episode).collect();
        let frames: Vec<i64> = rows.iter().map(|r| r.frame).collect();
        let timestamps: Vec<f64> = rows.iter().map(|r| r.timestamp).collect();
        let mut state = Vec::new();
        let mut def_levels = Vec::new();
        let mut rep_levels = Vec::new();
        for row in rows.iter() {
            for (i, v) in row.state.iter().enumerate() {
                state.push(*v);
                def_levels.push(1i16);
                rep_levels.push(if i == 0 { 0i16 } else { 1 });
            }
        }

        let mut group = writer.next_row_group().unwrap();
        let mut column = 0;
        while let Some(mut col) = group.next_column().unwrap() {
            match column {
                0 => {
                    col.typed::<Int64Type>()
                        .write_batch(&episodes, None, None)
                        .unwrap();
                }
                1 => {
                    col.typed::<Int64Type>()
                        .write_batch(&frames, None, None)
                        .unwrap();
                }
                2 => {
                    col.typed::<DoubleType>()
                        .write_batch(&timestamps, None, None)
                        .unwrap();
                }
                _ => {
                    col.typed::<DoubleType>()
                        .write_batch(&state, Some(&def_levels), Some(&rep_levels))
                        .unwrap();
                }
            }
            col.close().unwrap();
            column += 1;
        }
        group.close().unwrap();
    }
    writer.close().unwrap();
}

/// `meta/info.json` declaring still-image features.
pub fn write_lerobot_info(root: &Path, fps: f64, image_keys: &[&str]) {
    let features: serde_json::Map<String, serde_json::Value> = image_keys
        .iter()
        .map(|k| (k.to_string(), serde_json::json!({ "dtype": "image" })))
        .chain([(
            "observation.state".to_string(),
            serde_json::json!({ "dtype": "float32", "shape": [2] }),
        )])
        .collect();
    let info = serde_json::json!({
        "fps": fps,
        "chunks_size": 1000,
        "data_path": "data/chunk-{episode_chunk:03d}/episode_{episode_index:06d}.parquet",
        "image_path": "images/{image_key}/episode_{episode_index:06d}/frame_{frame_index:06d}.png",
        "features": features,
    });
    write_file(&root.join("meta/info.json"), info.to_string().as_bytes());
}

/// Still image for a LeRobot feature at `(episode, frame)`.
pub fn write_lerobot_image(root: &Path, key: &str, episode: i64, frame: i64, color: [u8; 3]) {
    let path = root.join(format!(
        "images/{key}/episode_{episode:06}/frame_{frame:06}.png"
    ));
    write_image(&path, 6, 4, color);
}

// ============================================================================
// ROS messages
// ============================================================================

/// Serializer for `sensor_msgs` payloads in either wire layout.
pub struct MessageWriter {
    buf: Vec<u8>,
    format: WireFormat,
}

impl MessageWriter {
    pub fn new(format: WireFormat) -> Self {
        let buf = match format {
            WireFormat::Cdr => vec![0x00, 0x01, 0x00, 0x00],
            WireFormat::Ros1 => Vec::new(),
        };
        Self { buf, format }
    }

    fn align(&mut self, size: usize) {
        if self.format == WireFormat::Cdr {
            while (self.buf.len() - 4) % size != 0 {
                self.buf.push(0);
            }
        }
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.align(4);
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f64(&mut self, v: f64) -> &mut Self {
        self.align(8);
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn string(&mut self, s: &str) -> &mut Self {
        match self.format {
            WireFormat::Cdr => {
                self.u32(s.len() as u32 + 1);
                self.buf.extend_from_slice(s.as_bytes());
                self.buf.push(0);
            }
            WireFormat::Ros1 => {
                self.u32(s.len() as u32);
                self.buf.extend_from_slice(s.as_bytes());
            }
        }
        self
    }

    pub fn bytes(&mut self, b: &[u8]) -> &mut Self {
        self.u32(b.len() as u32);
        self.buf.extend_from_slice(b);
        self
    }

    pub fn header(&mut self) -> &mut Self {
        if self.format == WireFormat::Ros1 {
            self.u32(0);
        }
        self.u32(1).u32(0).string("frame")
    }

    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

/// `sensor_msgs/Image` with `rgb8` pixels of one color.
pub fn rgb_image_msg(format: WireFormat, width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let pixels: Vec<u8> = (0..width * height).flat_map(|_| color).collect();
    MessageWriter::new(format)
        .header()
        .u32(height)
        .u32(width)
        .string("rgb8")
        .u8(0)
        .u32(width * 3)
        .bytes(&pixels)
        .finish()
}

/// `sensor_msgs/CompressedImage` holding a PNG.
pub fn png_image_msg(format: WireFormat, width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    MessageWriter::new(format)
        .header()
        .string("png")
        .bytes(&png_bytes(width, height, color))
        .finish()
}

/// `sensor_msgs/JointState` with positions only.
pub fn joint_state_msg(format: WireFormat, position: &[f64]) -> Vec<u8> {
    let mut w = MessageWriter::new(format);
    w.header().u32(position.len() as u32);
    for i in 0..position.len() {
        w.string(&format!("joint_{i}"));
    }
    w.u32(position.len() as u32);
    for p in position {
        w.f64(*p);
    }
    w.u32(0).u32(0);
    w.finish()
}

/// One recorded message.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub topic: &'static str,
    pub message_type: &'static str,
    pub time_ns: u64,
    pub data: Vec<u8>,
}

impl Recorded {
    pub fn new(topic: &'static str, message_type: &'static str, time_ns: u64, data: Vec<u8>) -> Self {
        Self {
            topic,
            message_type,
            time_ns,
            data,
        }
    }
}

// ============================================================================
// MCAP
// ============================================================================

/// Write an MCAP recording with CDR channels.
///
/// `chunk_size` bounds the uncompressed chunk size; `None` keeps the
/// writer's default.
pub fn write_mcap(path: &Path, messages: &[Recorded], chunk_size: Option<u64>) {
    let mut buffer = Vec::new();
    {
        let mut writer = mcap::WriteOptions::new()
            .chunk_size(chunk_size)
            .create(std::io::Cursor::new(&mut buffer))
            .unwrap();

        let mut channels: BTreeMap<&str, u16> = BTreeMap::new();
        for (sequence, msg) in messages.iter().enumerate() {
            let channel_id = match channels.get(msg.topic) {
                Some(id) => *id,
                None => {
                    let schema_id = writer
                        .add_schema(msg.message_type, "ros2msg", b"# fixture")
                        .unwrap();
                    let id = writer
                        .add_channel(schema_id, msg.topic, "cdr", &BTreeMap::new())
                        .unwrap();
                    channels.insert(msg.topic, id);
                    id
                }
            };
            let header = mcap::records::MessageHeader {
                channel_id,
                sequence: sequence as u32,
                log_time: msg.time_ns,
                publish_time: msg.time_ns,
            };
            writer.write_to_known_channel(&header, &msg.data).unwrap();
        }
        writer.finish().unwrap();
    }
    write_file(path, &buffer);
}

// ============================================================================
// ROS1 bag (format 2.0, uncompressed chunks)
// ============================================================================

const OP_MSG_DATA: u8 = 0x02;
const OP_BAG_HEADER: u8 = 0x03;
const OP_INDEX_DATA: u8 = 0x04;
const OP_CHUNK: u8 = 0x05;
const OP_CHUNK_INFO: u8 = 0x06;
const OP_CONNECTION: u8 = 0x07;
const BAG_HEADER_LEN: usize = 4096;

fn bag_field(name: &str, value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + name.len() + 1 + value.len());
    out.extend_from_slice(&((name.len() + 1 + value.len()) as u32).to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out.push(b'=');
    out.extend_from_slice(value);
    out
}

fn bag_record(fields: &[Vec<u8>], data: &[u8]) -> Vec<u8> {
    let header: Vec<u8> = fields.concat();
    let mut out = Vec::with_capacity(8 + header.len() + data.len());
    out.extend_from_slice(&(header.len() as u32).to_le_bytes());
    out.extend_from_slice(&header);
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    out
}

fn bag_time(ns: u64) -> [u8; 8] {
    let mut out = [0u8; 8];
    out[..4].copy_from_slice(&((ns / 1_000_000_000) as u32).to_le_bytes());
    out[4..].copy_from_slice(&((ns % 1_000_000_000) as u32).to_le_bytes());
    out
}

fn bag_connection(id: u32, topic: &str, message_type: &str) -> Vec<u8> {
    let data = [
        bag_field("topic", topic.as_bytes()),
        bag_field("type", message_type.as_bytes()),
        bag_field("md5sum", b"00000000000000000000000000000000"),
        bag_field("message_definition", b""),
    ]
    .concat();
    bag_record(
        &[
            bag_field("op", &[OP_CONNECTION]),
            bag_field("conn", &id.to_le_bytes()),
            bag_field("topic", topic.as_bytes()),
        ],
        &data,
    )
}

fn bag_header(index_pos: u64, conn_count: u32, chunk_count: u32) -> Vec<u8> {
    let fields = [
        bag_field("op", &[OP_BAG_HEADER]),
        bag_field("index_pos", &index_pos.to_le_bytes()),
        bag_field("conn_count", &conn_count.to_le_bytes()),
        bag_field("chunk_count", &chunk_count.to_le_bytes()),
    ];
    let header_len: usize = fields.iter().map(Vec::len).sum();
    let padding = vec![b' '; BAG_HEADER_LEN - 8 - header_len];
    bag_record(&fields, &padding)
}

/// Write a ROS1 bag, `per_chunk` messages per chunk.
pub fn write_bag(path: &Path, messages: &[Recorded], per_chunk: usize) {
    // topic -> (conn id, type)
    let mut connections: BTreeMap<&str, (u32, &str)> = BTreeMap::new();
    for msg in messages {
        let next = connections.len() as u32;
        connections
            .entry(msg.topic)
            .or_insert((next, msg.message_type));
    }

    let mut body = Vec::new();
    let mut chunk_infos = Vec::new();
    let body_start = (b"#ROSBAG V2.0\n".len() + BAG_HEADER_LEN) as u64;

    for group in messages.chunks(per_chunk.max(1)) {
        let chunk_pos = body_start + body.len() as u64;
        let mut inner = Vec::new();
        // conn id -> (time, offset) entries
        let mut index: BTreeMap<u32, Vec<(u64, u32)>> = BTreeMap::new();
        for msg in group {
            let (conn, message_type) = connections[msg.topic];
            if !index.contains_key(&conn) {
                inner.extend(bag_connection(conn, msg.topic, message_type));
            }
            index
                .entry(conn)
                .or_default()
                .push((msg.time_ns, inner.len() as u32));
            inner.extend(bag_record(
                &[
                    bag_field("op", &[OP_MSG_DATA]),
                    bag_field("conn", &conn.to_le_bytes()),
                    bag_field("time", &bag_time(msg.time_ns)),
                ],
                &msg.data,
            ));
        }

        body.extend(bag_record(
            &[
                bag_field("op", &[OP_CHUNK]),
                bag_field("compression", b"none"),
                bag_field("size", &(inner.len() as u32).to_le_bytes()),
            ],
            &inner,
        ));
        for (conn, entries) in &index {
            let data: Vec<u8> = entries
                .iter()
                .flat_map(|(t, offset)| {
                    let mut e = bag_time(*t).to_vec();
                    e.extend_from_slice(&offset.to_le_bytes());
                    e
                })
                .collect();
            body.extend(bag_record(
                &[
                    bag_field("op", &[OP_INDEX_DATA]),
                    bag_field("ver", &1u32.to_le_bytes()),
                    bag_field("conn", &conn.to_le_bytes()),
                    bag_field("count", &(entries.len() as u32).to_le_bytes()),
                ],
                &data,
            ));
        }

        let start = group.iter().map(|m| m.time_ns).min().unwrap_or(0);
        let end = group.iter().map(|m| m.time_ns).max().unwrap_or(0);
        chunk_infos.push((chunk_pos, start, end, index));
    }

    let index_pos = body_start + body.len() as u64;
    for (topic, (conn, message_type)) in &connections {
        body.extend(bag_connection(*conn, topic, message_type));
    }
    for (chunk_pos, start, end, index) in &chunk_infos {
        let data: Vec<u8> = index
            .iter()
            .flat_map(|(conn, entries)| {
                let mut e = conn.to_le_bytes().to_vec();
                e.extend_from_slice(&(entries.len() as u32).to_le_bytes());
                e
            })
            .collect();
        body.extend(bag_record(
            &[
                bag_field("op", &[OP_CHUNK_INFO]),
                bag_field("ver", &1u32.to_le_bytes()),
                bag_field("chunk_pos", &chunk_pos.to_le_bytes()),
                bag_field("start_time", &bag_time(*start)),
                bag_field("end_time", &bag_time(*end)),
                bag_field("count", &(index.len() as u32).to_le_bytes()),
            ],
            &data,
        ));
    }

    let mut file = b"#ROSBAG V2.0\n".to_vec();
    file.extend(bag_header(
        index_pos,
        connections.len() as u32,
        chunk_infos.len() as u32,
    ));
    file.extend(body);
    write_file(path, &file);
}
