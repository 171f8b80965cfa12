// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Time-indexed message recordings (ROS1 bag and MCAP).
//!
//! `load` walks the recording once and records, per topic, the time and
//! chunk position of every message of a known type. Payloads are not
//! decoded. The frame index is the de-duplicated timeline of one primary
//! image topic; `frame(i)` joins every other stream to that timeline with a
//! nearest-neighbour search inside a symmetric window and re-reads only the
//! chunks holding the selected messages.

pub mod bag_file;
pub mod cursor;
pub mod mcap_file;
pub mod messages;

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::frame::state_vec;
use crate::io::detection::extension_lower;
use crate::io::traits::{check_index, DatasetAdapter};
use crate::{AdapterConfig, CurateError, DatasetType, Frame, Result};

pub use bag_file::BagStore;
pub use cursor::{MessageCursor, WireFormat};
pub use mcap_file::McapStore;
pub use messages::MessageKind;

const ADAPTER: &str = "TimeIndexedMessagesAdapter";

/// Location of one message inside a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    /// Nanoseconds (MCAP publish time, bag record time)
    pub time: u64,
    /// Chunk ordinal in file order
    pub chunk: usize,
    /// Message ordinal inside the chunk, all topics counted
    pub position: usize,
}

/// Time-sorted messages of one topic.
#[derive(Debug, Clone)]
pub struct StreamIndex {
    pub topic: String,
    /// Topic without the leading `/`
    pub sensor: String,
    pub kind: MessageKind,
    pub format: WireFormat,
    pub entries: Vec<MessageRef>,
}

impl StreamIndex {
    fn new(topic: &str, kind: MessageKind, format: WireFormat) -> Self {
        Self {
            topic: topic.to_string(),
            sensor: topic.trim_start_matches('/').to_string(),
            kind,
            format,
            entries: Vec::new(),
        }
    }

    /// Message closest to `target`, if within `window` nanoseconds.
    ///
    /// Ties resolve to the earlier message.
    pub fn closest(&self, target: u64, window: u64) -> Option<&MessageRef> {
        let idx = self.entries.partition_point(|e| e.time < target);
        let before = idx.checked_sub(1).and_then(|i| self.entries.get(i));
        let after = self.entries.get(idx);
        let best = match (before, after) {
            (Some(b), Some(a)) => {
                if target - b.time <= a.time - target {
                    b
                } else {
                    a
                }
            }
            (Some(b), None) => b,
            (None, Some(a)) => a,
            (None, None) => return None,
        };
        (best.time.abs_diff(target) <= window).then_some(best)
    }
}

/// Collects stream indexes while a recording is walked.
#[derive(Debug, Default)]
pub(crate) struct StreamTable {
    /// `None` marks a topic whose type or encoding has no decoder
    streams: BTreeMap<String, Option<StreamIndex>>,
}

impl StreamTable {
    /// Record one message.
    pub(crate) fn record(
        &mut self,
        topic: &str,
        type_name: &str,
        format: Option<WireFormat>,
        entry: MessageRef,
    ) {
        if let Some(slot) = self.streams.get_mut(topic) {
            if let Some(stream) = slot {
                stream.entries.push(entry);
            }
            return;
        }
        let stream = match (MessageKind::from_type_name(type_name), format) {
            (Some(kind), Some(format)) => {
                let mut stream = StreamIndex::new(topic, kind, format);
                stream.entries.push(entry);
                Some(stream)
            }
            _ => {
                debug!(
                    context = ADAPTER,
                    topic = topic,
                    message_type = type_name,
                    "Skipping topic without a decoder"
                );
                None
            }
        };
        self.streams.insert(topic.to_string(), stream);
    }

    /// Streams in topic order, entries sorted by time.
    pub(crate) fn finish(self) -> Vec<StreamIndex> {
        self.streams
            .into_values()
            .flatten()
            .map(|mut s| {
                s.entries.sort_by_key(|e| (e.time, e.chunk, e.position));
                s
            })
            .collect()
    }
}

/// Backend of a recording that can be indexed and replayed chunk by chunk.
pub trait MessageStore: Send {
    /// Walk the recording and index every decodable topic.
    fn index(&self) -> Result<Vec<StreamIndex>>;

    /// Payloads of the messages at `positions` inside chunk `chunk`.
    fn read_chunk(&self, chunk: usize, positions: &BTreeSet<usize>)
        -> Result<HashMap<usize, Vec<u8>>>;
}

/// Open the store matching a recording's extension.
fn open_store(path: &Path) -> Result<Box<dyn MessageStore>> {
    match extension_lower(path).as_deref() {
        Some("mcap") => Ok(Box::new(McapStore::open(path)?)),
        Some("bag") => Ok(Box::new(BagStore::open(path)?)),
        _ => Err(CurateError::unrecognized(path)),
    }
}

/// Adapter over a ROS1 bag or MCAP recording.
pub struct TimeIndexedMessagesAdapter {
    sync_window_ns: u64,
    primary_topic: Option<String>,
    path: Option<PathBuf>,
    store: Option<Box<dyn MessageStore>>,
    streams: Vec<StreamIndex>,
    primary: usize,
    timeline: Vec<u64>,
    sensors: Vec<String>,
}

impl TimeIndexedMessagesAdapter {
    /// Create an adapter.
    pub fn new(config: &AdapterConfig) -> Self {
        Self {
            sync_window_ns: config.sync_window_ns(),
            primary_topic: config.primary_topic.clone(),
            path: None,
            store: None,
            streams: Vec::new(),
            primary: 0,
            timeline: Vec::new(),
            sensors: Vec::new(),
        }
    }

    /// Indexed streams, in topic order.
    pub fn streams(&self) -> &[StreamIndex] {
        &self.streams
    }

    /// Topic whose timestamps define the frame index.
    pub fn primary_topic(&self) -> Option<&str> {
        self.streams.get(self.primary).map(|s| s.topic.as_str())
    }

    /// Frame timestamps in nanoseconds.
    pub fn timeline(&self) -> &[u64] {
        &self.timeline
    }

    fn build_index(&mut self, path: &Path) -> Result<()> {
        let store = open_store(path)?;
        self.load_store(path, store)
    }

    /// Index an already opened store.
    pub(crate) fn load_store(&mut self, path: &Path, store: Box<dyn MessageStore>) -> Result<()> {
        let streams = store.index()?;
        let primary = select_primary(&streams, self.primary_topic.as_deref()).ok_or_else(|| {
            let what = match &self.primary_topic {
                Some(topic) => format!("image topic '{topic}'"),
                None => "sensor_msgs/Image or sensor_msgs/CompressedImage topic".to_string(),
            };
            CurateError::missing_metadata(path, what)
        })?;

        let mut timeline: Vec<u64> = streams[primary].entries.iter().map(|e| e.time).collect();
        timeline.dedup();

        self.sensors = streams.iter().map(|s| s.sensor.clone()).collect();
        self.streams = streams;
        self.primary = primary;
        self.timeline = timeline;
        self.store = Some(store);
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn decode_into(frame: &mut Frame, stream: &StreamIndex, data: &[u8]) -> Result<()> {
        match stream.kind {
            MessageKind::JointState => {
                let positions = messages::parse_joint_positions(data, stream.format)?;
                frame.state.insert(stream.sensor.clone(), state_vec(positions));
            }
            kind => {
                let image = messages::decode_image(kind, data, stream.format)?;
                frame.images.insert(stream.sensor.clone(), image);
            }
        }
        Ok(())
    }
}

/// Pick the stream that defines the timeline.
fn select_primary(streams: &[StreamIndex], configured: Option<&str>) -> Option<usize> {
    streams.iter().position(|s| match configured {
        Some(topic) => s.kind.is_image() && (s.topic == topic || s.sensor == topic),
        None => s.kind.is_image(),
    })
}

impl DatasetAdapter for TimeIndexedMessagesAdapter {
    fn load(&mut self, path: &Path) -> bool {
        self.close();
        match self.build_index(path) {
            Ok(()) => {
                info!(
                    context = ADAPTER,
                    path = %path.display(),
                    frames = self.timeline.len(),
                    streams = self.streams.len(),
                    primary = self.primary_topic().unwrap_or_default(),
                    "Indexed recording"
                );
                true
            }
            Err(e) => {
                warn!(
                    context = ADAPTER,
                    path = %path.display(),
                    error = %e,
                    "Failed to load recording"
                );
                self.close();
                false
            }
        }
    }

    fn len(&self) -> usize {
        self.timeline.len()
    }

    fn sensors(&self) -> &[String] {
        &self.sensors
    }

    fn frame(&mut self, index: usize) -> Result<Frame> {
        check_index(self.store.is_some(), ADAPTER, index, self.len())?;
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| CurateError::not_loaded(ADAPTER))?;
        let target = self.timeline[index];

        let picks: Vec<(usize, MessageRef)> = self
            .streams
            .iter()
            .enumerate()
            .filter_map(|(s, stream)| Some((s, *stream.closest(target, self.sync_window_ns)?)))
            .collect();

        let mut wanted: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
        for (_, r) in &picks {
            wanted.entry(r.chunk).or_default().insert(r.position);
        }

        let mut payloads: HashMap<(usize, usize), Vec<u8>> = HashMap::new();
        for (chunk, positions) in &wanted {
            match store.read_chunk(*chunk, positions) {
                Ok(found) => {
                    payloads.extend(found.into_iter().map(|(pos, data)| ((*chunk, pos), data)))
                }
                Err(e) => warn!(
                    context = ADAPTER,
                    chunk = chunk,
                    error = %e,
                    "Failed to read chunk"
                ),
            }
        }

        let mut frame = Frame::new(target as f64 / 1e9);
        for (s, r) in picks {
            let stream = &self.streams[s];
            let Some(data) = payloads.get(&(r.chunk, r.position)) else {
                continue;
            };
            if let Err(e) = Self::decode_into(&mut frame, stream, data) {
                warn!(
                    context = ADAPTER,
                    topic = %stream.topic,
                    frame = index,
                    error = %e,
                    "Dropping undecodable message"
                );
            }
        }
        Ok(frame)
    }

    fn close(&mut self) {
        self.store = None;
        self.path = None;
        self.streams.clear();
        self.primary = 0;
        self.timeline.clear();
        self.sensors.clear();
    }

    fn dataset_type(&self) -> DatasetType {
        DatasetType::TimeIndexedMessages
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::messages::encode;
    use super::*;
    use image::Rgb;
    use std::sync::{Arc, Mutex};

    const MS: u64 = 1_000_000;

    /// One chunk per message, payloads held in memory.
    struct MemoryStore {
        messages: Vec<Message>,
        reads: Arc<Mutex<Vec<usize>>>,
    }

    impl MessageStore for MemoryStore {
        fn index(&self) -> Result<Vec<StreamIndex>> {
            let mut table = StreamTable::default();
            for (chunk, (topic, tp, time, _)) in self.messages.iter().enumerate() {
                let entry = MessageRef {
                    time: *time,
                    chunk,
                    position: 0,
                };
                table.record(topic, tp, Some(WireFormat::Cdr), entry);
            }
            Ok(table.finish())
        }

        fn read_chunk(
            &self,
            chunk: usize,
            positions: &BTreeSet<usize>,
        ) -> Result<HashMap<usize, Vec<u8>>> {
            self.reads.lock().unwrap().push(chunk);
            let data = &self.messages[chunk].3;
            Ok(positions.iter().map(|p| (*p, data.clone())).collect())
        }
    }

    fn mono(v: u8) -> Vec<u8> {
        encode::image(WireFormat::Cdr, 1, 1, "mono8", &[v])
    }

    type Message = (&'static str, &'static str, u64, Vec<u8>);

    fn adapter(messages: Vec<Message>) -> (TimeIndexedMessagesAdapter, Arc<Mutex<Vec<usize>>>) {
        let reads = Arc::new(Mutex::new(Vec::new()));
        let store = MemoryStore {
            messages,
            reads: Arc::clone(&reads),
        };
        let mut adapter = TimeIndexedMessagesAdapter::new(&AdapterConfig::default());
        adapter.load_store(Path::new("memory"), Box::new(store)).unwrap();
        (adapter, reads)
    }

    #[test]
    fn test_closest_within_window() {
        let mut stream = StreamIndex::new("/cam", MessageKind::Image, WireFormat::Cdr);
        for (i, t) in [100, 200, 300].iter().enumerate() {
            stream.entries.push(MessageRef {
                time: *t,
                chunk: 0,
                position: i,
            });
        }
        assert_eq!(stream.closest(240, 50).map(|e| e.time), Some(200));
        assert_eq!(stream.closest(260, 50).map(|e| e.time), Some(300));
        assert_eq!(stream.closest(250, 50).map(|e| e.time), Some(200));
        assert_eq!(stream.closest(10, 50), None);
        assert_eq!(stream.closest(360, 60).map(|e| e.time), Some(300));
        assert_eq!(stream.sensor, "cam");
    }

    #[test]
    fn test_join_and_window() {
        let (mut adapter, reads) = adapter(vec![
            ("/cam_a", "sensor_msgs/msg/Image", 0, mono(10)),
            ("/cam_b", "sensor_msgs/msg/Image", 20 * MS, mono(20)),
            ("/cam_a", "sensor_msgs/msg/Image", 100 * MS, mono(30)),
            ("/cam_b", "sensor_msgs/msg/Image", 300 * MS, mono(40)),
            (
                "/joints",
                "sensor_msgs/msg/JointState",
                95 * MS,
                encode::joint_state(WireFormat::Cdr, &["j"], &[1.5]),
            ),
            ("/chatter", "std_msgs/msg/String", 0, vec![0, 1, 0, 0]),
        ]);

        assert_eq!(adapter.primary_topic(), Some("/cam_a"));
        assert_eq!(adapter.len(), 2);
        assert_eq!(adapter.sensors(), &["cam_a", "cam_b", "joints"]);

        let f0 = adapter.frame(0).unwrap();
        assert_eq!(f0.timestamp, 0.0);
        assert_eq!(f0.image("cam_b").unwrap().get_pixel(0, 0), &Rgb([20, 20, 20]));
        assert!(f0.state("joints").is_none());

        reads.lock().unwrap().clear();
        let f1 = adapter.frame(1).unwrap();
        assert!((f1.timestamp - 0.1).abs() < 1e-12);
        assert_eq!(f1.image("cam_a").unwrap().get_pixel(0, 0), &Rgb([30, 30, 30]));
        // cam_b is 200 ms away
        assert!(f1.image("cam_b").is_none());
        assert_eq!(f1.state("joints").unwrap().as_slice().unwrap(), &[1.5]);
        let mut read = reads.lock().unwrap().clone();
        read.sort();
        assert_eq!(read, vec![2, 4]);
    }

    #[test]
    fn test_undecodable_message_is_omitted() {
        let (mut adapter, _) = adapter(vec![
            ("/cam", "sensor_msgs/msg/Image", 0, mono(1)),
            ("/depth", "sensor_msgs/msg/Image", 0, vec![0, 1, 0, 0, 9]),
        ]);
        let frame = adapter.frame(0).unwrap();
        assert!(frame.image("cam").is_some());
        assert!(frame.image("depth").is_none());
    }

    #[test]
    fn test_configured_primary_topic() {
        let config = AdapterConfig {
            primary_topic: Some("wrist".to_string()),
            ..AdapterConfig::default()
        };
        let store = MemoryStore {
            messages: vec![
                ("/top", "sensor_msgs/Image", 0, mono(1)),
                ("/top", "sensor_msgs/Image", 10 * MS, mono(1)),
                ("/wrist", "sensor_msgs/Image", 5 * MS, mono(2)),
            ],
            reads: Arc::default(),
        };
        let mut adapter = TimeIndexedMessagesAdapter::new(&config);
        adapter.load_store(Path::new("memory"), Box::new(store)).unwrap();
        assert_eq!(adapter.primary_topic(), Some("/wrist"));
        assert_eq!(adapter.timeline(), &[5 * MS]);
    }

    #[test]
    fn test_no_image_topic_fails() {
        let store = MemoryStore {
            messages: vec![(
                "/joints",
                "sensor_msgs/JointState",
                0,
                encode::joint_state(WireFormat::Cdr, &[], &[]),
            )],
            reads: Arc::default(),
        };
        let mut adapter = TimeIndexedMessagesAdapter::new(&AdapterConfig::default());
        assert!(adapter.load_store(Path::new("memory"), Box::new(store)).is_err());
    }

    #[test]
    fn test_duplicate_timestamps_collapse() {
        let (adapter, _) = adapter(vec![
            ("/cam", "sensor_msgs/Image", 7, mono(1)),
            ("/cam", "sensor_msgs/Image", 7, mono(2)),
            ("/cam", "sensor_msgs/Image", 9, mono(3)),
        ]);
        assert_eq!(adapter.timeline(), &[7, 9]);
    }

    #[test]
    fn test_unloaded_and_unknown_extension() {
        let mut adapter = TimeIndexedMessagesAdapter::new(&AdapterConfig::default());
        assert!(matches!(adapter.frame(0), Err(CurateError::NotLoaded { .. })));
        assert!(!adapter.load(Path::new("/nonexistent/file.bag")));
        assert!(!adapter.load(Path::new("/nonexistent/file.txt")));
        assert_eq!(adapter.len(), 0);
    }
}
