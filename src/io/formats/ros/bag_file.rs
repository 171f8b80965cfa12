// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! ROS1 bag recordings (format 2.0).

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use super::{MessageRef, MessageStore, StreamIndex, StreamTable, WireFormat};
use crate::{CurateError, Result};

fn bag_error(what: &str, e: impl std::fmt::Display) -> CurateError {
    CurateError::decode("bag", format!("{what}: {e}"))
}

/// Topic and message type of a bag connection.
#[derive(Debug, Clone)]
struct ConnectionInfo {
    topic: String,
    message_type: String,
}

/// Open ROS1 bag.
///
/// Chunk ordinals used by [`MessageRef`] follow file order, so the
/// ordinal-th entry of `chunk_positions` is the chunk record to seek to.
pub struct BagStore {
    bag: rosbag::RosBag,
    chunk_positions: Vec<u64>,
}

impl BagStore {
    /// Open a bag file and read the chunk positions from its index section.
    pub fn open(path: &Path) -> Result<Self> {
        let bag = rosbag::RosBag::new(path).map_err(|e| bag_error("failed to open bag", e))?;
        let mut chunk_positions = Vec::new();
        for record in bag.index_records() {
            let record = record.map_err(|e| bag_error("failed to read index", e))?;
            if let rosbag::IndexRecord::ChunkInfo(info) = record {
                chunk_positions.push(info.chunk_pos);
            }
        }
        chunk_positions.sort_unstable();
        chunk_positions.dedup();
        Ok(Self {
            bag,
            chunk_positions,
        })
    }

    /// File offsets of the chunk records, in file order.
    pub fn chunk_positions(&self) -> &[u64] {
        &self.chunk_positions
    }

    /// Chunk record at `ordinal`, seeking via the index when it is known.
    fn chunk_at(&self, ordinal: usize) -> Result<Option<rosbag::record_types::Chunk<'_>>> {
        let mut records = self.bag.chunk_records();
        if let Some(&pos) = self.chunk_positions.get(ordinal) {
            records
                .seek(pos)
                .map_err(|e| bag_error("failed to seek to chunk", e))?;
            return match records.next() {
                Some(Ok(rosbag::ChunkRecord::Chunk(data))) => Ok(Some(data)),
                Some(Ok(_)) => Err(CurateError::decode(
                    "bag",
                    format!("index points at a non-chunk record at offset {pos}"),
                )),
                Some(Err(e)) => Err(bag_error("failed to read chunk", e)),
                None => Ok(None),
            };
        }

        // Bags without chunk infos: walk chunk records in order.
        let mut current = 0usize;
        for record in records {
            let record = record.map_err(|e| bag_error("failed to read chunk", e))?;
            if let rosbag::ChunkRecord::Chunk(data) = record {
                if current == ordinal {
                    return Ok(Some(data));
                }
                current += 1;
            }
        }
        Ok(None)
    }

    /// Connections from the index section.
    fn connections(&self) -> Result<HashMap<u32, ConnectionInfo>> {
        let mut connections = HashMap::new();
        for record in self.bag.index_records() {
            let record = record.map_err(|e| bag_error("failed to read index", e))?;
            if let rosbag::IndexRecord::Connection(conn) = record {
                connections.entry(conn.id).or_insert_with(|| ConnectionInfo {
                    topic: conn.topic.to_string(),
                    message_type: conn.tp.to_string(),
                });
            }
        }
        Ok(connections)
    }
}

impl MessageStore for BagStore {
    fn index(&self) -> Result<Vec<StreamIndex>> {
        let mut connections = self.connections()?;
        let mut table = StreamTable::default();
        let mut chunk = 0usize;

        for record in self.bag.chunk_records() {
            let record = record.map_err(|e| bag_error("failed to read chunk", e))?;
            let rosbag::ChunkRecord::Chunk(data) = record else {
                continue;
            };
            let mut position = 0usize;
            for message in data.messages() {
                match message.map_err(|e| bag_error("failed to read message", e))? {
                    rosbag::MessageRecord::MessageData(msg) => {
                        if let Some(conn) = connections.get(&msg.conn_id) {
                            table.record(
                                &conn.topic,
                                &conn.message_type,
                                Some(WireFormat::Ros1),
                                MessageRef {
                                    time: msg.time,
                                    chunk,
                                    position,
                                },
                            );
                        }
                        position += 1;
                    }
                    // Connections missing from the index section
                    rosbag::MessageRecord::Connection(conn) => {
                        connections.entry(conn.id).or_insert_with(|| ConnectionInfo {
                            topic: conn.topic.to_string(),
                            message_type: conn.tp.to_string(),
                        });
                    }
                }
            }
            chunk += 1;
        }
        Ok(table.finish())
    }

    fn read_chunk(
        &self,
        chunk: usize,
        positions: &BTreeSet<usize>,
    ) -> Result<HashMap<usize, Vec<u8>>> {
        let mut found = HashMap::with_capacity(positions.len());
        let Some(&last) = positions.last() else {
            return Ok(found);
        };

        let data = self.chunk_at(chunk)?.ok_or_else(|| {
            CurateError::decode("bag", format!("no chunk with ordinal {chunk}"))
        })?;
        let mut position = 0usize;
        for message in data.messages() {
            let message = message.map_err(|e| bag_error("failed to read message", e))?;
            if let rosbag::MessageRecord::MessageData(msg) = message {
                if positions.contains(&position) {
                    found.insert(position, msg.data.to_vec());
                }
                if position >= last {
                    break;
                }
                position += 1;
            }
        }
        Ok(found)
    }
}
