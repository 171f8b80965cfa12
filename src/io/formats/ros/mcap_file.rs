// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! MCAP recordings.
//!
//! With a summary section the file is walked chunk by chunk through the
//! chunk indexes, so a later `read_chunk` decompresses exactly one chunk.
//! Files without a summary are treated as a single chunk.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::path::Path;

use tracing::debug;

use super::{MessageStore, MessageRef, StreamIndex, StreamTable, WireFormat};
use crate::{CurateError, Result};

fn mcap_error(e: ::mcap::McapError) -> CurateError {
    CurateError::decode("mcap", e.to_string())
}

/// Map a channel message encoding to a wire layout.
pub fn wire_format(message_encoding: &str) -> Option<WireFormat> {
    match message_encoding {
        "cdr" => Some(WireFormat::Cdr),
        "ros1" => Some(WireFormat::Ros1),
        _ => None,
    }
}

/// Memory-mapped MCAP file.
pub struct McapStore {
    mmap: memmap2::Mmap,
    summary: Option<::mcap::Summary>,
}

impl McapStore {
    /// Map a file and read its summary, if any.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| CurateError::io(format!("opening '{}'", path.display()), e.to_string()))?;
        // SAFETY: the map is read-only and dropped on close.
        let mmap = unsafe { memmap2::Mmap::map(&file) }
            .map_err(|e| CurateError::io(format!("mapping '{}'", path.display()), e.to_string()))?;

        let summary = match ::mcap::Summary::read(&mmap) {
            Ok(Some(summary)) if !summary.chunk_indexes.is_empty() => Some(summary),
            Ok(_) => None,
            Err(e) => {
                debug!(
                    context = "McapStore",
                    path = %path.display(),
                    error = %e,
                    "Unreadable summary, falling back to a linear scan"
                );
                None
            }
        };
        Ok(Self { mmap, summary })
    }

    /// Whether chunk-level random access is available.
    pub fn is_chunked(&self) -> bool {
        self.summary.is_some()
    }

    /// Visit every message of chunk `chunk` with its in-chunk position.
    ///
    /// The visitor returns `false` to stop early.
    fn visit_chunk<F>(&self, chunk: usize, mut visit: F) -> Result<()>
    where
        F: FnMut(usize, &::mcap::Message<'_>) -> bool,
    {
        match &self.summary {
            Some(summary) => {
                let index = summary.chunk_indexes.get(chunk).ok_or_else(|| {
                    CurateError::decode("mcap", format!("no chunk with ordinal {chunk}"))
                })?;
                let messages = summary.stream_chunk(&self.mmap, index).map_err(mcap_error)?;
                for (position, message) in messages.enumerate() {
                    if !visit(position, &message.map_err(mcap_error)?) {
                        break;
                    }
                }
            }
            None => {
                let messages = ::mcap::MessageStream::new(&self.mmap).map_err(mcap_error)?;
                for (position, message) in messages.enumerate() {
                    if !visit(position, &message.map_err(mcap_error)?) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn chunk_count(&self) -> usize {
        self.summary.as_ref().map_or(1, |s| s.chunk_indexes.len())
    }
}

impl MessageStore for McapStore {
    fn index(&self) -> Result<Vec<StreamIndex>> {
        let mut table = StreamTable::default();
        for chunk in 0..self.chunk_count() {
            self.visit_chunk(chunk, |position, message| {
                let channel = &message.channel;
                let type_name = channel.schema.as_ref().map_or("", |s| s.name.as_str());
                table.record(
                    &channel.topic,
                    type_name,
                    wire_format(&channel.message_encoding),
                    MessageRef {
                        time: message.publish_time,
                        chunk,
                        position,
                    },
                );
                true
            })?;
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
        self.visit_chunk(chunk, |position, message| {
            if positions.contains(&position) {
                found.insert(position, message.data.to_vec());
            }
            position < last
        })?;
        Ok(found)
    }
}
