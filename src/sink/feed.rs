//! In-process playlist driven directly by the caller
//!
//! `Feed` stands in for a real decoder/mixer: the caller pushes buffers it
//! already produced, and every attached sink receives them. Item removal
//! and seeks are forwarded as purge and flush notifications.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{Playlist, Sink};
use crate::audio::{AudioFormat, Buffer, ItemId};
use crate::error::PlaylistError;

pub struct Feed {
    sinks: Mutex<Vec<Sink>>,
    /// Fixed output format, when the feed cannot convert
    format: Option<AudioFormat>,
    next_item: AtomicU64,
}

impl Feed {
    /// A feed that accepts sinks of any format
    pub fn new() -> Self {
        Self {
            sinks: Mutex::new(Vec::new()),
            format: None,
            next_item: AtomicU64::new(1),
        }
    }

    /// A feed that only produces `format` and rejects other sinks
    pub fn with_format(format: AudioFormat) -> Self {
        Self {
            format: Some(format),
            ..Self::new()
        }
    }

    /// Allocate a fresh item identity
    pub fn new_item(&self) -> ItemId {
        ItemId::new(self.next_item.fetch_add(1, Ordering::Relaxed))
    }

    /// Deliver one buffer to every attached sink
    pub fn push(&self, buffer: Buffer) {
        for sink in self.snapshot() {
            sink.deliver(buffer.clone());
        }
    }

    /// Signal the end of the current segment
    pub fn end_of_stream(&self) {
        for sink in self.snapshot() {
            sink.end_of_stream();
        }
    }

    /// Remove `item` from the playlist
    pub fn remove_item(&self, item: ItemId) {
        tracing::debug!("feed: removing {}", item);
        for sink in self.snapshot() {
            sink.purge(item);
        }
    }

    /// Jump to a new position; buffered audio is discarded downstream
    pub fn seek(&self) {
        tracing::debug!("feed: seek");
        for sink in self.snapshot() {
            sink.flush();
        }
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.lock().len()
    }

    // Callbacks into sinks run without the feed lock held
    fn snapshot(&self) -> Vec<Sink> {
        self.sinks.lock().clone()
    }
}

impl Default for Feed {
    fn default() -> Self {
        Self::new()
    }
}

impl Playlist for Feed {
    fn add_sink(&self, sink: Sink) -> Result<(), PlaylistError> {
        if let Some(provided) = self.format {
            let requested = sink.audio_format();
            if requested != provided {
                return Err(PlaylistError::FormatMismatch {
                    requested: requested.to_string(),
                    provided: provided.to_string(),
                });
            }
        }

        let mut sinks = self.sinks.lock();
        if sinks.iter().any(|s| s.same(&sink)) {
            return Err(PlaylistError::AlreadyAttached(sink.id()));
        }
        sinks.push(sink);
        Ok(())
    }

    fn remove_sink(&self, sink: &Sink) {
        self.sinks.lock().retain(|s| !s.same(sink));
    }
}
