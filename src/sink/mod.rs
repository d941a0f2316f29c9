//! Playlist subscription
//!
//! A [`Sink`] is the handle through which decoded audio reaches the
//! encoder. The playlist side pushes buffers and end-of-stream signals into
//! it, and notifies it when an item is removed ([`Sink::purge`]) or when the
//! stream is discontinuous ([`Sink::flush`]). Those notifications are
//! forwarded to the [`SinkListener`] installed at construction.

mod feed;

pub use feed::Feed;

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::audio::{AudioFormat, Buffer, ItemId};
use crate::error::PlaylistError;
use crate::queue::{Queue, QueueRead};

static NEXT_SINK_ID: AtomicU64 = AtomicU64::new(1);

/// Upstream source of decoded audio
pub trait Playlist: Send + Sync {
    /// Start delivering buffers in `sink.audio_format()` to `sink`
    fn add_sink(&self, sink: Sink) -> Result<(), PlaylistError>;

    /// Stop delivering to `sink`
    fn remove_sink(&self, sink: &Sink);
}

/// Receiver of playlist mutation notifications
pub trait SinkListener: Send + Sync {
    /// `item` was removed from the playlist
    fn on_purge(&self, item: ItemId);

    /// Playback jumped; everything buffered is stale
    fn on_flush(&self);
}

/// Outcome of [`Sink::get_buffer`]
#[derive(Debug)]
pub enum SinkRead {
    Buffer(Buffer),
    /// The playlist finished the current segment
    End,
    /// Nothing available, or the sink was detached
    NoData,
}

enum SinkItem {
    Buffer(Buffer),
    End,
}

struct SinkInner {
    id: u64,
    queue: Queue<SinkItem>,
    format: Mutex<AudioFormat>,
    attached: AtomicBool,
    playlist: Mutex<Option<Arc<dyn Playlist>>>,
    listener: Option<Arc<dyn SinkListener>>,
}

/// Subscription handle shared between the playlist and its consumer
#[derive(Clone)]
pub struct Sink {
    inner: Arc<SinkInner>,
}

impl Sink {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_listener(listener: Arc<dyn SinkListener>) -> Self {
        Self::build(Some(listener))
    }

    fn build(listener: Option<Arc<dyn SinkListener>>) -> Self {
        Self {
            inner: Arc::new(SinkInner {
                id: NEXT_SINK_ID.fetch_add(1, Ordering::Relaxed),
                queue: Queue::new(),
                format: Mutex::new(AudioFormat::default()),
                attached: AtomicBool::new(false),
                playlist: Mutex::new(None),
                listener,
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Format the playlist must deliver
    pub fn audio_format(&self) -> AudioFormat {
        *self.inner.format.lock()
    }

    /// Change the requested format; takes effect on the next attach
    pub fn set_audio_format(&self, format: AudioFormat) {
        *self.inner.format.lock() = format;
    }

    pub fn is_attached(&self) -> bool {
        self.inner.attached.load(Ordering::SeqCst)
    }

    /// Subscribe to `playlist`
    pub fn attach(&self, playlist: Arc<dyn Playlist>) -> Result<(), PlaylistError> {
        if self.inner.attached.swap(true, Ordering::SeqCst) {
            return Err(PlaylistError::AlreadyAttached(self.inner.id));
        }

        self.inner.queue.reset();
        if let Err(e) = playlist.add_sink(self.clone()) {
            self.inner.attached.store(false, Ordering::SeqCst);
            return Err(e);
        }

        *self.inner.playlist.lock() = Some(playlist);
        tracing::debug!("sink {} attached", self.inner.id);
        Ok(())
    }

    /// Unsubscribe and release any reader blocked in [`Sink::get_buffer`]
    pub fn detach(&self) {
        if !self.inner.attached.swap(false, Ordering::SeqCst) {
            return;
        }

        let playlist = self.inner.playlist.lock().take();
        if let Some(playlist) = playlist {
            playlist.remove_sink(self);
        }

        self.inner.queue.flush();
        self.inner.queue.abort();
        tracing::debug!("sink {} detached", self.inner.id);
    }

    /// Fetch the next decoded buffer, optionally waiting for one
    pub fn get_buffer(&self, block: bool) -> SinkRead {
        match self.inner.queue.get(block) {
            QueueRead::Item(SinkItem::Buffer(buffer)) => SinkRead::Buffer(buffer),
            QueueRead::Item(SinkItem::End) => SinkRead::End,
            QueueRead::Empty | QueueRead::Aborted => SinkRead::NoData,
        }
    }

    /// Number of decoded buffers waiting to be consumed
    pub fn pending(&self) -> usize {
        self.inner.queue.len()
    }

    // Playlist-facing side

    /// Queue a decoded buffer for the consumer. Ignored while detached.
    pub fn deliver(&self, buffer: Buffer) {
        if self.is_attached() {
            self.inner.queue.put(SinkItem::Buffer(buffer));
        }
    }

    /// Mark the end of the current segment
    pub fn end_of_stream(&self) {
        if self.is_attached() {
            self.inner.queue.put(SinkItem::End);
        }
    }

    /// Drop every pending buffer of `item` and notify the listener
    pub fn purge(&self, item: ItemId) {
        let removed = self.inner.queue.purge(|pending| match pending {
            SinkItem::Buffer(buffer) => buffer.item() == Some(item),
            SinkItem::End => false,
        });
        tracing::debug!("sink {} purged {} pending buffers of {}", self.inner.id, removed, item);

        if let Some(listener) = &self.inner.listener {
            listener.on_purge(item);
        }
    }

    /// Drop everything pending and notify the listener
    pub fn flush(&self) {
        self.inner.queue.flush();

        if let Some(listener) = &self.inner.listener {
            listener.on_flush();
        }
    }

    pub fn same(&self, other: &Sink) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Sink {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("id", &self.inner.id)
            .field("attached", &self.is_attached())
            .field("pending", &self.pending())
            .finish()
    }
}
