//! Encoder stage
//!
//! An [`Encoder`] subscribes to a playlist through a [`Sink`], runs a
//! dedicated encode thread that feeds decoded audio through a codec and a
//! container muxer, and exposes the resulting byte stream through
//! [`Encoder::get_buffer`].
//!
//! Every output buffer carries the playlist item and position that were
//! current when its bytes were produced, so removing an item also removes
//! its not-yet-consumed output. Each playlist segment ends with exactly one
//! [`EncodedRead::EndOfStream`] after all of that segment's bytes.
//!
//! Lock order is head state, then output queue. The muxer output path is
//! handed a snapshot of the head and never takes the head lock itself.

mod bridge;
mod worker;

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use self::bridge::Tag;
use crate::audio::{negotiate, AudioFormat, Buffer, ItemId};
use crate::codec::{AudioEncoder, CodecParams};
use crate::config::EncoderConfig;
use crate::constants::UNSET_POSITION;
use crate::error::{EncoderError, Result};
use crate::mux::StreamParams;
use crate::queue::{Queue, QueueHandler, QueueRead};
use crate::registry::Registry;
use crate::sink::{Playlist, Sink, SinkListener};

/// Outcome of [`Encoder::get_buffer`]
#[derive(Debug)]
pub enum EncodedRead {
    /// Container bytes, tagged with their source item and position
    Data(Buffer),
    /// The current segment is complete; a new header follows if more audio
    /// arrives
    EndOfStream,
    /// Nothing available, or the encoder is detached
    NoData,
}

/// Lifecycle of the encode thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    Detached,
    /// Attached; the next segment's header has not been written yet
    HeaderPending,
    Streaming,
    /// Draining codec and muxer at the end of a segment
    Flushing,
}

/// Snapshot of the encoder counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderStats {
    pub frames_encoded: u64,
    /// Input buffers the codec rejected
    pub frames_dropped: u64,
    pub packets_written: u64,
    pub write_errors: u64,
    pub bytes_out: u64,
    /// Output buffers discarded by purge or flush before being consumed
    pub buffers_discarded: u64,
    pub segments_completed: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    frames_encoded: AtomicU64,
    frames_dropped: AtomicU64,
    packets_written: AtomicU64,
    write_errors: AtomicU64,
    bytes_out: AtomicU64,
    buffers_discarded: AtomicU64,
    segments_completed: AtomicU64,
}

impl Counters {
    pub(crate) fn record_output(&self, bytes: usize) {
        self.bytes_out.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> EncoderStats {
        EncoderStats {
            frames_encoded: self.frames_encoded.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            packets_written: self.packets_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            bytes_out: self.bytes_out.load(Ordering::Relaxed),
            buffers_discarded: self.buffers_discarded.load(Ordering::Relaxed),
            segments_completed: self.segments_completed.load(Ordering::Relaxed),
        }
    }
}

/// Entry on the output queue
pub(crate) enum OutputItem {
    Packet(Buffer),
    EndOfStream,
}

impl OutputItem {
    fn is_from(&self, item: ItemId) -> bool {
        match self {
            OutputItem::Packet(buffer) => buffer.item() == Some(item),
            OutputItem::EndOfStream => false,
        }
    }
}

impl QueueHandler<OutputItem> for Counters {
    fn cleanup(&self, item: OutputItem) {
        if let OutputItem::Packet(_) = item {
            self.buffers_discarded.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Item and position of the most recently received audio, plus the open
/// codec
pub(crate) struct HeadState {
    item: Option<ItemId>,
    position: f64,
    format: AudioFormat,
    codec: Option<Box<dyn AudioEncoder>>,
}

impl HeadState {
    fn tag(&self) -> Tag {
        Tag {
            item: self.item,
            position: self.position,
            format: self.format,
        }
    }

    fn clear(&mut self) {
        self.item = None;
        self.position = UNSET_POSITION;
    }
}

/// State shared by the public handle, the encode thread, and the sink
/// listener callbacks
pub(crate) struct Shared {
    queue: Queue<OutputItem>,
    head: Mutex<HeadState>,
    counters: Arc<Counters>,
    header_written: AtomicBool,
    state: Mutex<EncoderState>,
}

impl Shared {
    fn new() -> Self {
        let counters = Arc::new(Counters::default());
        let handler: Arc<dyn QueueHandler<OutputItem>> = counters.clone();
        // readers get NoData until the first attach
        let queue = Queue::with_handler(handler);
        queue.abort();
        Self {
            queue,
            head: Mutex::new(HeadState {
                item: None,
                position: UNSET_POSITION,
                format: AudioFormat::default(),
                codec: None,
            }),
            counters,
            header_written: AtomicBool::new(false),
            state: Mutex::new(EncoderState::Detached),
        }
    }

    fn set_state(&self, state: EncoderState) {
        *self.state.lock() = state;
    }
}

impl SinkListener for Shared {
    fn on_purge(&self, item: ItemId) {
        let mut head = self.head.lock();
        let removed = self.queue.purge(|pending| pending.is_from(item));
        if head.item == Some(item) {
            head.clear();
        }
        tracing::debug!("encoder: purged {} output buffers of {}", removed, item);
    }

    fn on_flush(&self) {
        let mut head = self.head.lock();
        let removed = self.queue.flush();
        if let Some(codec) = head.codec.as_mut() {
            codec.flush();
        }
        tracing::debug!("encoder: flushed {} output buffers", removed);
    }
}

/// Encoding stage bound to at most one playlist at a time
pub struct Encoder {
    config: EncoderConfig,
    registry: Arc<Registry>,
    shared: Arc<Shared>,
    sink: Sink,
    thread: Option<JoinHandle<()>>,
    actual_format: Option<AudioFormat>,
}

impl Encoder {
    /// Detached encoder with default settings and the built-in codecs
    pub fn new() -> Self {
        Self::with_config(EncoderConfig::default())
    }

    pub fn with_config(config: EncoderConfig) -> Self {
        Self::with_registry(config, Arc::new(Registry::with_defaults()))
    }

    /// Detached encoder resolving codecs and containers from `registry`
    pub fn with_registry(config: EncoderConfig, registry: Arc<Registry>) -> Self {
        let shared = Arc::new(Shared::new());
        let sink = Sink::with_listener(shared.clone());
        Self {
            config,
            registry,
            shared,
            sink,
            thread: None,
            actual_format: None,
        }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Settings are read on the next [`Encoder::attach`]
    pub fn config_mut(&mut self) -> &mut EncoderConfig {
        &mut self.config
    }

    /// Format chosen by negotiation during the last attach
    pub fn actual_format(&self) -> Option<AudioFormat> {
        self.actual_format
    }

    pub fn is_attached(&self) -> bool {
        self.thread.is_some()
    }

    /// Resolve container and codec, negotiate the format, subscribe to
    /// `playlist` and start the encode thread.
    ///
    /// On failure everything set up so far is torn down again and the
    /// encoder is left detached.
    pub fn attach(&mut self, playlist: Arc<dyn Playlist>) -> Result<()> {
        if self.is_attached() || self.sink.is_attached() {
            return Err(EncoderError::AlreadyAttached.into());
        }

        if let Err(e) = self.start(playlist) {
            tracing::error!("encoder attach failed: {}", e);
            self.detach();
            self.actual_format = None;
            return Err(e);
        }
        Ok(())
    }

    fn start(&mut self, playlist: Arc<dyn Playlist>) -> Result<()> {
        self.shared.queue.reset();

        let container = self
            .registry
            .guess_container(
                self.config.format_short_name.as_deref(),
                self.config.filename.as_deref(),
                self.config.mime_type.as_deref(),
            )
            .ok_or(EncoderError::NoContainer)?;

        let codec_name = self
            .registry
            .guess_codec(container.as_ref(), self.config.codec_short_name.as_deref());
        let descriptor = self
            .registry
            .find_codec(&codec_name)
            .ok_or_else(|| EncoderError::NoCodec(codec_name.clone()))?;

        let format = negotiate(&descriptor.capabilities(), &self.config.target_format);
        tracing::info!("encoding audio format: {}", format);

        let codec = descriptor
            .open(&CodecParams {
                format,
                bit_rate: self.config.bit_rate,
            })
            .map_err(EncoderError::CodecOpen)?;

        let muxer = container
            .new_muxer(&StreamParams {
                codec: codec_name.clone(),
                format,
                bit_rate: self.config.bit_rate,
                initial_padding: codec.delay(),
            })
            .map_err(EncoderError::Stream)?;

        {
            let mut head = self.shared.head.lock();
            head.clear();
            head.format = format;
            head.codec = Some(codec);
        }

        self.sink.set_audio_format(format);
        self.sink.attach(playlist).map_err(EncoderError::SinkAttach)?;

        self.shared.header_written.store(false, Ordering::SeqCst);
        self.shared.set_state(EncoderState::HeaderPending);

        let shared = self.shared.clone();
        let sink = self.sink.clone();
        let handle = thread::Builder::new()
            .name("encode".into())
            .spawn(move || worker::run(shared, sink, muxer))
            .map_err(EncoderError::ThreadSpawn)?;
        self.thread = Some(handle);
        self.actual_format = Some(format);

        tracing::info!(
            "encoder attached: {} in {}",
            codec_name,
            container.name()
        );
        Ok(())
    }

    /// Stop the encode thread, unsubscribe from the playlist and discard
    /// pending output. Does nothing when already detached.
    pub fn detach(&mut self) {
        self.sink.detach();
        self.shared.queue.flush();
        self.shared.queue.abort();

        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                tracing::error!("encode thread panicked");
            }
            tracing::info!("encoder detached");
        }
        // anything written while the thread was winding down
        self.shared.queue.flush();

        {
            let mut head = self.shared.head.lock();
            head.codec = None;
            head.clear();
        }
        self.shared.header_written.store(false, Ordering::SeqCst);
        self.shared.set_state(EncoderState::Detached);
    }

    /// Take the next piece of encoded output
    pub fn get_buffer(&self, block: bool) -> EncodedRead {
        match self.shared.queue.get(block) {
            QueueRead::Item(OutputItem::Packet(buffer)) => EncodedRead::Data(buffer),
            QueueRead::Item(OutputItem::EndOfStream) => EncodedRead::EndOfStream,
            QueueRead::Empty | QueueRead::Aborted => EncodedRead::NoData,
        }
    }

    /// Item and position of the audio most recently fed to the codec
    pub fn position(&self) -> (Option<ItemId>, f64) {
        let head = self.shared.head.lock();
        (head.item, head.position)
    }

    pub fn state(&self) -> EncoderState {
        *self.shared.state.lock()
    }

    pub fn stats(&self) -> EncoderStats {
        self.shared.counters.snapshot()
    }

    /// Output buffers and markers not yet taken by `get_buffer`
    pub fn pending_output(&self) -> usize {
        self.shared.queue.len()
    }

    /// Whether the current segment's header has been emitted
    pub fn header_written(&self) -> bool {
        self.shared.header_written.load(Ordering::SeqCst)
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Encoder {
    fn drop(&mut self) {
        self.detach();
    }
}
