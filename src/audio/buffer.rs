//! Shared audio buffers
//!
//! A [`Buffer`] carries either decoded PCM handed down by the playlist or
//! encoded bytes produced by the muxer. Buffers are cheap to clone: every
//! clone is one more reference to the same immutable allocation, and the
//! data is freed when the last holder drops its handle.

use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

use super::format::AudioFormat;
use crate::constants::UNSET_POSITION;

/// Identity of an upstream playlist item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

impl ItemId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// What a buffer's bytes represent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// Raw samples laid out according to the buffer's format
    Audio,
    /// Muxed output bytes
    Packet,
}

struct BufferInner {
    item: Option<ItemId>,
    position: f64,
    format: AudioFormat,
    data: Bytes,
    frame_count: usize,
    kind: BufferKind,
}

/// Reference-counted audio or encoded data
#[derive(Clone)]
pub struct Buffer {
    inner: Arc<BufferInner>,
}

impl Buffer {
    /// Wrap decoded samples.
    ///
    /// `frame_count` is derived from the data length and the format's frame
    /// size; trailing bytes that do not fill a frame are ignored by codecs.
    pub fn audio(item: Option<ItemId>, position: f64, format: AudioFormat, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let frame_bytes = format.bytes_per_frame().max(1);
        let frame_count = data.len() / frame_bytes;
        Self {
            inner: Arc::new(BufferInner {
                item,
                position,
                format,
                data,
                frame_count,
                kind: BufferKind::Audio,
            }),
        }
    }

    /// Build an audio buffer from interleaved f32 samples, converting to
    /// `format.sample_format`.
    pub fn from_f32(item: Option<ItemId>, position: f64, format: AudioFormat, samples: &[f32]) -> Self {
        let data = crate::audio::convert::encode_interleaved(samples, &format);
        Self::audio(item, position, format, data)
    }

    /// Wrap muxed output bytes
    pub fn packet(item: Option<ItemId>, position: f64, format: AudioFormat, data: impl Into<Bytes>) -> Self {
        Self {
            inner: Arc::new(BufferInner {
                item,
                position,
                format,
                data: data.into(),
                frame_count: 0,
                kind: BufferKind::Packet,
            }),
        }
    }

    pub fn item(&self) -> Option<ItemId> {
        self.inner.item
    }

    /// Stream position in seconds, or [`UNSET_POSITION`] when unknown
    pub fn position(&self) -> f64 {
        self.inner.position
    }

    pub fn has_position(&self) -> bool {
        self.inner.position != UNSET_POSITION
    }

    pub fn format(&self) -> &AudioFormat {
        &self.inner.format
    }

    pub fn data(&self) -> &Bytes {
        &self.inner.data
    }

    pub fn size(&self) -> usize {
        self.inner.data.len()
    }

    /// Sample frames per channel (zero for packets)
    pub fn frame_count(&self) -> usize {
        self.inner.frame_count
    }

    pub fn kind(&self) -> BufferKind {
        self.inner.kind
    }

    /// Duration in seconds covered by an audio buffer
    pub fn duration(&self) -> f64 {
        let rate = self.inner.format.sample_rate;
        if rate == 0 {
            0.0
        } else {
            self.inner.frame_count as f64 / rate as f64
        }
    }

    /// Number of live handles to this buffer
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub fn ptr_eq(&self, other: &Buffer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("kind", &self.inner.kind)
            .field("item", &self.inner.item)
            .field("position", &self.inner.position)
            .field("format", &self.inner.format)
            .field("size", &self.inner.data.len())
            .finish()
    }
}
