//! Audio codecs
//!
//! An [`AudioEncoder`] follows a send/receive model: frames go in through
//! [`AudioEncoder::send_frame`], and zero or more packets come out of
//! [`AudioEncoder::receive_packet`] until it reports `None`. Sending `None`
//! starts a drain: the encoder flushes whatever latency it holds, and once
//! it reports `None` again it is ready for a new segment.
//!
//! A [`CodecDescriptor`] is the codec "class": it advertises capabilities
//! for negotiation and opens configured encoder instances.

pub mod opus;
pub mod pcm;

pub use self::opus::{OpusCodec, OpusEncoder};
pub use pcm::{PcmCodec, PcmEncoder};

use bytes::Bytes;

use crate::audio::{AudioFormat, Buffer, CodecCapabilities};
use crate::error::CodecError;

/// One encoded unit produced by a codec
#[derive(Debug, Clone)]
pub struct Packet {
    pub data: Bytes,
    /// Sample frames per channel covered by this packet, at the codec rate
    pub duration: u64,
}

/// Parameters an encoder is opened with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodecParams {
    pub format: AudioFormat,
    /// Target bit rate in bits per second; 0 lets the codec choose
    pub bit_rate: u32,
}

/// An open, stateful encoder instance
pub trait AudioEncoder: Send {
    fn name(&self) -> &str;

    /// Submit a frame, or `None` to drain
    fn send_frame(&mut self, frame: Option<&Buffer>) -> Result<(), CodecError>;

    /// Take the next finished packet, if any
    fn receive_packet(&mut self) -> Result<Option<Packet>, CodecError>;

    /// Discard buffered input and internal state
    fn flush(&mut self);

    /// Samples of algorithmic delay at the start of the stream
    fn delay(&self) -> u32 {
        0
    }
}

/// Registry entry describing a codec
pub trait CodecDescriptor: Send + Sync {
    fn name(&self) -> &str;

    fn capabilities(&self) -> CodecCapabilities;

    fn open(&self, params: &CodecParams) -> Result<Box<dyn AudioEncoder>, CodecError>;
}
