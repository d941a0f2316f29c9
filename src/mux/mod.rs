//! Container muxers
//!
//! A [`Muxer`] serializes encoded packets into a container byte stream.
//! It never owns its output: every call receives the writer to emit into,
//! so the caller decides how bytes are tagged and where they go.

pub mod ogg;
pub mod raw;
pub mod wav;

pub use self::ogg::OggFormat;
pub use raw::RawFormat;
pub use wav::WavFormat;

use std::io::Write;

use crate::audio::AudioFormat;
use crate::codec::Packet;
use crate::error::MuxError;

/// Description of the single audio stream a muxer carries
#[derive(Debug, Clone, PartialEq)]
pub struct StreamParams {
    pub codec: String,
    pub format: AudioFormat,
    pub bit_rate: u32,
    /// Codec delay in samples at the stream rate
    pub initial_padding: u32,
}

/// Stateful writer for one container stream
pub trait Muxer: Send {
    fn write_header(&mut self, io: &mut dyn Write) -> Result<(), MuxError>;

    fn write_packet(&mut self, packet: &Packet, io: &mut dyn Write) -> Result<(), MuxError>;

    /// Push out interleaving-buffered data. Returns `true` while something
    /// was written, so callers loop until `false`.
    fn flush(&mut self, _io: &mut dyn Write) -> Result<bool, MuxError> {
        Ok(false)
    }

    fn write_trailer(&mut self, io: &mut dyn Write) -> Result<(), MuxError>;
}

/// Registry entry describing a container
pub trait ContainerFormat: Send + Sync {
    fn name(&self) -> &str;

    fn extensions(&self) -> &[&str];

    fn mime_types(&self) -> &[&str];

    /// Codec used when the caller names none
    fn default_codec(&self) -> &str;

    fn new_muxer(&self, params: &StreamParams) -> Result<Box<dyn Muxer>, MuxError>;
}
