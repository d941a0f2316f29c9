//! Uncompressed PCM
//!
//! Frames already arrive in the negotiated format, so encoding is a
//! validation step followed by handing the same bytes on as a packet.

use std::collections::VecDeque;

use super::{AudioEncoder, CodecDescriptor, CodecParams, Packet};
use crate::audio::{AudioFormat, Buffer, CodecCapabilities, SampleFormat};
use crate::error::CodecError;

/// PCM codec family member fixed to one little-endian sample format
pub struct PcmCodec {
    name: &'static str,
    sample_format: SampleFormat,
}

impl PcmCodec {
    pub fn s16le() -> Self {
        Self {
            name: "pcm_s16le",
            sample_format: SampleFormat::S16,
        }
    }

    pub fn f32le() -> Self {
        Self {
            name: "pcm_f32le",
            sample_format: SampleFormat::Flt,
        }
    }

    pub fn sample_format(&self) -> SampleFormat {
        self.sample_format
    }
}

impl CodecDescriptor for PcmCodec {
    fn name(&self) -> &str {
        self.name
    }

    fn capabilities(&self) -> CodecCapabilities {
        CodecCapabilities {
            sample_formats: Some(vec![self.sample_format]),
            sample_rates: None,
            channel_layouts: None,
        }
    }

    fn open(&self, params: &CodecParams) -> Result<Box<dyn AudioEncoder>, CodecError> {
        if params.format.sample_format != self.sample_format {
            return Err(CodecError::EncoderInit(format!(
                "{} cannot encode {}",
                self.name, params.format.sample_format
            )));
        }
        if params.format.channels() == 0 || params.format.sample_rate == 0 {
            return Err(CodecError::EncoderInit(format!(
                "Invalid stream format: {}",
                params.format
            )));
        }
        Ok(Box::new(PcmEncoder::new(self.name, params.format)))
    }
}

pub struct PcmEncoder {
    name: &'static str,
    format: AudioFormat,
    pending: VecDeque<Packet>,
}

impl PcmEncoder {
    fn new(name: &'static str, format: AudioFormat) -> Self {
        Self {
            name,
            format,
            pending: VecDeque::new(),
        }
    }
}

impl AudioEncoder for PcmEncoder {
    fn name(&self) -> &str {
        self.name
    }

    fn send_frame(&mut self, frame: Option<&Buffer>) -> Result<(), CodecError> {
        let Some(frame) = frame else {
            return Ok(());
        };

        let format = frame.format();
        if format.sample_format != self.format.sample_format || format.channels() != self.format.channels() {
            return Err(CodecError::UnsupportedFormat(format!(
                "expected {}, got {}",
                self.format, format
            )));
        }

        let frame_bytes = self.format.bytes_per_frame();
        let usable = frame.frame_count() * frame_bytes;
        if usable != frame.size() {
            return Err(CodecError::InvalidFrameSize(frame.size()));
        }
        if usable == 0 {
            return Ok(());
        }

        self.pending.push_back(Packet {
            data: frame.data().slice(..usable),
            duration: frame.frame_count() as u64,
        });
        Ok(())
    }

    fn receive_packet(&mut self) -> Result<Option<Packet>, CodecError> {
        Ok(self.pending.pop_front())
    }

    fn flush(&mut self) {
        self.pending.clear();
    }
}
