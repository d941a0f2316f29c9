//! Opus encoder wrapper
//!
//! libopus only accepts whole frames of 2.5–60 ms, while playlist buffers
//! arrive in arbitrary sizes. Incoming samples are collected in a pending
//! block and cut into 20 ms frames. A drain appends the encoder lookahead
//! as silence so the last real samples come out, then pads to a whole
//! frame. Packet durations count real input only, so a container can trim
//! the padding at the end.

use ::opus::{Application, Bitrate, Channels, Encoder};
use bytes::Bytes;
use std::collections::VecDeque;

use super::{AudioEncoder, CodecDescriptor, CodecParams, Packet};
use crate::audio::convert::decode_interleaved;
use crate::audio::{AudioFormat, Buffer, ChannelLayout, CodecCapabilities, SampleFormat};
use crate::constants::OPUS_FRAME_MS;
use crate::error::CodecError;

/// Largest packet libopus will produce for one frame
const MAX_PACKET_SIZE: usize = 4000;

/// Encoder lookahead at 48 kHz for the audio application
const LOOKAHEAD_48K: u32 = 312;

/// Registry entry for libopus
pub struct OpusCodec;

impl CodecDescriptor for OpusCodec {
    fn name(&self) -> &str {
        "opus"
    }

    fn capabilities(&self) -> CodecCapabilities {
        CodecCapabilities {
            sample_formats: Some(vec![SampleFormat::S16, SampleFormat::Flt]),
            sample_rates: Some(vec![48000, 24000, 16000, 12000, 8000]),
            channel_layouts: Some(vec![ChannelLayout::MONO, ChannelLayout::STEREO]),
        }
    }

    fn open(&self, params: &CodecParams) -> Result<Box<dyn AudioEncoder>, CodecError> {
        Ok(Box::new(OpusEncoder::new(params)?))
    }
}

/// Opus encoder with frame accumulation
pub struct OpusEncoder {
    encoder: Encoder,
    format: AudioFormat,
    /// Samples per channel in one frame
    frame_size: usize,
    /// Interleaved samples not yet encoded
    pending: Vec<f32>,
    /// Encoding buffer (reused to avoid allocations)
    encode_buffer: Vec<u8>,
    ready: VecDeque<Packet>,
    /// Samples went in since the last reset, so a drain has latency to flush
    primed: bool,
    frames_encoded: u64,
    bytes_produced: u64,
}

impl OpusEncoder {
    pub fn new(params: &CodecParams) -> Result<Self, CodecError> {
        let format = params.format;
        let channels = match format.channels() {
            1 => Channels::Mono,
            2 => Channels::Stereo,
            n => {
                return Err(CodecError::EncoderInit(format!(
                    "Unsupported channel count: {}",
                    n
                )))
            }
        };

        if format.sample_format.is_planar() {
            return Err(CodecError::EncoderInit(format!(
                "Opus needs interleaved samples, got {}",
                format.sample_format
            )));
        }

        let mut encoder = Encoder::new(format.sample_rate, channels, Application::Audio)
            .map_err(|e| CodecError::EncoderInit(e.to_string()))?;

        if params.bit_rate > 0 {
            encoder
                .set_bitrate(Bitrate::Bits(params.bit_rate as i32))
                .map_err(|e| CodecError::EncoderInit(format!("Failed to set bitrate: {}", e)))?;
        }

        let frame_size = Self::frame_size_from_ms(format.sample_rate, OPUS_FRAME_MS);

        Ok(Self {
            encoder,
            format,
            frame_size,
            pending: Vec::with_capacity(frame_size * format.channels() * 2),
            encode_buffer: vec![0u8; MAX_PACKET_SIZE],
            ready: VecDeque::new(),
            primed: false,
            frames_encoded: 0,
            bytes_produced: 0,
        })
    }

    pub fn frame_size_from_ms(sample_rate: u32, ms: f32) -> usize {
        (sample_rate as f32 * ms / 1000.0) as usize
    }

    /// Samples per channel in one encoded frame
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Interleaved samples in one encoded frame
    pub fn samples_per_frame(&self) -> usize {
        self.frame_size * self.format.channels()
    }

    pub fn frames_encoded(&self) -> u64 {
        self.frames_encoded
    }

    pub fn bytes_produced(&self) -> u64 {
        self.bytes_produced
    }

    fn encode_frame(&mut self, samples: &[f32], duration: u64) -> Result<(), CodecError> {
        let size = self
            .encoder
            .encode_float(samples, &mut self.encode_buffer)
            .map_err(|e| CodecError::EncodingFailed(e.to_string()))?;

        self.frames_encoded += 1;
        self.bytes_produced += size as u64;
        self.ready.push_back(Packet {
            data: Bytes::copy_from_slice(&self.encode_buffer[..size]),
            duration,
        });
        Ok(())
    }

    fn encode_complete_frames(&mut self) -> Result<(), CodecError> {
        let per_frame = self.samples_per_frame();
        let whole = self.pending.len() / per_frame * per_frame;
        if whole == 0 {
            return Ok(());
        }

        let block: Vec<f32> = self.pending.drain(..whole).collect();
        let duration = self.frame_size as u64;
        for frame in block.chunks_exact(per_frame) {
            self.encode_frame(frame, duration)?;
        }
        Ok(())
    }

    /// Encode what is pending plus the lookahead, then start over
    fn drain(&mut self) -> Result<(), CodecError> {
        self.encode_complete_frames()?;
        if !self.primed {
            return Ok(());
        }

        let channels = self.format.channels();
        let per_frame = self.samples_per_frame();
        let mut remaining = (self.pending.len() / channels) as u64;

        let mut tail = std::mem::take(&mut self.pending);
        tail.resize(tail.len() + self.delay() as usize * channels, 0.0);
        tail.resize(tail.len().div_ceil(per_frame) * per_frame, 0.0);

        for frame in tail.chunks_exact(per_frame) {
            let duration = remaining.min(self.frame_size as u64);
            remaining -= duration;
            self.encode_frame(frame, duration)?;
        }

        self.primed = false;
        self.encoder
            .reset_state()
            .map_err(|e| CodecError::EncodingFailed(format!("Failed to reset opus state: {}", e)))
    }
}

impl AudioEncoder for OpusEncoder {
    fn name(&self) -> &str {
        "opus"
    }

    fn send_frame(&mut self, frame: Option<&Buffer>) -> Result<(), CodecError> {
        match frame {
            Some(frame) => {
                let format = frame.format();
                if format.channels() != self.format.channels() || format.sample_format.is_planar() {
                    return Err(CodecError::UnsupportedFormat(format!(
                        "expected {}, got {}",
                        self.format, format
                    )));
                }
                let samples = decode_interleaved(frame.data(), format);
                self.primed |= !samples.is_empty();
                self.pending.extend_from_slice(&samples);
                self.encode_complete_frames()
            }
            None => self.drain(),
        }
    }

    fn receive_packet(&mut self) -> Result<Option<Packet>, CodecError> {
        Ok(self.ready.pop_front())
    }

    fn flush(&mut self) {
        self.pending.clear();
        self.ready.clear();
        self.primed = false;
        if let Err(e) = self.encoder.reset_state() {
            tracing::warn!("Failed to reset opus state: {}", e);
        }
    }

    fn delay(&self) -> u32 {
        LOOKAHEAD_48K * self.format.sample_rate / 48000
    }
}
