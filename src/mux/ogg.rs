//! Ogg Opus (RFC 7845)
//!
//! Each segment is a complete logical bitstream: OpusHead and OpusTags on
//! their own pages, then one page per audio packet. The most recent packet
//! is held back so the trailer can flag it as end-of-stream, and every new
//! header starts a fresh serial number so consecutive segments chain.
//!
//! Page granule positions count decoded 48 kHz samples. The final page
//! instead carries input length plus pre-skip, which trims the codec's
//! padding at the end of the stream.

use ogg::writing::{PacketWriteEndInfo, PacketWriter};
use std::io::Write;

use super::{ContainerFormat, Muxer, StreamParams};
use crate::codec::Packet;
use crate::error::MuxError;

/// Opus granule positions always count 48 kHz samples
const GRANULE_RATE: u64 = 48000;

const VENDOR: &[u8] = b"stream-encoder";

pub struct OggFormat;

impl ContainerFormat for OggFormat {
    fn name(&self) -> &str {
        "ogg"
    }

    fn extensions(&self) -> &[&str] {
        &["ogg", "opus", "oga"]
    }

    fn mime_types(&self) -> &[&str] {
        &["audio/ogg", "application/ogg", "audio/opus"]
    }

    fn default_codec(&self) -> &str {
        "opus"
    }

    fn new_muxer(&self, params: &StreamParams) -> Result<Box<dyn Muxer>, MuxError> {
        if params.codec != "opus" {
            return Err(MuxError::UnsupportedCodec(params.codec.clone()));
        }

        let channels = params.format.channels();
        if !(1..=2).contains(&channels) {
            return Err(MuxError::InvalidParams(format!(
                "Ogg Opus mapping family 0 carries 1 or 2 channels, got {}",
                channels
            )));
        }
        if params.format.sample_rate == 0 {
            return Err(MuxError::InvalidParams("sample rate 0".into()));
        }

        Ok(Box::new(OggOpusMuxer {
            writer: PacketWriter::new(Vec::new()),
            serial: 0,
            channels: channels as u8,
            input_rate: params.format.sample_rate,
            pre_skip: (params.initial_padding as u64 * GRANULE_RATE / params.format.sample_rate as u64) as u16,
            samples_written: 0,
            samples_decoded: 0,
            held: None,
        }))
    }
}

struct OggOpusMuxer {
    /// Pages are staged here, then moved to the caller's writer
    writer: PacketWriter<'static, Vec<u8>>,
    serial: u32,
    channels: u8,
    input_rate: u32,
    pre_skip: u16,
    /// Codec-rate input samples muxed in the current segment
    samples_written: u64,
    /// 48 kHz samples a decoder produces for the current segment
    samples_decoded: u64,
    held: Option<Packet>,
}

impl OggOpusMuxer {
    fn opus_head(&self) -> Vec<u8> {
        let mut head = Vec::with_capacity(19);
        head.extend_from_slice(b"OpusHead");
        head.push(1);
        head.push(self.channels);
        head.extend_from_slice(&self.pre_skip.to_le_bytes());
        head.extend_from_slice(&self.input_rate.to_le_bytes());
        // output gain
        head.extend_from_slice(&0i16.to_le_bytes());
        // mapping family 0: mono/stereo, no table
        head.push(0);
        head
    }

    fn opus_tags() -> Vec<u8> {
        let mut tags = Vec::with_capacity(8 + 4 + VENDOR.len() + 4);
        tags.extend_from_slice(b"OpusTags");
        tags.extend_from_slice(&(VENDOR.len() as u32).to_le_bytes());
        tags.extend_from_slice(VENDOR);
        tags.extend_from_slice(&0u32.to_le_bytes());
        tags
    }

    fn end_granule(&self) -> u64 {
        let input = self.samples_written * GRANULE_RATE / self.input_rate as u64 + self.pre_skip as u64;
        input.min(self.samples_decoded)
    }

    fn decoded_samples(&self, packet: &Packet) -> u64 {
        match ::opus::packet::get_nb_samples(&packet.data, GRANULE_RATE as u32) {
            Ok(samples) => samples as u64,
            Err(_) => packet.duration * GRANULE_RATE / self.input_rate as u64,
        }
    }

    fn write_page(&mut self, data: Vec<u8>, end: PacketWriteEndInfo, granule: u64, io: &mut dyn Write) -> Result<(), MuxError> {
        self.writer.write_packet(data, self.serial, end, granule)?;

        let staged = std::mem::take(self.writer.inner_mut());
        if !staged.is_empty() {
            io.write_all(&staged)?;
        }
        Ok(())
    }

    fn emit_held(&mut self, end: PacketWriteEndInfo, io: &mut dyn Write) -> Result<(), MuxError> {
        if let Some(packet) = self.held.take() {
            self.samples_written += packet.duration;
            self.samples_decoded += self.decoded_samples(&packet);
            let granule = if matches!(end, PacketWriteEndInfo::EndStream) {
                self.end_granule()
            } else {
                self.samples_decoded
            };
            self.write_page(packet.data.to_vec(), end, granule, io)?;
        }
        Ok(())
    }
}

impl Muxer for OggOpusMuxer {
    fn write_header(&mut self, io: &mut dyn Write) -> Result<(), MuxError> {
        self.serial = self.serial.wrapping_add(1);
        self.samples_written = 0;
        self.samples_decoded = 0;
        self.held = None;

        let head = self.opus_head();
        self.write_page(head, PacketWriteEndInfo::EndPage, 0, io)?;
        self.write_page(Self::opus_tags(), PacketWriteEndInfo::EndPage, 0, io)
    }

    fn write_packet(&mut self, packet: &Packet, io: &mut dyn Write) -> Result<(), MuxError> {
        self.emit_held(PacketWriteEndInfo::EndPage, io)?;
        self.held = Some(packet.clone());
        Ok(())
    }

    fn write_trailer(&mut self, io: &mut dyn Write) -> Result<(), MuxError> {
        self.emit_held(PacketWriteEndInfo::EndStream, io)
    }
}
