//! Streaming WAV
//!
//! Output is never seekable, so `hound` writes the RIFF and data chunk
//! sizes as `0xFFFFFFFF` ("unknown, read to end") and the trailer is empty.

use std::io::Write;

use super::{ContainerFormat, Muxer, StreamParams};
use crate::audio::SampleFormat;
use crate::codec::Packet;
use crate::error::MuxError;

/// Channels with a defined WAVE_FORMAT_EXTENSIBLE speaker position
const MAX_CHANNELS: usize = 18;

pub struct WavFormat;

impl ContainerFormat for WavFormat {
    fn name(&self) -> &str {
        "wav"
    }

    fn extensions(&self) -> &[&str] {
        &["wav"]
    }

    fn mime_types(&self) -> &[&str] {
        &["audio/x-wav", "audio/wav"]
    }

    fn default_codec(&self) -> &str {
        "pcm_s16le"
    }

    fn new_muxer(&self, params: &StreamParams) -> Result<Box<dyn Muxer>, MuxError> {
        let (bits_per_sample, sample_format) = match (params.codec.as_str(), params.format.sample_format) {
            ("pcm_s16le", SampleFormat::S16) => (16, hound::SampleFormat::Int),
            ("pcm_f32le", SampleFormat::Flt) => (32, hound::SampleFormat::Float),
            (codec, _) if !codec.starts_with("pcm_") => {
                return Err(MuxError::UnsupportedCodec(params.codec.clone()))
            }
            _ => {
                return Err(MuxError::InvalidParams(format!(
                    "{} with {} samples",
                    params.codec, params.format.sample_format
                )))
            }
        };

        let channels = params.format.channels();
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(MuxError::InvalidParams(format!("{} channels", channels)));
        }

        // hound computes the byte rate in u32
        let block_align = channels as u32 * bits_per_sample as u32 / 8;
        if params.format.sample_rate == 0 || params.format.sample_rate.checked_mul(block_align).is_none() {
            return Err(MuxError::InvalidParams(format!(
                "sample rate {} Hz with {} channels",
                params.format.sample_rate, channels
            )));
        }

        let spec = hound::WavSpec {
            channels: channels as u16,
            sample_rate: params.format.sample_rate,
            bits_per_sample,
            sample_format,
        };

        Ok(Box::new(WavMuxer {
            header: spec.into_header_for_infinite_file(),
        }))
    }
}

struct WavMuxer {
    header: Vec<u8>,
}

impl Muxer for WavMuxer {
    fn write_header(&mut self, io: &mut dyn Write) -> Result<(), MuxError> {
        io.write_all(&self.header)?;
        Ok(())
    }

    fn write_packet(&mut self, packet: &Packet, io: &mut dyn Write) -> Result<(), MuxError> {
        io.write_all(&packet.data)?;
        Ok(())
    }

    fn write_trailer(&mut self, _io: &mut dyn Write) -> Result<(), MuxError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioFormat, ChannelLayout};

    fn params(codec: &str, sample_format: SampleFormat) -> StreamParams {
        StreamParams {
            codec: codec.into(),
            format: AudioFormat::new(44100, sample_format, ChannelLayout::STEREO),
            bit_rate: 0,
            initial_padding: 0,
        }
    }

    #[test]
    fn test_header_layout() {
        let mut muxer = WavFormat.new_muxer(&params("pcm_s16le", SampleFormat::S16)).unwrap();
        let mut out = Vec::new();
        muxer.write_header(&mut out).unwrap();

        assert_eq!(out.len(), 44);
        assert_eq!(&out[0..4], b"RIFF");
        assert_eq!(&out[8..12], b"WAVE");
        assert_eq!(u16::from_le_bytes([out[20], out[21]]), 1);
        assert_eq!(u16::from_le_bytes([out[22], out[23]]), 2);
        assert_eq!(u32::from_le_bytes([out[24], out[25], out[26], out[27]]), 44100);
        assert_eq!(u32::from_le_bytes([out[28], out[29], out[30], out[31]]), 44100 * 4);
        assert_eq!(u16::from_le_bytes([out[34], out[35]]), 16);
        assert_eq!(&out[36..40], b"data");
        // streaming: sizes unknown
        assert_eq!(&out[4..8], &[0xFF; 4]);
        assert_eq!(&out[40..44], &[0xFF; 4]);
    }

    #[test]
    fn test_float_uses_extensible_format() {
        let mut muxer = WavFormat.new_muxer(&params("pcm_f32le", SampleFormat::Flt)).unwrap();
        let mut out = Vec::new();
        muxer.write_header(&mut out).unwrap();

        assert_eq!(out.len(), 68);
        assert_eq!(u16::from_le_bytes([out[20], out[21]]), 0xFFFE);
        // sub-format GUID starts with the IEEE float tag
        assert_eq!(u16::from_le_bytes([out[44], out[45]]), 3);
        assert_eq!(&out[60..64], b"data");
        assert_eq!(&out[64..68], &[0xFF; 4]);
    }

    #[test]
    fn test_rejects_overflowing_rate() {
        let mut bad = params("pcm_s16le", SampleFormat::S16);
        bad.format.sample_rate = u32::MAX / 2;
        assert!(matches!(WavFormat.new_muxer(&bad), Err(MuxError::InvalidParams(_))));

        bad.format.sample_rate = 0;
        assert!(matches!(WavFormat.new_muxer(&bad), Err(MuxError::InvalidParams(_))));
    }

    #[test]
    fn test_rejects_compressed_codecs() {
        assert!(matches!(
            WavFormat.new_muxer(&params("opus", SampleFormat::Flt)),
            Err(MuxError::UnsupportedCodec(_))
        ));
    }
}
