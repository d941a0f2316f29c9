//! Headerless PCM output

use std::io::Write;

use super::{ContainerFormat, Muxer, StreamParams};
use crate::codec::Packet;
use crate::error::MuxError;

pub struct RawFormat {
    name: &'static str,
    codec: &'static str,
    extensions: &'static [&'static str],
}

impl RawFormat {
    pub fn s16le() -> Self {
        Self {
            name: "s16le",
            codec: "pcm_s16le",
            extensions: &["sw"],
        }
    }

    pub fn f32le() -> Self {
        Self {
            name: "f32le",
            codec: "pcm_f32le",
            extensions: &[],
        }
    }
}

impl ContainerFormat for RawFormat {
    fn name(&self) -> &str {
        self.name
    }

    fn extensions(&self) -> &[&str] {
        self.extensions
    }

    fn mime_types(&self) -> &[&str] {
        &[]
    }

    fn default_codec(&self) -> &str {
        self.codec
    }

    fn new_muxer(&self, params: &StreamParams) -> Result<Box<dyn Muxer>, MuxError> {
        if params.codec != self.codec {
            return Err(MuxError::UnsupportedCodec(params.codec.clone()));
        }
        Ok(Box::new(RawMuxer))
    }
}

struct RawMuxer;

impl Muxer for RawMuxer {
    fn write_header(&mut self, _io: &mut dyn Write) -> Result<(), MuxError> {
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
    use crate::audio::AudioFormat;
    use bytes::Bytes;

    #[test]
    fn test_raw_writes_packets_verbatim() {
        let params = StreamParams {
            codec: "pcm_s16le".into(),
            format: AudioFormat::default(),
            bit_rate: 0,
            initial_padding: 0,
        };
        let mut muxer = RawFormat::s16le().new_muxer(&params).unwrap();
        let mut out = Vec::new();

        muxer.write_header(&mut out).unwrap();
        muxer
            .write_packet(
                &Packet {
                    data: Bytes::from_static(&[9, 8, 7, 6]),
                    duration: 1,
                },
                &mut out,
            )
            .unwrap();
        muxer.write_trailer(&mut out).unwrap();

        assert_eq!(out, vec![9, 8, 7, 6]);
    }

    #[test]
    fn test_raw_rejects_other_codecs() {
        let params = StreamParams {
            codec: "opus".into(),
            format: AudioFormat::default(),
            bit_rate: 0,
            initial_padding: 0,
        };
        assert!(RawFormat::s16le().new_muxer(&params).is_err());
    }
}
