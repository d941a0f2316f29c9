//! Sample conversion between f32 and the stored sample formats

use super::format::{AudioFormat, SampleFormat};

/// Serialize interleaved f32 samples as little-endian `format` bytes.
///
/// Planar formats are de-interleaved into one plane per channel.
pub fn encode_interleaved(samples: &[f32], format: &AudioFormat) -> Vec<u8> {
    let sample_format = format.sample_format;
    let mut out = Vec::with_capacity(samples.len() * sample_format.bytes_per_sample());

    if sample_format.is_planar() {
        let channels = format.channels().max(1);
        for ch in 0..channels {
            for &s in samples.iter().skip(ch).step_by(channels) {
                write_sample(&mut out, s, sample_format);
            }
        }
    } else {
        for &s in samples {
            write_sample(&mut out, s, sample_format);
        }
    }

    out
}

/// Read `format` bytes back into interleaved f32 samples.
///
/// Trailing bytes that do not form a complete frame are dropped.
pub fn decode_interleaved(data: &[u8], format: &AudioFormat) -> Vec<f32> {
    let sample_format = format.sample_format;
    let width = sample_format.bytes_per_sample();
    let channels = format.channels().max(1);
    let frames = data.len() / (width * channels);
    let mut out = vec![0.0f32; frames * channels];

    if sample_format.is_planar() {
        for ch in 0..channels {
            let plane = &data[ch * frames * width..(ch + 1) * frames * width];
            for (i, chunk) in plane.chunks_exact(width).enumerate() {
                out[i * channels + ch] = read_sample(chunk, sample_format);
            }
        }
    } else {
        for (slot, chunk) in out.iter_mut().zip(data.chunks_exact(width)) {
            *slot = read_sample(chunk, sample_format);
        }
    }

    out
}

fn write_sample(out: &mut Vec<u8>, s: f32, format: SampleFormat) {
    let s = s.clamp(-1.0, 1.0);
    match format.packed() {
        SampleFormat::U8 => out.push(((s * 127.0) + 128.0).round() as u8),
        SampleFormat::S16 => out.extend_from_slice(&((s * i16::MAX as f32) as i16).to_le_bytes()),
        SampleFormat::S32 => out.extend_from_slice(&((s as f64 * i32::MAX as f64) as i32).to_le_bytes()),
        SampleFormat::Flt => out.extend_from_slice(&s.to_le_bytes()),
        SampleFormat::Dbl => out.extend_from_slice(&(s as f64).to_le_bytes()),
        _ => unreachable!("packed() only yields interleaved formats"),
    }
}

fn read_sample(bytes: &[u8], format: SampleFormat) -> f32 {
    match format.packed() {
        SampleFormat::U8 => (bytes[0] as f32 - 128.0) / 128.0,
        SampleFormat::S16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f32 / 32768.0,
        SampleFormat::S32 => {
            (i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64 / 2147483648.0) as f32
        }
        SampleFormat::Flt => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        SampleFormat::Dbl => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[..8]);
            f64::from_le_bytes(raw) as f32
        }
        _ => unreachable!("packed() only yields interleaved formats"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::format::ChannelLayout;

    #[test]
    fn test_s16_layout() {
        let format = AudioFormat::new(48000, SampleFormat::S16, ChannelLayout::MONO);
        let bytes = encode_interleaved(&[0.0, 1.0, -1.0], &format);
        assert_eq!(bytes, vec![0, 0, 0xff, 0x7f, 0x01, 0x80]);
    }

    #[test]
    fn test_planar_split() {
        let format = AudioFormat::new(48000, SampleFormat::FltP, ChannelLayout::STEREO);
        let samples = [0.25, -0.25, 0.5, -0.5];
        let bytes = encode_interleaved(&samples, &format);

        // left plane first
        assert_eq!(&bytes[0..4], &0.25f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &0.5f32.to_le_bytes());
        assert_eq!(decode_interleaved(&bytes, &format), samples.to_vec());
    }

    #[test]
    fn test_partial_frame_dropped() {
        let format = AudioFormat::new(48000, SampleFormat::S16, ChannelLayout::STEREO);
        let decoded = decode_interleaved(&[0u8; 7], &format);
        assert_eq!(decoded.len(), 2);
    }
}
