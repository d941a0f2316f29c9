//! Audio format description
//!
//! Sample formats, channel layouts and the combined [`AudioFormat`] value
//! that flows through negotiation, sinks and buffer tagging.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::DEFAULT_SAMPLE_RATE;

/// Sample storage format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    U8,
    S16,
    S32,
    Flt,
    Dbl,
    U8P,
    S16P,
    S32P,
    FltP,
    DblP,
}

impl SampleFormat {
    /// Size of one sample of one channel
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::U8 | SampleFormat::U8P => 1,
            SampleFormat::S16 | SampleFormat::S16P => 2,
            SampleFormat::S32 | SampleFormat::S32P | SampleFormat::Flt | SampleFormat::FltP => 4,
            SampleFormat::Dbl | SampleFormat::DblP => 8,
        }
    }

    pub fn is_planar(self) -> bool {
        matches!(
            self,
            SampleFormat::U8P
                | SampleFormat::S16P
                | SampleFormat::S32P
                | SampleFormat::FltP
                | SampleFormat::DblP
        )
    }

    /// Interleaved variant of this format
    pub fn packed(self) -> Self {
        match self {
            SampleFormat::U8P => SampleFormat::U8,
            SampleFormat::S16P => SampleFormat::S16,
            SampleFormat::S32P => SampleFormat::S32,
            SampleFormat::FltP => SampleFormat::Flt,
            SampleFormat::DblP => SampleFormat::Dbl,
            packed => packed,
        }
    }

    /// Planar variant of this format
    pub fn planar(self) -> Self {
        match self {
            SampleFormat::U8 => SampleFormat::U8P,
            SampleFormat::S16 => SampleFormat::S16P,
            SampleFormat::S32 => SampleFormat::S32P,
            SampleFormat::Flt => SampleFormat::FltP,
            SampleFormat::Dbl => SampleFormat::DblP,
            planar => planar,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SampleFormat::U8 => "u8",
            SampleFormat::S16 => "s16",
            SampleFormat::S32 => "s32",
            SampleFormat::Flt => "flt",
            SampleFormat::Dbl => "dbl",
            SampleFormat::U8P => "u8p",
            SampleFormat::S16P => "s16p",
            SampleFormat::S32P => "s32p",
            SampleFormat::FltP => "fltp",
            SampleFormat::DblP => "dblp",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Speaker layout as a bitmask of channel positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelLayout(u64);

impl ChannelLayout {
    pub const FRONT_LEFT: u64 = 0x1;
    pub const FRONT_RIGHT: u64 = 0x2;
    pub const FRONT_CENTER: u64 = 0x4;
    pub const LOW_FREQUENCY: u64 = 0x8;
    pub const BACK_LEFT: u64 = 0x10;
    pub const BACK_RIGHT: u64 = 0x20;
    pub const SIDE_LEFT: u64 = 0x200;
    pub const SIDE_RIGHT: u64 = 0x400;

    pub const MONO: Self = Self(Self::FRONT_CENTER);
    pub const STEREO: Self = Self(Self::FRONT_LEFT | Self::FRONT_RIGHT);
    pub const LAYOUT_2_1: Self = Self(Self::STEREO.0 | Self::LOW_FREQUENCY);
    pub const SURROUND: Self = Self(Self::STEREO.0 | Self::FRONT_CENTER);
    pub const QUAD: Self = Self(Self::STEREO.0 | Self::BACK_LEFT | Self::BACK_RIGHT);
    pub const LAYOUT_5_0: Self = Self(Self::SURROUND.0 | Self::SIDE_LEFT | Self::SIDE_RIGHT);
    pub const LAYOUT_5_1: Self = Self(Self::LAYOUT_5_0.0 | Self::LOW_FREQUENCY);
    pub const LAYOUT_7_1: Self = Self(Self::LAYOUT_5_1.0 | Self::BACK_LEFT | Self::BACK_RIGHT);

    const NAMED: [(&'static str, ChannelLayout); 8] = [
        ("mono", Self::MONO),
        ("stereo", Self::STEREO),
        ("2.1", Self::LAYOUT_2_1),
        ("3.0", Self::SURROUND),
        ("quad", Self::QUAD),
        ("5.0", Self::LAYOUT_5_0),
        ("5.1", Self::LAYOUT_5_1),
        ("7.1", Self::LAYOUT_7_1),
    ];

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub fn channel_count(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Default layout for a channel count, if one is known
    pub fn default_for_channels(channels: usize) -> Option<Self> {
        Self::NAMED
            .iter()
            .map(|&(_, layout)| layout)
            .find(|layout| layout.channel_count() == channels)
    }

    fn name(self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|&&(_, layout)| layout == self)
            .map(|&(name, _)| name)
    }
}

impl fmt::Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{} channels (0x{:x})", self.channel_count(), self.0),
        }
    }
}

impl FromStr for ChannelLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if let Some(&(_, layout)) = Self::NAMED.iter().find(|(name, _)| *name == lower) {
            return Ok(layout);
        }
        if let Some(hex) = lower.strip_prefix("0x") {
            return u64::from_str_radix(hex, 16)
                .map(Self)
                .map_err(|e| format!("Invalid channel mask {}: {}", s, e));
        }
        Err(format!("Unknown channel layout: {}", s))
    }
}

impl TryFrom<String> for ChannelLayout {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChannelLayout> for String {
    fn from(layout: ChannelLayout) -> Self {
        match layout.name() {
            Some(name) => name.to_string(),
            None => format!("0x{:x}", layout.0),
        }
    }
}

/// Complete description of a PCM stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub sample_format: SampleFormat,
    pub channel_layout: ChannelLayout,
}

impl AudioFormat {
    pub fn new(sample_rate: u32, sample_format: SampleFormat, channel_layout: ChannelLayout) -> Self {
        Self {
            sample_rate,
            sample_format,
            channel_layout,
        }
    }

    pub fn channels(&self) -> usize {
        self.channel_layout.channel_count()
    }

    /// Bytes occupied by one sample frame (all channels)
    pub fn bytes_per_frame(&self) -> usize {
        self.sample_format.bytes_per_sample() * self.channels()
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            sample_format: SampleFormat::S16,
            channel_layout: ChannelLayout::STEREO,
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {} Hz, {}", self.sample_format, self.sample_rate, self.channel_layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_and_planar() {
        assert_eq!(SampleFormat::FltP.packed(), SampleFormat::Flt);
        assert_eq!(SampleFormat::S16.packed(), SampleFormat::S16);
        assert_eq!(SampleFormat::S32.planar(), SampleFormat::S32P);
        assert!(SampleFormat::DblP.is_planar());
        assert_eq!(SampleFormat::S16P.bytes_per_sample(), 2);
    }

    #[test]
    fn test_layout_channel_counts() {
        assert_eq!(ChannelLayout::MONO.channel_count(), 1);
        assert_eq!(ChannelLayout::STEREO.channel_count(), 2);
        assert_eq!(ChannelLayout::LAYOUT_5_1.channel_count(), 6);
        assert_eq!(ChannelLayout::LAYOUT_7_1.channel_count(), 8);
        assert_eq!(ChannelLayout::default_for_channels(6), Some(ChannelLayout::LAYOUT_5_1));
    }

    #[test]
    fn test_layout_parse_and_display() {
        assert_eq!("5.1".parse::<ChannelLayout>().unwrap(), ChannelLayout::LAYOUT_5_1);
        assert_eq!("Stereo".parse::<ChannelLayout>().unwrap(), ChannelLayout::STEREO);
        assert_eq!("0x3".parse::<ChannelLayout>().unwrap(), ChannelLayout::STEREO);
        assert!("sideways".parse::<ChannelLayout>().is_err());
        assert_eq!(ChannelLayout::QUAD.to_string(), "quad");
    }

    #[test]
    fn test_default_format() {
        let format = AudioFormat::default();
        assert_eq!(format.sample_rate, 44100);
        assert_eq!(format.sample_format, SampleFormat::S16);
        assert_eq!(format.channel_layout, ChannelLayout::STEREO);
        assert_eq!(format.bytes_per_frame(), 4);
        assert_eq!(format.to_string(), "s16, 44100 Hz, stereo");
    }
}
