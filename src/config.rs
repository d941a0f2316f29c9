//! Encoder configuration
//!
//! Settings are plain serde structs so they can be loaded from TOML:
//!
//! ```toml
//! bit_rate = 96000
//! format_short_name = "ogg"
//!
//! [target_format]
//! sample_rate = 48000
//! sample_format = "flt"
//! channel_layout = "stereo"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::audio::AudioFormat;
use crate::constants::DEFAULT_BIT_RATE;
use crate::error::{Error, Result};

/// Everything the caller sets before `Encoder::attach`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Bits per second; 0 leaves the choice to the codec
    pub bit_rate: u32,
    /// Container short name, e.g. "ogg"
    pub format_short_name: Option<String>,
    /// Codec short name, e.g. "opus"
    pub codec_short_name: Option<String>,
    /// Output filename, used only for guessing the container
    pub filename: Option<String>,
    /// Output MIME type, used only for guessing the container
    pub mime_type: Option<String>,
    /// Desired format; the codec may force a different one
    pub target_format: AudioFormat,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            bit_rate: DEFAULT_BIT_RATE,
            format_short_name: None,
            codec_short_name: None,
            filename: None,
            mime_type: None,
            target_format: AudioFormat::default(),
        }
    }
}

impl EncoderConfig {
    /// Config selecting a container by short name
    pub fn for_container(short_name: &str) -> Self {
        Self {
            format_short_name: Some(short_name.to_string()),
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Per-user config file location
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "stream-encoder")
            .map(|dirs| dirs.config_dir().join("encoder.toml"))
    }

    /// Load the per-user config file, falling back to defaults when it is
    /// absent
    pub fn load_or_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }
}
