//! # Stream Encoder
//!
//! Streaming audio encoder stage: pulls decoded audio from a playlist,
//! encodes and muxes it, and hands out ready-to-send container bytes.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                            PLAYLIST SIDE                             │
//! │   ┌─────────────┐   push / end_of_stream   ┌─────────────────────┐   │
//! │   │  Playlist   │ ───────────────────────▶ │   Sink (sink::Sink) │   │
//! │   │ (sink::Feed)│ ── purge(item) / flush ─▶│   negotiated format │   │
//! │   └─────────────┘                          └──────────┬──────────┘   │
//! └───────────────────────────────────────────────────────┼──────────────┘
//!                                                         │ get_buffer
//!                                                         ▼
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                    ENCODE THREAD (encoder::worker)                   │
//! │   ┌──────────────┐   packets   ┌──────────────┐   bytes              │
//! │   │ AudioEncoder │ ──────────▶ │    Muxer     │ ──────┐              │
//! │   │ (codec::*)   │             │   (mux::*)   │       │              │
//! │   └──────────────┘             └──────────────┘       ▼              │
//! │                                            ┌──────────────────────┐  │
//! │                                            │ OutputWriter (tagged │  │
//! │                                            │ with item/position)  │  │
//! │                                            └──────────┬───────────┘  │
//! └───────────────────────────────────────────────────────┼──────────────┘
//!                                                         ▼
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │        Output queue ──▶ Encoder::get_buffer ──▶ consumer             │
//! │        [packet][packet]...[packet][END]   one END per segment        │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

pub mod audio;
pub mod codec;
pub mod config;
pub mod encoder;
pub mod error;
pub mod mux;
pub mod queue;
pub mod registry;
pub mod sink;

pub use config::EncoderConfig;
pub use encoder::{EncodedRead, Encoder, EncoderState, EncoderStats};
pub use error::{Error, Result};
pub use registry::Registry;

/// Application-wide constants
pub mod constants {
    /// Default sample rate for the target format
    pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

    /// Default encoder bit rate in bits per second
    pub const DEFAULT_BIT_RATE: u32 = 128_000;

    /// Opus frame duration in milliseconds
    pub const OPUS_FRAME_MS: f32 = 20.0;

    /// Position value meaning "no position"
    pub const UNSET_POSITION: f64 = -1.0;
}
