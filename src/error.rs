//! Error types for the encoding stage

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Encoder error: {0}")]
    Encoder(#[from] EncoderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Setup failures reported by `Encoder::attach`
#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("Encoder is already attached to a playlist")]
    AlreadyAttached,

    #[error("No container format matches the given hints")]
    NoContainer,

    #[error("No encoder found for codec: {0}")]
    NoCodec(String),

    #[error("Unable to create output stream: {0}")]
    Stream(MuxError),

    #[error("Unable to open codec: {0}")]
    CodecOpen(CodecError),

    #[error("Unable to attach sink: {0}")]
    SinkAttach(PlaylistError),

    #[error("Unable to spawn encode thread: {0}")]
    ThreadSpawn(std::io::Error),
}

/// Codec errors
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Encoder initialization failed: {0}")]
    EncoderInit(String),

    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid frame size: {0}")]
    InvalidFrameSize(usize),
}

/// Container muxer errors
#[derive(Error, Debug)]
pub enum MuxError {
    #[error("Codec not supported by container: {0}")]
    UnsupportedCodec(String),

    #[error("Invalid stream parameters: {0}")]
    InvalidParams(String),

    #[error("Write failed: {0}")]
    Write(#[from] std::io::Error),
}

/// Errors raised by the upstream playlist when managing sinks
#[derive(Error, Debug)]
pub enum PlaylistError {
    #[error("Sink format {requested} does not match playlist format {provided}")]
    FormatMismatch { requested: String, provided: String },

    #[error("Sink {0} is already attached")]
    AlreadyAttached(u64),
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;
