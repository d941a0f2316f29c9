//! Audio data model: formats, shared buffers and format negotiation

pub mod buffer;
pub mod convert;
pub mod format;
pub mod negotiate;

pub use buffer::{Buffer, BufferKind, ItemId};
pub use format::{AudioFormat, ChannelLayout, SampleFormat};
pub use negotiate::{negotiate, CodecCapabilities};
