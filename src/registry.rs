//! Codec and container lookup
//!
//! Resolves the caller's selection hints (container short name, output
//! filename, MIME type, codec short name) to registered descriptors.

use std::path::Path;
use std::sync::Arc;

use crate::codec::{CodecDescriptor, OpusCodec, PcmCodec};
use crate::mux::{ContainerFormat, OggFormat, RawFormat, WavFormat};

const SCORE_NAME: u32 = 100;
const SCORE_MIME: u32 = 10;
const SCORE_EXTENSION: u32 = 5;

#[derive(Clone, Default)]
pub struct Registry {
    containers: Vec<Arc<dyn ContainerFormat>>,
    codecs: Vec<Arc<dyn CodecDescriptor>>,
}

impl Registry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in codec and container
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_container(Arc::new(WavFormat));
        registry.register_container(Arc::new(OggFormat));
        registry.register_container(Arc::new(RawFormat::s16le()));
        registry.register_container(Arc::new(RawFormat::f32le()));
        registry.register_codec(Arc::new(PcmCodec::s16le()));
        registry.register_codec(Arc::new(PcmCodec::f32le()));
        registry.register_codec(Arc::new(OpusCodec));
        registry
    }

    pub fn register_container(&mut self, container: Arc<dyn ContainerFormat>) {
        self.containers.push(container);
    }

    pub fn register_codec(&mut self, codec: Arc<dyn CodecDescriptor>) {
        self.codecs.push(codec);
    }

    /// Pick the container best matching the hints.
    ///
    /// A short-name match outweighs a MIME match, which outweighs a
    /// filename extension match. Earlier registrations win ties.
    pub fn guess_container(
        &self,
        short_name: Option<&str>,
        filename: Option<&str>,
        mime_type: Option<&str>,
    ) -> Option<Arc<dyn ContainerFormat>> {
        let extension = filename
            .and_then(|f| Path::new(f).extension())
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let mut best: Option<(u32, &Arc<dyn ContainerFormat>)> = None;
        for container in &self.containers {
            let mut score = 0;
            if short_name.is_some_and(|name| name.eq_ignore_ascii_case(container.name())) {
                score += SCORE_NAME;
            }
            if mime_type.is_some_and(|mime| container.mime_types().iter().any(|m| m.eq_ignore_ascii_case(mime))) {
                score += SCORE_MIME;
            }
            if let Some(ext) = &extension {
                if container.extensions().iter().any(|e| *e == ext.as_str()) {
                    score += SCORE_EXTENSION;
                }
            }

            if score > best.map_or(0, |(s, _)| s) {
                best = Some((score, container));
            }
        }

        best.map(|(_, container)| Arc::clone(container))
    }

    /// Codec to use inside `container`: the named one if given, else the
    /// container's default
    pub fn guess_codec(&self, container: &dyn ContainerFormat, codec_short_name: Option<&str>) -> String {
        codec_short_name
            .map(str::to_string)
            .unwrap_or_else(|| container.default_codec().to_string())
    }

    pub fn find_codec(&self, name: &str) -> Option<Arc<dyn CodecDescriptor>> {
        self.codecs.iter().find(|c| c.name() == name).cloned()
    }
}
