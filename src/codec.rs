//! Explicit codec registration.
//!
//! Codecs are described by a [`CodecDescriptor`] and collected in a
//! [`CodecRegistry`] that callers build themselves. Nothing registers
//! itself globally: [`CodecRegistry::builtin`] is the one factory that
//! knows which codecs ship with the crate.
//!
//! ```
//! use utahframe::{CodecRegistry, utah_codec};
//!
//! let mut registry = CodecRegistry::new();
//! registry.register(utah_codec());
//!
//! let codec = registry.probe(b"UT\x01\0\0\0\x01\0\0\0\x00").unwrap();
//! assert_eq!(codec.name, "utah");
//! ```

use crate::{
    decoder::UtahDecoder,
    encoder::UtahEncoder,
    error::UtahError,
    format::{self, FILE_EXTENSION, PIXEL_LAYOUT},
    frame::PixelLayout,
};

/// Static description of an image codec.
#[derive(Debug, Clone, Copy)]
pub struct CodecDescriptor {
    /// Short name, unique within a registry.
    pub name: &'static str,
    /// Human-readable name.
    pub long_name: &'static str,
    /// File extension, without the dot.
    pub extension: &'static str,
    /// Pixel layouts the encoder accepts.
    pub pixel_layouts: &'static [PixelLayout],
    /// Every frame decodes on its own.
    pub intra_only: bool,
    /// Returns `true` when a buffer looks like this codec's data.
    pub sniff: fn(&[u8]) -> bool,
}

impl CodecDescriptor {
    /// Whether the encoder accepts `layout`.
    pub fn supports(&self, layout: PixelLayout) -> bool {
        self.pixel_layouts.contains(&layout)
    }
}

/// Descriptor for the UTAH raw-tagged-image codec.
pub fn utah_codec() -> CodecDescriptor {
    CodecDescriptor {
        name: "utah",
        long_name: "UTAH raw-tagged image (RGB8)",
        extension: FILE_EXTENSION,
        pixel_layouts: &[PIXEL_LAYOUT],
        intra_only: true,
        sniff: format::has_magic,
    }
}

/// Create a UTAH decoder.
pub fn utah_decoder() -> UtahDecoder {
    UtahDecoder::new()
}

/// Create a UTAH encoder for frames of `layout` and the given size.
pub fn utah_encoder(layout: PixelLayout, width: u32, height: u32) -> Result<UtahEncoder, UtahError> {
    UtahEncoder::new(layout, width, height)
}

/// An explicitly populated set of codecs.
#[derive(Debug, Clone, Default)]
pub struct CodecRegistry {
    codecs: Vec<CodecDescriptor>,
}

impl CodecRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every codec this crate implements.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(utah_codec());
        registry
    }

    /// Add a codec, replacing any existing entry with the same name.
    pub fn register(&mut self, codec: CodecDescriptor) {
        if let Some(existing) = self.codecs.iter_mut().find(|c| c.name == codec.name) {
            log::debug!("Replacing registered codec {}", codec.name);
            *existing = codec;
        } else {
            log::debug!("Registered codec {}", codec.name);
            self.codecs.push(codec);
        }
    }

    /// Look up a codec by its short name.
    pub fn find_by_name(&self, name: &str) -> Option<&CodecDescriptor> {
        self.codecs.iter().find(|c| c.name == name)
    }

    /// Case-insensitive lookup; a leading dot is ignored.
    pub fn find_by_extension(&self, extension: &str) -> Option<&CodecDescriptor> {
        let extension = extension.trim_start_matches('.');
        self.codecs
            .iter()
            .find(|c| c.extension.eq_ignore_ascii_case(extension))
    }

    /// The first registered codec whose sniffer accepts `bytes`.
    pub fn probe(&self, bytes: &[u8]) -> Option<&CodecDescriptor> {
        self.codecs.iter().find(|c| (c.sniff)(bytes))
    }

    /// Registered codecs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &CodecDescriptor> {
        self.codecs.iter()
    }

    /// Number of registered codecs.
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Whether no codec is registered.
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}
