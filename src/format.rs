//! The UTAH raw-tagged-image layout.
//!
//! ```text
//! offset  size  field
//!      0     2  magic, b"UT"
//!      2     4  width in pixels, little-endian u32
//!      6     4  height in pixels, little-endian u32
//!     10   w*h  pixels, RGB8 (3-3-2), rows packed back to back
//! ```
//!
//! Width and height read from a buffer are untrusted: [`UtahHeader::parse`]
//! rejects zero dimensions and any header whose payload would run past the
//! end of the buffer before a single payload byte is touched.

use crate::{error::FormatError, frame::PixelLayout};

/// File signature.
pub const MAGIC: [u8; 2] = *b"UT";

/// Size of the fixed header in bytes.
pub const HEADER_LEN: usize = 10;

/// Extension used for UTAH files.
pub const FILE_EXTENSION: &str = "utah";

/// The only pixel layout UTAH stores.
pub const PIXEL_LAYOUT: PixelLayout = PixelLayout::Rgb8;

/// Returns `true` if `bytes` starts with the UTAH signature.
pub fn has_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(&MAGIC)
}

/// A validated UTAH header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtahHeader {
    width: u32,
    height: u32,
}

impl UtahHeader {
    /// Create a header for an image of the given size.
    ///
    /// # Errors
    ///
    /// [`FormatError::InvalidDimensions`] if either dimension is zero or the
    /// encoded size does not fit in `usize`.
    pub fn new(width: u32, height: u32) -> Result<Self, FormatError> {
        let header = Self { width, height };
        if width == 0 || height == 0 || header.encoded_len().is_none() {
            return Err(FormatError::InvalidDimensions {
                width,
                height,
                buffer_len: 0,
            });
        }
        Ok(header)
    }

    /// Read and validate the header at the start of `bytes`.
    ///
    /// Checks, in order: the signature, the header length, non-zero
    /// dimensions, and that `HEADER_LEN + width * height` fits in `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        if !has_magic(bytes) {
            return Err(FormatError::BadMagic);
        }
        let Some(header) = bytes.get(..HEADER_LEN) else {
            return Err(FormatError::TruncatedHeader { len: bytes.len() });
        };

        let width = read_le32(&header[2..6]);
        let height = read_le32(&header[6..10]);
        let invalid = FormatError::InvalidDimensions {
            width,
            height,
            buffer_len: bytes.len(),
        };

        if width == 0 || height == 0 {
            return Err(invalid);
        }
        let header = Self { width, height };
        match header.encoded_len() {
            Some(len) if len <= bytes.len() => Ok(header),
            _ => Err(invalid),
        }
    }

    /// Declared width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Declared height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Payload size in bytes, `None` on overflow.
    pub fn payload_len(&self) -> Option<usize> {
        (self.width as usize).checked_mul(self.height as usize)
    }

    /// Total encoded size in bytes, `None` on overflow.
    pub fn encoded_len(&self) -> Option<usize> {
        self.payload_len()?.checked_add(HEADER_LEN)
    }

    /// The 10 header bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0; HEADER_LEN];
        bytes[..2].copy_from_slice(&MAGIC);
        bytes[2..6].copy_from_slice(&self.width.to_le_bytes());
        bytes[6..10].copy_from_slice(&self.height.to_le_bytes());
        bytes
    }
}

fn read_le32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
