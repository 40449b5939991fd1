//! UTAH encoding.
//!
//! [`UtahEncoder`] is opened for one pixel layout and one image size and
//! then turns any number of frames of that size into UTAH bytes. The layout
//! check happens when the encoder is created; a second check on every
//! frame rejects mislabelled input before anything is written.
//!
//! # Example
//!
//! ```
//! use utahframe::{Frame, PixelLayout, UtahEncoder};
//!
//! let frame = Frame::from_packed(PixelLayout::Rgb8, 2, 2, vec![1, 2, 3, 4])?;
//! let mut encoder = UtahEncoder::new(PixelLayout::Rgb8, 2, 2)?;
//! let encoded = encoder.encode(&frame)?;
//! assert_eq!(&encoded.data()[..2], b"UT");
//! assert_eq!(encoded.data().len(), 14);
//! # Ok::<(), utahframe::UtahError>(())
//! ```

use crate::{
    error::{FormatError, UtahError},
    format::{HEADER_LEN, PIXEL_LAYOUT, UtahHeader},
    frame::{Frame, PixelLayout, zeroed_buffer},
};

/// One encoded image, borrowed from the encoder's output buffer.
#[derive(Debug, Clone, Copy)]
pub struct EncodedFrame<'a> {
    data: &'a [u8],
}

impl<'a> EncodedFrame<'a> {
    /// The encoded bytes, header included.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Always `true`: every UTAH image decodes on its own.
    pub fn is_key_frame(&self) -> bool {
        true
    }
}

/// Stateless-per-frame UTAH encoder with one reusable output buffer of
/// exactly `10 + width * height` bytes.
#[derive(Debug)]
pub struct UtahEncoder {
    header: UtahHeader,
    buffer: Vec<u8>,
}

impl UtahEncoder {
    /// Open an encoder for frames of `layout` and the given size.
    ///
    /// # Errors
    ///
    /// - [`FormatError::UnsupportedPixelFormat`] unless `layout` is
    ///   [`PixelLayout::Rgb8`].
    /// - [`FormatError::InvalidDimensions`] for zero dimensions.
    /// - [`ResourceError::AllocationFailed`](crate::ResourceError::AllocationFailed)
    ///   if the output buffer cannot be allocated.
    pub fn new(layout: PixelLayout, width: u32, height: u32) -> Result<Self, UtahError> {
        if layout != PIXEL_LAYOUT {
            log::info!("UTAH encoder rejected pixel format {layout}");
            return Err(FormatError::UnsupportedPixelFormat(layout).into());
        }
        let header = UtahHeader::new(width, height)?;
        let buffer = zeroed_buffer(HEADER_LEN + header.payload_len().unwrap_or(0))?;
        Ok(Self { header, buffer })
    }

    /// Width the encoder was opened for.
    pub fn width(&self) -> u32 {
        self.header.width()
    }

    /// Height the encoder was opened for.
    pub fn height(&self) -> u32 {
        self.header.height()
    }

    /// Encode one frame. The frame may have any stride; the output is the
    /// same for identical pixels.
    ///
    /// # Errors
    ///
    /// [`FormatError::UnsupportedPixelFormat`] if the frame is not RGB8,
    /// [`FormatError::DimensionMismatch`] if its size differs from the one
    /// the encoder was opened with.
    pub fn encode(&mut self, frame: &Frame) -> Result<EncodedFrame<'_>, UtahError> {
        if frame.layout() != PIXEL_LAYOUT {
            return Err(FormatError::UnsupportedPixelFormat(frame.layout()).into());
        }
        if frame.width() != self.width() || frame.height() != self.height() {
            return Err(FormatError::DimensionMismatch {
                width: self.width(),
                height: self.height(),
                found_width: frame.width(),
                found_height: frame.height(),
            }
            .into());
        }

        let width = self.width() as usize;
        let (header, payload) = self.buffer.split_at_mut(HEADER_LEN);
        header.copy_from_slice(&self.header.to_bytes());
        for (destination, source) in payload.chunks_exact_mut(width).zip(frame.rows()) {
            destination.copy_from_slice(source);
        }

        Ok(EncodedFrame { data: &self.buffer })
    }

    /// Consume the encoder and return its output buffer, which holds the
    /// last encoded image.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// Encode a single RGB8 frame into an owned buffer.
pub fn encode_image(frame: &Frame) -> Result<Vec<u8>, UtahError> {
    let mut encoder = UtahEncoder::new(frame.layout(), frame.width(), frame.height())?;
    encoder.encode(frame)?;
    Ok(encoder.into_bytes())
}
