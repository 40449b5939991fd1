//! UTAH decoding.
//!
//! [`UtahDecoder`] turns an encoded buffer into a [`Frame`] whose rows are
//! laid out with the decoder's own stride convention.
//!
//! Rows narrower than the configured alignment are padded only up to the
//! next power of two of their width. A decoded frame therefore never takes
//! twice the memory of the payload it came from, however tall and narrow
//! the image claims to be.
//!
//! # Buffer ownership
//!
//! A decoder owns at most one frame at a time. On each call to
//! [`decode`](UtahDecoder::decode):
//!
//! - if the held frame has the same width and height as the new image, it
//!   is overwritten in place;
//! - otherwise it is released first and a new frame is allocated.
//!
//! The frame returned by `decode` borrows the decoder, so it cannot be
//! observed while the next image is being written into it. Use
//! [`take_frame`](UtahDecoder::take_frame) to keep a frame past the next
//! call.
//!
//! # Example
//!
//! ```
//! use utahframe::UtahDecoder;
//!
//! let bytes = [b'U', b'T', 2, 0, 0, 0, 1, 0, 0, 0, 7, 9];
//! let mut decoder = UtahDecoder::new();
//! let frame = decoder.decode(&bytes)?;
//! assert_eq!(frame.row(0), &[7, 9]);
//! # Ok::<(), utahframe::UtahError>(())
//! ```

use crate::{
    error::UtahError,
    format::{HEADER_LEN, PIXEL_LAYOUT, UtahHeader},
    frame::{DEFAULT_STRIDE_ALIGNMENT, Frame},
};

/// Stateful UTAH decoder owning one reusable frame.
#[derive(Debug)]
pub struct UtahDecoder {
    frame: Option<Frame>,
    alignment: usize,
}

impl Default for UtahDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl UtahDecoder {
    /// Create a decoder that pads rows to [`DEFAULT_STRIDE_ALIGNMENT`].
    pub fn new() -> Self {
        Self::with_stride_alignment(DEFAULT_STRIDE_ALIGNMENT)
    }

    /// Create a decoder that pads rows to a multiple of `alignment` bytes.
    /// An alignment of 1 produces packed frames.
    ///
    /// Narrow rows use a smaller alignment, see
    /// [`stride_alignment_for`](UtahDecoder::stride_alignment_for).
    pub fn with_stride_alignment(alignment: usize) -> Self {
        Self {
            frame: None,
            alignment: alignment.max(1),
        }
    }

    /// Decode one UTAH image.
    ///
    /// # Errors
    ///
    /// - [`FormatError::BadMagic`](crate::FormatError::BadMagic) if the
    ///   buffer does not start with `"UT"`.
    /// - [`FormatError::TruncatedHeader`](crate::FormatError::TruncatedHeader)
    ///   if the header is incomplete.
    /// - [`FormatError::InvalidDimensions`](crate::FormatError::InvalidDimensions)
    ///   for zero dimensions or a payload longer than the buffer.
    /// - [`ResourceError::AllocationFailed`](crate::ResourceError::AllocationFailed)
    ///   if a new frame cannot be allocated.
    pub fn decode(&mut self, bytes: &[u8]) -> Result<&Frame, UtahError> {
        let frame = self.fill(bytes)?;
        Ok(self.frame.insert(frame))
    }

    /// Validate `bytes` and copy its payload into the held frame (or a
    /// fresh one), returning it by value.
    fn fill(&mut self, bytes: &[u8]) -> Result<Frame, UtahError> {
        let header = UtahHeader::parse(bytes)?;
        let (width, height) = (header.width(), header.height());

        let mut frame = match self.frame.take() {
            Some(frame) if frame.width() == width && frame.height() == height => frame,
            released => {
                drop(released);
                let alignment = self.stride_alignment_for(width);
                Frame::with_alignment(PIXEL_LAYOUT, width, height, alignment)?
            }
        };

        let payload = &bytes[HEADER_LEN..];
        for (destination, source) in frame
            .rows_mut()
            .zip(payload.chunks_exact(width as usize))
        {
            destination.copy_from_slice(source);
        }
        frame.set_key_frame(true);

        let used = HEADER_LEN + width as usize * height as usize;
        if bytes.len() > used {
            log::trace!("Ignoring {} trailing bytes after UTAH payload", bytes.len() - used);
        }

        Ok(frame)
    }

    /// Alignment applied to rows of an image `width` pixels wide: the
    /// configured alignment, capped at the next power of two of the row
    /// width.
    pub fn stride_alignment_for(&self, width: u32) -> usize {
        let row_bytes = width as usize * PIXEL_LAYOUT.bytes_per_pixel();
        self.alignment.min(row_bytes.next_power_of_two())
    }

    /// The frame produced by the last successful decode, if still held.
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    /// Move the held frame out; the next decode allocates a fresh one.
    pub fn take_frame(&mut self) -> Option<Frame> {
        self.frame.take()
    }
}

/// Decode a single image into an owned frame.
pub fn decode_image(bytes: &[u8]) -> Result<Frame, UtahError> {
    UtahDecoder::new().fill(bytes)
}
