//! Stride-aware in-memory frames.
//!
//! A [`Frame`] is a single plane of packed pixels whose rows may be padded:
//! row `y` starts at `y * stride` and holds `width * bytes_per_pixel`
//! meaningful bytes. The padding never leaves memory; the UTAH codec strips
//! it on encode and the decoder introduces its own on decode.

use std::fmt::{Display, Formatter, Result as FmtResult};

use ffmpeg_next::format::Pixel;
use image::RgbImage;

use crate::error::{FormatError, ResourceError, UtahError};

/// Row alignment used by [`Frame::new`], matching FFmpeg's default buffer
/// alignment.
///
/// [`Frame::new`] pads every row to this size, so a one-pixel-wide RGB8
/// frame takes 32 bytes per row. [`UtahDecoder`](crate::UtahDecoder) caps
/// the padding for narrow images it decodes from untrusted input.
pub const DEFAULT_STRIDE_ALIGNMENT: usize = 32;

/// Packed pixel layouts a [`Frame`] can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelLayout {
    /// One byte per pixel, 3-3-2 bits (msb red, lsb blue). The only layout
    /// UTAH files store.
    Rgb8,
    /// Three bytes per pixel, R then G then B.
    Rgb24,
}

impl PixelLayout {
    /// Bytes occupied by one pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Rgb8 => 1,
            PixelLayout::Rgb24 => 3,
        }
    }

    /// Map to the corresponding FFmpeg pixel format.
    pub(crate) fn to_ffmpeg_pixel(self) -> Pixel {
        match self {
            PixelLayout::Rgb8 => Pixel::RGB8,
            PixelLayout::Rgb24 => Pixel::RGB24,
        }
    }
}

impl Display for PixelLayout {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            PixelLayout::Rgb8 => "rgb8",
            PixelLayout::Rgb24 => "rgb24",
        };
        f.write_str(name)
    }
}

/// A single-plane frame with an explicit row stride.
///
/// Invariants, checked by every constructor: width and height are
/// non-zero, `stride >= width * bytes_per_pixel`, and the buffer holds at
/// least `stride * height` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    layout: PixelLayout,
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
    key_frame: bool,
}

impl Frame {
    /// Allocate a zeroed frame whose stride is the row width rounded up to
    /// [`DEFAULT_STRIDE_ALIGNMENT`].
    ///
    /// # Errors
    ///
    /// [`FormatError::InvalidDimensions`] for zero or overflowing
    /// dimensions, [`ResourceError::AllocationFailed`] if the buffer cannot
    /// be allocated.
    pub fn new(layout: PixelLayout, width: u32, height: u32) -> Result<Self, UtahError> {
        Self::with_alignment(layout, width, height, DEFAULT_STRIDE_ALIGNMENT)
    }

    /// Allocate a zeroed frame whose stride is the row width rounded up to
    /// a multiple of `alignment` (values below 1 are treated as 1).
    pub fn with_alignment(
        layout: PixelLayout,
        width: u32,
        height: u32,
        alignment: usize,
    ) -> Result<Self, UtahError> {
        let row_bytes = row_bytes(layout, width, height)?;
        let stride = align_up(row_bytes, alignment.max(1)).ok_or(
            FormatError::InvalidDimensions {
                width,
                height,
                buffer_len: 0,
            },
        )?;
        Self::with_stride(layout, width, height, stride)
    }

    /// Allocate a zeroed frame with an explicit stride.
    pub fn with_stride(
        layout: PixelLayout,
        width: u32,
        height: u32,
        stride: usize,
    ) -> Result<Self, UtahError> {
        let required = required_len(layout, width, height, stride)?;
        let data = zeroed_buffer(required)?;
        Ok(Self {
            layout,
            width,
            height,
            stride,
            data,
            key_frame: false,
        })
    }

    /// Wrap an existing buffer.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] if the geometry is invalid or `data` is
    /// shorter than `stride * height`.
    pub fn from_raw(
        layout: PixelLayout,
        width: u32,
        height: u32,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self, FormatError> {
        let required = required_len(layout, width, height, stride)?;
        if data.len() < required {
            return Err(FormatError::BufferTooSmall {
                required,
                len: data.len(),
            });
        }
        Ok(Self {
            layout,
            width,
            height,
            stride,
            data,
            key_frame: false,
        })
    }

    /// Wrap a tightly packed buffer (stride equals the row width).
    pub fn from_packed(
        layout: PixelLayout,
        width: u32,
        height: u32,
        data: Vec<u8>,
    ) -> Result<Self, FormatError> {
        let stride = row_bytes(layout, width, height)?;
        Self::from_raw(layout, width, height, stride, data)
    }

    /// Quantize an RGB image into a frame of the given layout.
    pub fn from_rgb_image(image: &RgbImage, layout: PixelLayout) -> Result<Self, UtahError> {
        let mut frame = Self::new(layout, image.width(), image.height())?;
        for (row, pixels) in frame.rows_mut().zip(image.rows()) {
            match layout {
                PixelLayout::Rgb8 => {
                    for (byte, pixel) in row.iter_mut().zip(pixels) {
                        *byte = rgb_to_rgb332(pixel.0);
                    }
                }
                PixelLayout::Rgb24 => {
                    for (chunk, pixel) in row.chunks_exact_mut(3).zip(pixels) {
                        chunk.copy_from_slice(&pixel.0);
                    }
                }
            }
        }
        frame.key_frame = true;
        Ok(frame)
    }

    /// Expand the frame into a 24-bit RGB image.
    pub fn to_rgb_image(&self) -> RgbImage {
        let mut buffer = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for row in self.rows() {
            match self.layout {
                PixelLayout::Rgb8 => {
                    for &byte in row {
                        buffer.extend_from_slice(&rgb332_to_rgb(byte));
                    }
                }
                PixelLayout::Rgb24 => buffer.extend_from_slice(row),
            }
        }
        // Buffer length is exactly width * height * 3 by construction.
        RgbImage::from_raw(self.width, self.height, buffer)
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    /// Pixel layout of the buffer.
    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Byte distance between the starts of consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Meaningful bytes per row (`width * bytes_per_pixel`).
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.layout.bytes_per_pixel()
    }

    /// The whole buffer, padding included.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the whole buffer, padding included.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Whether the frame decodes independently of any other frame.
    pub fn is_key_frame(&self) -> bool {
        self.key_frame
    }

    /// Mark the frame as independently decodable or not.
    pub fn set_key_frame(&mut self, key_frame: bool) {
        self.key_frame = key_frame;
    }

    /// The meaningful bytes of row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.row_bytes()]
    }

    /// Iterate over the meaningful bytes of every row, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        let row_bytes = self.row_bytes();
        self.data
            .chunks(self.stride)
            .take(self.height as usize)
            .map(move |row| &row[..row_bytes])
    }

    /// Mutable counterpart of [`rows`](Frame::rows).
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u8]> {
        let row_bytes = self.row_bytes();
        self.data
            .chunks_mut(self.stride)
            .take(self.height as usize)
            .map(move |row| &mut row[..row_bytes])
    }

    /// Copy the pixels into a tightly packed buffer.
    pub fn to_packed(&self) -> Vec<u8> {
        if self.stride == self.row_bytes() {
            return self.data[..self.stride * self.height as usize].to_vec();
        }
        let mut buffer = Vec::with_capacity(self.row_bytes() * self.height as usize);
        for row in self.rows() {
            buffer.extend_from_slice(row);
        }
        buffer
    }

    /// Compare layout, dimensions and pixels, ignoring stride and padding.
    pub fn same_pixels(&self, other: &Frame) -> bool {
        self.layout == other.layout
            && self.width == other.width
            && self.height == other.height
            && self.rows().eq(other.rows())
    }
}

/// Expand a 3-3-2 RGB8 pixel to 24-bit RGB.
pub fn rgb332_to_rgb(value: u8) -> [u8; 3] {
    let red = (value >> 5) & 0x07;
    let green = (value >> 2) & 0x07;
    let blue = value & 0x03;
    [
        (red as u16 * 255 / 7) as u8,
        (green as u16 * 255 / 7) as u8,
        (blue as u16 * 255 / 3) as u8,
    ]
}

/// Quantize a 24-bit RGB pixel to 3-3-2 RGB8.
pub fn rgb_to_rgb332([red, green, blue]: [u8; 3]) -> u8 {
    (red & 0xE0) | ((green >> 5) << 2) | (blue >> 6)
}

/// Allocate a zeroed buffer, reporting allocator failure instead of
/// aborting.
pub(crate) fn zeroed_buffer(len: usize) -> Result<Vec<u8>, ResourceError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| ResourceError::AllocationFailed { bytes: len })?;
    buffer.resize(len, 0);
    Ok(buffer)
}

fn row_bytes(layout: PixelLayout, width: u32, height: u32) -> Result<usize, FormatError> {
    let invalid = FormatError::InvalidDimensions {
        width,
        height,
        buffer_len: 0,
    };
    if width == 0 || height == 0 {
        return Err(invalid);
    }
    (width as usize)
        .checked_mul(layout.bytes_per_pixel())
        .ok_or(invalid)
}

fn required_len(
    layout: PixelLayout,
    width: u32,
    height: u32,
    stride: usize,
) -> Result<usize, FormatError> {
    let row_bytes = row_bytes(layout, width, height)?;
    if stride < row_bytes {
        return Err(FormatError::InvalidStride { row_bytes, stride });
    }
    stride
        .checked_mul(height as usize)
        .ok_or(FormatError::InvalidDimensions {
            width,
            height,
            buffer_len: 0,
        })
}

fn align_up(value: usize, alignment: usize) -> Option<usize> {
    value
        .checked_add(alignment - 1)
        .map(|padded| padded / alignment * alignment)
}
