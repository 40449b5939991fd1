//! Error types for the `utahframe` crate.
//!
//! Failures are grouped by where they are detected: [`FormatError`] for
//! malformed UTAH data and frame geometry, [`SourceError`] for the media
//! source, [`ResourceError`] for allocation, and [`CodecError`] for the
//! decoder and colour converter. [`UtahError`] wraps all of them and is the
//! error type returned by every fallible public operation.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

use crate::frame::PixelLayout;

/// Malformed UTAH data or invalid frame geometry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FormatError {
    /// The buffer does not start with the `"UT"` signature.
    #[error("Bad magic number (expected \"UT\")")]
    BadMagic,

    /// The buffer ends before the 10-byte header is complete.
    #[error("Truncated header: {len} bytes available, 10 required")]
    TruncatedHeader {
        /// Length of the supplied buffer.
        len: usize,
    },

    /// Zero dimensions, or a header whose payload does not fit the buffer.
    #[error("Invalid dimensions {width}x{height} for a buffer of {buffer_len} bytes")]
    InvalidDimensions {
        /// Declared width in pixels.
        width: u32,
        /// Declared height in pixels.
        height: u32,
        /// Length of the buffer the header was read from (0 when encoding).
        buffer_len: usize,
    },

    /// A frame does not have the dimensions the encoder was opened with.
    #[error("Frame is {found_width}x{found_height}, encoder expects {width}x{height}")]
    DimensionMismatch {
        /// Width declared at encoder initialization.
        width: u32,
        /// Height declared at encoder initialization.
        height: u32,
        /// Width of the offending frame.
        found_width: u32,
        /// Height of the offending frame.
        found_height: u32,
    },

    /// A row stride shorter than one row of pixels.
    #[error("Stride {stride} is smaller than the row width of {row_bytes} bytes")]
    InvalidStride {
        /// Bytes occupied by one row of pixels.
        row_bytes: usize,
        /// The rejected stride.
        stride: usize,
    },

    /// A pixel buffer smaller than `stride * height`.
    #[error("Pixel buffer holds {len} bytes, {required} required")]
    BufferTooSmall {
        /// Minimum length for the declared geometry.
        required: usize,
        /// Actual length.
        len: usize,
    },

    /// The frame is not tagged with the single layout UTAH stores.
    #[error("Unsupported pixel format: {0}")]
    UnsupportedPixelFormat(PixelLayout),
}

/// Failures reported by the media source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SourceError {
    /// The locator could not be opened or its container was not recognised.
    #[error("Failed to open media source {locator}: {reason}")]
    OpenFailed {
        /// Path or URL that was passed in.
        locator: String,
        /// Underlying reason.
        reason: String,
    },

    /// Stream information could not be determined.
    #[error("Failed to probe streams of {locator}: {reason}")]
    ProbeFailed {
        /// Path or URL of the source.
        locator: String,
        /// Underlying reason.
        reason: String,
    },

    /// A packet could not be read.
    #[error("Failed to read packet: {0}")]
    ReadFailed(String),

    /// None of the source's streams is a video stream.
    #[error("No video stream found in source")]
    NoVideoStream,
}

/// Allocation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ResourceError {
    /// The allocator could not provide a buffer of the requested size.
    #[error("Failed to allocate {bytes} bytes")]
    AllocationFailed {
        /// Requested size.
        bytes: usize,
    },
}

/// Failures of the decoder or the colour converter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// No decoder is available for the selected stream's codec.
    #[error("No decoder found for codec {codec}")]
    DecoderNotFound {
        /// Codec name reported by the source.
        codec: String,
    },

    /// The decoder exists but could not be opened.
    #[error("Failed to open decoder for codec {codec}: {reason}")]
    DecoderOpenFailed {
        /// Codec name reported by the source.
        codec: String,
        /// Underlying reason.
        reason: String,
    },

    /// The decoder rejected one packet as corrupt. The extraction loop
    /// skips such packets; they produce no frame.
    #[error("Decoder rejected packet: {0}")]
    InvalidPacket(String),

    /// The decoder failed in a way that is not a per-packet data error.
    #[error("Failed to decode video frame: {0}")]
    DecodeFailed(String),

    /// A decoded frame could not be converted to the requested layout.
    #[error("Failed to convert frame to {target}: {reason}")]
    ConversionFailed {
        /// Requested layout.
        target: PixelLayout,
        /// Underlying reason.
        reason: String,
    },
}

/// The unified error type for all `utahframe` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UtahError {
    /// Malformed UTAH data or frame geometry.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Media source failure.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Allocation failure.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Decoder or converter failure.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// An option value was rejected.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// An output file could not be written.
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        source: IoError,
    },

    /// An I/O error outside of frame persistence.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),

    /// An FFmpeg error not attributable to a more specific stage.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),
}

impl From<FfmpegError> for UtahError {
    fn from(error: FfmpegError) -> Self {
        UtahError::Ffmpeg(error.to_string())
    }
}
