//! # utahframe
//!
//! Extract video frames into UTAH raw-tagged images.
//!
//! UTAH is a minimal still-image format: a two-byte `"UT"` signature, the
//! width and height as little-endian `u32`s, then one RGB8 (3-3-2) byte per
//! pixel, rows packed back to back. `utahframe` provides a stride-aware
//! [`UtahEncoder`] and [`UtahDecoder`] for it, and a [`FrameExtractor`]
//! that decodes the first video stream of any container FFmpeg can open,
//! via the [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate,
//! and writes up to 300 frames as numbered files.
//!
//! ## Quick Start
//!
//! ### Extract Frames
//!
//! ```no_run
//! use utahframe::ExtractOptions;
//!
//! // frames/frame1.utah, frames/frame2.utah, ...
//! let report = utahframe::extract_frames("input.mp4", "frames", &ExtractOptions::new())?;
//! println!("{} frames written", report.frames_persisted);
//! # Ok::<(), utahframe::UtahError>(())
//! ```
//!
//! ### Encode and Decode
//!
//! ```
//! use utahframe::{Frame, PixelLayout, UtahDecoder, UtahEncoder};
//!
//! let frame = Frame::from_packed(PixelLayout::Rgb8, 2, 2, vec![1, 2, 3, 4])?;
//! let mut encoder = UtahEncoder::new(PixelLayout::Rgb8, 2, 2)?;
//! let bytes = encoder.encode(&frame)?.data().to_vec();
//!
//! let mut decoder = UtahDecoder::new();
//! assert!(decoder.decode(&bytes)?.same_pixels(&frame));
//! # Ok::<(), utahframe::UtahError>(())
//! ```
//!
//! ## Features
//!
//! - **UTAH codec**: header validation before any payload access,
//!   stride-independent encoding, frame reuse across decodes
//! - **Frame extraction**: first video stream, decoder flush at end of
//!   stream, configurable frame limit, file prefix and output format
//! - **Pluggable media backend**: the pipeline runs against the traits in
//!   [`backend`]; [`FfmpegBackend`] is the shipped implementation
//! - **Codec registry**: explicit registration and magic-number sniffing
//! - **Progress callbacks**: batched [`ProgressInfo`] snapshots
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod backend;
pub mod codec;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod extract;
pub mod ffmpeg;
pub mod format;
pub mod frame;
pub mod progress;
pub mod sink;

pub use backend::{
    FrameConverter, FrameDecoder, MediaBackend, MediaSource, MediaType, SendStatus, StreamInfo,
    StreamPacket,
};
pub use codec::{CodecDescriptor, CodecRegistry, utah_codec, utah_decoder, utah_encoder};
pub use config::{DEFAULT_FILE_PREFIX, DEFAULT_FRAME_LIMIT, ExtractOptions, OutputFormat};
pub use decoder::{UtahDecoder, decode_image};
pub use encoder::{EncodedFrame, UtahEncoder, encode_image};
pub use error::{CodecError, FormatError, ResourceError, SourceError, UtahError};
pub use extract::{
    ExtractionReport, FrameExtractor, PipelineStage, PipelineState, extract_frames,
    select_video_stream,
};
pub use ffmpeg::{FfmpegBackend, FfmpegLogLevel, set_ffmpeg_log_level};
pub use format::UtahHeader;
pub use frame::{DEFAULT_STRIDE_ALIGNMENT, Frame, PixelLayout, rgb_to_rgb332, rgb332_to_rgb};
pub use progress::{ProgressCallback, ProgressInfo};
pub use sink::{DirectorySink, FrameSink, encode_ppm, frame_path};
