//! FFmpeg implementation of the pipeline collaborators.
//!
//! [`FfmpegBackend`] opens sources with libavformat, decodes with
//! libavcodec and converts with libswscale, through `ffmpeg-next`. Opening
//! and stream probing go through `ffmpeg-sys-next` directly so that each
//! reports its own failure.
//! This module also converts between crate [`Frame`]s and FFmpeg video
//! frames, and wraps FFmpeg's own log level.
//!
//! FFmpeg's console output is separate from the `log` records this crate
//! emits; [`set_ffmpeg_log_level`] only affects the former.

use std::{
    ffi::CString,
    fmt::{Debug, Formatter, Result as FmtResult},
    ptr,
    str::FromStr,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    picture,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::log::Level,
};

use crate::{
    backend::{
        FrameConverter, FrameDecoder, MediaBackend, MediaSource, MediaType, StreamInfo,
        SendStatus, StreamPacket,
    },
    error::{CodecError, SourceError, UtahError},
    frame::{Frame, PixelLayout},
};

/// FFmpeg console verbosity, most quiet first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Print nothing.
    Quiet,
    /// Only conditions that will crash the process.
    Panic,
    /// Unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings and errors. FFmpeg's own default is `Info`.
    Warning,
    /// Informational messages such as stream summaries.
    Info,
    /// More detail than `Info`.
    Verbose,
    /// Developer diagnostics.
    Debug,
    /// Everything, including per-packet tracing.
    Trace,
}

impl FfmpegLogLevel {
    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Panic => Level::Panic,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
            FfmpegLogLevel::Trace => Level::Trace,
        }
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = UtahError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" => Ok(FfmpegLogLevel::Quiet),
            "panic" => Ok(FfmpegLogLevel::Panic),
            "fatal" => Ok(FfmpegLogLevel::Fatal),
            "error" => Ok(FfmpegLogLevel::Error),
            "warning" | "warn" => Ok(FfmpegLogLevel::Warning),
            "info" => Ok(FfmpegLogLevel::Info),
            "verbose" => Ok(FfmpegLogLevel::Verbose),
            "debug" => Ok(FfmpegLogLevel::Debug),
            "trace" => Ok(FfmpegLogLevel::Trace),
            other => Err(UtahError::InvalidOption(format!(
                "unknown FFmpeg log level: {other}"
            ))),
        }
    }
}

/// Set what FFmpeg itself prints to stderr.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

impl From<Type> for MediaType {
    fn from(medium: Type) -> Self {
        match medium {
            Type::Video => MediaType::Video,
            Type::Audio => MediaType::Audio,
            Type::Subtitle => MediaType::Subtitle,
            Type::Data => MediaType::Data,
            Type::Attachment => MediaType::Attachment,
            Type::Unknown => MediaType::Unknown,
        }
    }
}

/// Media collaborators backed by FFmpeg.
#[derive(Debug, Clone, Default)]
pub struct FfmpegBackend {
    dump_format: bool,
}

impl FfmpegBackend {
    /// Backend with FFmpeg's container dump disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Print FFmpeg's description of the container to stderr once its
    /// streams have been probed.
    #[must_use]
    pub fn with_dump_format(mut self, dump_format: bool) -> Self {
        self.dump_format = dump_format;
        self
    }
}

impl MediaBackend for FfmpegBackend {
    type Source = FfmpegSource;
    type Decoder = FfmpegDecoder;
    type Converter = FfmpegConverter;

    fn open(&self, locator: &str) -> Result<FfmpegSource, SourceError> {
        let open_failed = |reason: String| SourceError::OpenFailed {
            locator: locator.to_string(),
            reason,
        };

        // Safe to call more than once.
        ffmpeg_next::init()
            .map_err(|error| open_failed(format!("FFmpeg initialisation failed: {error}")))?;

        let url = CString::new(locator)
            .map_err(|_| open_failed("locator contains a NUL byte".to_string()))?;

        // Only the container header is read here. Stream parameters are
        // filled in by `FfmpegSource::probe`.
        let mut context = ptr::null_mut();
        let status = unsafe {
            ffmpeg_sys_next::avformat_open_input(
                &mut context,
                url.as_ptr(),
                ptr::null_mut(),
                ptr::null_mut(),
            )
        };
        if status < 0 || context.is_null() {
            return Err(open_failed(FfmpegError::from(status).to_string()));
        }
        // The context is closed with `avformat_close_input` when `Input` drops.
        let input = unsafe { Input::wrap(context) };

        log::debug!(
            "Opened media source {locator} (format={})",
            input.format().name(),
        );

        Ok(FfmpegSource {
            input,
            locator: locator.to_string(),
            probed: false,
            dump_format: self.dump_format,
        })
    }

    fn open_decoder(
        &self,
        source: &FfmpegSource,
        stream: &StreamInfo,
    ) -> Result<FfmpegDecoder, CodecError> {
        let open_failed = |reason: String| CodecError::DecoderOpenFailed {
            codec: stream.codec.clone(),
            reason,
        };

        let av_stream = source
            .input
            .stream(stream.index)
            .ok_or_else(|| open_failed(format!("stream {} does not exist", stream.index)))?;
        let parameters = av_stream.parameters();

        let codec = ffmpeg_next::decoder::find(parameters.id()).ok_or_else(|| {
            CodecError::DecoderNotFound {
                codec: stream.codec.clone(),
            }
        })?;

        let decoder = CodecContext::from_parameters(parameters)
            .and_then(|context| context.decoder().open_as(codec))
            .and_then(|opened| opened.video())
            .map_err(|error| open_failed(error.to_string()))?;

        log::debug!(
            "Opened {} decoder for stream {}: {}x{} {:?}",
            stream.codec,
            stream.index,
            decoder.width(),
            decoder.height(),
            decoder.format(),
        );

        Ok(FfmpegDecoder { decoder })
    }

    fn converter(&self) -> FfmpegConverter {
        FfmpegConverter::default()
    }
}

/// An opened FFmpeg demuxer.
pub struct FfmpegSource {
    input: Input,
    locator: String,
    probed: bool,
    dump_format: bool,
}

impl Debug for FfmpegSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FfmpegSource")
            .field("locator", &self.locator)
            .field("probed", &self.probed)
            .finish_non_exhaustive()
    }
}

impl MediaSource for FfmpegSource {
    type Packet = FfmpegPacket;

    /// Run `avformat_find_stream_info` on the first call, then list the
    /// streams. A container may legitimately hold no streams at all.
    fn probe(&mut self) -> Result<Vec<StreamInfo>, SourceError> {
        if !self.probed {
            let status = unsafe {
                ffmpeg_sys_next::avformat_find_stream_info(self.input.as_mut_ptr(), ptr::null_mut())
            };
            if status < 0 {
                return Err(SourceError::ProbeFailed {
                    locator: self.locator.clone(),
                    reason: FfmpegError::from(status).to_string(),
                });
            }
            self.probed = true;

            if self.dump_format {
                let locator = self.locator.as_str();
                ffmpeg_next::format::context::input::dump(&self.input, 0, Some(locator));
            }
        }

        let streams: Vec<StreamInfo> = self
            .input
            .streams()
            .map(|stream| {
                let parameters = stream.parameters();
                StreamInfo {
                    index: stream.index(),
                    media_type: parameters.medium().into(),
                    codec: parameters.id().name().to_string(),
                }
            })
            .collect();

        log::debug!("Probed {} stream(s) in {}", streams.len(), self.locator);
        Ok(streams)
    }

    fn next_packet(&mut self) -> Result<Option<FfmpegPacket>, SourceError> {
        let mut packet = Packet::empty();
        match packet.read(&mut self.input) {
            Ok(()) => Ok(Some(FfmpegPacket(packet))),
            Err(FfmpegError::Eof) => Ok(None),
            Err(error) => Err(SourceError::ReadFailed(error.to_string())),
        }
    }
}

/// A demuxed FFmpeg packet.
pub struct FfmpegPacket(Packet);

impl StreamPacket for FfmpegPacket {
    fn stream_index(&self) -> usize {
        self.0.stream()
    }
}

/// An opened FFmpeg video decoder.
pub struct FfmpegDecoder {
    decoder: VideoDecoder,
}

impl FrameDecoder for FfmpegDecoder {
    type Packet = FfmpegPacket;
    type Frame = VideoFrame;

    fn send_packet(&mut self, packet: &FfmpegPacket) -> Result<SendStatus, CodecError> {
        match self.decoder.send_packet(&packet.0) {
            Ok(()) => Ok(SendStatus::Accepted),
            // EAGAIN on send: output is pending and the packet was not consumed.
            Err(error) if is_again(&error) => Ok(SendStatus::Full),
            Err(error @ FfmpegError::InvalidData) => Err(CodecError::InvalidPacket(error.to_string())),
            Err(error) => Err(CodecError::DecodeFailed(error.to_string())),
        }
    }

    fn send_eof(&mut self) -> Result<(), CodecError> {
        match self.decoder.send_eof() {
            Ok(()) | Err(FfmpegError::Eof) => Ok(()),
            Err(error) => Err(CodecError::DecodeFailed(error.to_string())),
        }
    }

    fn receive_frame(&mut self) -> Result<Option<VideoFrame>, CodecError> {
        let mut frame = VideoFrame::empty();
        match self.decoder.receive_frame(&mut frame) {
            Ok(()) => Ok(Some(frame)),
            Err(FfmpegError::Eof) => Ok(None),
            Err(error) if is_again(&error) => Ok(None),
            Err(error) => Err(CodecError::DecodeFailed(error.to_string())),
        }
    }
}

fn is_again(error: &FfmpegError) -> bool {
    matches!(error, FfmpegError::Other { errno } if *errno == ffmpeg_next::util::error::EAGAIN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScalingKey {
    format: Pixel,
    width: u32,
    height: u32,
    target: Pixel,
}

/// swscale-backed converter. The scaling context is created on the first
/// frame and rebuilt whenever the input geometry or format changes.
#[derive(Default)]
pub struct FfmpegConverter {
    scaler: Option<(ScalingKey, ScalingContext)>,
}

impl FrameConverter for FfmpegConverter {
    type Frame = VideoFrame;

    fn convert(&mut self, frame: &VideoFrame, target: PixelLayout) -> Result<Frame, UtahError> {
        let conversion_failed = |reason: String| CodecError::ConversionFailed { target, reason };

        let key = ScalingKey {
            format: frame.format(),
            width: frame.width(),
            height: frame.height(),
            target: target.to_ffmpeg_pixel(),
        };

        if !matches!(&self.scaler, Some((current, _)) if *current == key) {
            log::debug!(
                "Creating scaler {:?} {}x{} -> {target}",
                key.format,
                key.width,
                key.height,
            );
            let context = ScalingContext::get(
                key.format,
                key.width,
                key.height,
                key.target,
                key.width,
                key.height,
                ScalingFlags::BILINEAR,
            )
            .map_err(|error| conversion_failed(error.to_string()))?;
            self.scaler = Some((key, context));
        }

        let Some((_, scaler)) = self.scaler.as_mut() else {
            return Err(conversion_failed("scaler unavailable".to_string()).into());
        };

        let mut converted = VideoFrame::empty();
        scaler
            .run(frame, &mut converted)
            .map_err(|error| conversion_failed(error.to_string()))?;

        let mut output = video_to_frame(&converted, target)?;
        output.set_key_frame(frame.is_key());
        Ok(output)
    }
}

/// Copy an FFmpeg video frame of a supported layout into a crate frame,
/// honouring both strides.
///
/// # Errors
///
/// [`CodecError::ConversionFailed`] if the FFmpeg frame's pixel format is
/// not the one `layout` maps to.
pub fn video_to_frame(video: &VideoFrame, layout: PixelLayout) -> Result<Frame, UtahError> {
    if video.format() != layout.to_ffmpeg_pixel() {
        return Err(CodecError::ConversionFailed {
            target: layout,
            reason: format!("frame has pixel format {:?}", video.format()),
        }
        .into());
    }

    let mut frame = Frame::new(layout, video.width(), video.height())?;
    let source_stride = video.stride(0);
    let source = video.data(0);
    for (y, row) in frame.rows_mut().enumerate() {
        let start = y * source_stride;
        let end = start + row.len();
        let Some(source_row) = source.get(start..end) else {
            return Err(CodecError::ConversionFailed {
                target: layout,
                reason: format!("plane too small for row {y}"),
            }
            .into());
        };
        row.copy_from_slice(source_row);
    }
    Ok(frame)
}

/// Hand a crate frame back to FFmpeg as an intra-coded video frame.
pub fn frame_to_video(frame: &Frame) -> VideoFrame {
    let mut video = VideoFrame::new(frame.layout().to_ffmpeg_pixel(), frame.width(), frame.height());
    let stride = video.stride(0);
    let destination = video.data_mut(0);
    for (y, row) in frame.rows().enumerate() {
        let start = y * stride;
        destination[start..start + row.len()].copy_from_slice(row);
    }
    video.set_kind(picture::Type::I);
    video
}
