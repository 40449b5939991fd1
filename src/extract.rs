//! Frame extraction pipeline.
//!
//! [`FrameExtractor`] opens a media source, picks its first video stream,
//! decodes every packet of that stream and hands each decoded frame,
//! converted to the sink's pixel layout, to a [`FrameSink`]. At most
//! [`frame_limit`](crate::ExtractOptions::with_frame_limit) frames are
//! persisted; decoding continues to the end of the stream regardless.
//!
//! A run moves through the stages of [`PipelineStage`]. It ends in
//! [`PipelineState::Completed`] when the source is exhausted, or in
//! [`PipelineState::Failed`] naming the stage that raised the error.
//! Extraction is not atomic: frames persisted before a failure stay where
//! the sink put them.
//!
//! # Example
//!
//! ```no_run
//! use utahframe::{ExtractOptions, UtahError};
//!
//! let report = utahframe::extract_frames("input.mp4", "frames", &ExtractOptions::new())?;
//! println!("wrote {} frames", report.frames_persisted);
//! # Ok::<(), UtahError>(())
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::Path,
};

use crate::{
    backend::{
        FrameConverter, FrameDecoder, MediaBackend, MediaSource, MediaType, SendStatus,
        StreamInfo, StreamPacket,
    },
    config::ExtractOptions,
    error::{CodecError, SourceError, UtahError},
    ffmpeg::FfmpegBackend,
    frame::PixelLayout,
    progress::ProgressTracker,
    sink::{DirectorySink, FrameSink},
};

/// Stages of an extraction run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Opening the source by locator.
    Opening,
    /// Listing the source's streams.
    StreamProbing,
    /// Selecting the video stream and opening its decoder.
    StreamSelected,
    /// Reading packets and decoding them.
    Decoding,
    /// Flushing frames buffered in the decoder after end of stream.
    Draining,
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            PipelineStage::Opening => "opening",
            PipelineStage::StreamProbing => "stream probing",
            PipelineStage::StreamSelected => "stream selection",
            PipelineStage::Decoding => "decoding",
            PipelineStage::Draining => "draining",
        };
        f.write_str(name)
    }
}

/// Where a [`FrameExtractor`] stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No run has started yet.
    Idle,
    /// A run is in the given stage.
    Running(PipelineStage),
    /// The last run reached end of stream.
    Completed,
    /// The last run failed in the given stage.
    Failed(PipelineStage),
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Container index of the stream that was decoded.
    pub stream_index: usize,
    /// Codec of that stream.
    pub codec: String,
    /// Packets read from the source, all streams included.
    pub packets_read: u64,
    /// Packets of other streams that were discarded.
    pub packets_skipped: u64,
    /// Packets the decoder rejected as corrupt.
    pub packets_rejected: u64,
    /// Frames the decoder produced.
    pub frames_decoded: u64,
    /// Frames handed to the sink.
    pub frames_persisted: u64,
}

/// Return the first video stream in container order.
///
/// # Errors
///
/// [`SourceError::NoVideoStream`] if no stream is tagged as video.
pub fn select_video_stream(streams: &[StreamInfo]) -> Result<&StreamInfo, SourceError> {
    streams
        .iter()
        .find(|stream| stream.media_type == MediaType::Video)
        .ok_or(SourceError::NoVideoStream)
}

/// Drives one [`MediaBackend`] through extraction runs.
#[derive(Debug)]
pub struct FrameExtractor<B: MediaBackend> {
    backend: B,
    options: ExtractOptions,
    state: PipelineState,
}

impl<B: MediaBackend> FrameExtractor<B> {
    /// Extractor in the [`PipelineState::Idle`] state.
    pub fn new(backend: B, options: ExtractOptions) -> Self {
        Self {
            backend,
            options,
            state: PipelineState::Idle,
        }
    }

    /// Outcome of the most recent call to [`run`](FrameExtractor::run), or
    /// [`PipelineState::Idle`] before the first.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Options every run uses.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract frames from `locator` into `sink`.
    ///
    /// # Errors
    ///
    /// - [`SourceError::OpenFailed`], [`SourceError::ProbeFailed`],
    ///   [`SourceError::NoVideoStream`], [`SourceError::ReadFailed`] from
    ///   the source.
    /// - [`CodecError::DecoderNotFound`], [`CodecError::DecoderOpenFailed`],
    ///   [`CodecError::DecodeFailed`], [`CodecError::ConversionFailed`] from
    ///   the decoder and converter.
    /// - Any error returned by the sink.
    pub fn run<S: FrameSink>(
        &mut self,
        locator: &str,
        sink: &mut S,
    ) -> Result<ExtractionReport, UtahError> {
        self.state = PipelineState::Running(PipelineStage::Opening);
        let mut session = Session {
            backend: &self.backend,
            options: &self.options,
            stage: PipelineStage::Opening,
            tracker: ProgressTracker::new(
                self.options.progress.clone(),
                self.options.frame_limit,
                self.options.batch_size,
            ),
            packets_read: 0,
            packets_skipped: 0,
            packets_rejected: 0,
        };

        match session.execute(locator, sink) {
            Ok(report) => {
                self.state = PipelineState::Completed;
                log::info!(
                    "Extracted {} of {} decoded frames from {locator} (stream {}, {})",
                    report.frames_persisted,
                    report.frames_decoded,
                    report.stream_index,
                    report.codec,
                );
                Ok(report)
            }
            Err(error) => {
                self.state = PipelineState::Failed(session.stage);
                log::error!(
                    "Frame extraction from {locator} failed during {}: {error}",
                    session.stage,
                );
                Err(error)
            }
        }
    }
}

/// Per-run state. Dropped at the end of [`FrameExtractor::run`].
struct Session<'a, B: MediaBackend> {
    backend: &'a B,
    options: &'a ExtractOptions,
    stage: PipelineStage,
    tracker: ProgressTracker,
    packets_read: u64,
    packets_skipped: u64,
    packets_rejected: u64,
}

impl<B: MediaBackend> Session<'_, B> {
    fn enter(&mut self, stage: PipelineStage) {
        log::debug!("Pipeline stage: {stage}");
        self.stage = stage;
    }

    fn execute<S: FrameSink>(
        &mut self,
        locator: &str,
        sink: &mut S,
    ) -> Result<ExtractionReport, UtahError> {
        self.enter(PipelineStage::Opening);
        let mut source = self.backend.open(locator)?;

        self.enter(PipelineStage::StreamProbing);
        let streams = source.probe()?;
        for stream in &streams {
            log::debug!(
                "Stream {}: {:?} ({})",
                stream.index,
                stream.media_type,
                stream.codec,
            );
        }

        self.enter(PipelineStage::StreamSelected);
        let stream = select_video_stream(&streams)?.clone();
        let mut decoder = self.backend.open_decoder(&source, &stream)?;
        let mut converter = self.backend.converter();
        let target = sink.pixel_layout();

        self.enter(PipelineStage::Decoding);
        while let Some(packet) = source.next_packet()? {
            self.packets_read += 1;
            if packet.stream_index() != stream.index {
                self.packets_skipped += 1;
                continue;
            }

            if self.feed_packet(&mut decoder, &mut converter, target, sink, &packet)? {
                self.receive_frames(&mut decoder, &mut converter, target, sink)?;
            }
        }

        self.enter(PipelineStage::Draining);
        decoder.send_eof()?;
        self.receive_frames(&mut decoder, &mut converter, target, sink)?;

        // Release in reverse order of acquisition.
        drop(converter);
        drop(decoder);
        drop(source);

        self.tracker.finish();
        Ok(ExtractionReport {
            stream_index: stream.index,
            codec: stream.codec,
            packets_read: self.packets_read,
            packets_skipped: self.packets_skipped,
            packets_rejected: self.packets_rejected,
            frames_decoded: self.tracker.decoded(),
            frames_persisted: self.tracker.persisted(),
        })
    }

    /// Send `packet`, draining the decoder each time it reports
    /// [`SendStatus::Full`]. Returns `false` if the packet was rejected as
    /// corrupt and skipped.
    fn feed_packet<S: FrameSink>(
        &mut self,
        decoder: &mut B::Decoder,
        converter: &mut B::Converter,
        target: PixelLayout,
        sink: &mut S,
        packet: &<B::Source as MediaSource>::Packet,
    ) -> Result<bool, UtahError> {
        loop {
            match decoder.send_packet(packet) {
                Ok(SendStatus::Accepted) => return Ok(true),
                Ok(SendStatus::Full) => {
                    // A full decoder with nothing to hand out would refuse forever.
                    if self.receive_frames(decoder, converter, target, sink)? == 0 {
                        return Err(CodecError::DecodeFailed(
                            "decoder refused input with no frame ready".to_string(),
                        )
                        .into());
                    }
                }
                Err(CodecError::InvalidPacket(reason)) => {
                    log::warn!(
                        "Skipping packet {} of stream {}: {reason}",
                        self.packets_read,
                        packet.stream_index(),
                    );
                    self.packets_rejected += 1;
                    return Ok(false);
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Drain every frame the decoder has ready, persisting those under the
    /// frame limit. Returns how many frames were received.
    fn receive_frames<S: FrameSink>(
        &mut self,
        decoder: &mut B::Decoder,
        converter: &mut B::Converter,
        target: PixelLayout,
        sink: &mut S,
    ) -> Result<u64, UtahError> {
        let mut received = 0;
        while let Some(decoded) = decoder.receive_frame()? {
            received += 1;
            self.tracker.record_decoded();
            if self.tracker.persisted() >= self.options.frame_limit {
                continue;
            }

            let frame = converter.convert(&decoded, target)?;
            sink.persist(self.tracker.persisted() + 1, &frame)?;
            self.tracker.record_persisted();
        }
        Ok(received)
    }
}

/// Extract frames from `locator` with FFmpeg into files under `directory`.
///
/// Convenience wrapper around [`FrameExtractor`], [`FfmpegBackend`] and
/// [`DirectorySink`].
pub fn extract_frames(
    locator: &str,
    directory: impl AsRef<Path>,
    options: &ExtractOptions,
) -> Result<ExtractionReport, UtahError> {
    let mut sink = DirectorySink::new(directory.as_ref(), options)?;
    FrameExtractor::new(FfmpegBackend::new(), options.clone()).run(locator, &mut sink)
}
