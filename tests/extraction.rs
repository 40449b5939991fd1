//! Frame extraction pipeline tests.
//!
//! The pipeline runs against a scripted in-memory backend, so these tests
//! need neither FFmpeg fixtures nor codecs.

use std::{
    collections::VecDeque,
    io,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use utahframe::{
    CodecError, DirectorySink, ExtractOptions, Frame, FrameConverter, FrameDecoder,
    FrameExtractor, FrameSink, MediaBackend, MediaSource, MediaType, OutputFormat, PipelineStage,
    PipelineState, PixelLayout, ProgressCallback, ProgressInfo, SendStatus, SourceError,
    StreamInfo, StreamPacket, UtahError,
};

// ── Scripted backend ───────────────────────────────────────────────

#[derive(Debug, Clone)]
struct FakePacket {
    stream: usize,
    frames: u32,
    corrupt: bool,
    /// Refused once with `SendStatus::Full` before being accepted.
    busy: bool,
}

impl StreamPacket for FakePacket {
    fn stream_index(&self) -> usize {
        self.stream
    }
}

#[derive(Debug, Clone, Default)]
struct Script {
    streams: Vec<StreamInfo>,
    packets: Vec<FakePacket>,
    fail_open: bool,
    fail_probe: bool,
    missing_decoder: bool,
    hold_back: usize,
    read_error_at: Option<usize>,
}

type Events = Arc<Mutex<Vec<&'static str>>>;

struct FakeBackend {
    script: Script,
    events: Events,
    conversions: Arc<AtomicUsize>,
    sends: Arc<AtomicUsize>,
}

impl FakeBackend {
    fn new(script: Script) -> Self {
        Self {
            script,
            events: Arc::new(Mutex::new(Vec::new())),
            conversions: Arc::new(AtomicUsize::new(0)),
            sends: Arc::new(AtomicUsize::new(0)),
        }
    }
}

struct FakeSource {
    streams: Vec<StreamInfo>,
    packets: VecDeque<FakePacket>,
    fail_probe: bool,
    read_error_at: Option<usize>,
    read: usize,
    events: Events,
}

impl MediaSource for FakeSource {
    type Packet = FakePacket;

    fn probe(&mut self) -> Result<Vec<StreamInfo>, SourceError> {
        if self.fail_probe {
            return Err(SourceError::ProbeFailed {
                locator: "fake".to_string(),
                reason: "unreadable header".to_string(),
            });
        }
        Ok(self.streams.clone())
    }

    fn next_packet(&mut self) -> Result<Option<FakePacket>, SourceError> {
        if self.read_error_at == Some(self.read) {
            return Err(SourceError::ReadFailed("truncated file".to_string()));
        }
        self.read += 1;
        Ok(self.packets.pop_front())
    }
}

impl Drop for FakeSource {
    fn drop(&mut self) {
        self.events.lock().unwrap().push("source");
    }
}

/// Emits RGB24 2x2 frames whose every byte is the frame's 1-based number.
/// Up to `hold_back` frames stay buffered until end of stream, or until the
/// decoder has refused a packet.
struct FakeDecoder {
    pending: VecDeque<Frame>,
    produced: u8,
    hold_back: usize,
    eof: bool,
    refused: bool,
    sends: Arc<AtomicUsize>,
    events: Events,
}

impl FrameDecoder for FakeDecoder {
    type Packet = FakePacket;
    type Frame = Frame;

    fn send_packet(&mut self, packet: &FakePacket) -> Result<SendStatus, CodecError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        if packet.corrupt {
            return Err(CodecError::InvalidPacket("corrupt slice".to_string()));
        }
        if packet.busy && !self.refused {
            self.refused = true;
            return Ok(SendStatus::Full);
        }
        self.refused = false;
        for _ in 0..packet.frames {
            self.produced = self.produced.wrapping_add(1);
            self.pending.push_back(solid_frame(self.produced));
        }
        Ok(SendStatus::Accepted)
    }

    fn send_eof(&mut self) -> Result<(), CodecError> {
        self.eof = true;
        Ok(())
    }

    fn receive_frame(&mut self) -> Result<Option<Frame>, CodecError> {
        if !self.eof && !self.refused && self.pending.len() <= self.hold_back {
            return Ok(None);
        }
        Ok(self.pending.pop_front())
    }
}

impl Drop for FakeDecoder {
    fn drop(&mut self) {
        self.events.lock().unwrap().push("decoder");
    }
}

struct FakeConverter {
    conversions: Arc<AtomicUsize>,
    events: Events,
}

impl FrameConverter for FakeConverter {
    type Frame = Frame;

    fn convert(&mut self, frame: &Frame, target: PixelLayout) -> Result<Frame, UtahError> {
        self.conversions.fetch_add(1, Ordering::SeqCst);
        if frame.layout() == target {
            return Ok(frame.clone());
        }
        Frame::from_rgb_image(&frame.to_rgb_image(), target)
    }
}

impl Drop for FakeConverter {
    fn drop(&mut self) {
        self.events.lock().unwrap().push("converter");
    }
}

impl MediaBackend for FakeBackend {
    type Source = FakeSource;
    type Decoder = FakeDecoder;
    type Converter = FakeConverter;

    fn open(&self, locator: &str) -> Result<FakeSource, SourceError> {
        if self.script.fail_open {
            return Err(SourceError::OpenFailed {
                locator: locator.to_string(),
                reason: "No such file or directory".to_string(),
            });
        }
        Ok(FakeSource {
            streams: self.script.streams.clone(),
            packets: self.script.packets.iter().cloned().collect(),
            fail_probe: self.script.fail_probe,
            read_error_at: self.script.read_error_at,
            read: 0,
            events: self.events.clone(),
        })
    }

    fn open_decoder(
        &self,
        _source: &FakeSource,
        stream: &StreamInfo,
    ) -> Result<FakeDecoder, CodecError> {
        if self.script.missing_decoder {
            return Err(CodecError::DecoderNotFound {
                codec: stream.codec.clone(),
            });
        }
        Ok(FakeDecoder {
            pending: VecDeque::new(),
            produced: 0,
            hold_back: self.script.hold_back,
            eof: false,
            refused: false,
            sends: self.sends.clone(),
            events: self.events.clone(),
        })
    }

    fn converter(&self) -> FakeConverter {
        FakeConverter {
            conversions: self.conversions.clone(),
            events: self.events.clone(),
        }
    }
}

struct RecordingSink {
    layout: PixelLayout,
    frames: Vec<(u64, Frame)>,
    fail_at: Option<u64>,
}

impl RecordingSink {
    fn new(layout: PixelLayout) -> Self {
        Self {
            layout,
            frames: Vec::new(),
            fail_at: None,
        }
    }

    fn numbers(&self) -> Vec<u64> {
        self.frames.iter().map(|(number, _)| *number).collect()
    }

    /// First byte of every persisted frame, i.e. its decode order.
    fn values(&self) -> Vec<u8> {
        self.frames.iter().map(|(_, frame)| frame.row(0)[0]).collect()
    }
}

impl FrameSink for RecordingSink {
    fn pixel_layout(&self) -> PixelLayout {
        self.layout
    }

    fn persist(&mut self, number: u64, frame: &Frame) -> Result<(), UtahError> {
        if self.fail_at == Some(number) {
            return Err(io::Error::other("disk full").into());
        }
        self.frames.push((number, frame.clone()));
        Ok(())
    }
}

fn solid_frame(value: u8) -> Frame {
    Frame::from_packed(PixelLayout::Rgb24, 2, 2, vec![value; 12]).expect("valid frame")
}

fn stream(index: usize, media_type: MediaType) -> StreamInfo {
    StreamInfo {
        index,
        media_type,
        codec: match media_type {
            MediaType::Video => "fakevideo".to_string(),
            _ => "fakeaudio".to_string(),
        },
    }
}

fn packets(stream: usize, count: usize) -> Vec<FakePacket> {
    (0..count)
        .map(|_| FakePacket {
            stream,
            frames: 1,
            corrupt: false,
            busy: false,
        })
        .collect()
}

fn video_script(frame_count: usize) -> Script {
    Script {
        streams: vec![stream(0, MediaType::Video)],
        packets: packets(0, frame_count),
        ..Script::default()
    }
}

// ── Frame limit and numbering ──────────────────────────────────────

#[test]
fn persists_every_frame_under_the_limit() {
    let mut extractor = FrameExtractor::new(FakeBackend::new(video_script(5)), ExtractOptions::new());
    let mut sink = RecordingSink::new(PixelLayout::Rgb24);

    let report = extractor.run("clip.mp4", &mut sink).expect("extraction");

    assert_eq!(extractor.state(), PipelineState::Completed);
    assert_eq!(sink.numbers(), vec![1, 2, 3, 4, 5]);
    assert_eq!(sink.values(), vec![1, 2, 3, 4, 5]);
    assert_eq!(report.frames_decoded, 5);
    assert_eq!(report.frames_persisted, 5);
    assert_eq!(report.packets_read, 5);
    assert_eq!(report.stream_index, 0);
    assert_eq!(report.codec, "fakevideo");
}

#[test]
fn stops_persisting_at_the_limit_but_keeps_decoding() {
    let backend = FakeBackend::new(video_script(10));
    let conversions = backend.conversions.clone();
    let options = ExtractOptions::new().with_frame_limit(4);
    let mut extractor = FrameExtractor::new(backend, options);
    let mut sink = RecordingSink::new(PixelLayout::Rgb24);

    let report = extractor.run("clip.mp4", &mut sink).expect("extraction");

    assert_eq!(sink.numbers(), vec![1, 2, 3, 4]);
    assert_eq!(report.frames_decoded, 10);
    assert_eq!(report.frames_persisted, 4);
    assert_eq!(conversions.load(Ordering::SeqCst), 4);
    assert_eq!(extractor.state(), PipelineState::Completed);
}

#[test]
fn default_limit_is_three_hundred_frames() {
    let mut extractor =
        FrameExtractor::new(FakeBackend::new(video_script(310)), ExtractOptions::new());
    let mut sink = RecordingSink::new(PixelLayout::Rgb8);

    let report = extractor.run("long.mp4", &mut sink).expect("extraction");

    assert_eq!(report.frames_persisted, 300);
    assert_eq!(report.frames_decoded, 310);
    assert_eq!(sink.numbers(), (1..=300).collect::<Vec<u64>>());
}

#[test]
fn zero_limit_decodes_without_persisting() {
    let options = ExtractOptions::new().with_frame_limit(0);
    let mut extractor = FrameExtractor::new(FakeBackend::new(video_script(3)), options);
    let mut sink = RecordingSink::new(PixelLayout::Rgb8);

    let report = extractor.run("clip.mp4", &mut sink).expect("extraction");

    assert!(sink.frames.is_empty());
    assert_eq!(report.frames_decoded, 3);
}

#[test]
fn frames_are_converted_to_the_sink_layout() {
    let mut extractor = FrameExtractor::new(FakeBackend::new(video_script(2)), ExtractOptions::new());
    let mut sink = RecordingSink::new(PixelLayout::Rgb8);

    extractor.run("clip.mp4", &mut sink).expect("extraction");

    for (_, frame) in &sink.frames {
        assert_eq!(frame.layout(), PixelLayout::Rgb8);
        assert_eq!((frame.width(), frame.height()), (2, 2));
    }
}

// ── Stream selection ───────────────────────────────────────────────

#[test]
fn selects_the_first_video_stream() {
    let mut packet_list = packets(2, 3);
    packet_list.extend(packets(1, 2));
    packet_list.extend(packets(0, 4));
    let script = Script {
        streams: vec![
            stream(0, MediaType::Audio),
            stream(1, MediaType::Video),
            stream(2, MediaType::Video),
        ],
        packets: packet_list,
        ..Script::default()
    };
    let mut extractor = FrameExtractor::new(FakeBackend::new(script), ExtractOptions::new());
    let mut sink = RecordingSink::new(PixelLayout::Rgb24);

    let report = extractor.run("multi.mkv", &mut sink).expect("extraction");

    assert_eq!(report.stream_index, 1);
    assert_eq!(report.packets_read, 9);
    assert_eq!(report.packets_skipped, 7);
    assert_eq!(report.frames_persisted, 2);
    assert_eq!(sink.numbers(), vec![1, 2]);
}

#[test]
fn no_video_stream_fails_before_decoding() {
    let script = Script {
        streams: vec![stream(0, MediaType::Audio), stream(1, MediaType::Subtitle)],
        packets: packets(0, 5),
        ..Script::default()
    };
    let backend = FakeBackend::new(script);
    let conversions = backend.conversions.clone();
    let mut extractor = FrameExtractor::new(backend, ExtractOptions::new());
    let mut sink = RecordingSink::new(PixelLayout::Rgb8);

    let result = extractor.run("song.m4a", &mut sink);

    assert!(
        matches!(result, Err(UtahError::Source(SourceError::NoVideoStream))),
        "Expected NoVideoStream, got {result:?}",
    );
    assert!(sink.frames.is_empty());
    assert_eq!(conversions.load(Ordering::SeqCst), 0);
    assert_eq!(
        extractor.state(),
        PipelineState::Failed(PipelineStage::StreamSelected),
    );
}

#[test]
fn select_video_stream_skips_other_media() {
    let streams = vec![
        stream(3, MediaType::Data),
        stream(4, MediaType::Video),
        stream(5, MediaType::Video),
    ];
    let selected = utahframe::select_video_stream(&streams).expect("video stream");
    assert_eq!(selected.index, 4);

    let audio_only = vec![stream(0, MediaType::Audio)];
    assert_eq!(
        utahframe::select_video_stream(&audio_only),
        Err(SourceError::NoVideoStream),
    );
}

// ── Decoder behaviour ──────────────────────────────────────────────

#[test]
fn packets_that_complete_no_frame_are_normal() {
    let mut packet_list = Vec::new();
    for frames in [0, 1, 0, 0, 2, 0, 1] {
        packet_list.push(FakePacket {
            stream: 0,
            frames,
            corrupt: false,
            busy: false,
        });
    }
    let script = Script {
        streams: vec![stream(0, MediaType::Video)],
        packets: packet_list,
        ..Script::default()
    };
    let mut extractor = FrameExtractor::new(FakeBackend::new(script), ExtractOptions::new());
    let mut sink = RecordingSink::new(PixelLayout::Rgb24);

    let report = extractor.run("clip.mp4", &mut sink).expect("extraction");

    assert_eq!(report.frames_decoded, 4);
    assert_eq!(sink.numbers(), vec![1, 2, 3, 4]);
}

#[test]
fn corrupt_packets_are_skipped() {
    let mut packet_list = packets(0, 2);
    packet_list.push(FakePacket {
        stream: 0,
        frames: 1,
        corrupt: true,
        busy: false,
    });
    packet_list.extend(packets(0, 2));
    let script = Script {
        streams: vec![stream(0, MediaType::Video)],
        packets: packet_list,
        ..Script::default()
    };
    let mut extractor = FrameExtractor::new(FakeBackend::new(script), ExtractOptions::new());
    let mut sink = RecordingSink::new(PixelLayout::Rgb24);

    let report = extractor.run("clip.mp4", &mut sink).expect("extraction");

    assert_eq!(report.packets_rejected, 1);
    assert_eq!(report.frames_decoded, 4);
    assert_eq!(sink.numbers(), vec![1, 2, 3, 4]);
    assert_eq!(sink.values(), vec![1, 2, 3, 4]);
}

#[test]
fn buffered_frames_are_drained_at_end_of_stream() {
    let script = Script {
        hold_back: 2,
        ..video_script(5)
    };
    let mut extractor = FrameExtractor::new(FakeBackend::new(script), ExtractOptions::new());
    let mut sink = RecordingSink::new(PixelLayout::Rgb24);

    let report = extractor.run("clip.mp4", &mut sink).expect("extraction");

    assert_eq!(report.frames_decoded, 5);
    assert_eq!(sink.values(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn full_decoder_is_drained_and_the_packet_resent() {
    let mut packet_list = packets(0, 3);
    packet_list[1].busy = true;
    let script = Script {
        streams: vec![stream(0, MediaType::Video)],
        packets: packet_list,
        hold_back: 1,
        ..Script::default()
    };
    let backend = FakeBackend::new(script);
    let sends = backend.sends.clone();
    let mut extractor = FrameExtractor::new(backend, ExtractOptions::new());
    let mut sink = RecordingSink::new(PixelLayout::Rgb24);

    let report = extractor.run("clip.mp4", &mut sink).expect("extraction");

    assert_eq!(report.packets_rejected, 0);
    assert_eq!(report.frames_decoded, 3);
    assert_eq!(sink.values(), vec![1, 2, 3]);
    assert_eq!(sends.load(Ordering::SeqCst), 4);
    assert_eq!(extractor.state(), PipelineState::Completed);
}

#[test]
fn full_decoder_without_output_fails_decoding() {
    let mut packet_list = packets(0, 2);
    packet_list[0].busy = true;
    let script = Script {
        streams: vec![stream(0, MediaType::Video)],
        packets: packet_list,
        ..Script::default()
    };
    let mut extractor = FrameExtractor::new(FakeBackend::new(script), ExtractOptions::new());
    let mut sink = RecordingSink::new(PixelLayout::Rgb24);

    let result = extractor.run("clip.mp4", &mut sink);

    assert!(
        matches!(result, Err(UtahError::Codec(CodecError::DecodeFailed(_)))),
        "Expected DecodeFailed, got {result:?}",
    );
    assert_eq!(extractor.state(), PipelineState::Failed(PipelineStage::Decoding));
    assert!(sink.frames.is_empty());
}

// ── Failures ───────────────────────────────────────────────────────

#[test]
fn open_failure_is_reported_at_opening() {
    let script = Script {
        fail_open: true,
        ..video_script(3)
    };
    let mut extractor = FrameExtractor::new(FakeBackend::new(script), ExtractOptions::new());
    let mut sink = RecordingSink::new(PixelLayout::Rgb8);

    let result = extractor.run("missing.mp4", &mut sink);

    match result {
        Err(UtahError::Source(SourceError::OpenFailed { locator, .. })) => {
            assert_eq!(locator, "missing.mp4");
        }
        other => panic!("Expected OpenFailed, got: {other:?}"),
    }
    assert_eq!(extractor.state(), PipelineState::Failed(PipelineStage::Opening));
    assert!(sink.frames.is_empty());
}

#[test]
fn probe_failure_is_reported_at_stream_probing() {
    let script = Script {
        fail_probe: true,
        ..video_script(3)
    };
    let mut extractor = FrameExtractor::new(FakeBackend::new(script), ExtractOptions::new());
    let mut sink = RecordingSink::new(PixelLayout::Rgb8);

    let result = extractor.run("clip.mp4", &mut sink);

    assert!(matches!(
        result,
        Err(UtahError::Source(SourceError::ProbeFailed { .. }))
    ));
    assert_eq!(
        extractor.state(),
        PipelineState::Failed(PipelineStage::StreamProbing),
    );
}

#[test]
fn missing_decoder_is_a_codec_error() {
    let script = Script {
        missing_decoder: true,
        ..video_script(3)
    };
    let mut extractor = FrameExtractor::new(FakeBackend::new(script), ExtractOptions::new());
    let mut sink = RecordingSink::new(PixelLayout::Rgb8);

    let result = extractor.run("clip.mp4", &mut sink);

    match result {
        Err(UtahError::Codec(CodecError::DecoderNotFound { codec })) => {
            assert_eq!(codec, "fakevideo");
        }
        other => panic!("Expected DecoderNotFound, got: {other:?}"),
    }
    assert_eq!(
        extractor.state(),
        PipelineState::Failed(PipelineStage::StreamSelected),
    );
}

#[test]
fn read_failure_keeps_frames_already_persisted() {
    let script = Script {
        read_error_at: Some(3),
        ..video_script(6)
    };
    let mut extractor = FrameExtractor::new(FakeBackend::new(script), ExtractOptions::new());
    let mut sink = RecordingSink::new(PixelLayout::Rgb24);

    let result = extractor.run("clip.mp4", &mut sink);

    assert!(matches!(
        result,
        Err(UtahError::Source(SourceError::ReadFailed(_)))
    ));
    assert_eq!(sink.numbers(), vec![1, 2, 3]);
    assert_eq!(extractor.state(), PipelineState::Failed(PipelineStage::Decoding));
}

#[test]
fn sink_failure_aborts_the_run() {
    let mut extractor = FrameExtractor::new(FakeBackend::new(video_script(5)), ExtractOptions::new());
    let mut sink = RecordingSink::new(PixelLayout::Rgb24);
    sink.fail_at = Some(3);

    let result = extractor.run("clip.mp4", &mut sink);

    assert!(matches!(result, Err(UtahError::Io(_))));
    assert_eq!(sink.numbers(), vec![1, 2]);
    assert_eq!(extractor.state(), PipelineState::Failed(PipelineStage::Decoding));
}

// ── Resource lifetime ──────────────────────────────────────────────

#[test]
fn state_is_idle_before_the_first_run() {
    let extractor = FrameExtractor::new(FakeBackend::new(video_script(1)), ExtractOptions::new());
    assert_eq!(extractor.state(), PipelineState::Idle);
}

#[test]
fn resources_are_released_in_reverse_order() {
    let backend = FakeBackend::new(video_script(2));
    let events = backend.events.clone();
    let mut extractor = FrameExtractor::new(backend, ExtractOptions::new());
    let mut sink = RecordingSink::new(PixelLayout::Rgb8);

    extractor.run("clip.mp4", &mut sink).expect("extraction");

    assert_eq!(*events.lock().unwrap(), vec!["converter", "decoder", "source"]);
}

#[test]
fn resources_are_released_after_a_failure() {
    let backend = FakeBackend::new(video_script(5));
    let events = backend.events.clone();
    let mut extractor = FrameExtractor::new(backend, ExtractOptions::new());
    let mut sink = RecordingSink::new(PixelLayout::Rgb8);
    sink.fail_at = Some(2);

    assert!(extractor.run("clip.mp4", &mut sink).is_err());
    assert_eq!(*events.lock().unwrap(), vec!["converter", "decoder", "source"]);
}

// ── Progress ───────────────────────────────────────────────────────

struct RecordingProgress {
    infos: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.infos.lock().unwrap().push(info.clone());
    }
}

#[test]
fn progress_is_reported_per_batch_and_on_completion() {
    let progress = Arc::new(RecordingProgress {
        infos: Mutex::new(Vec::new()),
    });
    let options = ExtractOptions::new()
        .with_frame_limit(5)
        .with_batch_size(2)
        .with_progress(progress.clone());
    let mut extractor = FrameExtractor::new(FakeBackend::new(video_script(6)), options);
    let mut sink = RecordingSink::new(PixelLayout::Rgb8);

    extractor.run("clip.mp4", &mut sink).expect("extraction");

    let infos = progress.infos.lock().unwrap();
    let persisted: Vec<u64> = infos.iter().map(|info| info.frames_persisted).collect();
    assert_eq!(persisted, vec![2, 4, 5]);

    let last = infos.last().expect("final report");
    assert!(last.finished);
    assert_eq!(last.frames_decoded, 6);
    assert_eq!(last.frame_limit, 5);
    assert_eq!(last.last_frame, Some(5));
    assert_eq!(last.percentage, Some(100.0));
    assert!(infos[..infos.len() - 1].iter().all(|info| !info.finished));
}

#[test]
fn failed_runs_send_no_final_report() {
    let progress = Arc::new(RecordingProgress {
        infos: Mutex::new(Vec::new()),
    });
    let script = Script {
        fail_open: true,
        ..video_script(3)
    };
    let options = ExtractOptions::new().with_progress(progress.clone());
    let mut extractor = FrameExtractor::new(FakeBackend::new(script), options);
    let mut sink = RecordingSink::new(PixelLayout::Rgb8);

    assert!(extractor.run("clip.mp4", &mut sink).is_err());
    assert!(progress.infos.lock().unwrap().is_empty());
}

// ── Directory output ───────────────────────────────────────────────

#[test]
fn directory_sink_writes_numbered_utah_files() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let options = ExtractOptions::new().with_frame_limit(3);
    let mut sink = DirectorySink::new(directory.path(), &options).expect("sink");
    let mut extractor = FrameExtractor::new(FakeBackend::new(video_script(5)), options);

    let report = extractor.run("clip.mp4", &mut sink).expect("extraction");
    assert_eq!(report.frames_persisted, 3);

    for number in 1..=3 {
        let path = directory.path().join(format!("frame{number}.utah"));
        let bytes = std::fs::read(&path).expect("frame file");
        assert_eq!(bytes.len(), 10 + 2 * 2);
        let frame = utahframe::decode_image(&bytes).expect("valid UTAH file");
        assert_eq!((frame.width(), frame.height()), (2, 2));
    }
    assert!(!directory.path().join("frame4.utah").exists());
    assert!(!directory.path().join("frame0.utah").exists());
    assert_eq!(sink.written().len(), 3);
}

#[test]
fn directory_sink_writes_ppm_with_custom_prefix() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let options = ExtractOptions::new()
        .with_output_format(OutputFormat::Ppm)
        .with_file_prefix("shot");
    let mut sink = DirectorySink::new(directory.path(), &options).expect("sink");
    let mut extractor = FrameExtractor::new(FakeBackend::new(video_script(2)), options);

    extractor.run("clip.mp4", &mut sink).expect("extraction");

    let bytes = std::fs::read(directory.path().join("shot1.ppm")).expect("ppm file");
    assert!(bytes.starts_with(b"P6"));
    let image = image::load_from_memory(&bytes).expect("decodable ppm").to_rgb8();
    assert_eq!(image.dimensions(), (2, 2));
    assert_eq!(image.get_pixel(0, 0).0, [1, 1, 1]);
    assert!(directory.path().join("shot2.ppm").exists());
}
