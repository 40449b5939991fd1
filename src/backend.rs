//! Seams between the extraction pipeline and the media framework.
//!
//! Demuxing, decoding and colour conversion are not implemented by this
//! crate. [`FrameExtractor`](crate::FrameExtractor) drives them through the
//! traits below; [`FfmpegBackend`](crate::FfmpegBackend) implements them
//! with FFmpeg, and tests substitute in-memory fakes.
//!
//! Every call is synchronous and runs to completion. Closing a source,
//! decoder or converter is dropping it.

use crate::{
    error::{CodecError, SourceError, UtahError},
    frame::{Frame, PixelLayout},
};

/// Kind of elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// Video frames.
    Video,
    /// Audio samples.
    Audio,
    /// Text or bitmap subtitles.
    Subtitle,
    /// Opaque data such as timecode tracks.
    Data,
    /// Attached files such as fonts or cover art.
    Attachment,
    /// A stream the framework could not classify.
    Unknown,
}

/// One stream as reported by [`MediaSource::probe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// Position of the stream in the container, as carried by its packets.
    pub index: usize,
    /// Media type tag.
    pub media_type: MediaType,
    /// Codec name (e.g. `"h264"`).
    pub codec: String,
}

/// A demuxed packet that knows which stream it belongs to.
pub trait StreamPacket {
    /// Container index of the stream the packet was demuxed from.
    fn stream_index(&self) -> usize;
}

/// An opened media source.
pub trait MediaSource {
    type Packet: StreamPacket;

    /// List the source's streams in container order.
    fn probe(&mut self) -> Result<Vec<StreamInfo>, SourceError>;

    /// Read the next packet of any stream; `None` at end of stream.
    fn next_packet(&mut self) -> Result<Option<Self::Packet>, SourceError>;
}

/// Outcome of a [`FrameDecoder::send_packet`] call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    /// The packet was consumed.
    Accepted,
    /// The decoder holds output that must be received before it takes more
    /// input. The packet was not consumed and must be sent again.
    Full,
}

/// A send/receive video decoder bound to one stream.
///
/// After each accepted [`send_packet`](FrameDecoder::send_packet) the caller
/// drains [`receive_frame`](FrameDecoder::receive_frame) until it returns
/// `None`; a packet may complete zero frames.
pub trait FrameDecoder {
    type Packet;
    type Frame;

    /// Feed one packet. [`CodecError::InvalidPacket`] means this packet was
    /// rejected and the decoder is still usable.
    fn send_packet(&mut self, packet: &Self::Packet) -> Result<SendStatus, CodecError>;

    /// Signal end of stream so buffered frames can be drained.
    fn send_eof(&mut self) -> Result<(), CodecError>;

    /// Take the next completed frame, `None` if more input is needed.
    fn receive_frame(&mut self) -> Result<Option<Self::Frame>, CodecError>;
}

/// Converts decoder output into a packed [`Frame`] of a given layout.
pub trait FrameConverter {
    type Frame;

    fn convert(&mut self, frame: &Self::Frame, target: PixelLayout) -> Result<Frame, UtahError>;
}

/// Factory for the three collaborators of one extraction run.
pub trait MediaBackend {
    type Source: MediaSource;
    type Decoder: FrameDecoder<Packet = <Self::Source as MediaSource>::Packet>;
    type Converter: FrameConverter<Frame = <Self::Decoder as FrameDecoder>::Frame>;

    /// Open a source by path or URL.
    fn open(&self, locator: &str) -> Result<Self::Source, SourceError>;

    /// Find and open a decoder for `stream`.
    fn open_decoder(
        &self,
        source: &Self::Source,
        stream: &StreamInfo,
    ) -> Result<Self::Decoder, CodecError>;

    /// Create a colour converter.
    fn converter(&self) -> Self::Converter;
}
