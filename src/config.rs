//! Extraction options.
//!
//! [`ExtractOptions`] is a builder threaded through
//! [`FrameExtractor`](crate::FrameExtractor) and
//! [`DirectorySink`](crate::DirectorySink). A default-constructed value
//! persists at most 300 frames as `frame1.utah`, `frame2.utah`, ….
//!
//! # Example
//!
//! ```
//! use utahframe::{ExtractOptions, OutputFormat};
//!
//! let options = ExtractOptions::new()
//!     .with_frame_limit(50)
//!     .with_output_format(OutputFormat::Ppm)
//!     .with_file_prefix("shot");
//! assert_eq!(options.frame_limit(), 50);
//! ```

use std::{
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    path::MAIN_SEPARATOR,
    str::FromStr,
    sync::Arc,
};

use crate::{
    error::UtahError,
    format::FILE_EXTENSION,
    frame::PixelLayout,
    progress::{NoOpProgress, ProgressCallback},
};

/// Frames persisted by a default run.
pub const DEFAULT_FRAME_LIMIT: u64 = 300;

/// File name prefix of a default run.
pub const DEFAULT_FILE_PREFIX: &str = "frame";

/// How extracted frames are serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// UTAH raw-tagged image, RGB8, `.utah`.
    #[default]
    Utah,
    /// Binary portable pixmap (`P6`), 24-bit RGB, `.ppm`.
    Ppm,
}

impl OutputFormat {
    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Utah => FILE_EXTENSION,
            OutputFormat::Ppm => "ppm",
        }
    }

    /// Layout frames must be converted to before serialization.
    pub fn pixel_layout(self) -> PixelLayout {
        match self {
            OutputFormat::Utah => PixelLayout::Rgb8,
            OutputFormat::Ppm => PixelLayout::Rgb24,
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = UtahError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "utah" => Ok(OutputFormat::Utah),
            "ppm" => Ok(OutputFormat::Ppm),
            other => Err(UtahError::InvalidOption(format!(
                "unsupported output format: {other} (expected utah or ppm)"
            ))),
        }
    }
}

/// Settings for one extraction run.
#[derive(Clone)]
pub struct ExtractOptions {
    pub(crate) frame_limit: u64,
    pub(crate) output_format: OutputFormat,
    pub(crate) file_prefix: String,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) batch_size: u64,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("frame_limit", &self.frame_limit)
            .field("output_format", &self.output_format)
            .field("file_prefix", &self.file_prefix)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Options with the default limit, format and prefix.
    pub fn new() -> Self {
        Self {
            frame_limit: DEFAULT_FRAME_LIMIT,
            output_format: OutputFormat::Utah,
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
        }
    }

    /// Maximum number of frames to persist. Decoding continues past the
    /// limit; frames beyond it are dropped.
    #[must_use]
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = limit;
        self
    }

    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// File name prefix; the frame number and extension are appended.
    #[must_use]
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Report progress every `size` persisted frames (minimum 1).
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Maximum number of frames persisted per run.
    pub fn frame_limit(&self) -> u64 {
        self.frame_limit
    }

    /// Format frames are written in.
    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    /// Prefix of every output file name.
    pub fn file_prefix(&self) -> &str {
        &self.file_prefix
    }

    /// Reject prefixes that are empty or would escape the output directory.
    pub(crate) fn validate(&self) -> Result<(), UtahError> {
        let prefix = self.file_prefix.as_str();
        if prefix.is_empty() {
            return Err(UtahError::InvalidOption(
                "file prefix must not be empty".to_string(),
            ));
        }
        if prefix.contains('/') || prefix.contains(MAIN_SEPARATOR) {
            return Err(UtahError::InvalidOption(format!(
                "file prefix must not contain path separators: {prefix}"
            )));
        }
        Ok(())
    }
}
