//! Persistence of extracted frames.
//!
//! A [`FrameSink`] receives every frame the pipeline keeps, already
//! converted to the layout the sink asked for. [`DirectorySink`] writes one
//! file per frame into a directory:
//!
//! ```text
//! <directory>/<prefix><N>.<extension>     N = 1, 2, 3, …
//! ```
//!
//! Files are written one at a time. A failed run leaves the files written
//! before the failure in place.

use std::{
    fs,
    path::{Path, PathBuf},
};

use image::{
    ExtendedColorType, ImageEncoder,
    codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding},
};

use crate::{
    config::{ExtractOptions, OutputFormat},
    encoder::UtahEncoder,
    error::{FormatError, UtahError},
    frame::{Frame, PixelLayout},
};

/// Destination for extracted frames.
pub trait FrameSink {
    /// Layout frames are converted to before [`persist`](FrameSink::persist).
    fn pixel_layout(&self) -> PixelLayout;

    /// Store frame number `number` (1-based, consecutive).
    fn persist(&mut self, number: u64, frame: &Frame) -> Result<(), UtahError>;
}

/// Path of frame `number` inside `directory`.
///
/// ```
/// use std::path::Path;
///
/// let path = utahframe::frame_path(Path::new("out"), "frame", 12, "utah");
/// assert_eq!(path, Path::new("out").join("frame12.utah"));
/// ```
pub fn frame_path(directory: &Path, prefix: &str, number: u64, extension: &str) -> PathBuf {
    directory.join(format!("{prefix}{number}.{extension}"))
}

/// Writes each frame to its own file.
#[derive(Debug)]
pub struct DirectorySink {
    directory: PathBuf,
    prefix: String,
    format: OutputFormat,
    encoder: Option<UtahEncoder>,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    /// Create the sink, creating `directory` if needed.
    ///
    /// # Errors
    ///
    /// [`UtahError::InvalidOption`] for an unusable file prefix, or an I/O
    /// error if the directory cannot be created.
    pub fn new(directory: impl Into<PathBuf>, options: &ExtractOptions) -> Result<Self, UtahError> {
        options.validate()?;
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            prefix: options.file_prefix.clone(),
            format: options.output_format,
            encoder: None,
            written: Vec::new(),
        })
    }

    /// Directory frames are written to.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path the frame numbered `number` is written to.
    pub fn frame_path(&self, number: u64) -> PathBuf {
        frame_path(&self.directory, &self.prefix, number, self.format.extension())
    }

    /// Paths written so far, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn encode_utah(&mut self, frame: &Frame) -> Result<&[u8], UtahError> {
        let encoder = match self.encoder.take() {
            Some(encoder)
                if encoder.width() == frame.width() && encoder.height() == frame.height() =>
            {
                encoder
            }
            _ => UtahEncoder::new(frame.layout(), frame.width(), frame.height())?,
        };
        let encoder = self.encoder.insert(encoder);
        Ok(encoder.encode(frame)?.data())
    }
}

impl FrameSink for DirectorySink {
    fn pixel_layout(&self) -> PixelLayout {
        self.format.pixel_layout()
    }

    fn persist(&mut self, number: u64, frame: &Frame) -> Result<(), UtahError> {
        let path = self.frame_path(number);
        let result = match self.format {
            OutputFormat::Utah => {
                let bytes = self.encode_utah(frame)?;
                fs::write(&path, bytes)
            }
            OutputFormat::Ppm => fs::write(&path, encode_ppm(frame)?),
        };
        result.map_err(|source| UtahError::Write {
            path: path.clone(),
            source,
        })?;

        log::trace!("Wrote frame {number} to {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

/// Serialize an RGB24 frame as a binary portable pixmap.
pub fn encode_ppm(frame: &Frame) -> Result<Vec<u8>, UtahError> {
    if frame.layout() != PixelLayout::Rgb24 {
        return Err(FormatError::UnsupportedPixelFormat(frame.layout()).into());
    }
    let mut buffer = Vec::new();
    PnmEncoder::new(&mut buffer)
        .with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary))
        .write_image(
            &frame.to_packed(),
            frame.width(),
            frame.height(),
            ExtendedColorType::Rgb8,
        )?;
    Ok(buffer)
}
