//! Destinations for finished images.

use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use mandelsync_bmp::{encode, BmpError};
use thiserror::Error;

use crate::ImageBuffer;

/// Errors that occur while persisting a finished image.
///
/// The image itself is left untouched, so persisting can be retried.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Opening or writing the destination failed.
    #[error("failed to write image: {0}")]
    Io(#[from] io::Error),

    /// The image could not be encoded.
    #[error("failed to encode image: {0}")]
    Encode(#[from] BmpError),
}

/// Accepts a fully populated image and persists it.
pub trait ImageSink {
    /// Persists `image`.
    fn persist(&mut self, image: &ImageBuffer) -> Result<(), SinkError>;
}

/// Writes images as bitmap files to a fixed path.
#[derive(Clone, Debug)]
pub struct BmpFileSink {
    path: PathBuf,
}

impl BmpFileSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSink for BmpFileSink {
    fn persist(&mut self, image: &ImageBuffer) -> Result<(), SinkError> {
        let file = fs::File::create(&self.path)?;
        let mut writer = BufWriter::new(file);

        encode(image, &mut writer)?;
        writer.flush()?;

        log::info!("Saved image to '{}'", self.path.display());
        Ok(())
    }
}

/// Encodes images as bitmaps into an arbitrary [`Write`]r.
#[derive(Debug)]
pub struct BmpWriterSink<W> {
    writer: W,
}

impl<W: Write> BmpWriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Gets the underlying writer back.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ImageSink for BmpWriterSink<W> {
    fn persist(&mut self, image: &ImageBuffer) -> Result<(), SinkError> {
        encode(image, &mut self.writer)?;
        self.writer.flush()?;

        Ok(())
    }
}
