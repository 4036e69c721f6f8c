//! Writing extracted frames to disk.
//!
//! [`FrameWriter`] encodes one decoded frame into an image file named
//! `frame_NNNN.<ext>` and then checks that the file really landed on disk.
//! The check catches truncated writes (full disk, permission races) that the
//! write call itself does not report.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{self, File},
    io::{self, Cursor, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use image::{
    DynamicImage, ImageEncoder,
    codecs::{jpeg::JpegEncoder, png::PngEncoder},
};

use crate::error::FramePickError;

/// Default JPEG quality, matching common photo-viewer defaults.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Output image encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageFormat {
    /// JPEG, written with the `.jpg` extension.
    #[default]
    Jpeg,
    /// Lossless PNG.
    Png,
}

impl ImageFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
        }
    }
}

impl Display for ImageFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            "png" => Ok(ImageFormat::Png),
            other => Err(format!("unsupported image format: {other} (expected jpg or png)")),
        }
    }
}

/// File name for the given 1-based sequence number.
///
/// Numbers are zero-padded to at least four digits; larger numbers keep all
/// their digits.
///
/// ```
/// use framepick::{ImageFormat, frame_file_name};
///
/// assert_eq!(frame_file_name(7, ImageFormat::Png), "frame_0007.png");
/// assert_eq!(frame_file_name(12345, ImageFormat::Jpeg), "frame_12345.jpg");
/// ```
pub fn frame_file_name(sequence_number: u64, format: ImageFormat) -> String {
    format!("frame_{sequence_number:04}.{}", format.extension())
}

/// Encodes frames and verifies the resulting files.
///
/// The writer holds no per-run state. Sequence numbers are supplied by the
/// caller, so each call creates or replaces exactly one file.
#[derive(Debug, Clone, Copy)]
pub struct FrameWriter {
    jpeg_quality: u8,
}

impl Default for FrameWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameWriter {
    /// Create a writer with the default JPEG quality.
    pub fn new() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Set the JPEG quality. Clamped to 1–100.
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// The JPEG quality in use.
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Encode `frame` into `output_directory` and verify the write.
    ///
    /// Returns the path of the written file.
    ///
    /// # Errors
    ///
    /// - [`FramePickError::EncodeFailed`] if the image encoder rejects the frame.
    /// - [`FramePickError::WriteFailed`] if the bytes cannot be written.
    /// - [`FramePickError::VerifyFailed`] if the file is missing or empty
    ///   afterwards.
    pub fn write(
        &self,
        frame: &DynamicImage,
        output_directory: &Path,
        sequence_number: u64,
        format: ImageFormat,
    ) -> Result<PathBuf, FramePickError> {
        let path = output_directory.join(frame_file_name(sequence_number, format));

        let bytes = self.encode(frame, format).map_err(|error| {
            FramePickError::EncodeFailed {
                path: path.clone(),
                reason: error.to_string(),
            }
        })?;

        let write_failed = |source: io::Error| FramePickError::WriteFailed {
            path: path.clone(),
            source,
        };

        // A file that cannot be opened was neither created nor truncated,
        // so whatever is at `path` stays untouched.
        let mut file = File::create(&path).map_err(write_failed)?;
        let written = file.write_all(&bytes).map_err(write_failed);
        drop(file);
        let written = written.and_then(|()| verify_written(&path));

        if let Err(error) = written {
            // Never leave a truncated frame behind.
            let _ = fs::remove_file(&path);
            return Err(error);
        }
        log::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    fn encode(&self, frame: &DynamicImage, format: ImageFormat) -> image::ImageResult<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        match format {
            ImageFormat::Jpeg => {
                // JPEG has no alpha channel.
                let rgb = frame.to_rgb8();
                JpegEncoder::new_with_quality(&mut buffer, self.jpeg_quality).write_image(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    image::ExtendedColorType::Rgb8,
                )?;
            }
            ImageFormat::Png => {
                frame.write_with_encoder(PngEncoder::new(&mut buffer))?;
            }
        }
        Ok(buffer.into_inner())
    }
}

/// Re-stat a written file and fail if it is missing or empty.
pub(crate) fn verify_written(path: &Path) -> Result<(), FramePickError> {
    let metadata = fs::metadata(path).map_err(|error| FramePickError::VerifyFailed {
        path: path.to_path_buf(),
        reason: format!("file is missing after write: {error}"),
    })?;
    if !metadata.is_file() {
        return Err(FramePickError::VerifyFailed {
            path: path.to_path_buf(),
            reason: "not a regular file".to_string(),
        });
    }
    if metadata.len() == 0 {
        return Err(FramePickError::VerifyFailed {
            path: path.to_path_buf(),
            reason: "file is empty".to_string(),
        });
    }
    Ok(())
}
