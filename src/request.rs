//! Extraction requests and their validation.
//!
//! An [`ExtractionRequest`] names the video, the output directory, how many
//! stills to take, and the image format. Validation happens in two steps:
//! [`validate_paths`](ExtractionRequest::validate_paths) checks the request
//! on its own, and [`validate_against`](ExtractionRequest::validate_against)
//! checks the frame count once the video's metadata is known.

use std::path::{Path, PathBuf};

use crate::{error::FramePickError, metadata::VideoMetadata, writer::ImageFormat};

/// What to extract and where to put it.
///
/// # Example
///
/// ```
/// use framepick::{ExtractionRequest, ImageFormat};
///
/// let request = ExtractionRequest::new("clip.mp4", "stills", 10, ImageFormat::Png);
/// assert_eq!(request.desired_frame_count, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    /// Video to sample.
    pub source_path: PathBuf,
    /// Existing directory that receives `frame_NNNN.<ext>` files.
    pub output_directory: PathBuf,
    /// Number of evenly spaced stills to extract.
    pub desired_frame_count: u64,
    /// Encoding for the output images.
    pub image_format: ImageFormat,
}

impl ExtractionRequest {
    /// Create a request.
    pub fn new<S: AsRef<Path>, O: AsRef<Path>>(
        source_path: S,
        output_directory: O,
        desired_frame_count: u64,
        image_format: ImageFormat,
    ) -> Self {
        Self {
            source_path: source_path.as_ref().to_path_buf(),
            output_directory: output_directory.as_ref().to_path_buf(),
            desired_frame_count,
            image_format,
        }
    }

    /// Create a request that writes next to the video itself.
    ///
    /// A bare file name resolves to the current directory.
    pub fn beside_source<S: AsRef<Path>>(
        source_path: S,
        desired_frame_count: u64,
        image_format: ImageFormat,
    ) -> Self {
        let source_path = source_path.as_ref().to_path_buf();
        let output_directory = match source_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self {
            source_path,
            output_directory,
            desired_frame_count,
            image_format,
        }
    }

    /// Check everything that does not need the video to be opened.
    ///
    /// # Errors
    ///
    /// - [`FramePickError::SourceNotFound`] if the video does not exist.
    /// - [`FramePickError::OutputDirectoryMissing`] /
    ///   [`FramePickError::OutputNotDirectory`] for a bad output path.
    /// - [`FramePickError::InvalidFrameCount`] if zero frames were requested.
    pub fn validate_paths(&self) -> Result<(), FramePickError> {
        if !self.source_path.is_file() {
            return Err(FramePickError::SourceNotFound(self.source_path.clone()));
        }
        if !self.output_directory.exists() {
            return Err(FramePickError::OutputDirectoryMissing(
                self.output_directory.clone(),
            ));
        }
        if !self.output_directory.is_dir() {
            return Err(FramePickError::OutputNotDirectory(
                self.output_directory.clone(),
            ));
        }
        if self.desired_frame_count == 0 {
            return Err(FramePickError::InvalidFrameCount {
                requested: 0,
                total_frames: 0,
            });
        }
        Ok(())
    }

    /// Check the requested count against the video's frame count.
    ///
    /// # Errors
    ///
    /// - [`FramePickError::EmptyVideo`] if the video has no frames.
    /// - [`FramePickError::InvalidFrameCount`] if the count is zero or larger
    ///   than the number of frames.
    pub fn validate_against(&self, metadata: &VideoMetadata) -> Result<(), FramePickError> {
        if metadata.frame_count == 0 {
            return Err(FramePickError::EmptyVideo(self.source_path.clone()));
        }
        if self.desired_frame_count == 0 || self.desired_frame_count > metadata.frame_count {
            return Err(FramePickError::InvalidFrameCount {
                requested: self.desired_frame_count,
                total_frames: metadata.frame_count,
            });
        }
        Ok(())
    }
}
