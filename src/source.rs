//! The video source seam.
//!
//! The extraction loop only needs four things from a decoder: open a file,
//! report its metadata, produce the frame at a given index, and release its
//! resources. [`SourceOpener`] and [`VideoSource`] capture exactly that, so
//! the loop can run against FFmpeg ([`FfmpegOpener`](crate::FfmpegOpener))
//! or any other decoder.

use std::path::Path;

use image::DynamicImage;

use crate::{error::FramePickError, metadata::VideoMetadata};

/// An opened video that can produce frames by index.
///
/// `seek_and_decode` is not expected to be cheap: most decoders seek to the
/// nearest keyframe and decode forward from there.
pub trait VideoSource {
    /// Metadata read when the source was opened.
    fn metadata(&self) -> &VideoMetadata;

    /// Seek to `frame_index` and decode the frame there.
    ///
    /// # Errors
    ///
    /// - [`FramePickError::SeekFailed`] if the seek is rejected.
    /// - [`FramePickError::DecodeFailed`] if decoding fails.
    /// - [`FramePickError::EndOfStream`] if the stream ends before the frame.
    fn seek_and_decode(&mut self, frame_index: u64) -> Result<DynamicImage, FramePickError>;

    /// Release the decoder. Calling it more than once has no further effect.
    fn close(&mut self);
}

/// Opens [`VideoSource`]s from paths.
///
/// Openers are cloned into background threads, so the source itself never
/// has to cross a thread boundary.
pub trait SourceOpener: Clone + Send + 'static {
    /// The source type produced by this opener.
    type Source: VideoSource;

    /// Open the video at `path`.
    ///
    /// # Errors
    ///
    /// - [`FramePickError::SourceNotFound`] if the file does not exist.
    /// - [`FramePickError::UnreadableContainer`] if it cannot be demuxed.
    /// - [`FramePickError::NoVideoStream`] if it has no video track.
    fn open(&self, path: &Path) -> Result<Self::Source, FramePickError>;

    /// Read a video's metadata without keeping it open.
    ///
    /// Used to validate a request before a background run starts. The
    /// default implementation opens the source, copies its metadata, and
    /// closes it again.
    fn probe(&self, path: &Path) -> Result<VideoMetadata, FramePickError> {
        let mut source = self.open(path)?;
        let metadata = source.metadata().clone();
        source.close();
        Ok(metadata)
    }
}
