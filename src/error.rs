//! Error types for the `framepick` crate.
//!
//! This module defines [`FramePickError`], the error type returned by every
//! fallible operation, and [`FailureKind`], the coarse classification carried
//! by a failed [`ExtractionOutcome`](crate::ExtractionOutcome). Errors carry
//! the path, frame index, or upstream message needed to explain the failure
//! without extra logging at the call site.

use std::{fmt, io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use thiserror::Error;

/// The unified error type for all `framepick` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramePickError {
    /// The source video does not exist.
    #[error("Video file not found: {0}")]
    SourceNotFound(PathBuf),

    /// The source exists but its container could not be read.
    #[error("Failed to open video file at {path}: {reason}")]
    UnreadableContainer {
        /// Path that was passed to the opener.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in {0}")]
    NoVideoStream(PathBuf),

    /// The video reports zero frames, so there is nothing to sample.
    #[error("Video at {0} has no frames")]
    EmptyVideo(PathBuf),

    /// The output directory does not exist.
    #[error("Output directory does not exist: {0}")]
    OutputDirectoryMissing(PathBuf),

    /// The output path exists but is not a directory.
    #[error("Output path is not a directory: {0}")]
    OutputNotDirectory(PathBuf),

    /// The requested number of frames is zero or exceeds the video length.
    #[error("Frame count must be between 1 and {total_frames}, got {requested}")]
    InvalidFrameCount {
        /// The number of frames the caller asked for.
        requested: u64,
        /// The total number of frames in the video.
        total_frames: u64,
    },

    /// Another extraction is already running on this controller.
    #[error("An extraction is already running")]
    AlreadyRunning,

    /// The background extraction thread could not be started.
    #[error("Failed to start extraction thread: {0}")]
    WorkerUnavailable(#[source] IoError),

    /// The background extraction thread ended without reporting an outcome.
    #[error("Extraction thread exited without reporting an outcome")]
    WorkerLost,

    /// Seeking to a frame failed.
    #[error("Failed to seek to frame {frame_index}: {reason}")]
    SeekFailed {
        /// The frame the source was asked to seek to.
        frame_index: u64,
        /// Upstream reason.
        reason: String,
    },

    /// Decoding the frame at the seek position failed.
    #[error("Failed to read frame at position {frame_index}: {reason}")]
    DecodeFailed {
        /// The frame that could not be decoded.
        frame_index: u64,
        /// Upstream reason.
        reason: String,
    },

    /// The stream ended before the requested frame was reached.
    ///
    /// The controller treats this as an early end of the run rather than a
    /// failure, since frame counts taken from container headers are
    /// frequently off by a few frames.
    #[error("Stream ended before frame {frame_index}")]
    EndOfStream {
        /// The frame that was never reached.
        frame_index: u64,
    },

    /// The frame could not be encoded to the requested image format.
    #[error("Failed to encode frame {path}: {reason}")]
    EncodeFailed {
        /// Destination the frame was meant for.
        path: PathBuf,
        /// Encoder message.
        reason: String,
    },

    /// The encoded bytes could not be written.
    #[error("Failed to save frame {path}: {source}")]
    WriteFailed {
        /// Destination file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: IoError,
    },

    /// The file written is missing or empty after the write returned.
    #[error("Frame file {path} failed verification: {reason}")]
    VerifyFailed {
        /// File that was checked.
        path: PathBuf,
        /// What the check found.
        reason: String,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),
}

impl From<FfmpegError> for FramePickError {
    fn from(error: FfmpegError) -> Self {
        FramePickError::FfmpegError(error.to_string())
    }
}

/// Which stage of a run produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The request was rejected before any frame was touched.
    Validation,
    /// Opening, seeking, or decoding the video failed.
    Source,
    /// Encoding, writing, or verifying an output image failed.
    Sink,
    /// The controller was already running another extraction.
    Busy,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Validation => "validation",
            FailureKind::Source => "source",
            FailureKind::Sink => "sink",
            FailureKind::Busy => "busy",
        };
        f.write_str(label)
    }
}

impl FramePickError {
    /// Classify this error for reporting in an outcome.
    pub fn kind(&self) -> FailureKind {
        match self {
            FramePickError::SourceNotFound(_)
            | FramePickError::EmptyVideo(_)
            | FramePickError::OutputDirectoryMissing(_)
            | FramePickError::OutputNotDirectory(_)
            | FramePickError::InvalidFrameCount { .. } => FailureKind::Validation,
            FramePickError::AlreadyRunning | FramePickError::WorkerUnavailable(_) => {
                FailureKind::Busy
            }
            FramePickError::UnreadableContainer { .. }
            | FramePickError::NoVideoStream(_)
            | FramePickError::SeekFailed { .. }
            | FramePickError::DecodeFailed { .. }
            | FramePickError::EndOfStream { .. }
            | FramePickError::WorkerLost
            | FramePickError::FfmpegError(_) => FailureKind::Source,
            FramePickError::EncodeFailed { .. }
            | FramePickError::WriteFailed { .. }
            | FramePickError::VerifyFailed { .. } => FailureKind::Sink,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_stage() {
        let decode = FramePickError::DecodeFailed {
            frame_index: 3,
            reason: "bad packet".to_string(),
        };
        assert_eq!(decode.kind(), FailureKind::Source);

        let verify = FramePickError::VerifyFailed {
            path: PathBuf::from("frame_0001.png"),
            reason: "file is empty".to_string(),
        };
        assert_eq!(verify.kind(), FailureKind::Sink);

        let count = FramePickError::InvalidFrameCount {
            requested: 0,
            total_frames: 10,
        };
        assert_eq!(count.kind(), FailureKind::Validation);
        assert_eq!(FramePickError::AlreadyRunning.kind(), FailureKind::Busy);
    }

    #[test]
    fn messages_carry_context() {
        let error = FramePickError::DecodeFailed {
            frame_index: 40,
            reason: "eof".to_string(),
        };
        assert_eq!(error.to_string(), "Failed to read frame at position 40: eof");
    }
}
