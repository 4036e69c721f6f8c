//! FFmpeg-backed video source.
//!
//! [`FfmpegOpener`] opens files through `ffmpeg-next` and produces
//! [`FfmpegSource`]s. Each `seek_and_decode` call seeks to the nearest
//! keyframe at or before the target, then decodes forward until the frame
//! whose presentation timestamp maps to the requested index (or the first
//! frame after it, for streams with gaps). Frames are converted to RGB24 by
//! the software scaler.
//!
//! This module also exposes [`set_ffmpeg_log_level`] for tuning FFmpeg's own
//! console output, which is separate from the `log` crate diagnostics the
//! rest of the crate emits.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::log::Level,
};
use image::{DynamicImage, RgbImage};

use crate::{
    error::FramePickError,
    metadata::VideoMetadata,
    source::{SourceOpener, VideoSource},
};

/// Opens videos with FFmpeg.
///
/// # Example
///
/// ```no_run
/// use framepick::{FfmpegOpener, SourceOpener, VideoSource};
///
/// let mut source = FfmpegOpener.open("input.mp4".as_ref())?;
/// println!("{}", source.metadata());
/// let first = source.seek_and_decode(0)?;
/// first.save("first.png")?;
/// source.close();
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegOpener;

impl SourceOpener for FfmpegOpener {
    type Source = FfmpegSource;

    fn open(&self, path: &Path) -> Result<FfmpegSource, FramePickError> {
        FfmpegSource::open(path)
    }
}

/// Demuxer, decoder, and scaler for one open video.
struct OpenStream {
    input: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
}

/// A video opened through FFmpeg.
pub struct FfmpegSource {
    stream: Option<OpenStream>,
    metadata: VideoMetadata,
    stream_index: usize,
    time_base: Rational,
    /// Stream start time in stream time-base units.
    start_pts: i64,
    path: PathBuf,
}

impl std::fmt::Debug for FfmpegSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegSource")
            .field("path", &self.path)
            .field("metadata", &self.metadata)
            .field("stream_index", &self.stream_index)
            .field("open", &self.stream.is_some())
            .finish_non_exhaustive()
    }
}

impl FfmpegSource {
    /// Open `path` and read the metadata of its best video stream.
    ///
    /// # Errors
    ///
    /// See [`SourceOpener::open`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FramePickError> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening video: {}", path.display());

        if !path.exists() {
            return Err(FramePickError::SourceNotFound(path));
        }

        let unreadable = |reason: String| FramePickError::UnreadableContainer {
            path: path.clone(),
            reason,
        };

        ffmpeg_next::init()
            .map_err(|error| unreadable(format!("FFmpeg initialisation failed: {error}")))?;

        let input = ffmpeg_next::format::input(&path).map_err(|error| unreadable(error.to_string()))?;

        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or_else(|| FramePickError::NoVideoStream(path.clone()))?;
        let stream_index = stream.index();
        let time_base = stream.time_base();
        let start_pts = stream.start_time().max(0);

        let decoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|error| unreadable(format!("cannot create video decoder: {error}")))?;

        let frames_per_second = rational_to_f64(stream.avg_frame_rate())
            .or_else(|| rational_to_f64(stream.rate()))
            .unwrap_or(0.0);

        let stream_seconds = if stream.duration() > 0 {
            stream.duration() as f64 * rational_to_f64(time_base).unwrap_or(0.0)
        } else {
            // Container duration is in AV_TIME_BASE (microseconds).
            input.duration().max(0) as f64 / 1_000_000.0
        };

        let frame_count = match stream.frames() {
            frames if frames > 0 => frames as u64,
            _ => (stream_seconds * frames_per_second) as u64,
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| unreadable(format!("cannot create RGB converter: {error}")))?;

        let metadata = VideoMetadata {
            frame_count,
            frames_per_second,
            width,
            height,
            codec,
        };

        log::debug!(
            "Opened {} (stream={}, {}x{}, {:.3} fps, {} frames)",
            path.display(),
            stream_index,
            width,
            height,
            frames_per_second,
            frame_count
        );

        Ok(Self {
            stream: Some(OpenStream {
                input,
                decoder,
                scaler,
            }),
            metadata,
            stream_index,
            time_base,
            start_pts,
            path,
        })
    }

    /// Map a decoded frame's timestamp to a 0-based frame index.
    fn frame_index_of(&self, frame: &VideoFrame) -> u64 {
        let pts = frame.timestamp().or(frame.pts()).unwrap_or(self.start_pts);
        let seconds = (pts - self.start_pts) as f64 * rational_to_f64(self.time_base).unwrap_or(0.0);
        (seconds * self.metadata.frames_per_second).round().max(0.0) as u64
    }
}

impl VideoSource for FfmpegSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn seek_and_decode(&mut self, frame_index: u64) -> Result<DynamicImage, FramePickError> {
        let fps = self.metadata.frames_per_second;
        if fps <= 0.0 {
            return Err(FramePickError::SeekFailed {
                frame_index,
                reason: "stream has no usable frame rate".to_string(),
            });
        }

        let start_seconds = self.start_pts as f64 * rational_to_f64(self.time_base).unwrap_or(0.0);
        let seek_timestamp = ((frame_index as f64 / fps + start_seconds) * 1_000_000.0) as i64;

        let Some(mut open) = self.stream.take() else {
            return Err(FramePickError::DecodeFailed {
                frame_index,
                reason: "source is closed".to_string(),
            });
        };
        let result = self.decode_at(&mut open, frame_index, seek_timestamp);
        self.stream = Some(open);
        result
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            log::debug!("Closed video: {}", self.path.display());
        }
    }
}

impl FfmpegSource {
    fn decode_at(
        &self,
        open: &mut OpenStream,
        frame_index: u64,
        seek_timestamp: i64,
    ) -> Result<DynamicImage, FramePickError> {
        let decode_failed = |error: ffmpeg_next::Error| FramePickError::DecodeFailed {
            frame_index,
            reason: error.to_string(),
        };

        open.input
            .seek(seek_timestamp, ..seek_timestamp)
            .map_err(|error| FramePickError::SeekFailed {
                frame_index,
                reason: error.to_string(),
            })?;
        open.decoder.flush();

        let mut decoded = VideoFrame::empty();

        for (stream, packet) in open.input.packets() {
            if stream.index() != self.stream_index {
                continue;
            }
            open.decoder.send_packet(&packet).map_err(decode_failed)?;

            while open.decoder.receive_frame(&mut decoded).is_ok() {
                if self.frame_index_of(&decoded) >= frame_index {
                    return to_rgb_image(&mut open.scaler, &decoded, &self.metadata, frame_index);
                }
            }
        }

        open.decoder.send_eof().map_err(decode_failed)?;
        while open.decoder.receive_frame(&mut decoded).is_ok() {
            if self.frame_index_of(&decoded) >= frame_index {
                return to_rgb_image(&mut open.scaler, &decoded, &self.metadata, frame_index);
            }
        }

        Err(FramePickError::EndOfStream { frame_index })
    }
}

fn rational_to_f64(value: Rational) -> Option<f64> {
    (value.denominator() != 0 && value.numerator() != 0)
        .then(|| f64::from(value.numerator()) / f64::from(value.denominator()))
}

/// Convert a decoded frame to an RGB image, dropping any row padding.
fn to_rgb_image(
    scaler: &mut ScalingContext,
    decoded: &VideoFrame,
    metadata: &VideoMetadata,
    frame_index: u64,
) -> Result<DynamicImage, FramePickError> {
    let mut rgb_frame = VideoFrame::empty();
    scaler
        .run(decoded, &mut rgb_frame)
        .map_err(|error| FramePickError::DecodeFailed {
            frame_index,
            reason: format!("pixel conversion failed: {error}"),
        })?;

    let row_bytes = metadata.width as usize * 3;
    let rows = metadata.height as usize;
    let stride = rgb_frame.stride(0);
    let plane = rgb_frame.data(0);

    let pixels: Vec<u8> = if stride == row_bytes {
        plane[..row_bytes * rows].to_vec()
    } else {
        plane
            .chunks(stride)
            .take(rows)
            .flat_map(|row| &row[..row_bytes])
            .copied()
            .collect()
    };

    RgbImage::from_raw(metadata.width, metadata.height, pixels)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| FramePickError::DecodeFailed {
            frame_index,
            reason: "decoded frame is smaller than the stream dimensions".to_string(),
        })
}

/// FFmpeg's own console verbosity.
///
/// Ordered from silent to most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// No output.
    Quiet,
    /// Unrecoverable errors only.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Debugging output.
    Debug,
}

impl FromStr for FfmpegLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" | "off" => Ok(FfmpegLogLevel::Quiet),
            "fatal" => Ok(FfmpegLogLevel::Fatal),
            "error" => Ok(FfmpegLogLevel::Error),
            "warning" | "warn" => Ok(FfmpegLogLevel::Warning),
            "info" => Ok(FfmpegLogLevel::Info),
            "debug" => Ok(FfmpegLogLevel::Debug),
            other => Err(format!("unsupported FFmpeg log level: {other}")),
        }
    }
}

/// Set FFmpeg's console verbosity. Does not affect `log` crate output.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    let level = match level {
        FfmpegLogLevel::Quiet => Level::Quiet,
        FfmpegLogLevel::Fatal => Level::Fatal,
        FfmpegLogLevel::Error => Level::Error,
        FfmpegLogLevel::Warning => Level::Warning,
        FfmpegLogLevel::Info => Level::Info,
        FfmpegLogLevel::Debug => Level::Debug,
    };
    ffmpeg_next::util::log::set_level(level);
}
