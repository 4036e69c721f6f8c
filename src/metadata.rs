//! Video metadata.
//!
//! [`VideoMetadata`] is read once from a [`VideoSource`](crate::VideoSource)
//! when it is opened and stays fixed for the lifetime of a run.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

/// Metadata for the video stream being sampled.
///
/// # Example
///
/// ```
/// use framepick::VideoMetadata;
///
/// let metadata = VideoMetadata::new(300, 30.0, 1920, 1080);
/// assert_eq!(metadata.duration().as_secs(), 10);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Total number of frames reported by the container.
    pub frame_count: u64,
    /// Frames per second (average rate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Codec name (e.g. `"h264"`), or `"unknown"`.
    pub codec: String,
}

impl VideoMetadata {
    /// Build metadata with an unknown codec.
    pub fn new(frame_count: u64, frames_per_second: f64, width: u32, height: u32) -> Self {
        Self {
            frame_count,
            frames_per_second,
            width,
            height,
            codec: "unknown".to_string(),
        }
    }

    /// Set the codec name.
    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = codec.into();
        self
    }

    /// Duration derived from frame count and frame rate.
    ///
    /// Zero when the frame rate is not positive.
    pub fn duration(&self) -> Duration {
        if self.frames_per_second > 0.0 {
            Duration::from_secs_f64(self.frame_count as f64 / self.frames_per_second)
        } else {
            Duration::ZERO
        }
    }
}

impl Display for VideoMetadata {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let seconds = self.duration().as_secs_f64();
        writeln!(f, "Resolution: {}x{} pixels", self.width, self.height)?;
        writeln!(
            f,
            "Duration: {seconds:.2} seconds ({:.1} minutes)",
            seconds / 60.0
        )?;
        writeln!(f, "Total Frames: {}", group_thousands(self.frame_count))?;
        write!(f, "Frame Rate: {:.2} FPS", self.frames_per_second)
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (position, digit) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_from_frames() {
        let metadata = VideoMetadata::new(100, 25.0, 640, 480);
        assert_eq!(metadata.duration(), Duration::from_secs(4));
    }

    #[test]
    fn zero_rate_has_no_duration() {
        let metadata = VideoMetadata::new(100, 0.0, 640, 480);
        assert_eq!(metadata.duration(), Duration::ZERO);
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn summary_lines() {
        let summary = VideoMetadata::new(9000, 30.0, 1280, 720).to_string();
        assert!(summary.contains("Resolution: 1280x720 pixels"));
        assert!(summary.contains("Duration: 300.00 seconds (5.0 minutes)"));
        assert!(summary.contains("Total Frames: 9,000"));
        assert!(summary.contains("Frame Rate: 30.00 FPS"));
    }
}
