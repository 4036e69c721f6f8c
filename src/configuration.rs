//! Extraction options.
//!
//! [`ExtractOptions`] is a builder that threads the progress callback,
//! cancellation token, and encoder settings through a run without
//! widening every function signature.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framepick::{CancellationToken, ExtractOptions, ExtractionProgress, ProgressCallback};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, progress: &ExtractionProgress) {
//!         println!("{}", progress.last_message);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = ExtractOptions::new()
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone())
//!     .with_jpeg_quality(85);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback, RunCancellation};
use crate::writer::{DEFAULT_JPEG_QUALITY, FrameWriter};

/// Default capacity of the event channel used by async streams.
pub(crate) const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Options for an extraction run.
///
/// A default-constructed value reports nothing, is never cancelled, and
/// writes JPEGs at quality 95.
#[derive(Clone)]
pub struct ExtractOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) jpeg_quality: u8,
    pub(crate) channel_capacity: usize,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("has_cancellation", &self.cancellation.is_some())
            .field("jpeg_quality", &self.jpeg_quality)
            .field("channel_capacity", &self.channel_capacity)
            .finish_non_exhaustive()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// Background runs started with
    /// [`spawn`](crate::ExtractionController::spawn) reuse this token for
    /// [`ExtractionTask::cancel`](crate::ExtractionTask::cancel), so either
    /// side can stop the run.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set the JPEG quality. Clamped to 1–100.
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Set the number of buffered events for async streams. Minimum 1.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Fresh cancellation state for one run, observing the attached token.
    pub(crate) fn run_cancellation(&self) -> RunCancellation {
        RunCancellation::new(self.cancellation.clone())
    }

    pub(crate) fn writer(&self) -> FrameWriter {
        FrameWriter::new().with_jpeg_quality(self.jpeg_quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let debug = format!("{:?}", ExtractOptions::new());
        assert!(debug.contains("has_cancellation: false"));
        assert!(debug.contains("jpeg_quality: 95"));
    }

    #[test]
    fn attached_token_is_shared() {
        let token = CancellationToken::new();
        let options = ExtractOptions::new().with_cancellation(token.clone());
        token.cancel();
        assert!(options.run_cancellation().is_cancelled());
    }

    #[test]
    fn capacity_minimum() {
        let options = ExtractOptions::new().with_channel_capacity(0);
        assert_eq!(options.channel_capacity, 1);
    }
}
