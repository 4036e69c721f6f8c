//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for observing a run,
//! [`CancellationToken`] for cooperative cancellation, and
//! [`ExtractionProgress`] for the snapshots delivered after every written
//! frame.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framepick::{
//!     ExtractOptions, ExtractionController, ExtractionOutcome, ExtractionProgress,
//!     ExtractionRequest, FfmpegOpener, ImageFormat, ProgressCallback,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, progress: &ExtractionProgress) {
//!         println!("{:.1}% {}", progress.percentage, progress.last_message);
//!     }
//!
//!     fn on_finished(&self, outcome: &ExtractionOutcome) {
//!         println!("{}", outcome.message());
//!     }
//! }
//!
//! let controller = ExtractionController::new(FfmpegOpener);
//! let request = ExtractionRequest::new("input.mp4", "stills", 10, ImageFormat::Png);
//! let options = ExtractOptions::new().with_progress(Arc::new(PrintProgress));
//! let outcome = controller.run(&request, &options);
//! assert!(outcome.frames_written() <= 10);
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

use crate::outcome::ExtractionOutcome;

/// A snapshot of a running extraction.
///
/// One snapshot is emitted after each frame is written and verified, so
/// `frames_written` strictly increases from one snapshot to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionProgress {
    /// Frames written and verified so far.
    pub frames_written: u64,
    /// Number of frames in the sample plan.
    pub target: u64,
    /// Human-readable status line (e.g. `"Extracting frame 3/10"`).
    pub last_message: String,
    /// Completion percentage (0.0 – 100.0).
    pub percentage: f32,
    /// Source frame index of the frame just written.
    pub frame_index: u64,
    /// Wall-clock time since the run started.
    pub elapsed: Duration,
    /// Estimated time remaining based on throughput so far.
    pub estimated_remaining: Option<Duration>,
}

/// Receives progress snapshots and the terminal outcome of a run.
///
/// Implementations must be [`Send`] and [`Sync`] because background runs
/// call them from the worker thread. Callbacks observe but cannot halt a
/// run; use [`CancellationToken`] for that.
pub trait ProgressCallback: Send + Sync {
    /// Called after every successfully written frame.
    fn on_progress(&self, progress: &ExtractionProgress);

    /// Called exactly once when the run reaches a terminal state, after the
    /// last [`on_progress`](ProgressCallback::on_progress) call.
    fn on_finished(&self, _outcome: &ExtractionOutcome) {}
}

/// Discards all notifications. The default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _progress: &ExtractionProgress) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clones share state. The extraction loop checks
/// [`is_cancelled`](CancellationToken::is_cancelled) once before each frame,
/// so a cancelled run stops after at most one more decode-and-write.
///
/// ```
/// use framepick::CancellationToken;
///
/// let token = CancellationToken::new();
/// let remote = token.clone();
/// remote.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. Has no effect on a run that already finished.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellation as seen by one run.
///
/// Each run owns a fresh token, handed out through `ExtractionTask` and
/// `ExtractionStream`, so cancelling a finished run cannot reach the next
/// one. A token attached through
/// [`ExtractOptions::with_cancellation`](crate::ExtractOptions::with_cancellation)
/// is observed as well.
#[derive(Debug, Clone)]
pub(crate) struct RunCancellation {
    own: CancellationToken,
    attached: Option<CancellationToken>,
}

impl RunCancellation {
    pub(crate) fn new(attached: Option<CancellationToken>) -> Self {
        Self {
            own: CancellationToken::new(),
            attached,
        }
    }

    /// The run's own token.
    pub(crate) fn token(&self) -> CancellationToken {
        self.own.clone()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.own.is_cancelled()
            || self
                .attached
                .as_ref()
                .is_some_and(CancellationToken::is_cancelled)
    }
}

/// Counts written frames and builds snapshots for the callback.
pub(crate) struct ProgressTracker {
    target: u64,
    frames_written: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(target: u64) -> Self {
        Self {
            target,
            frames_written: 0,
            start_time: Instant::now(),
        }
    }

    pub(crate) fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Record one written frame and return the snapshot to publish.
    pub(crate) fn advance(&mut self, frame_index: u64) -> ExtractionProgress {
        self.frames_written += 1;
        let elapsed = self.start_time.elapsed();

        let percentage = if self.target > 0 {
            (self.frames_written as f32 / self.target as f32) * 100.0
        } else {
            100.0
        };

        let remaining = self.target.saturating_sub(self.frames_written);
        let estimated_remaining = u32::try_from(self.frames_written)
            .ok()
            .zip(u32::try_from(remaining).ok())
            .map(|(done, left)| elapsed / done * left);

        ExtractionProgress {
            frames_written: self.frames_written,
            target: self.target,
            last_message: format!("Extracting frame {}/{}", self.frames_written, self.target),
            percentage,
            frame_index,
            elapsed,
            estimated_remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_counts_and_formats() {
        let mut tracker = ProgressTracker::new(4);
        let first = tracker.advance(0);
        assert_eq!(first.frames_written, 1);
        assert_eq!(first.percentage, 25.0);
        assert_eq!(first.last_message, "Extracting frame 1/4");

        let _ = tracker.advance(10);
        let _ = tracker.advance(20);
        let last = tracker.advance(30);
        assert_eq!(last.frames_written, 4);
        assert_eq!(last.percentage, 100.0);
        assert_eq!(last.estimated_remaining, Some(Duration::ZERO));
        assert_eq!(tracker.frames_written(), 4);
    }

    #[test]
    fn run_cancellation_observes_both_tokens() {
        let attached = CancellationToken::new();
        let run = RunCancellation::new(Some(attached.clone()));
        assert!(!run.is_cancelled());
        attached.cancel();
        assert!(run.is_cancelled());

        let run = RunCancellation::new(None);
        run.token().cancel();
        assert!(run.is_cancelled());
    }

    #[test]
    fn own_token_does_not_touch_attached() {
        let attached = CancellationToken::new();
        let run = RunCancellation::new(Some(attached.clone()));
        run.token().cancel();
        assert!(run.is_cancelled());
        assert!(!attached.is_cancelled());
        assert!(!RunCancellation::new(Some(attached)).is_cancelled());
    }
}
