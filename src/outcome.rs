//! Terminal results and controller states.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::{FailureKind, FramePickError};

/// How a run ended. Produced exactly once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum ExtractionOutcome {
    /// Every planned frame was written and verified.
    Completed {
        /// Frames written.
        frames_written: u64,
    },
    /// The run was cancelled, or the video ran out before the plan did.
    StoppedByUser {
        /// Frames written before stopping.
        frames_written: u64,
    },
    /// A validation, source, or sink error ended the run.
    Failed {
        /// Human-readable description of the error.
        reason: String,
        /// Which stage failed.
        kind: FailureKind,
        /// Frames written before the failure.
        frames_written: u64,
    },
}

impl ExtractionOutcome {
    pub(crate) fn failed(error: &FramePickError, frames_written: u64) -> Self {
        ExtractionOutcome::Failed {
            reason: error.to_string(),
            kind: error.kind(),
            frames_written,
        }
    }

    /// Frames written before the run ended, whatever the outcome.
    pub fn frames_written(&self) -> u64 {
        match self {
            ExtractionOutcome::Completed { frames_written }
            | ExtractionOutcome::StoppedByUser { frames_written }
            | ExtractionOutcome::Failed { frames_written, .. } => *frames_written,
        }
    }

    /// Returns `true` for [`ExtractionOutcome::Completed`].
    pub fn is_completed(&self) -> bool {
        matches!(self, ExtractionOutcome::Completed { .. })
    }

    /// The state a controller settles in after this outcome.
    pub fn state(&self) -> ExtractionState {
        match self {
            ExtractionOutcome::Completed { .. } => ExtractionState::Completed,
            ExtractionOutcome::StoppedByUser { .. } => ExtractionState::StoppedByUser,
            ExtractionOutcome::Failed { .. } => ExtractionState::Failed,
        }
    }

    /// A one-line message suitable for a status bar or dialog.
    pub fn message(&self) -> String {
        match self {
            ExtractionOutcome::Completed { frames_written } => {
                format!("Successfully extracted {frames_written} frames!")
            }
            ExtractionOutcome::StoppedByUser { frames_written } => {
                format!("Extraction stopped after {frames_written} frames.")
            }
            ExtractionOutcome::Failed {
                reason,
                frames_written,
                ..
            } => format!("Extraction failed after {frames_written} frames: {reason}"),
        }
    }
}

impl Display for ExtractionOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.message())
    }
}

/// Lifecycle of an [`ExtractionController`](crate::ExtractionController).
///
/// `Running` is the only non-terminal state after the first run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExtractionState {
    /// No run has started yet.
    #[default]
    Idle,
    /// A run is in progress.
    Running,
    /// The last run wrote every planned frame.
    Completed,
    /// The last run was cancelled or ended early.
    StoppedByUser,
    /// The last run failed.
    Failed,
}

impl ExtractionState {
    /// Returns `true` for any state other than `Idle` and `Running`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, ExtractionState::Idle | ExtractionState::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let completed = ExtractionOutcome::Completed { frames_written: 5 };
        assert_eq!(completed.message(), "Successfully extracted 5 frames!");

        let stopped = ExtractionOutcome::StoppedByUser { frames_written: 2 };
        assert_eq!(stopped.message(), "Extraction stopped after 2 frames.");
        assert_eq!(stopped.state(), ExtractionState::StoppedByUser);
    }

    #[test]
    fn failed_carries_kind() {
        let error = FramePickError::EndOfStream { frame_index: 9 };
        let outcome = ExtractionOutcome::failed(&error, 3);
        assert_eq!(outcome.frames_written(), 3);
        match outcome {
            ExtractionOutcome::Failed { kind, .. } => assert_eq!(kind, FailureKind::Source),
            other => panic!("Expected Failed, got: {other:?}"),
        }
    }

    #[test]
    fn terminal_states() {
        assert!(!ExtractionState::Idle.is_terminal());
        assert!(!ExtractionState::Running.is_terminal());
        assert!(ExtractionState::Failed.is_terminal());
    }
}
