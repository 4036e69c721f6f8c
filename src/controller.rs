//! The extraction run loop.
//!
//! [`ExtractionController`] validates a request, opens the video, asks the
//! planner for the sample indices, and then seeks, decodes, and writes each
//! planned frame in order. A run ends in exactly one
//! [`ExtractionOutcome`]; the video is closed on every path out of the loop.
//!
//! Runs execute either on the calling thread ([`run`](ExtractionController::run))
//! or on a background thread ([`spawn`](ExtractionController::spawn)). A
//! background run delivers [`ExtractionEvent`]s over a channel, so a UI
//! thread can poll for progress without sharing any state with the worker.
//!
//! # Example
//!
//! ```no_run
//! use framepick::{
//!     ExtractOptions, ExtractionController, ExtractionEvent, ExtractionRequest,
//!     FfmpegOpener, ImageFormat,
//! };
//!
//! let controller = ExtractionController::new(FfmpegOpener);
//! let request = ExtractionRequest::new("input.mp4", "stills", 12, ImageFormat::Jpeg);
//! let mut task = controller.spawn(request, ExtractOptions::new())?;
//!
//! while let Some(event) = task.next_event() {
//!     match event {
//!         ExtractionEvent::Progress(progress) => println!("{}", progress.last_message),
//!         ExtractionEvent::Finished(outcome) => println!("{outcome}"),
//!     }
//! }
//! # Ok::<(), framepick::FramePickError>(())
//! ```

use std::{
    ops::{Deref, DerefMut},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        mpsc::{self, Receiver, RecvError, Sender, TryRecvError},
    },
    thread::{self, JoinHandle},
};

use crate::{
    configuration::ExtractOptions,
    error::FramePickError,
    metadata::VideoMetadata,
    outcome::{ExtractionOutcome, ExtractionState},
    planner,
    progress::{
        CancellationToken, ExtractionProgress, ProgressCallback, ProgressTracker, RunCancellation,
    },
    request::ExtractionRequest,
    source::{SourceOpener, VideoSource},
};

/// A message from a background run.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionEvent {
    /// A frame was written and verified.
    Progress(ExtractionProgress),
    /// The run ended. Always the last event of a run.
    Finished(ExtractionOutcome),
}

/// Drives extraction runs, at most one at a time.
///
/// The controller is generic over how videos are opened, so tests and
/// alternative decoders can stand in for FFmpeg.
#[derive(Debug)]
pub struct ExtractionController<O: SourceOpener> {
    opener: O,
    state: Arc<Mutex<ExtractionState>>,
}

impl<O: SourceOpener> ExtractionController<O> {
    /// Create an idle controller.
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            state: Arc::new(Mutex::new(ExtractionState::Idle)),
        }
    }

    /// The opener used for new runs.
    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ExtractionState {
        *lock_state(&self.state)
    }

    /// Returns `true` while a run is in progress.
    pub fn is_running(&self) -> bool {
        self.state() == ExtractionState::Running
    }

    /// Read a video's metadata, e.g. to show it before starting a run.
    ///
    /// # Errors
    ///
    /// Any error from [`SourceOpener::probe`].
    pub fn probe(&self, request: &ExtractionRequest) -> Result<VideoMetadata, FramePickError> {
        self.opener.probe(&request.source_path)
    }

    /// Run an extraction on the calling thread.
    ///
    /// Validation problems and a busy controller are reported as
    /// [`ExtractionOutcome::Failed`] with zero frames written. The options'
    /// progress callback receives every snapshot and then the outcome.
    pub fn run(&self, request: &ExtractionRequest, options: &ExtractOptions) -> ExtractionOutcome {
        let outcome = match self.prepare(request) {
            Ok(guard) => {
                let cancellation = options.run_cancellation();
                let outcome = execute(
                    &self.opener,
                    request,
                    options,
                    &cancellation,
                    options.progress.as_ref(),
                );
                guard.settle(outcome.state());
                outcome
            }
            Err(error) => {
                log::warn!("Extraction rejected: {error}");
                ExtractionOutcome::failed(&error, 0)
            }
        };
        options.progress.on_finished(&outcome);
        outcome
    }

    /// Validate `request` and start it on a background thread.
    ///
    /// Nothing is written and no thread is started when validation fails.
    ///
    /// # Errors
    ///
    /// - [`FramePickError::AlreadyRunning`] if a run is in progress.
    /// - Any validation or probe error for the request.
    /// - [`FramePickError::WorkerUnavailable`] if the thread cannot be started.
    pub fn spawn(
        &self,
        request: ExtractionRequest,
        options: ExtractOptions,
    ) -> Result<ExtractionTask, FramePickError> {
        let guard = self.prepare(&request)?;
        let cancellation = options.run_cancellation();
        let token = cancellation.token();
        let (sender, receiver) = mpsc::channel();

        let opener = self.opener.clone();
        let spawned = thread::Builder::new()
            .name("framepick-extract".to_string())
            .spawn(move || {
                let forwarder = ChannelProgress {
                    sender,
                    inner: Arc::clone(&options.progress),
                };
                let outcome = execute(&opener, &request, &options, &cancellation, &forwarder);
                guard.settle(outcome.state());
                forwarder.on_finished(&outcome);
            });

        match spawned {
            Ok(handle) => Ok(ExtractionTask {
                receiver,
                token,
                handle: Some(handle),
                outcome: None,
            }),
            // The guard was dropped along with the closure, marking the run failed.
            Err(error) => Err(FramePickError::WorkerUnavailable(error)),
        }
    }

    /// Claim the controller and validate a request.
    ///
    /// A rejected request leaves the controller in the state it was in.
    pub(crate) fn prepare(&self, request: &ExtractionRequest) -> Result<RunGuard, FramePickError> {
        let guard = RunGuard::acquire(&self.state)?;
        match self.validate(request) {
            Ok(()) => Ok(guard),
            Err(error) => {
                guard.release();
                Err(error)
            }
        }
    }

    fn validate(&self, request: &ExtractionRequest) -> Result<(), FramePickError> {
        request.validate_paths()?;
        let metadata = self.opener.probe(&request.source_path)?;
        request.validate_against(&metadata)
    }
}

/// A run executing on a background thread.
///
/// Events can be polled without blocking ([`try_next_event`](Self::try_next_event)),
/// received one at a time ([`next_event`](Self::next_event), or by iterating
/// the task), or drained with [`wait`](Self::wait).
#[derive(Debug)]
pub struct ExtractionTask {
    receiver: Receiver<ExtractionEvent>,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
    outcome: Option<ExtractionOutcome>,
}

impl ExtractionTask {
    /// Ask the run to stop before its next frame.
    ///
    /// Does nothing once the run has finished. The token belongs to this run
    /// only, so a token attached through
    /// [`ExtractOptions::with_cancellation`] is never set by this call.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// This run's own cancellation token.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// The outcome, once the `Finished` event has been received.
    pub fn outcome(&self) -> Option<&ExtractionOutcome> {
        self.outcome.as_ref()
    }

    /// Returns `true` once the `Finished` event has been received.
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Return the next pending event without blocking.
    pub fn try_next_event(&mut self) -> Option<ExtractionEvent> {
        if self.outcome.is_some() {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(event) => Some(self.record(event)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.record(worker_lost())),
        }
    }

    /// Block until the next event. Returns `None` after `Finished`.
    pub fn next_event(&mut self) -> Option<ExtractionEvent> {
        if self.outcome.is_some() {
            return None;
        }
        match self.receiver.recv() {
            Ok(event) => Some(self.record(event)),
            Err(RecvError) => Some(self.record(worker_lost())),
        }
    }

    /// Drain remaining events and return the outcome.
    pub fn wait(mut self) -> ExtractionOutcome {
        while self.next_event().is_some() {}
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        self.outcome.unwrap_or_else(|| {
            ExtractionOutcome::failed(&FramePickError::WorkerLost, 0)
        })
    }

    fn record(&mut self, event: ExtractionEvent) -> ExtractionEvent {
        if let ExtractionEvent::Finished(outcome) = &event {
            self.outcome = Some(outcome.clone());
        }
        event
    }
}

impl Iterator for ExtractionTask {
    type Item = ExtractionEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event()
    }
}

fn worker_lost() -> ExtractionEvent {
    ExtractionEvent::Finished(ExtractionOutcome::failed(&FramePickError::WorkerLost, 0))
}

/// Forwards worker notifications to the caller's callback and the channel.
struct ChannelProgress {
    sender: Sender<ExtractionEvent>,
    inner: Arc<dyn ProgressCallback>,
}

impl ProgressCallback for ChannelProgress {
    fn on_progress(&self, progress: &ExtractionProgress) {
        self.inner.on_progress(progress);
        // The receiver may have been dropped; the run continues regardless.
        let _ = self.sender.send(ExtractionEvent::Progress(progress.clone()));
    }

    fn on_finished(&self, outcome: &ExtractionOutcome) {
        self.inner.on_finished(outcome);
        let _ = self.sender.send(ExtractionEvent::Finished(outcome.clone()));
    }
}

/// Holds the controller in `Running` until the run settles.
///
/// Dropping an unsettled guard (a panicking worker) marks the run failed so
/// the controller can be used again.
pub(crate) struct RunGuard {
    state: Arc<Mutex<ExtractionState>>,
    previous: ExtractionState,
    settled: bool,
}

impl RunGuard {
    fn acquire(state: &Arc<Mutex<ExtractionState>>) -> Result<Self, FramePickError> {
        let mut current = lock_state(state);
        if *current == ExtractionState::Running {
            return Err(FramePickError::AlreadyRunning);
        }
        let previous = *current;
        *current = ExtractionState::Running;
        Ok(Self {
            state: Arc::clone(state),
            previous,
            settled: false,
        })
    }

    pub(crate) fn settle(mut self, next: ExtractionState) {
        *lock_state(&self.state) = next;
        self.settled = true;
    }

    /// Give the controller back without having run anything.
    fn release(self) {
        let previous = self.previous;
        self.settle(previous);
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.settled {
            *lock_state(&self.state) = ExtractionState::Failed;
        }
    }
}

fn lock_state(state: &Mutex<ExtractionState>) -> MutexGuard<'_, ExtractionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Closes the wrapped source when dropped, so every exit path releases it
/// exactly once.
struct OpenSource<S: VideoSource> {
    source: S,
}

impl<S: VideoSource> Deref for OpenSource<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.source
    }
}

impl<S: VideoSource> DerefMut for OpenSource<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: VideoSource> Drop for OpenSource<S> {
    fn drop(&mut self) {
        self.source.close();
    }
}

/// Open the source and run the sampling loop.
pub(crate) fn execute<O: SourceOpener>(
    opener: &O,
    request: &ExtractionRequest,
    options: &ExtractOptions,
    cancellation: &RunCancellation,
    progress: &dyn ProgressCallback,
) -> ExtractionOutcome {
    let outcome = match opener.open(&request.source_path) {
        Ok(source) => {
            let mut source = OpenSource { source };
            sample_frames(&mut source, request, options, cancellation, progress)
        }
        Err(error) => ExtractionOutcome::failed(&error, 0),
    };

    match &outcome {
        ExtractionOutcome::Failed { kind, reason, .. } => {
            log::error!("Extraction failed ({kind}): {reason}");
        }
        other => log::info!("{other}"),
    }
    outcome
}

fn sample_frames<S: VideoSource>(
    source: &mut OpenSource<S>,
    request: &ExtractionRequest,
    options: &ExtractOptions,
    cancellation: &RunCancellation,
    progress: &dyn ProgressCallback,
) -> ExtractionOutcome {
    // The file may have changed since the request was validated.
    let metadata = source.metadata().clone();
    if let Err(error) = request.validate_against(&metadata) {
        return ExtractionOutcome::failed(&error, 0);
    }

    let plan = planner::plan(metadata.frame_count, request.desired_frame_count);
    let writer = options.writer();
    let mut tracker = ProgressTracker::new(plan.len() as u64);

    log::info!(
        "Extracting {} frames from {} into {} (every {} frames)",
        plan.len(),
        request.source_path.display(),
        request.output_directory.display(),
        plan.interval()
    );

    for &frame_index in plan.indices() {
        if cancellation.is_cancelled() {
            log::info!("Cancellation requested before frame {frame_index}");
            return ExtractionOutcome::StoppedByUser {
                frames_written: tracker.frames_written(),
            };
        }

        let frame = match source.seek_and_decode(frame_index) {
            Ok(frame) => frame,
            Err(FramePickError::EndOfStream { frame_index }) => {
                log::warn!(
                    "Stream ended before frame {frame_index} ({} frames reported)",
                    metadata.frame_count
                );
                break;
            }
            Err(error) => return ExtractionOutcome::failed(&error, tracker.frames_written()),
        };

        let sequence_number = tracker.frames_written() + 1;
        if let Err(error) = writer.write(
            &frame,
            &request.output_directory,
            sequence_number,
            request.image_format,
        ) {
            return ExtractionOutcome::failed(&error, tracker.frames_written());
        }

        let snapshot = tracker.advance(frame_index);
        progress.on_progress(&snapshot);
    }

    let frames_written = tracker.frames_written();
    if frames_written == plan.len() as u64 && !plan.is_short() {
        ExtractionOutcome::Completed { frames_written }
    } else {
        ExtractionOutcome::StoppedByUser { frames_written }
    }
}
