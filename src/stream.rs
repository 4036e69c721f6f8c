//! Async extraction via Tokio.
//!
//! [`ExtractionStream`] runs the same loop as
//! [`ExtractionController::spawn`], but on `tokio::task::spawn_blocking`,
//! and yields [`ExtractionEvent`]s through a bounded channel. Decoding and
//! encoding stay off the async runtime's worker threads.
//!
//! # Example
//!
//! ```no_run
//! use tokio_stream::StreamExt;
//!
//! use framepick::{
//!     ExtractOptions, ExtractionController, ExtractionEvent, ExtractionRequest,
//!     FfmpegOpener, FramePickError, ImageFormat,
//! };
//!
//! # async fn example() -> Result<(), FramePickError> {
//! let controller = ExtractionController::new(FfmpegOpener);
//! let request = ExtractionRequest::new("input.mp4", "stills", 8, ImageFormat::Png);
//! let mut stream = controller.spawn_stream(request, ExtractOptions::new())?;
//!
//! while let Some(event) = stream.next().await {
//!     if let ExtractionEvent::Finished(outcome) = event {
//!         println!("{outcome}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_stream::Stream;

use crate::{
    configuration::ExtractOptions,
    controller::{ExtractionController, ExtractionEvent, execute},
    error::FramePickError,
    outcome::ExtractionOutcome,
    progress::{CancellationToken, ExtractionProgress, ProgressCallback},
    request::ExtractionRequest,
    source::SourceOpener,
};

/// Events of a run executing on Tokio's blocking pool.
///
/// The stream ends after the [`ExtractionEvent::Finished`] event. Dropping
/// the stream does not stop the run; call [`cancel`](Self::cancel) first.
pub struct ExtractionStream {
    receiver: Receiver<ExtractionEvent>,
    token: CancellationToken,
    #[allow(dead_code)]
    handle: JoinHandle<()>,
}

impl ExtractionStream {
    /// Ask the run to stop before its next frame.
    ///
    /// Does nothing once the run has finished.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Stream for ExtractionStream {
    type Item = ExtractionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Forwards notifications into the bounded Tokio channel.
struct BlockingSender {
    sender: Sender<ExtractionEvent>,
    inner: Arc<dyn ProgressCallback>,
}

impl ProgressCallback for BlockingSender {
    fn on_progress(&self, progress: &ExtractionProgress) {
        self.inner.on_progress(progress);
        let _ = self
            .sender
            .blocking_send(ExtractionEvent::Progress(progress.clone()));
    }

    fn on_finished(&self, outcome: &ExtractionOutcome) {
        self.inner.on_finished(outcome);
        let _ = self
            .sender
            .blocking_send(ExtractionEvent::Finished(outcome.clone()));
    }
}

impl<O: SourceOpener> ExtractionController<O> {
    /// Validate `request` and run it on Tokio's blocking thread pool.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Same as [`spawn`](ExtractionController::spawn).
    pub fn spawn_stream(
        &self,
        request: ExtractionRequest,
        options: ExtractOptions,
    ) -> Result<ExtractionStream, FramePickError> {
        let guard = self.prepare(&request)?;
        let cancellation = options.run_cancellation();
        let token = cancellation.token();
        let (sender, receiver) = tokio::sync::mpsc::channel(options.channel_capacity);

        let opener = self.opener().clone();
        let handle = tokio::task::spawn_blocking(move || {
            let forwarder = BlockingSender {
                sender,
                inner: Arc::clone(&options.progress),
            };
            let outcome = execute(&opener, &request, &options, &cancellation, &forwarder);
            guard.settle(outcome.state());
            forwarder.on_finished(&outcome);
        });

        Ok(ExtractionStream {
            receiver,
            token,
            handle,
        })
    }
}
