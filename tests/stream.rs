//! Async extraction stream tests.

#![cfg(feature = "async")]

mod common;

use std::sync::Arc;

use framepick::{
    CancellationToken, ExtractOptions, ExtractionController, ExtractionEvent, ExtractionOutcome,
    ExtractionRequest, ExtractionState, FramePickError, ImageFormat,
};
use tokio_stream::StreamExt;

use common::{FakeOpener, FakeVideo, file_names, workspace};

#[tokio::test(flavor = "multi_thread")]
async fn stream_yields_progress_then_outcome() {
    let space = workspace();
    let opener = FakeOpener::new(FakeVideo::new(100, 30.0));
    let counters = Arc::clone(&opener.counters);
    let controller = ExtractionController::new(opener);

    let request = ExtractionRequest::new(&space.video, &space.output, 4, ImageFormat::Png);
    let stream = controller
        .spawn_stream(request, ExtractOptions::new().with_channel_capacity(1))
        .expect("spawn succeeds");
    let events: Vec<ExtractionEvent> = stream.collect().await;

    assert_eq!(events.len(), 5);
    for (position, event) in events.iter().take(4).enumerate() {
        match event {
            ExtractionEvent::Progress(progress) => {
                assert_eq!(progress.frames_written, position as u64 + 1);
            }
            other => panic!("Expected Progress, got: {other:?}"),
        }
    }
    assert_eq!(
        events.last(),
        Some(&ExtractionEvent::Finished(ExtractionOutcome::Completed {
            frames_written: 4
        }))
    );
    assert_eq!(controller.state(), ExtractionState::Completed);
    assert_eq!(counters.closed(), 1);
    assert_eq!(file_names(&space.output).len(), 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn stream_honours_cancellation() {
    let space = workspace();
    let controller = ExtractionController::new(FakeOpener::new(FakeVideo::new(100, 30.0)));

    let token = CancellationToken::new();
    token.cancel();
    let request = ExtractionRequest::new(&space.video, &space.output, 4, ImageFormat::Png);
    let mut stream = controller
        .spawn_stream(request, ExtractOptions::new().with_cancellation(token))
        .expect("spawn succeeds");

    let mut outcome = None;
    while let Some(event) = stream.next().await {
        if let ExtractionEvent::Finished(finished) = event {
            outcome = Some(finished);
        }
    }
    assert_eq!(
        outcome,
        Some(ExtractionOutcome::StoppedByUser { frames_written: 0 })
    );
    assert!(file_names(&space.output).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn stream_rejects_invalid_requests() {
    let space = workspace();
    let controller = ExtractionController::new(FakeOpener::new(FakeVideo::new(10, 30.0)));

    let request = ExtractionRequest::new(&space.video, &space.output, 11, ImageFormat::Png);
    let result = controller.spawn_stream(request, ExtractOptions::new());

    assert!(matches!(
        result,
        Err(FramePickError::InvalidFrameCount { .. })
    ));
    assert_eq!(controller.state(), ExtractionState::Idle);
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelling_a_drained_stream_leaves_the_next_run_alone() {
    let space = workspace();
    let controller = ExtractionController::new(FakeOpener::new(FakeVideo::new(100, 30.0)));

    let attached = CancellationToken::new();
    let options = ExtractOptions::new().with_cancellation(attached.clone());
    let request = ExtractionRequest::new(&space.video, &space.output, 4, ImageFormat::Png);

    let mut stream = controller
        .spawn_stream(request.clone(), options.clone())
        .expect("spawn succeeds");
    while stream.next().await.is_some() {}
    stream.cancel();
    assert!(!attached.is_cancelled());

    let events: Vec<ExtractionEvent> = controller
        .spawn_stream(request, options)
        .expect("spawn succeeds")
        .collect()
        .await;
    assert_eq!(
        events.last(),
        Some(&ExtractionEvent::Finished(ExtractionOutcome::Completed {
            frames_written: 4
        }))
    );
}
