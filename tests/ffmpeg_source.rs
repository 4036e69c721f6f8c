//! FFmpeg-backed source integration tests.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`.

use std::{fs, path::Path};

use framepick::{
    ExtractOptions, ExtractionController, ExtractionOutcome, ExtractionRequest, FailureKind,
    FfmpegOpener, FfmpegSource, FramePickError, ImageFormat, SourceOpener, VideoSource,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

fn sample_audio_only_path() -> &'static str {
    "tests/fixtures/sample_audio_only.mp4"
}

// ── Opening ────────────────────────────────────────────────────────

#[test]
fn open_reads_metadata() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let source = FfmpegSource::open(path).expect("Failed to open fixture");
    let metadata = source.metadata();
    assert_eq!(metadata.width, 320);
    assert_eq!(metadata.height, 240);
    assert!((metadata.frames_per_second - 30.0).abs() < 0.01);
    assert!(
        (99..=101).contains(&metadata.frame_count),
        "unexpected frame count {}",
        metadata.frame_count
    );
    assert_eq!(metadata.codec, "h264");
}

#[test]
fn probe_matches_open() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let probed = FfmpegOpener.probe(Path::new(path)).expect("Failed to probe");
    let opened = FfmpegSource::open(path).expect("Failed to open fixture");
    assert_eq!(&probed, opened.metadata());
}

#[test]
fn audio_only_file_has_no_video_stream() {
    let path = sample_audio_only_path();
    if !Path::new(path).exists() {
        return;
    }

    let result = FfmpegSource::open(path);
    assert!(matches!(result, Err(FramePickError::NoVideoStream(_))));
}

#[test]
fn garbage_file_is_unreadable() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = directory.path().join("not_a_video.mp4");
    fs::write(&path, b"plain text pretending to be a video").expect("Failed to write file");

    let result = FfmpegSource::open(&path);
    assert!(matches!(
        result,
        Err(FramePickError::UnreadableContainer { .. })
    ));
}

// ── Decoding ───────────────────────────────────────────────────────

#[test]
fn decodes_frames_across_the_video() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source = FfmpegSource::open(path).expect("Failed to open fixture");
    // Out of order on purpose: every call seeks.
    for index in [50_u64, 0, 99, 15] {
        let frame = source
            .seek_and_decode(index)
            .unwrap_or_else(|error| panic!("Failed to decode frame {index}: {error}"));
        assert_eq!(frame.width(), 320);
        assert_eq!(frame.height(), 240);
    }
}

#[test]
fn decoding_past_the_end_reports_end_of_stream() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source = FfmpegSource::open(path).expect("Failed to open fixture");
    let result = source.seek_and_decode(10_000);
    assert!(
        matches!(result, Err(FramePickError::EndOfStream { .. })),
        "unexpected result: {result:?}"
    );
}

#[test]
fn closed_source_refuses_to_decode() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source = FfmpegSource::open(path).expect("Failed to open fixture");
    source.close();
    source.close();
    assert!(matches!(
        source.seek_and_decode(0),
        Err(FramePickError::DecodeFailed { .. })
    ));
}

// ── Full runs ──────────────────────────────────────────────────────

#[test]
fn extracts_stills_from_fixture() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let controller = ExtractionController::new(FfmpegOpener);
    let request = ExtractionRequest::new(path, output.path(), 10, ImageFormat::Png);

    let outcome = controller.run(&request, &ExtractOptions::new());
    assert_eq!(outcome, ExtractionOutcome::Completed { frames_written: 10 });

    for sequence in 1..=10 {
        let file = output.path().join(format!("frame_{sequence:04}.png"));
        let image = image::open(&file).expect("Failed to decode written frame");
        assert_eq!((image.width(), image.height()), (320, 240));
    }
}

#[test]
fn unreadable_video_fails_before_writing() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let video = directory.path().join("broken.mp4");
    fs::write(&video, b"nope").expect("Failed to write file");
    let output = directory.path().join("stills");
    fs::create_dir(&output).expect("Failed to create output dir");

    let controller = ExtractionController::new(FfmpegOpener);
    let request = ExtractionRequest::new(&video, &output, 3, ImageFormat::Jpeg);

    match controller.run(&request, &ExtractOptions::new()) {
        ExtractionOutcome::Failed {
            kind,
            frames_written,
            ..
        } => {
            assert_eq!(kind, FailureKind::Source);
            assert_eq!(frames_written, 0);
        }
        other => panic!("Expected Failed, got: {other:?}"),
    }
    assert_eq!(fs::read_dir(&output).expect("read dir").count(), 0);
}
