//! Shared helpers for integration tests.
//!
//! [`FakeOpener`] produces synthetic videos so the run loop can be exercised
//! without FFmpeg or fixture files.

#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
        mpsc::{self, Receiver, Sender},
    },
};

use framepick::{FramePickError, SourceOpener, VideoMetadata, VideoSource};
use image::{DynamicImage, Rgb, RgbImage};

pub const FRAME_WIDTH: u32 = 32;
pub const FRAME_HEIGHT: u32 = 24;

/// Knobs for a synthetic video.
#[derive(Debug, Clone)]
pub struct FakeVideo {
    pub total_frames: u64,
    pub frames_per_second: f64,
    /// Decoding this frame index fails.
    pub fail_at: Option<u64>,
    /// Decoding this frame index or later reports end of stream.
    pub end_of_stream_at: Option<u64>,
    /// Frame count reported by `open`, if it differs from `total_frames`.
    pub opened_frame_count: Option<u64>,
}

impl FakeVideo {
    pub fn new(total_frames: u64, frames_per_second: f64) -> Self {
        Self {
            total_frames,
            frames_per_second,
            fail_at: None,
            end_of_stream_at: None,
            opened_frame_count: None,
        }
    }

    pub fn failing_at(mut self, frame_index: u64) -> Self {
        self.fail_at = Some(frame_index);
        self
    }

    pub fn ending_at(mut self, frame_index: u64) -> Self {
        self.end_of_stream_at = Some(frame_index);
        self
    }

    pub fn reopening_with(mut self, frame_count: u64) -> Self {
        self.opened_frame_count = Some(frame_count);
        self
    }
}

/// Counters shared between an opener, its clones, and the sources it opens.
#[derive(Debug, Default)]
pub struct Counters {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub probed: AtomicUsize,
    pub decoded: Mutex<Vec<u64>>,
}

impl Counters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn probed(&self) -> usize {
        self.probed.load(Ordering::SeqCst)
    }

    pub fn decoded(&self) -> Vec<u64> {
        self.decoded.lock().expect("decoded lock").clone()
    }
}

/// Holds each decode until the test releases it.
#[derive(Debug, Clone)]
pub struct Gate {
    entered: Sender<u64>,
    release: Arc<Mutex<Receiver<()>>>,
}

/// Test-side handle of a [`Gate`].
pub struct GateControl {
    pub entered: Receiver<u64>,
    release: Sender<()>,
}

impl GateControl {
    /// Let one blocked decode continue.
    pub fn release_one(&self) {
        let _ = self.release.send(());
    }
}

pub fn gate() -> (Gate, GateControl) {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    (
        Gate {
            entered: entered_tx,
            release: Arc::new(Mutex::new(release_rx)),
        },
        GateControl {
            entered: entered_rx,
            release: release_tx,
        },
    )
}

#[derive(Debug, Clone)]
pub struct FakeOpener {
    pub video: FakeVideo,
    pub counters: Arc<Counters>,
    gate: Option<Gate>,
}

impl FakeOpener {
    pub fn new(video: FakeVideo) -> Self {
        Self {
            video,
            counters: Arc::new(Counters::default()),
            gate: None,
        }
    }

    pub fn gated(video: FakeVideo, gate: Gate) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(video)
        }
    }
}

impl SourceOpener for FakeOpener {
    type Source = FakeSource;

    fn open(&self, path: &Path) -> Result<FakeSource, FramePickError> {
        if !path.exists() {
            return Err(FramePickError::SourceNotFound(path.to_path_buf()));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        let frame_count = self.video.opened_frame_count.unwrap_or(self.video.total_frames);
        Ok(FakeSource {
            metadata: VideoMetadata::new(
                frame_count,
                self.video.frames_per_second,
                FRAME_WIDTH,
                FRAME_HEIGHT,
            )
            .with_codec("fake"),
            video: self.video.clone(),
            counters: Arc::clone(&self.counters),
            gate: self.gate.clone(),
            closed: false,
        })
    }

    fn probe(&self, path: &Path) -> Result<VideoMetadata, FramePickError> {
        if !path.exists() {
            return Err(FramePickError::SourceNotFound(path.to_path_buf()));
        }
        self.counters.probed.fetch_add(1, Ordering::SeqCst);
        Ok(VideoMetadata::new(
            self.video.total_frames,
            self.video.frames_per_second,
            FRAME_WIDTH,
            FRAME_HEIGHT,
        )
        .with_codec("fake"))
    }
}

#[derive(Debug)]
pub struct FakeSource {
    metadata: VideoMetadata,
    video: FakeVideo,
    counters: Arc<Counters>,
    gate: Option<Gate>,
    closed: bool,
}

impl VideoSource for FakeSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn seek_and_decode(&mut self, frame_index: u64) -> Result<DynamicImage, FramePickError> {
        assert!(!self.closed, "decode after close");
        if let Some(gate) = &self.gate {
            let _ = gate.entered.send(frame_index);
            let _ = gate.release.lock().expect("gate lock").recv();
        }
        self.counters
            .decoded
            .lock()
            .expect("decoded lock")
            .push(frame_index);

        if self.video.fail_at == Some(frame_index) {
            return Err(FramePickError::DecodeFailed {
                frame_index,
                reason: "corrupt packet".to_string(),
            });
        }
        if self
            .video
            .end_of_stream_at
            .is_some_and(|end| frame_index >= end)
        {
            return Err(FramePickError::EndOfStream { frame_index });
        }
        Ok(synthetic_frame(frame_index))
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// A solid frame whose red channel encodes the index.
pub fn synthetic_frame(frame_index: u64) -> DynamicImage {
    let shade = (frame_index % 256) as u8;
    DynamicImage::ImageRgb8(RgbImage::from_pixel(
        FRAME_WIDTH,
        FRAME_HEIGHT,
        Rgb([shade, 64, 128]),
    ))
}

/// A temp directory holding a placeholder video file and an output folder.
pub struct Workspace {
    pub root: tempfile::TempDir,
    pub video: PathBuf,
    pub output: PathBuf,
}

pub fn workspace() -> Workspace {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let video = root.path().join("clip.mp4");
    fs::write(&video, b"not really a video").expect("Failed to write placeholder video");
    let output = root.path().join("stills");
    fs::create_dir(&output).expect("Failed to create output dir");
    Workspace {
        root,
        video,
        output,
    }
}

/// Sorted file names in `directory`.
pub fn file_names(directory: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(directory)
        .expect("Failed to read directory")
        .map(|entry| {
            entry
                .expect("Failed to read entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
