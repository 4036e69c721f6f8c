//! # framepick
//!
//! Pick evenly spaced still frames out of a video file and write them to
//! disk as numbered images.
//!
//! Given a video and a frame count `n`, `framepick` samples every
//! `total / n`-th frame starting at frame 0, decodes each one, and writes
//! `frame_0001.jpg`, `frame_0002.jpg`, … into an output directory. Every
//! file is checked after it is written, progress is reported after each
//! frame, and a run can be cancelled between frames. Decoding goes through
//! FFmpeg via the [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)
//! crate by default, but the run loop only depends on the [`VideoSource`]
//! and [`SourceOpener`] traits.
//!
//! ## Quick Start
//!
//! ### Extract stills on the current thread
//!
//! ```no_run
//! use framepick::{ExtractOptions, ExtractionController, ExtractionRequest, FfmpegOpener, ImageFormat};
//!
//! let controller = ExtractionController::new(FfmpegOpener);
//! let request = ExtractionRequest::new("input.mp4", "stills", 10, ImageFormat::Png);
//! let outcome = controller.run(&request, &ExtractOptions::new());
//! println!("{outcome}");
//! ```
//!
//! ### Extract in the background and cancel
//!
//! ```no_run
//! use framepick::{
//!     ExtractOptions, ExtractionController, ExtractionEvent, ExtractionRequest,
//!     FfmpegOpener, ImageFormat,
//! };
//!
//! let controller = ExtractionController::new(FfmpegOpener);
//! let request = ExtractionRequest::beside_source("input.mp4", 50, ImageFormat::Jpeg);
//! let mut task = controller.spawn(request, ExtractOptions::new())?;
//! let token = task.cancellation_token();
//!
//! for event in task.by_ref() {
//!     if let ExtractionEvent::Progress(progress) = event {
//!         if progress.frames_written == 10 {
//!             token.cancel();
//!         }
//!     }
//! }
//! # Ok::<(), framepick::FramePickError>(())
//! ```
//!
//! ### Plan without decoding
//!
//! ```
//! let plan = framepick::plan(100, 10);
//! assert_eq!(plan.indices(), &[0, 10, 20, 30, 40, 50, 60, 70, 80, 90]);
//! ```
//!
//! ## Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | `ExtractionStream` runs the loop on Tokio's blocking pool |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod configuration;
pub mod controller;
pub mod error;
pub mod ffmpeg;
pub mod metadata;
pub mod outcome;
pub mod planner;
pub mod progress;
pub mod request;
pub mod source;
#[cfg(feature = "async")]
pub mod stream;
pub mod writer;

pub use configuration::ExtractOptions;
pub use controller::{ExtractionController, ExtractionEvent, ExtractionTask};
pub use error::{FailureKind, FramePickError};
pub use ffmpeg::{FfmpegLogLevel, FfmpegOpener, FfmpegSource, set_ffmpeg_log_level};
pub use metadata::VideoMetadata;
pub use outcome::{ExtractionOutcome, ExtractionState};
pub use planner::{SamplePlan, plan};
pub use progress::{CancellationToken, ExtractionProgress, ProgressCallback};
pub use request::ExtractionRequest;
pub use source::{SourceOpener, VideoSource};
#[cfg(feature = "async")]
pub use stream::ExtractionStream;
pub use writer::{DEFAULT_JPEG_QUALITY, FrameWriter, ImageFormat, frame_file_name};
