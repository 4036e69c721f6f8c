use std::{fs, path::PathBuf, process::ExitCode};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use framepick::{
    ExtractOptions, ExtractionController, ExtractionEvent, ExtractionOutcome, ExtractionRequest,
    FfmpegLogLevel, FfmpegOpener, ImageFormat, SourceOpener, frame_file_name,
};

const CLI_AFTER_HELP: &str = "Examples:\n  framepick info input.mp4 --json\n  framepick extract input.mp4 --count 20 --out stills --format png --progress\n  framepick extract input.mp4 --count 5 --beside-source\n  framepick completions zsh > _framepick";

#[derive(Debug, Parser)]
#[command(
    name = "framepick",
    version,
    about = "Extract evenly spaced still frames from a video",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while extracting.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow writing over frames left by a previous run.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print video information.
    #[command(
        about = "Print video information",
        visible_alias = "probe",
        after_help = "Examples:\n  framepick info input.mp4\n  framepick info input.mp4 --json"
    )]
    Info {
        /// Input video path.
        input: PathBuf,

        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Extract evenly spaced frames.
    #[command(
        about = "Extract evenly spaced frames",
        after_help = "Examples:\n  framepick extract input.mp4 --count 10 --out stills\n  framepick extract input.mp4 --count 24 --beside-source --format png"
    )]
    Extract {
        /// Input video path.
        input: PathBuf,
        /// Number of frames to extract.
        #[arg(long, short = 'n', default_value_t = 10)]
        count: u64,
        /// Output directory (created if missing).
        #[arg(long, conflicts_with = "beside_source", required_unless_present = "beside_source")]
        out: Option<PathBuf>,
        /// Write frames into the video's own directory.
        #[arg(long)]
        beside_source: bool,
        /// Output image format (jpg, png).
        #[arg(long, default_value = "jpg")]
        format: String,
        /// JPEG quality (1-100).
        #[arg(long, default_value_t = framepick::DEFAULT_JPEG_QUALITY)]
        quality: u8,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = if global.verbose { "framepick=debug" } else { "framepick=warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        framepick::set_ffmpeg_log_level(parsed);
    } else if !global.verbose {
        framepick::set_ffmpeg_log_level(FfmpegLogLevel::Error);
    }
    Ok(())
}

fn progress_bar(target: u64) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let bar = ProgressBar::new(target);
    let style = ProgressStyle::with_template(
        "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg} (eta {eta})",
    )?;
    bar.set_style(style.progress_chars("##-"));
    Ok(bar)
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global)?;

    match cli.command {
        Commands::Info { input, json } => {
            let metadata = FfmpegOpener.probe(&input)?;
            if json {
                let payload = json!({
                    "path": input.display().to_string(),
                    "width": metadata.width,
                    "height": metadata.height,
                    "fps": metadata.frames_per_second,
                    "frame_count": metadata.frame_count,
                    "duration_seconds": metadata.duration().as_secs_f64(),
                    "codec": metadata.codec,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("{metadata}");
                println!("Codec: {}", metadata.codec);
            }
        }
        Commands::Extract {
            input,
            count,
            out,
            beside_source,
            format,
            quality,
        } => {
            let image_format: ImageFormat = format.parse()?;
            let request = match out {
                Some(directory) if !beside_source => {
                    fs::create_dir_all(&directory)?;
                    ExtractionRequest::new(&input, directory, count, image_format)
                }
                _ => ExtractionRequest::beside_source(&input, count, image_format),
            };

            let first = request
                .output_directory
                .join(frame_file_name(1, image_format));
            if first.exists() && !cli.global.overwrite {
                return Err(format!(
                    "output file already exists: {} (use --overwrite)",
                    first.display()
                )
                .into());
            }

            let controller = ExtractionController::new(FfmpegOpener);
            let options = ExtractOptions::new().with_jpeg_quality(quality);
            let mut task = controller.spawn(request.clone(), options)?;

            let bar = if cli.global.progress {
                Some(progress_bar(count)?)
            } else {
                None
            };

            let mut outcome = None;
            for event in task.by_ref() {
                match event {
                    ExtractionEvent::Progress(progress) => {
                        if let Some(bar) = &bar {
                            bar.set_length(progress.target);
                            bar.set_position(progress.frames_written);
                        } else if cli.global.verbose {
                            eprintln!("{} {}", "progress".cyan().bold(), progress.last_message);
                        }
                    }
                    ExtractionEvent::Finished(finished) => outcome = Some(finished),
                }
            }
            if let Some(bar) = bar {
                bar.finish_and_clear();
            }

            return Ok(report(outcome.unwrap_or_else(|| task.wait()), &request));
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framepick", &mut std::io::stdout());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn report(outcome: ExtractionOutcome, request: &ExtractionRequest) -> ExitCode {
    match &outcome {
        ExtractionOutcome::Completed { .. } => {
            println!(
                "{} {}",
                "success:".green().bold(),
                format!("{} ({})", outcome.message(), request.output_directory.display()).green()
            );
            ExitCode::SUCCESS
        }
        ExtractionOutcome::StoppedByUser { .. } => {
            eprintln!("{} {}", "warning:".yellow().bold(), outcome.message().yellow());
            ExitCode::SUCCESS
        }
        ExtractionOutcome::Failed { .. } => {
            eprintln!("{} {}", "error:".red().bold(), outcome.message());
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
