use anyhow::{Context, Result};
use clap::Parser;
use knifehand::capture::{FfmpegDecoder, FrameSource};
use knifehand::output::{EncoderSettings, FfmpegEncoder};
use knifehand::pipeline::{self, OutputPaths};
use knifehand::report;
use knifehand::signature::{DetectionConfig, SignatureDetector};
use std::path::PathBuf;

/// Cuts any flagged sections from a video, and optionally bookends it
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Source video to process
    #[arg(value_parser = existing_file)]
    video_path: PathBuf,

    /// Directory to output the processed video and cut info file
    #[arg(short, long, default_value = ".", value_parser = existing_dir)]
    output_dir: PathBuf,

    /// Video to play before the main video
    #[arg(long, value_parser = existing_file)]
    intro: Option<PathBuf>,

    /// Video to play after the main video
    #[arg(long, value_parser = existing_file)]
    outro: Option<PathBuf>,

    /// Samples of each signature color needed to flag a frame
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    required_pixels: u32,

    /// Maximum per-channel difference from a signature color
    #[arg(long, default_value_t = 30)]
    color_tolerance: u32,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn detection_config(&self) -> DetectionConfig {
        DetectionConfig {
            required_pixels: self.required_pixels,
            color_tolerance: self.color_tolerance,
        }
    }
}

fn existing_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("file {} does not exist", value))
    }
}

fn existing_dir(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_dir() {
        Ok(path)
    } else {
        Err(format!("directory {} does not exist", value))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Knifehand starting");

    let paths = OutputPaths::for_source(&args.video_path, &args.output_dir);
    let detector = SignatureDetector::new(args.detection_config());

    // Open every input up front so a bad intro/outro fails before encoding starts
    let mut source = FfmpegDecoder::open(&args.video_path)
        .context("Failed to open source video")?;
    let fps = source.frame_rate();
    let (width, height) = source.resolution();

    // Intro/outro are resampled to the main frame rate so they keep their duration
    let mut intro = args
        .intro
        .as_ref()
        .map(|path| FfmpegDecoder::open_at_rate(path, fps))
        .transpose()
        .context("Failed to open intro video")?;
    let mut outro = args
        .outro
        .as_ref()
        .map(|path| FfmpegDecoder::open_at_rate(path, fps))
        .transpose()
        .context("Failed to open outro video")?;

    let mut encoder = FfmpegEncoder::create(
        &paths.video,
        width,
        height,
        fps,
        &EncoderSettings::default(),
    )
    .context("Failed to initialize video encoder")?;

    if let Some(intro) = intro.as_mut() {
        pipeline::append_clip(intro, &mut encoder, "intro")?;
    }

    let outcome = pipeline::cut_marked_frames(&mut source, &mut encoder, &detector)?;

    if let Some(outro) = outro.as_mut() {
        pipeline::append_clip(outro, &mut encoder, "outro")?;
    }

    encoder.finish().context("Failed to finish output video")?;

    let lines = report::format_report(&outcome.cut_runs, fps);
    report::write_report(&paths.report, &lines)?;
    tracing::info!("Report written to {}", paths.report.display());

    // Dump the report to console
    println!("\n{}", report::REPORT_HEADER);
    for line in &lines {
        println!("{}", line);
    }

    Ok(())
}
