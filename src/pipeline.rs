//! Streams decoded frames through signature detection and run segmentation into a sink.

use crate::capture::FrameSource;
use crate::output::VideoSink;
use crate::segmentation::{CutRun, RunSegmenter};
use crate::signature::SignatureDetector;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Frames between periodic progress logs
const STATS_INTERVAL: u64 = 300;

/// What happened while cutting the main video
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CutOutcome {
    pub frames_read: u64,
    pub frames_kept: u64,
    pub cut_runs: Vec<CutRun>,
}

impl CutOutcome {
    pub fn frames_cut(&self) -> u64 {
        self.cut_runs.iter().map(|run| run.frame_count).sum()
    }
}

/// Destination files for a processed source video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub video: PathBuf,
    pub report: PathBuf,
}

impl OutputPaths {
    /// `edited_<stem>.mp4` and `edited_<stem>.txt` inside `output_dir`
    pub fn for_source(source: &Path, output_dir: &Path) -> Self {
        let stem = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());

        Self {
            video: output_dir.join(format!("edited_{}.mp4", stem)),
            report: output_dir.join(format!("edited_{}.txt", stem)),
        }
    }
}

/// Copy every frame of `source` into `sink` unchanged, returning the frame count
pub fn append_clip<C, O>(source: &mut C, sink: &mut O, label: &str) -> Result<u64>
where
    C: FrameSource,
    O: VideoSink,
{
    let _span = tracing::debug_span!("append_clip", label).entered();
    let mut count = 0u64;

    for frame in source.frames() {
        let frame = frame.with_context(|| format!("Failed to decode {} frame {}", label, count))?;
        sink.write_frame(&frame)
            .with_context(|| format!("Failed to write {} frame {}", label, count))?;
        count += 1;
    }

    tracing::info!("Appended {} ({} frames)", label, count);
    Ok(count)
}

/// Remove cut-marked frames from `source`, writing the rest to `sink`
///
/// Each frame is decoded, classified and written (or dropped) exactly once.
pub fn cut_marked_frames<C, O>(
    source: &mut C,
    sink: &mut O,
    detector: &SignatureDetector,
) -> Result<CutOutcome>
where
    C: FrameSource,
    O: VideoSink,
{
    let mut segmenter = RunSegmenter::new();
    let mut outcome = CutOutcome::default();

    let mut total_decode_time = Duration::ZERO;
    let mut total_detect_time = Duration::ZERO;
    let mut total_output_time = Duration::ZERO;

    tracing::info!(
        "Scanning for cut signature (required_pixels={}, color_tolerance={})",
        detector.config().required_pixels,
        detector.config().color_tolerance
    );

    loop {
        let index = segmenter.frames_seen();

        // Decode frame
        let decode_start = Instant::now();
        let Some(frame) = source
            .next_frame()
            .with_context(|| format!("Failed to decode frame {}", index))?
        else {
            break;
        };
        total_decode_time += decode_start.elapsed();

        // Classify
        let detect_start = Instant::now();
        let marked = detector
            .detect(&frame)
            .with_context(|| format!("Failed to inspect frame {}", index))?;
        total_detect_time += detect_start.elapsed();

        let observation = segmenter.observe(marked);
        if marked {
            tracing::debug!("Frame {} carries the cut signature", index);
        }
        if let Some(run) = observation.closed {
            tracing::info!(
                "Cut frames {}..={} ({} frames)",
                run.start_index,
                run.end_index,
                run.frame_count
            );
            outcome.cut_runs.push(run);
        }

        // Output frame
        if observation.keep {
            let output_start = Instant::now();
            sink.write_frame(&frame)
                .with_context(|| format!("Failed to write frame {}", index))?;
            total_output_time += output_start.elapsed();
            outcome.frames_kept += 1;
        }

        outcome.frames_read += 1;

        // Log stats every STATS_INTERVAL frames
        if outcome.frames_read % STATS_INTERVAL == 0 {
            let frames = outcome.frames_read as f64;
            tracing::info!(
                "Frame {}: decode={:.1}ms, detect={:.2}ms, output={:.1}ms, kept={}",
                outcome.frames_read,
                total_decode_time.as_secs_f64() * 1000.0 / frames,
                total_detect_time.as_secs_f64() * 1000.0 / frames,
                total_output_time.as_secs_f64() * 1000.0 / frames,
                outcome.frames_kept
            );
        }
    }

    if let Some(run) = segmenter.finish() {
        tracing::info!(
            "Cut frames {}..={} ({} frames, end of video)",
            run.start_index,
            run.end_index,
            run.frame_count
        );
        outcome.cut_runs.push(run);
    }

    tracing::info!(
        "Processed {} frames: kept {}, cut {} in {} runs",
        outcome.frames_read,
        outcome.frames_kept,
        outcome.frames_cut(),
        outcome.cut_runs.len()
    );

    Ok(outcome)
}
