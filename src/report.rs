use crate::segmentation::CutRun;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Header printed above the report on the console
pub const REPORT_HEADER: &str = "STATS FOR NERDS:";

/// Format one cut run as `"<start> - <end> - Cut, <n> frames."`, times in seconds
pub fn format_cut_run(run: &CutRun, fps: f64) -> String {
    format!(
        "{:.2} - {:.2} - Cut, {} frames.",
        run.start_secs(fps),
        run.end_secs(fps),
        run.frame_count
    )
}

pub fn format_report(runs: &[CutRun], fps: f64) -> Vec<String> {
    runs.iter().map(|run| format_cut_run(run, fps)).collect()
}

/// Write the report lines, one newline-terminated record per cut run
pub fn write_report<P: AsRef<Path>>(path: P, lines: &[String]) -> Result<()> {
    let path = path.as_ref();
    tracing::debug!("Writing {} report lines to {}", lines.len(), path.display());

    let file = File::create(path)
        .with_context(|| format!("Failed to create report file {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for line in lines {
        writeln!(writer, "{}", line)
            .with_context(|| format!("Failed to write report file {}", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush report file {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(start_index: u64, end_index: u64, frame_count: u64) -> CutRun {
        CutRun {
            start_index,
            end_index,
            frame_count,
        }
    }

    #[test]
    fn test_format_cut_run() {
        assert_eq!(
            format_cut_run(&run(25, 50, 26), 25.0),
            "1.00 - 2.00 - Cut, 26 frames."
        );
        assert_eq!(
            format_cut_run(&run(1, 2, 2), 30.0),
            "0.03 - 0.07 - Cut, 2 frames."
        );
    }

    #[test]
    fn test_format_single_frame_run() {
        assert_eq!(
            format_cut_run(&run(4, 4, 1), 24.0),
            "0.17 - 0.17 - Cut, 1 frames."
        );
    }

    #[test]
    fn test_format_report_keeps_run_order() {
        let lines = format_report(&[run(0, 9, 10), run(20, 29, 10)], 10.0);
        assert_eq!(
            lines,
            vec![
                "0.00 - 0.90 - Cut, 10 frames.".to_string(),
                "2.00 - 2.90 - Cut, 10 frames.".to_string(),
            ]
        );
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edited_clip.txt");
        let lines = format_report(&[run(1, 2, 2), run(4, 4, 1)], 1.0);

        write_report(&path, &lines).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "1.00 - 2.00 - Cut, 2 frames.\n4.00 - 4.00 - Cut, 1 frames.\n"
        );
    }

    #[test]
    fn test_write_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");

        write_report(&path, &[]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_write_report_to_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.txt");
        assert!(write_report(&path, &["x".to_string()]).is_err());
    }
}
