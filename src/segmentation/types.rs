use image::RgbImage;

/// A maximal run of consecutive cut-marked frames, in source frame indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutRun {
    pub start_index: u64,
    /// Inclusive
    pub end_index: u64,
    pub frame_count: u64,
}

impl CutRun {
    pub fn start_secs(&self, fps: f64) -> f64 {
        self.start_index as f64 / fps
    }

    pub fn end_secs(&self, fps: f64) -> f64 {
        self.end_index as f64 / fps
    }
}

/// Frames that survived segmentation plus the runs that were removed
#[derive(Debug, Clone, Default)]
pub struct SegmentationResult {
    /// Unmarked frames in their original order
    pub kept_frames: Vec<RgbImage>,
    /// Removed runs in the order they occurred
    pub cut_runs: Vec<CutRun>,
}
