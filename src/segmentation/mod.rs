//! Run-length segmentation of a classified frame stream into kept frames and cut runs

mod segmenter;
pub mod types;

pub use segmenter::{segment, Observation, RunSegmenter, RunState};
pub use types::{CutRun, SegmentationResult};
