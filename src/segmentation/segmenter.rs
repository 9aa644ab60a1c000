use super::types::{CutRun, SegmentationResult};
use image::RgbImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Not inside a cut run
    Outside,
    /// Accumulating a cut run that started at `run_start`
    InRun { run_start: u64, marked_count: u64 },
}

impl RunState {
    /// Advance by one frame at `index`. Returns the next state and the run
    /// closed by this frame, if any.
    fn transition(self, index: u64, marked: bool) -> (RunState, Option<CutRun>) {
        match (self, marked) {
            (RunState::Outside, true) => (
                RunState::InRun {
                    run_start: index,
                    marked_count: 1,
                },
                None,
            ),
            (
                RunState::InRun {
                    run_start,
                    marked_count,
                },
                true,
            ) => (
                RunState::InRun {
                    run_start,
                    marked_count: marked_count + 1,
                },
                None,
            ),
            (
                RunState::InRun {
                    run_start,
                    marked_count,
                },
                false,
            ) => (
                RunState::Outside,
                Some(CutRun {
                    start_index: run_start,
                    end_index: index - 1,
                    frame_count: marked_count,
                }),
            ),
            (RunState::Outside, false) => (RunState::Outside, None),
        }
    }
}

/// What to do with the frame just observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// Frame goes to the output
    pub keep: bool,
    /// Run that ended right before this frame
    pub closed: Option<CutRun>,
}

/// Single-pass state machine splitting a frame stream into kept frames and cut runs
///
/// Frames are fed one at a time in stream order; the segmenter only tracks the
/// current run, so the stream never has to be held in memory.
#[derive(Debug, Clone)]
pub struct RunSegmenter {
    state: RunState,
    next_index: u64,
}

impl Default for RunSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSegmenter {
    pub fn new() -> Self {
        Self {
            state: RunState::Outside,
            next_index: 0,
        }
    }

    /// Record the classification of the next frame in the stream
    pub fn observe(&mut self, marked: bool) -> Observation {
        let index = self.next_index;
        self.next_index += 1;

        let (state, closed) = self.state.transition(index, marked);
        self.state = state;

        Observation {
            keep: !marked,
            closed,
        }
    }

    /// Close the run still open at the end of the stream, if any
    pub fn finish(self) -> Option<CutRun> {
        match self.state {
            RunState::Outside => None,
            RunState::InRun {
                run_start,
                marked_count,
            } => Some(CutRun {
                start_index: run_start,
                end_index: self.next_index - 1,
                frame_count: marked_count,
            }),
        }
    }

    pub fn current_state(&self) -> &RunState {
        &self.state
    }

    pub fn frames_seen(&self) -> u64 {
        self.next_index
    }
}

/// Remove every cut-marked frame from `frames`, recording the removed runs
pub fn segment<I, F>(frames: I, mut classifier: F) -> SegmentationResult
where
    I: IntoIterator<Item = RgbImage>,
    F: FnMut(&RgbImage) -> bool,
{
    let mut segmenter = RunSegmenter::new();
    let mut result = SegmentationResult::default();

    for frame in frames {
        let observation = segmenter.observe(classifier(&frame));
        if let Some(run) = observation.closed {
            result.cut_runs.push(run);
        }
        if observation.keep {
            result.kept_frames.push(frame);
        }
    }

    if let Some(run) = segmenter.finish() {
        result.cut_runs.push(run);
    }

    result
}
