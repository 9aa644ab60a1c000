mod ffmpeg_decoder;
pub mod probe;

pub use ffmpeg_decoder::FfmpegDecoder;
pub use probe::{probe_video, VideoProbe};

use anyhow::Result;
use image::RgbImage;

/// Trait for ordered, forward-only frame sources
pub trait FrameSource {
    /// Decode the next frame, or `None` once the stream is exhausted
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Frames per second of the source
    fn frame_rate(&self) -> f64;

    /// Get the resolution of decoded frames
    fn resolution(&self) -> (u32, u32);

    /// Iterate over the remaining frames
    fn frames(&mut self) -> Frames<'_, Self>
    where
        Self: Sized,
    {
        Frames { source: self }
    }
}

/// Iterator adapter over a [`FrameSource`]
pub struct Frames<'a, S> {
    source: &'a mut S,
}

impl<S: FrameSource> Iterator for Frames<'_, S> {
    type Item = Result<RgbImage>;

    fn next(&mut self) -> Option<Self::Item> {
        self.source.next_frame().transpose()
    }
}
