mod ffmpeg_encoder;

pub use ffmpeg_encoder::{EncoderSettings, FfmpegEncoder};

use anyhow::Result;
use image::{imageops, RgbImage};
use std::borrow::Cow;

/// Trait for output destinations
pub trait VideoSink {
    /// Append a frame to the output
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Get the expected output resolution
    fn resolution(&self) -> (u32, u32);
}

/// Resize `frame` to `(width, height)` unless it already matches
pub fn fit_to_resolution(frame: &RgbImage, (width, height): (u32, u32)) -> Cow<'_, RgbImage> {
    if frame.dimensions() == (width, height) {
        Cow::Borrowed(frame)
    } else {
        Cow::Owned(imageops::resize(
            frame,
            width,
            height,
            imageops::FilterType::Lanczos3,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_matching_frame_is_borrowed() {
        let frame = RgbImage::from_pixel(32, 24, Rgb([1, 2, 3]));
        assert!(matches!(fit_to_resolution(&frame, (32, 24)), Cow::Borrowed(_)));
    }

    #[test]
    fn test_mismatched_frame_is_resized() {
        let frame = RgbImage::from_pixel(64, 48, Rgb([200, 100, 50]));
        let fitted = fit_to_resolution(&frame, (32, 24));

        assert_eq!(fitted.dimensions(), (32, 24));
        let pixel = fitted.get_pixel(10, 10);
        for (channel, expected) in pixel.0.iter().zip([200u8, 100, 50]) {
            assert!(channel.abs_diff(expected) <= 1);
        }
    }
}
