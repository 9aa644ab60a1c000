use super::types::{ColorMarker, DetectionConfig, MarkerCounts, SignatureError, REGION_SIZE};
use image::RgbImage;
use ndarray::{s, ArrayView3, Axis, ErrorKind, ShapeError};

/// Looks for the cyan/magenta/yellow cut signature in the top-left corner of a frame
#[derive(Debug, Clone, Default)]
pub struct SignatureDetector {
    config: DetectionConfig,
}

impl SignatureDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Count the samples of the signature region that match each marker color
    ///
    /// A sample inside the tolerance window of more than one marker is counted
    /// for each of them.
    pub fn match_counts(&self, frame: &RgbImage) -> Result<MarkerCounts, SignatureError> {
        let view = hwc_view(frame)?;
        let region = view.slice(s![..REGION_SIZE, ..REGION_SIZE, ..]);

        let mut counts = MarkerCounts::default();
        for sample in region.lanes(Axis(2)) {
            for marker in ColorMarker::ALL {
                if marker.matches(sample.view(), self.config.color_tolerance) {
                    counts.increment(marker);
                }
            }
        }

        Ok(counts)
    }

    /// Returns true if the frame carries the cut signature
    ///
    /// Frames smaller than the 20x20 signature region are rejected with
    /// [`SignatureError::InvalidFrameShape`].
    pub fn detect(&self, frame: &RgbImage) -> Result<bool, SignatureError> {
        let counts = self.match_counts(frame)?;
        Ok(counts.all_at_least(self.config.required_pixels))
    }
}

/// Detect the cut signature with an explicit configuration
pub fn detect(frame: &RgbImage, config: &DetectionConfig) -> Result<bool, SignatureError> {
    SignatureDetector::new(*config).detect(frame)
}

/// View an RGB frame as a (height, width, channel) array
fn hwc_view(frame: &RgbImage) -> Result<ArrayView3<'_, u8>, SignatureError> {
    let (width, height) = frame.dimensions();
    if (width as usize) < REGION_SIZE || (height as usize) < REGION_SIZE {
        return Err(SignatureError::InvalidFrameShape { width, height });
    }

    let shape = (height as usize, width as usize, 3);
    let len = shape.0 * shape.1 * shape.2;

    // The container may be longer than the image, never shorter
    let pixels = frame
        .as_raw()
        .get(..len)
        .ok_or_else(|| ShapeError::from_kind(ErrorKind::OutOfBounds))?;

    Ok(ArrayView3::from_shape(shape, pixels)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const CYAN: [u8; 3] = [0, 255, 255];
    const MAGENTA: [u8; 3] = [255, 0, 255];
    const YELLOW: [u8; 3] = [255, 255, 0];

    /// A 20-row frame whose columns cycle through `pattern`
    fn tiled(pattern: [[u8; 3]; 3]) -> RgbImage {
        RgbImage::from_fn(60, 20, |x, _| Rgb(pattern[x as usize % 3]))
    }

    fn detector(required_pixels: u32, color_tolerance: u32) -> SignatureDetector {
        SignatureDetector::new(DetectionConfig {
            required_pixels,
            color_tolerance,
        })
    }

    #[test]
    fn test_default_config() {
        let config = DetectionConfig::default();
        assert_eq!(config.required_pixels, 10);
        assert_eq!(config.color_tolerance, 30);
    }

    #[test]
    fn test_exact_signature() {
        let frame = tiled([CYAN, MAGENTA, YELLOW]);
        assert!(detector(10, 30).detect(&frame).unwrap());
        assert!(detector(5, 30).detect(&frame).unwrap());
        assert!(detector(10, 0).detect(&frame).unwrap());
    }

    #[test]
    fn test_counts_only_cover_region() {
        let frame = tiled([CYAN, MAGENTA, YELLOW]);
        let counts = detector(10, 30).match_counts(&frame).unwrap();

        // columns 0..20 split 7/7/6 across the three colors
        assert_eq!(counts.cyan, 7 * 20);
        assert_eq!(counts.magenta, 7 * 20);
        assert_eq!(counts.yellow, 6 * 20);
    }

    #[test]
    fn test_signature_within_tolerance() {
        let frame = tiled([[10, 245, 245], [245, 10, 245], [245, 245, 10]]);
        assert!(detector(10, 30).detect(&frame).unwrap());
    }

    #[test]
    fn test_not_enough_pixels() {
        let frame = tiled([CYAN, MAGENTA, YELLOW]);
        assert!(!detector(500, 30).detect(&frame).unwrap());
    }

    #[test]
    fn test_shifted_outside_tolerance() {
        let frame = tiled([[40, 215, 215], [215, 40, 215], [215, 215, 40]]);
        assert!(!detector(10, 30).detect(&frame).unwrap());
    }

    #[test]
    fn test_unrelated_colors() {
        let frame = tiled([[0, 0, 0], [255, 255, 255], [127, 127, 127]]);
        assert!(!detector(10, 30).detect(&frame).unwrap());
    }

    #[test]
    fn test_tolerance_boundary_is_inclusive() {
        let at_limit = tiled([[30, 225, 225], MAGENTA, YELLOW]);
        assert!(detector(10, 30).detect(&at_limit).unwrap());

        let past_limit = tiled([[31, 225, 225], MAGENTA, YELLOW]);
        let counts = detector(10, 30).match_counts(&past_limit).unwrap();
        assert_eq!(counts.cyan, 0);
        assert!(!detector(10, 30).detect(&past_limit).unwrap());
    }

    #[test]
    fn test_single_channel_out_of_tolerance() {
        let frame = tiled([[0, 255, 224], MAGENTA, YELLOW]);
        assert!(!detector(10, 30).detect(&frame).unwrap());
    }

    #[test]
    fn test_overlapping_windows_count_for_each_marker() {
        // inside both the cyan and the yellow window at tolerance 128
        let frame = RgbImage::from_pixel(20, 20, Rgb([128, 255, 128]));
        let counts = detector(10, 128).match_counts(&frame).unwrap();

        assert_eq!(counts.cyan, 400);
        assert_eq!(counts.yellow, 400);
        assert_eq!(counts.magenta, 0);
        assert!(!detector(10, 128).detect(&frame).unwrap());
    }

    #[test]
    fn test_signature_outside_corner_is_ignored() {
        let frame = RgbImage::from_fn(80, 40, |x, _| {
            if x < 20 {
                Rgb([0, 0, 0])
            } else {
                Rgb([CYAN, MAGENTA, YELLOW][x as usize % 3])
            }
        });
        assert!(!detector(10, 30).detect(&frame).unwrap());
    }

    #[test]
    fn test_signature_in_large_frame() {
        let frame = RgbImage::from_fn(640, 360, |x, y| {
            if x < 20 && y < 20 {
                Rgb([CYAN, MAGENTA, YELLOW][(y as usize / 7).min(2)])
            } else {
                Rgb([(x % 256) as u8, (y % 256) as u8, 90])
            }
        });
        assert!(detect(&frame, &DetectionConfig::default()).unwrap());
    }

    #[test]
    fn test_undersized_frame_is_rejected() {
        let frame = RgbImage::from_pixel(19, 40, Rgb(CYAN));
        let err = detector(10, 30).detect(&frame).unwrap_err();
        assert!(matches!(
            err,
            SignatureError::InvalidFrameShape {
                width: 19,
                height: 40
            }
        ));

        let frame = RgbImage::from_pixel(40, 10, Rgb(CYAN));
        assert!(detector(10, 30).detect(&frame).is_err());
    }

    #[test]
    fn test_trailing_buffer_bytes_are_ignored() {
        let mut raw: Vec<u8> = (0..20 * 20)
            .flat_map(|i| [CYAN, MAGENTA, YELLOW][i % 20 % 3])
            .collect();
        raw.extend([7u8; 9]);
        let frame = RgbImage::from_raw(20, 20, raw).unwrap();

        let counts = detector(10, 30).match_counts(&frame).unwrap();
        assert_eq!(counts.cyan + counts.magenta + counts.yellow, 400);
        assert!(detector(10, 30).detect(&frame).unwrap());
    }

    #[test]
    fn test_minimum_frame_size() {
        let frame = RgbImage::from_fn(20, 20, |x, _| Rgb([CYAN, MAGENTA, YELLOW][x as usize % 3]));
        assert!(detector(10, 30).detect(&frame).unwrap());
    }
}
