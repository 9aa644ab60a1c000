use ndarray::ArrayView1;
use thiserror::Error;

/// Side length of the square corner region that carries the cut signature
pub const REGION_SIZE: usize = 20;

/// One of the three reference colors that make up the cut signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorMarker {
    Cyan,
    Magenta,
    Yellow,
}

impl ColorMarker {
    /// All markers, in the order they appear in the signature
    pub const ALL: [ColorMarker; 3] = [
        ColorMarker::Cyan,
        ColorMarker::Magenta,
        ColorMarker::Yellow,
    ];

    pub const fn rgb(self) -> [u8; 3] {
        match self {
            ColorMarker::Cyan => [0, 255, 255],
            ColorMarker::Magenta => [255, 0, 255],
            ColorMarker::Yellow => [255, 255, 0],
        }
    }

    /// Whether an RGB sample lies inside this marker's tolerance window.
    ///
    /// The comparison is inclusive and must hold on every channel.
    pub fn matches(self, sample: ArrayView1<'_, u8>, tolerance: u32) -> bool {
        sample
            .iter()
            .zip(self.rgb())
            .all(|(&value, reference)| u32::from(value.abs_diff(reference)) <= tolerance)
    }
}

/// Thresholds used when looking for the cut signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionConfig {
    /// Minimum number of matching samples per marker color
    pub required_pixels: u32,
    /// Maximum per-channel absolute difference from a marker color
    pub color_tolerance: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            required_pixels: 10,
            color_tolerance: 30,
        }
    }
}

/// Number of region samples matching each marker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkerCounts {
    pub cyan: u32,
    pub magenta: u32,
    pub yellow: u32,
}

impl MarkerCounts {
    pub fn get(&self, marker: ColorMarker) -> u32 {
        match marker {
            ColorMarker::Cyan => self.cyan,
            ColorMarker::Magenta => self.magenta,
            ColorMarker::Yellow => self.yellow,
        }
    }

    pub(crate) fn increment(&mut self, marker: ColorMarker) {
        match marker {
            ColorMarker::Cyan => self.cyan += 1,
            ColorMarker::Magenta => self.magenta += 1,
            ColorMarker::Yellow => self.yellow += 1,
        }
    }

    /// True when every marker reached `required`
    pub fn all_at_least(&self, required: u32) -> bool {
        ColorMarker::ALL
            .into_iter()
            .all(|marker| self.get(marker) >= required)
    }
}

#[derive(Debug, Error)]
pub enum SignatureError {
    /// Frame is too small to contain the signature region
    #[error("frame is {width}x{height}, the cut signature needs at least 20x20")]
    InvalidFrameShape { width: u32, height: u32 },

    #[error("frame buffer does not match its dimensions")]
    Layout(#[from] ndarray::ShapeError),
}
