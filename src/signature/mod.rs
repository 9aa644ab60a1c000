mod detector;
pub mod types;

pub use detector::{detect, SignatureDetector};
pub use types::{ColorMarker, DetectionConfig, MarkerCounts, SignatureError, REGION_SIZE};
