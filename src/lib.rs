//! Finds frames flagged with a cyan/magenta/yellow cut signature and removes
//! them from a video, reporting every removed run.

pub mod capture;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod segmentation;
pub mod signature;
