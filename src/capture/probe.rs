use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

/// Stream properties of the first video stream in a file
///
/// `width` and `height` are the displayed dimensions, i.e. after the stream's
/// rotation is applied, matching what `ffmpeg` decodes by default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoProbe {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    /// Display rotation in degrees, normalized to 0, 90, 180 or 270
    pub rotation: u32,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    #[serde(default)]
    tags: ProbeTags,
    #[serde(default)]
    side_data_list: Vec<ProbeSideData>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeTags {
    rotate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeSideData {
    rotation: Option<f64>,
}

impl ProbeStream {
    /// Display-matrix rotation, falling back to the legacy `rotate` tag
    fn rotation(&self) -> Result<u32> {
        let degrees = match self.side_data_list.iter().find_map(|data| data.rotation) {
            Some(degrees) => degrees,
            None => match &self.tags.rotate {
                Some(tag) => tag
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid rotate tag {:?}", tag))?,
                None => 0.0,
            },
        };

        let normalized = (degrees.round() as i64).rem_euclid(360);
        if normalized % 90 != 0 {
            bail!("Unsupported rotation of {} degrees", degrees);
        }
        Ok(normalized as u32)
    }
}

/// Run `ffprobe` on a video file
pub fn probe_video<P: AsRef<Path>>(path: P) -> Result<VideoProbe> {
    let path = path.as_ref();
    tracing::debug!("Probing {}", path.display());

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate,avg_frame_rate\
             :stream_tags=rotate:stream_side_data=rotation",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .context("Failed to run ffprobe")?;

    if !output.status.success() {
        bail!(
            "ffprobe failed on {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    parse_probe_output(&output.stdout)
        .with_context(|| format!("Failed to read stream info for {}", path.display()))
}

/// Parse `ffprobe -of json` output
pub fn parse_probe_output(json: &[u8]) -> Result<VideoProbe> {
    let parsed: ProbeOutput = serde_json::from_slice(json).context("Invalid ffprobe output")?;

    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No video stream found"))?;

    let stored_width = stream
        .width
        .ok_or_else(|| anyhow!("Video stream has no width"))?;
    let stored_height = stream
        .height
        .ok_or_else(|| anyhow!("Video stream has no height"))?;

    // ffmpeg applies the rotation while decoding, so quarter turns swap the axes
    let rotation = stream.rotation()?;
    let (width, height) = if rotation % 180 == 90 {
        (stored_height, stored_width)
    } else {
        (stored_width, stored_height)
    };

    // r_frame_rate is 0/0 for some containers, fall back to the average rate
    let frame_rate = [stream.r_frame_rate, stream.avg_frame_rate]
        .into_iter()
        .flatten()
        .find_map(|rate| parse_frame_rate(&rate).ok())
        .ok_or_else(|| anyhow!("Video stream has no usable frame rate"))?;

    Ok(VideoProbe {
        width,
        height,
        frame_rate,
        rotation,
    })
}

/// Parse a frame rate given either as a rational (`30000/1001`) or a decimal
pub fn parse_frame_rate(rate: &str) -> Result<f64> {
    let rate = rate.trim();
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num
                .trim()
                .parse()
                .with_context(|| format!("Invalid frame rate numerator in {:?}", rate))?;
            let den: f64 = den
                .trim()
                .parse()
                .with_context(|| format!("Invalid frame rate denominator in {:?}", rate))?;
            if den == 0.0 {
                bail!("Frame rate {:?} has a zero denominator", rate);
            }
            num / den
        }
        None => rate
            .parse()
            .with_context(|| format!("Invalid frame rate {:?}", rate))?,
    };

    if !value.is_finite() || value <= 0.0 {
        bail!("Frame rate {:?} is not positive", rate);
    }

    Ok(value)
}
