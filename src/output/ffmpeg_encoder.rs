use super::{fit_to_resolution, VideoSink};
use anyhow::{anyhow, bail, Context, Result};
use image::RgbImage;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

/// Codec options passed to `ffmpeg`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    pub codec: String,
    pub pixel_format: String,
    pub preset: String,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            pixel_format: "yuv420p".to_string(),
            preset: "medium".to_string(),
        }
    }
}

impl EncoderSettings {
    /// Arguments for an ffmpeg run reading raw RGB frames from stdin
    fn ffmpeg_args(&self, width: u32, height: u32, fps: f64) -> Vec<String> {
        let mut args: Vec<String> = [
            "-y", "-nostdin", "-v", "error", "-f", "rawvideo", "-pix_fmt", "rgb24",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        args.extend([
            "-s".to_string(),
            format!("{}x{}", width, height),
            "-r".to_string(),
            format!("{}", fps),
            "-i".to_string(),
            "-".to_string(),
            "-an".to_string(),
            // 4:2:0 chroma needs even dimensions
            "-vf".to_string(),
            "pad=ceil(iw/2)*2:ceil(ih/2)*2".to_string(),
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-pix_fmt".to_string(),
            self.pixel_format.clone(),
        ]);

        args
    }
}

/// Encodes RGB frames to a video file through an `ffmpeg` child process
pub struct FfmpegEncoder {
    path: PathBuf,
    child: Child,
    stdin: Option<BufWriter<ChildStdin>>,
    width: u32,
    height: u32,
    frames_written: u64,
}

impl FfmpegEncoder {
    pub fn create<P: AsRef<Path>>(
        path: P,
        width: u32,
        height: u32,
        fps: f64,
        settings: &EncoderSettings,
    ) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!(
            "Encoding {} ({}x{} @ {:.3} fps, {})",
            path.display(),
            width,
            height,
            fps,
            settings.codec
        );

        let mut child = Command::new("ffmpeg")
            .args(settings.ffmpeg_args(width, height, fps))
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .context("Failed to start ffmpeg encoder")?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("ffmpeg encoder has no stdin"))?;

        Ok(Self {
            path: path.to_path_buf(),
            child,
            stdin: Some(BufWriter::new(stdin)),
            width,
            height,
            frames_written: 0,
        })
    }

    /// Close the frame pipe and wait for ffmpeg to finish writing the file
    pub fn finish(mut self) -> Result<()> {
        if let Some(mut stdin) = self.stdin.take() {
            stdin
                .flush()
                .context("Failed to flush frames to ffmpeg encoder")?;
        }

        let status = self
            .child
            .wait()
            .context("Failed to wait for ffmpeg encoder")?;

        if !status.success() {
            bail!("ffmpeg failed to encode {} ({})", self.path.display(), status);
        }

        tracing::info!(
            "Wrote {} frames to {}",
            self.frames_written,
            self.path.display()
        );
        Ok(())
    }
}

impl VideoSink for FfmpegEncoder {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let frame = fit_to_resolution(frame, (self.width, self.height));

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| anyhow!("ffmpeg encoder is already closed"))?;

        stdin
            .write_all(frame.as_raw())
            .context("Failed to write frame to ffmpeg encoder")?;
        self.frames_written += 1;

        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        // Unfinished encode: drop the pipe and stop ffmpeg
        if let Some(stdin) = self.stdin.take() {
            drop(stdin);
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = EncoderSettings::default();
        assert_eq!(settings.codec, "libx264");
        assert_eq!(settings.pixel_format, "yuv420p");
    }

    #[test]
    fn test_ffmpeg_args_describe_raw_input() {
        let args = EncoderSettings::default().ffmpeg_args(640, 360, 29.97);

        let position = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert_eq!(args[position("-s") + 1], "640x360");
        assert_eq!(args[position("-r") + 1], "29.97");
        assert_eq!(args[position("-i") + 1], "-");
        assert_eq!(args[position("-c:v") + 1], "libx264");
        assert!(args.contains(&"-an".to_string()));
    }
}
