use super::probe::probe_video;
use super::FrameSource;
use crate::signature::REGION_SIZE;
use anyhow::{anyhow, bail, Context, Result};
use image::RgbImage;
use std::ffi::OsString;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

/// Decodes a video file to RGB frames through an `ffmpeg` child process
pub struct FfmpegDecoder {
    path: PathBuf,
    child: Child,
    stdout: BufReader<ChildStdout>,
    width: u32,
    height: u32,
    frame_rate: f64,
    frames_read: u64,
    finished: bool,
}

impl FfmpegDecoder {
    /// Decode at the video's own frame rate
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_rate(path, None)
    }

    /// Decode with frames dropped or duplicated to `target_fps`, keeping the
    /// clip's duration
    pub fn open_at_rate<P: AsRef<Path>>(path: P, target_fps: f64) -> Result<Self> {
        Self::open_with_rate(path, Some(target_fps))
    }

    fn open_with_rate<P: AsRef<Path>>(path: P, target_fps: Option<f64>) -> Result<Self> {
        let path = path.as_ref();
        let probe = probe_video(path)?;

        tracing::info!(
            "Opening {} ({}x{} @ {:.3} fps, rotation {})",
            path.display(),
            probe.width,
            probe.height,
            probe.frame_rate,
            probe.rotation
        );
        if let Some(fps) = target_fps {
            if (fps - probe.frame_rate).abs() > 1e-3 {
                tracing::info!("Resampling {} to {:.3} fps", path.display(), fps);
            }
        }

        if (probe.width as usize) < REGION_SIZE || (probe.height as usize) < REGION_SIZE {
            bail!(
                "{} is {}x{}, frames must be at least {}x{}",
                path.display(),
                probe.width,
                probe.height,
                REGION_SIZE,
                REGION_SIZE
            );
        }

        let mut child = Command::new("ffmpeg")
            .args(decoder_args(path, target_fps))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .context("Failed to start ffmpeg decoder")?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("ffmpeg decoder has no stdout"))?;

        Ok(Self {
            path: path.to_path_buf(),
            child,
            stdout: BufReader::new(stdout),
            width: probe.width,
            height: probe.height,
            frame_rate: target_fps.unwrap_or(probe.frame_rate),
            frames_read: 0,
            finished: false,
        })
    }

    fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Reap the child once its output is exhausted
    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        let status = self
            .child
            .wait()
            .context("Failed to wait for ffmpeg decoder")?;

        if !status.success() {
            bail!("ffmpeg failed to decode {} ({})", self.path.display(), status);
        }

        tracing::debug!(
            "Decoded {} frames from {}",
            self.frames_read,
            self.path.display()
        );
        Ok(())
    }
}

/// Arguments for an ffmpeg run writing rgb24 frames to stdout
///
/// Rotation is left on, the probed dimensions account for it.
fn decoder_args(path: &Path, target_fps: Option<f64>) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-nostdin", "-v", "error", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(path.as_os_str().to_owned());
    args.extend(["-map", "0:v:0"].into_iter().map(OsString::from));

    if let Some(fps) = target_fps {
        args.push("-vf".into());
        args.push(format!("fps={}", fps).into());
    }

    args.extend(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"].into_iter().map(OsString::from));
    args
}

/// Fill `buf` as far as the reader allows, returning the number of bytes read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl FrameSource for FfmpegDecoder {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.finished {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.frame_len()];
        let filled = read_full(&mut self.stdout, &mut buf)
            .with_context(|| format!("Failed to read frame {}", self.frames_read))?;

        if filled == 0 {
            self.finish()?;
            return Ok(None);
        }
        if filled < buf.len() {
            self.finished = true;
            bail!(
                "Truncated frame {} from {} ({} of {} bytes)",
                self.frames_read,
                self.path.display(),
                filled,
                buf.len()
            );
        }

        let frame = RgbImage::from_raw(self.width, self.height, buf)
            .ok_or_else(|| anyhow!("Frame {} has the wrong size", self.frames_read))?;
        self.frames_read += 1;

        Ok(Some(frame))
    }

    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for FfmpegDecoder {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}
