//! Video backend: `ffprobe` for dimensions, `ffmpeg` for transcoding.
//!
//! Both tools are run synchronously; a non-zero exit becomes
//! [`BackendError::CommandFailed`] carrying the tool's stderr.

use super::backend::{BackendError, Dimensions, VideoBackend};
use super::params::TranscodeParams;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    ffmpeg: String,
    ffprobe: String,
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn probe_command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args([
            "-v",
            "error",
            "-select_streams",
            "v",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=p=0:s=x",
        ])
        .arg(path);
        cmd
    }

    fn transcode_command(&self, params: &TranscodeParams) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-y")
            .arg("-i")
            .arg(&params.source)
            .arg("-filter:v")
            .arg(params.filter.to_string())
            .arg("-filter:a")
            .arg(params.loudness.to_string())
            .arg(&params.output);
        cmd
    }
}

/// Parse ffprobe's `WIDTHxHEIGHT` output (first line only).
pub fn parse_dimensions(output: &str) -> Option<Dimensions> {
    let line = output.lines().next()?.trim();
    let (w, h) = line.split_once('x')?;
    let width: u32 = w.trim().parse().ok()?;
    let height: u32 = h.trim().parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some(Dimensions { width, height })
}

impl VideoBackend for FfmpegBackend {
    fn probe(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let output = self.probe_command(path).output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            return Err(BackendError::Probe {
                path: path.display().to_string(),
                output: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        parse_dimensions(&stdout).ok_or_else(|| BackendError::Probe {
            path: path.display().to_string(),
            output: stdout.trim().to_string(),
        })
    }

    fn transcode(&self, params: &TranscodeParams) -> Result<(), BackendError> {
        tracing::info!(
            source = %params.source.display(),
            output = %params.output.display(),
            filter = %params.filter,
            "running ffmpeg"
        );
        let output = self.transcode_command(params).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!(source = %params.source.display(), %stderr, "ffmpeg failed");
            return Err(BackendError::CommandFailed {
                program: self.ffmpeg.clone(),
                stderr,
            });
        }
        Ok(())
    }
}
