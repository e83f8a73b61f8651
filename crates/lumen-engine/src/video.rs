//! Video assembly through an external encoder, and opening results

use anyhow::{Context, Result, bail};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Encoder executable
pub const ENCODER: &str = "ffmpeg";

/// Encode a directory of numbered frames into a video
#[derive(Debug, Clone, PartialEq)]
pub struct VideoJob {
    pub frames_dir: PathBuf,
    /// printf-style frame file name inside `frames_dir`
    pub pattern: String,
    pub fps: u32,
    pub output: PathBuf,
}

impl VideoJob {
    pub fn new(frames_dir: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            frames_dir: frames_dir.into(),
            pattern: "%06d.bmp".to_string(),
            fps: 60,
            output: output.into(),
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Encoder arguments, with `output` passed through unchanged
    pub fn args(&self) -> Vec<OsString> {
        let fps = self.fps.to_string();
        vec![
            "-framerate".into(),
            fps.clone().into(),
            "-i".into(),
            self.pattern.clone().into(),
            "-c:v".into(),
            "libx264".into(),
            "-r".into(),
            fps.into(),
            self.output.clone().into_os_string(),
        ]
    }

    /// The encoder invocation, run from inside `frames_dir`.
    ///
    /// A relative `output` is resolved against the caller's working
    /// directory first.
    pub fn command(&self) -> Result<Command> {
        let output = std::path::absolute(&self.output)
            .with_context(|| format!("Failed to resolve {}", self.output.display()))?;
        let job = Self {
            output,
            ..self.clone()
        };
        let mut command = Command::new(ENCODER);
        command.args(job.args()).current_dir(&self.frames_dir);
        Ok(command)
    }

    /// Run the encoder to completion
    pub fn run(&self) -> Result<PathBuf> {
        if !self.frames_dir.is_dir() {
            bail!("Frame directory {} does not exist", self.frames_dir.display());
        }
        info!(
            "Encoding {} at {} fps into {}",
            self.frames_dir.join(&self.pattern).display(),
            self.fps,
            self.output.display()
        );
        let status = self
            .command()?
            .status()
            .with_context(|| format!("Failed to start {ENCODER}"))?;
        if !status.success() {
            bail!("{ENCODER} exited with {status}");
        }
        Ok(self.output.clone())
    }
}

/// Open `path` with the platform's default program
pub fn open_with_default_program(path: &Path) -> Result<()> {
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut command = Command::new("explorer");
        command.arg(path);
        command
    };

    #[cfg(target_os = "macos")]
    let mut command = {
        let mut command = Command::new("open");
        command.arg(path);
        command
    };

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let mut command = {
        let mut command = Command::new("xdg-open");
        command.arg(path);
        command
    };

    if let Err(e) = command.spawn() {
        warn!("Failed to open {}: {e}", path.display());
        return Err(e).with_context(|| format!("Failed to open {}", path.display()));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn encoder_arguments() {
        let job = VideoJob::new("frames", "out.mp4").with_fps(30);
        let args: Vec<String> = job
            .args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            [
                "-framerate", "30", "-i", "%06d.bmp", "-c:v", "libx264", "-r", "30", "out.mp4"
            ]
        );
    }

    #[test]
    fn command_runs_in_the_frame_directory() {
        let job = VideoJob::new("frames", "out.mp4");
        let command = job.command().unwrap();
        assert_eq!(command.get_program(), ENCODER);
        assert_eq!(command.get_current_dir(), Some(Path::new("frames")));
        let output = command.get_args().last().unwrap();
        assert!(Path::new(output).is_absolute());
    }

    #[test]
    fn missing_frame_directory() {
        let dir = std::env::temp_dir().join("lumen_video_missing_frames");
        let err = VideoJob::new(dir, "out.mp4").run().unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
