//! Batch render configuration

use anyhow::{Context, Result, bail};
use lumen_core::Extent;
use lumen_core::animation::power_ramp;
use lumen_core::fractal::{FractalParams, InteriorColor};
use lumen_math::{Palette, Viewport};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// An animated fractal sequence rendered to numbered image files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of frames to render
    pub frames: usize,
    pub width: u32,
    pub height: u32,
    pub viewport: Viewport,
    pub max_iterations: u32,
    /// Exponent at the first frame
    pub power_from: f32,
    /// Exponent at the last frame
    pub power_to: f32,
    pub palette: Palette,
    pub interior: InteriorColor,
    /// Directory the frames are written into
    pub output_dir: PathBuf,
    /// printf-style frame file name, e.g. `%06d.bmp`
    pub pattern: String,
    /// Frame rate of the assembled video
    pub fps: u32,
    /// Encode the frames into this video once rendering finishes
    pub video: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            frames: 3600,
            width: 2000,
            height: 2000,
            viewport: Viewport::default(),
            max_iterations: 75,
            power_from: 0.0,
            power_to: 6.0,
            palette: Palette::default(),
            interior: InteriorColor::default(),
            output_dir: PathBuf::from("frames"),
            pattern: "%06d.bmp".to_string(),
            fps: 60,
            video: None,
        }
    }
}

impl BatchConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch config {}", path.display()))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse batch config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a single frame
    pub fn validate(&self) -> Result<()> {
        if self.frames == 0 {
            bail!("Batch has no frames");
        }
        if self.extent().is_empty() {
            bail!("Invalid frame size {}", self.extent());
        }
        if self.fps == 0 {
            bail!("Frame rate must be positive");
        }
        frame_file_name(&self.pattern, 0)?;
        Ok(())
    }

    pub fn with_frames(mut self, frames: usize) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_power_range(mut self, from: f32, to: f32) -> Self {
        self.power_from = from;
        self.power_to = to;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_video(mut self, video: impl Into<PathBuf>) -> Self {
        self.video = Some(video.into());
        self
    }

    pub fn extent(&self) -> Extent {
        Extent::new(self.width, self.height)
    }

    /// Exponent of frame `index`
    pub fn power_at(&self, index: usize) -> f32 {
        power_ramp(index, self.frames, self.power_from, self.power_to)
    }

    /// Fractal parameters of frame `index`
    pub fn frame_params(&self, index: usize) -> FractalParams {
        FractalParams::default()
            .with_viewport(self.viewport)
            .with_max_iterations(self.max_iterations)
            .with_power(self.power_at(index))
            .with_palette(self.palette.clone())
            .with_interior(self.interior)
    }

    /// Output file of frame `index`
    pub fn frame_path(&self, index: usize) -> Result<PathBuf> {
        Ok(self.output_dir.join(frame_file_name(&self.pattern, index)?))
    }
}

/// Widest zero padding a frame pattern may ask for
pub const MAX_PATTERN_WIDTH: usize = 32;

/// Expand the single `%d` / `%0Nd` placeholder of `pattern` with `index`
pub fn frame_file_name(pattern: &str, index: usize) -> Result<String> {
    let Some(start) = pattern.find('%') else {
        bail!("Frame pattern {pattern:?} has no %d placeholder");
    };
    let rest = &pattern[start + 1..];
    let Some(end) = rest.find('d') else {
        bail!("Frame pattern {pattern:?} has an unterminated placeholder");
    };
    let flags = &rest[..end];
    let width = if flags.is_empty() {
        0
    } else if let Some(digits) = flags.strip_prefix('0') {
        digits
            .parse::<usize>()
            .with_context(|| format!("Bad width in frame pattern {pattern:?}"))?
    } else {
        bail!("Frame pattern {pattern:?} only supports %d and %0Nd");
    };
    if width > MAX_PATTERN_WIDTH {
        bail!("Frame pattern {pattern:?} pads wider than {MAX_PATTERN_WIDTH} digits");
    }
    let tail = &rest[end + 1..];
    if tail.contains('%') {
        bail!("Frame pattern {pattern:?} has more than one placeholder");
    }
    Ok(format!("{}{index:0width$}{tail}", &pattern[..start]))
}
