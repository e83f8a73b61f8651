//! Lumen CLI - fractal and raymarched scene rendering from the command line

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use lumen_core::{PixelGrid, dispatch};
use lumen_engine::{
    BackendKind, BatchConfig, Extent, FractalParams, HeadlessOptions, InteriorColor,
    SceneDescription, Subject, VideoJob, open_with_default_program, render_batch, render_frame,
    run_headless, save_image,
};
use lumen_math::Viewport;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lumen")]
#[command(about = "Per-pixel fractal and raymarched scene renderer", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one fractal frame to an image file
    Fractal {
        /// Output image file (.png or .bmp)
        #[arg(short, long, default_value = "fractal.png")]
        output: PathBuf,

        /// Fractal parameters as JSON (flags below override it)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Image size as WIDTHxHEIGHT
        #[arg(long, default_value = "1024x1024", value_parser = parse_extent)]
        size: Extent,

        /// Iteration budget per pixel
        #[arg(long)]
        iterations: Option<u32>,

        /// Exponent p of z^p + c
        #[arg(long, allow_negative_numbers = true)]
        power: Option<f32>,

        /// Complex-plane window
        #[arg(
            long,
            num_args = 4,
            value_names = ["LEFT", "RIGHT", "TOP", "BOTTOM"],
            allow_negative_numbers = true
        )]
        viewport: Option<Vec<f32>>,

        /// Colour of points that never escape
        #[arg(long, value_enum)]
        interior: Option<InteriorArg>,

        /// Open the image when done
        #[arg(long)]
        open: bool,
    },

    /// Render a signed distance scene to an image file
    Scene {
        /// Scene description as JSON (uses the demo scene if not provided)
        #[arg(short, long)]
        scene: Option<PathBuf>,

        /// Output image file (.png or .bmp)
        #[arg(short, long, default_value = "scene.png")]
        output: PathBuf,

        /// Image size as WIDTHxHEIGHT
        #[arg(long, default_value = "1280x720", value_parser = parse_extent)]
        size: Extent,

        /// Print the demo scene as JSON and exit
        #[arg(long)]
        print_demo: bool,

        /// Open the image when done
        #[arg(long)]
        open: bool,
    },

    /// Render an animated fractal sequence to numbered frames
    Batch {
        /// Batch configuration as JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of frames
        #[arg(long)]
        frames: Option<usize>,

        /// Frame size as WIDTHxHEIGHT
        #[arg(long, value_parser = parse_extent)]
        size: Option<Extent>,

        /// Directory for the frames
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Encode the frames into this video afterwards
        #[arg(long)]
        video: Option<PathBuf>,
    },

    /// Encode a directory of numbered frames into a video
    Video {
        /// Directory holding the frames
        frames_dir: PathBuf,

        /// Output video file
        #[arg(short, long, default_value = "output.mp4")]
        output: PathBuf,

        /// Frame file name pattern
        #[arg(long, default_value = "%06d.bmp")]
        pattern: String,

        /// Frames per second
        #[arg(long, default_value = "60")]
        fps: u32,

        /// Open the video when done
        #[arg(long)]
        open: bool,
    },

    /// Drive the frame loop headless for a number of frames
    Run {
        /// Scene description as JSON (renders the animated fractal if not provided)
        #[arg(short, long)]
        scene: Option<PathBuf>,

        /// Number of frames
        #[arg(long, default_value = "60")]
        frames: u32,

        /// Surface size as WIDTHxHEIGHT
        #[arg(long, default_value = "640x480", value_parser = parse_extent)]
        size: Extent,

        /// Resize the surface to WIDTHxHEIGHT halfway through
        #[arg(long, value_parser = parse_extent)]
        resize_to: Option<Extent>,

        /// Presentation backend
        #[arg(long, value_enum, default_value = "software")]
        backend: BackendArg,

        /// Save the last presented frame
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InteriorArg {
    Black,
    Last,
}

impl From<InteriorArg> for InteriorColor {
    fn from(arg: InteriorArg) -> Self {
        match arg {
            InteriorArg::Black => InteriorColor::Black,
            InteriorArg::Last => InteriorColor::LastPaletteEntry,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Software,
    Wgpu,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Software => BackendKind::Software,
            BackendArg::Wgpu => BackendKind::Wgpu,
        }
    }
}

fn parse_extent(s: &str) -> Result<Extent, String> {
    let (width, height) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let width = width.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let height = height.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    Ok(Extent::new(width, height))
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fractal {
            output,
            config,
            size,
            iterations,
            power,
            viewport,
            interior,
            open,
        } => {
            let mut params = match config {
                Some(path) => load_fractal_params(&path)?,
                None => FractalParams::default(),
            };
            if let Some(iterations) = iterations {
                params.max_iterations = iterations;
            }
            if let Some(power) = power {
                params.power = power;
            }
            if let Some(sides) = viewport {
                params.viewport = viewport_from_sides(&sides)?;
            }
            if let Some(interior) = interior {
                params.interior = interior.into();
            }
            run_fractal(&params, size, &output, open)?;
        }
        Commands::Scene {
            scene,
            output,
            size,
            print_demo,
            open,
        } => {
            if print_demo {
                println!("{}", SceneDescription::demo().to_json()?);
                return Ok(());
            }
            run_scene(scene.as_deref(), size, &output, open)?;
        }
        Commands::Batch {
            config,
            frames,
            size,
            output_dir,
            video,
        } => {
            let mut config = match config {
                Some(path) => BatchConfig::load(&path)?,
                None => BatchConfig::default(),
            };
            if let Some(frames) = frames {
                config = config.with_frames(frames);
            }
            if let Some(size) = size {
                config = config.with_size(size.width, size.height);
            }
            if let Some(output_dir) = output_dir {
                config = config.with_output_dir(output_dir);
            }
            if let Some(video) = video {
                config = config.with_video(video);
            }
            run_batch(&config)?;
        }
        Commands::Video {
            frames_dir,
            output,
            pattern,
            fps,
            open,
        } => {
            let job = VideoJob::new(frames_dir, output)
                .with_pattern(pattern)
                .with_fps(fps);
            let video = job.run()?;
            println!("Saved to: {}", video.display());
            if open {
                open_with_default_program(&video)?;
            }
        }
        Commands::Run {
            scene,
            frames,
            size,
            resize_to,
            backend,
            output,
        } => {
            let subject = match scene {
                Some(path) => Subject::Scene(SceneDescription::load(&path)?),
                None => Subject::Fractal {
                    params: FractalParams::default(),
                    animate: true,
                },
            };
            let options = HeadlessOptions {
                frames,
                extent: size,
                resize_to,
                backend: backend.into(),
                output,
            };
            let report = run_headless(subject, &options)?;
            info!("Headless run finished with {:?}", report.stats);
            println!(
                "Presented {} frames ({} skipped), {} resizes, {} throttle waits",
                report.presented, report.skipped, report.stats.resizes, report.stats.throttle_waits
            );
            if let Some(path) = report.output {
                println!("Saved to: {}", path.display());
            }
        }
    }

    Ok(())
}

fn load_fractal_params(path: &Path) -> Result<FractalParams> {
    debug!("Loading fractal parameters from {}", path.display());
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
}

fn viewport_from_sides(sides: &[f32]) -> Result<Viewport> {
    let [left, right, top, bottom] = sides else {
        bail!("Viewport needs exactly four values");
    };
    Ok(Viewport::new(*left, *right, *top, *bottom))
}

fn run_fractal(params: &FractalParams, size: Extent, output: &Path, open: bool) -> Result<()> {
    println!("Rendering fractal to {} ({size})...", output.display());
    info!(
        "Fractal: power {}, {} iterations, viewport {:?}",
        params.power,
        params.max_iterations,
        params.viewport.as_array()
    );
    let grid = render_frame(params, size)?;
    let path = save_image(&grid, output)?;
    println!("Saved to: {}", path.display());
    if open {
        open_with_default_program(&path)?;
    }
    Ok(())
}

fn run_scene(scene: Option<&Path>, size: Extent, output: &Path, open: bool) -> Result<()> {
    let scene = match scene {
        Some(path) => {
            println!("Loading scene: {}", path.display());
            SceneDescription::load(path)?
        }
        None => SceneDescription::demo(),
    };
    println!("Rendering scene to {} ({size})...", output.display());

    info!("Scene with {} top-level shapes", scene.shapes.len());
    let kernel = scene.kernel(size)?;
    let mut grid = PixelGrid::new(size)?;
    dispatch(&kernel, &mut grid);

    let path = save_image(&grid, output)?;
    println!("Saved to: {}", path.display());
    if open {
        open_with_default_program(&path)?;
    }
    Ok(())
}

fn run_batch(config: &BatchConfig) -> Result<()> {
    let report = render_batch(config)?;
    println!(
        "Rendered {} frames into {} in {:.1}s",
        report.frames,
        report.output_dir.display(),
        report.elapsed.as_secs_f64()
    );
    if let Some(video) = &config.video {
        info!("Assembling {} at {} fps", video.display(), config.fps);
        VideoJob::new(&report.output_dir, video)
            .with_pattern(config.pattern.clone())
            .with_fps(config.fps)
            .run()?;
        println!("Saved to: {}", video.display());
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn extent_parsing() {
        assert_eq!(parse_extent("640x480").unwrap(), Extent::new(640, 480));
        assert_eq!(parse_extent("8X6").unwrap(), Extent::new(8, 6));
        assert!(parse_extent("640").is_err());
        assert!(parse_extent("ax4").is_err());
    }

    #[test]
    fn negative_viewport_values_parse() {
        let cli = Cli::try_parse_from([
            "lumen", "fractal", "--viewport", "-2.25", "0.75", "-1.5", "1.5", "--power", "3",
        ])
        .unwrap();
        let Commands::Fractal { viewport, power, .. } = cli.command else {
            panic!("expected the fractal command");
        };
        let viewport = viewport_from_sides(&viewport.unwrap()).unwrap();
        assert_eq!(viewport, Viewport::new(-2.25, 0.75, -1.5, 1.5));
        assert_eq!(power, Some(3.0));
    }
}
