//! Batch and headless runs end to end

#![allow(clippy::expect_used)]

use lumen_engine::{
    BackendKind, BatchConfig, Extent, HeadlessOptions, SceneDescription, Subject, render_batch,
    run_headless,
};
use lumen_math::{Color, Palette, Viewport};
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lumen_{name}_{}", std::process::id()));
    std::fs::remove_dir_all(&dir).ok();
    dir
}

#[test]
fn small_batch_writes_every_frame() {
    let dir = scratch_dir("batch");
    let config = BatchConfig::default()
        .with_frames(4)
        .with_size(16, 12)
        .with_max_iterations(20)
        .with_viewport(Viewport::new(-2.0, 1.0, -1.5, 1.5))
        .with_output_dir(&dir);

    let report = render_batch(&config).expect("batch");
    assert_eq!(report.frames, 4);
    assert_eq!(report.output_dir, dir);

    for i in 0..4 {
        let path = config.frame_path(i).expect("frame path");
        let image = image::open(&path).expect("decode frame").to_rgba8();
        assert_eq!(image.dimensions(), (16, 12));
    }
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn batch_config_loads_from_json() {
    let dir = scratch_dir("config");
    std::fs::create_dir_all(&dir).expect("create dir");
    let path = dir.join("batch.json");
    std::fs::write(
        &path,
        r#"{
            "frames": 10,
            "width": 320,
            "height": 240,
            "power_from": 2.0,
            "power_to": 3.0,
            "pattern": "frame_%04d.png"
        }"#,
    )
    .expect("write config");

    let config = BatchConfig::load(&path).expect("load");
    assert_eq!(config.extent(), Extent::new(320, 240));
    assert_eq!(
        config.frame_path(7).expect("frame path"),
        PathBuf::from("frames/frame_0007.png")
    );
    assert!(BatchConfig::load(dir.join("missing.json")).is_err());
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn headless_scene_run_resizes_and_saves() {
    let dir = scratch_dir("headless");
    let options = HeadlessOptions {
        frames: 4,
        extent: Extent::new(32, 24),
        resize_to: Some(Extent::new(20, 10)),
        backend: BackendKind::Software,
        output: Some(dir.join("last")),
    };

    let report = run_headless(Subject::Scene(SceneDescription::demo()), &options).expect("run");
    assert_eq!(report.presented, 4);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.stats.drains, 1);
    assert_eq!(report.final_extent, Some(Extent::new(20, 10)));

    let written = report.output.expect("saved frame");
    let image = image::open(&written).expect("decode").to_rgba8();
    assert_eq!(image.dimensions(), (20, 10));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn headless_fractal_run_presents_the_palette() {
    let options = HeadlessOptions {
        frames: 2,
        extent: Extent::new(8, 8),
        ..HeadlessOptions::default()
    };
    let subject = Subject::Fractal {
        params: lumen_engine::FractalParams::default().with_palette(Palette::solid(Color::BLACK)),
        animate: true,
    };
    let report = run_headless(subject, &options).expect("run");
    assert_eq!(report.presented, 2);
    assert_eq!(report.output, None);
}
