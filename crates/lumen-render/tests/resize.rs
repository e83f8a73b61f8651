//! Frame loop lifecycle against the software backend

#![allow(clippy::expect_used)]

use lumen_core::Extent;
use lumen_core::kernel::Kernel;
use lumen_core::prelude::Vec4;
use lumen_render::source::Fixed;
use lumen_render::{
    FrameLoop, FrameOp, FrameOutcome, LoopState, RenderError, ResourceKind, ResourceState,
    SoftwareBackend, SurfaceHandle, from_fn,
};

#[derive(Clone)]
struct Solid(Vec4);

impl Kernel for Solid {
    fn shade(&self, _x: u32, _y: u32, _width: u32, _height: u32) -> Vec4 {
        self.0
    }
}

const TEAL: Vec4 = Vec4::new(0.0, 0.5, 0.5, 1.0);

fn running(extent: Extent) -> (SurfaceHandle, FrameLoop<SoftwareBackend, Fixed<Solid>>) {
    let surface = SurfaceHandle::new(extent);
    let mut frames = FrameLoop::new(Fixed(Solid(TEAL)));
    frames
        .initialize(SoftwareBackend::new(surface.clone()))
        .expect("initialize");
    (surface, frames)
}

fn presented_extent(outcome: FrameOutcome) -> Extent {
    match outcome {
        FrameOutcome::Presented { extent, .. } => extent,
        FrameOutcome::Skipped => panic!("frame was skipped"),
    }
}

#[test]
fn update_before_initialize_fails() {
    let mut frames: FrameLoop<SoftwareBackend, _> = FrameLoop::new(Fixed(Solid(TEAL)));
    assert_eq!(frames.state(), LoopState::Uninitialized);
    assert!(matches!(frames.on_update(0.0), Err(RenderError::Uninitialized)));
    assert!(matches!(frames.on_resize(), Err(RenderError::Uninitialized)));
}

#[test]
fn frames_alternate_buffers_and_fences_increase() {
    let (_surface, mut frames) = running(Extent::new(16, 8));
    assert_eq!(frames.state(), LoopState::Ready);

    let mut indices = Vec::new();
    let mut fences = Vec::new();
    for i in 0..4 {
        match frames.on_update(i as f32 / 60.0).expect("update") {
            FrameOutcome::Presented {
                buffer_index,
                fence,
                extent,
            } => {
                assert_eq!(extent, Extent::new(16, 8));
                indices.push(buffer_index);
                fences.push(fence);
            }
            FrameOutcome::Skipped => panic!("frame {i} skipped"),
        }
        assert_eq!(frames.state(), LoopState::Ready);
    }

    assert_eq!(indices, vec![0, 1, 0, 1]);
    assert_eq!(fences, vec![1, 2, 3, 4]);
    assert_eq!(frames.next_fence(), 5);

    let backend = frames.backend().expect("backend");
    assert!(backend.signals().windows(2).all(|w| w[0] < w[1]));
    assert_eq!(backend.presented().len(), 4);
    // The fence never completes on its own, so every frame throttles
    assert_eq!(frames.stats().throttle_waits, 4);
    assert_eq!(frames.stats().drains, 0);
}

#[test]
fn presented_buffer_holds_the_kernel_output() {
    let (_surface, mut frames) = running(Extent::new(5, 3));
    frames.on_update(0.0).expect("update");
    let image = frames.capture().expect("capture").expect("a presented frame");
    assert_eq!(image.extent(), Extent::new(5, 3));
    assert!(image.pixels().iter().all(|px| *px == [0, 127, 127, 255]));
}

#[test]
fn resize_mid_run_drains_once_and_reallocates() {
    let (surface, mut frames) = running(Extent::new(64, 48));
    let tracker = frames.backend().expect("backend").tracker();
    for i in 0..3 {
        frames.on_update(i as f32).expect("update");
    }
    let before = frames.stats();

    surface.set_extent(Extent::new(32, 16));
    frames.on_resize().expect("resize");
    assert!(frames.resize_pending());
    let outcome = frames.on_update(3.0).expect("update after resize");

    let after = frames.stats();
    assert_eq!(after.drains - before.drains, 1);
    assert_eq!(after.resizes - before.resizes, 1);
    assert_eq!(presented_extent(outcome), Extent::new(32, 16));
    assert!(!frames.resize_pending());

    // Exactly one working texture and two back buffers, all at the new size
    let live = tracker.live_allocations();
    assert_eq!(live.len(), 3);
    assert!(live.iter().all(|a| a.extent == Extent::new(32, 16)));
    assert_eq!(
        live.iter().filter(|a| a.kind == ResourceKind::BackBuffer).count(),
        2
    );

    let next = frames.on_update(4.0).expect("next frame");
    assert_eq!(presented_extent(next), Extent::new(32, 16));
}

#[test]
fn failed_resize_keeps_previous_size_and_retries() {
    let (surface, mut frames) = running(Extent::new(24, 24));
    let tracker = frames.backend().expect("backend").tracker();
    frames.on_update(0.0).expect("first frame");

    frames
        .backend_mut()
        .expect("backend")
        .fail_allocations_at(Some(Extent::new(128, 128)));
    surface.set_extent(Extent::new(128, 128));
    frames.on_resize().expect("resize");

    let degraded = frames.on_update(1.0).expect("degraded frame");
    assert_eq!(presented_extent(degraded), Extent::new(24, 24));
    assert_eq!(frames.state(), LoopState::Ready);
    assert!(frames.resize_pending());
    assert_eq!(frames.stats().failed_resizes, 1);
    assert!(tracker.live_allocations().iter().all(|a| a.extent == Extent::new(24, 24)));
    let fallback = frames.capture().expect("capture").expect("fallback frame presented");
    assert_eq!(fallback.extent(), Extent::new(24, 24));

    frames.backend_mut().expect("backend").fail_allocations_at(None);
    let recovered = frames.on_update(2.0).expect("recovered frame");
    assert_eq!(presented_extent(recovered), Extent::new(128, 128));
    assert!(!frames.resize_pending());
}

fn presented_fence(outcome: FrameOutcome) -> u64 {
    match outcome {
        FrameOutcome::Presented { fence, .. } => fence,
        FrameOutcome::Skipped => panic!("frame was skipped"),
    }
}

#[test]
fn one_failed_frame_call_does_not_wedge_the_loop() {
    // A fence value is spent once signalled, so failures after the signal
    // move the next fence on by one
    let cases = [
        (FrameOp::Upload, 2),
        (FrameOp::Copy, 2),
        (FrameOp::Submit, 2),
        (FrameOp::Signal, 2),
        (FrameOp::Present, 3),
        (FrameOp::Wait, 3),
    ];
    for (op, next) in cases {
        let (_surface, mut frames) = running(Extent::new(6, 6));
        let tracker = frames.backend().expect("backend").tracker();
        frames.on_update(0.0).expect("first frame");

        frames.backend_mut().expect("backend").fail_next(op);
        assert!(frames.on_update(1.0).is_err(), "{op:?} should fail the frame");
        assert_eq!(frames.state(), LoopState::Ready);

        let fences: Vec<u64> = (2..5)
            .map(|i| presented_fence(frames.on_update(i as f32).expect("frame after failure")))
            .collect();
        assert_eq!(fences, vec![next, next + 1, next + 2], "after {op:?}");

        let backend = frames.backend().expect("backend");
        assert!(backend.signals().windows(2).all(|w| w[0] < w[1]));
        for allocation in tracker.live_allocations() {
            let resting = match allocation.kind {
                ResourceKind::WorkingTexture => ResourceState::UnorderedAccess,
                ResourceKind::BackBuffer => ResourceState::Common,
            };
            assert_eq!(allocation.state, resting, "after {op:?}");
        }

        let image = frames.capture().expect("capture").expect("a presented frame");
        assert!(image.pixels().iter().all(|px| *px == [0, 127, 127, 255]));
    }
}

#[test]
fn minimized_surface_defers_the_resize() {
    let (surface, mut frames) = running(Extent::new(10, 10));
    frames.on_update(0.0).expect("first frame");

    surface.set_extent(Extent::new(0, 10));
    frames.on_resize().expect("resize");
    let outcome = frames.on_update(1.0).expect("update while minimized");
    assert_eq!(presented_extent(outcome), Extent::new(10, 10));
    assert!(frames.resize_pending());

    surface.set_extent(Extent::new(20, 12));
    let outcome = frames.on_update(2.0).expect("update after restore");
    assert_eq!(presented_extent(outcome), Extent::new(20, 12));
}

#[test]
fn minimized_at_start_skips() {
    let (surface, mut frames) = running(Extent::new(0, 0));
    assert_eq!(frames.on_update(0.0).expect("update"), FrameOutcome::Skipped);
    assert_eq!(frames.extent(), None);

    surface.set_extent(Extent::new(4, 4));
    let outcome = frames.on_update(0.1).expect("update");
    assert_eq!(presented_extent(outcome), Extent::new(4, 4));
}

#[test]
fn immediate_fence_never_throttles() {
    let surface = SurfaceHandle::new(Extent::new(8, 8));
    let mut frames = FrameLoop::new(Fixed(Solid(TEAL)));
    frames
        .initialize(SoftwareBackend::new(surface).with_immediate_completion(true))
        .expect("initialize");
    for i in 0..5 {
        frames.on_update(i as f32).expect("update");
    }
    assert_eq!(frames.stats().frames, 5);
    assert_eq!(frames.stats().throttle_waits, 0);
}

#[test]
fn shutdown_releases_everything() {
    let (_surface, mut frames) = running(Extent::new(8, 8));
    let tracker = frames.backend().expect("backend").tracker();
    frames.on_update(0.0).expect("update");
    assert_eq!(tracker.live_allocations().len(), 3);

    frames.shutdown().expect("shutdown");
    assert_eq!(frames.state(), LoopState::ShutDown);
    assert!(tracker.live_allocations().is_empty());
    assert!(matches!(frames.on_update(1.0), Err(RenderError::ShutDown)));
    // A second shutdown is a no-op
    frames.shutdown().expect("second shutdown");
}

#[test]
fn closure_sources_see_the_frame_context() {
    let surface = SurfaceHandle::new(Extent::new(6, 4));
    let mut seen = Vec::new();
    {
        let source = from_fn(|frame: &lumen_render::FrameContext| {
            seen.push((frame.frame_index, frame.extent));
            Ok(Solid(Vec4::new(frame.time, 0.0, 0.0, 1.0)))
        });
        let mut frames = FrameLoop::new(source);
        frames
            .initialize(SoftwareBackend::new(surface))
            .expect("initialize");
        frames.on_update(0.5).expect("update");
        frames.on_update(1.0).expect("update");
    }
    assert_eq!(seen, vec![(0, Extent::new(6, 4)), (1, Extent::new(6, 4))]);
}
