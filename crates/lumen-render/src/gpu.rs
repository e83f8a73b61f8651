//! wgpu-backed presentation
//!
//! Back buffers are plain render-target textures; presenting records which
//! one is front. wgpu tracks resource usage itself, so barriers are only
//! traced, and the fence is emulated with submitted-work callbacks that raise
//! an atomic counter.

use crate::backend::{PresentBackend, ResourceState, SwapChain};
use crate::surface::SurfaceHandle;
use crate::{RenderError, Result};
use lumen_core::{Extent, PixelGrid};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, trace};

const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const BYTES_PER_PIXEL: u32 = 4;

/// Acquire a device and queue without a window
pub async fn init_headless() -> Result<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .map_err(|e| RenderError::DeviceCreation(e.to_string()))?;
    info!("Using adapter {}", adapter.get_info().name);

    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("Lumen Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::Off,
        })
        .await
        .map_err(|e| RenderError::DeviceCreation(e.to_string()))
}

fn extent3d(extent: Extent) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: extent.width,
        height: extent.height,
        depth_or_array_layers: 1,
    }
}

/// GPU [`PresentBackend`] on a wgpu device
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: SurfaceHandle,
    encoder: Option<wgpu::CommandEncoder>,
    completed: Arc<AtomicU64>,
    front: Option<wgpu::Texture>,
}

impl WgpuBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, surface: SurfaceHandle) -> Self {
        Self {
            device,
            queue,
            surface,
            encoder: None,
            completed: Arc::new(AtomicU64::new(0)),
            front: None,
        }
    }

    /// Headless device, blocking on adapter and device requests
    pub fn headless(surface: SurfaceHandle) -> Result<Self> {
        let (device, queue) = pollster::block_on(init_headless())?;
        Ok(Self::new(device, queue, surface))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Texture most recently presented
    pub fn front_buffer(&self) -> Option<&wgpu::Texture> {
        self.front.as_ref()
    }

    fn create(&self, label: &str, extent: Extent, usage: wgpu::TextureUsages) -> Result<wgpu::Texture> {
        if extent.is_empty() {
            return Err(RenderError::ZeroSizedSurface);
        }
        let limit = self.device.limits().max_texture_dimension_2d;
        if extent.width > limit || extent.height > limit {
            return Err(RenderError::ResourceCreation {
                extent,
                reason: format!("exceeds the device limit of {limit}"),
            });
        }
        Ok(self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent3d(extent),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage,
            view_formats: &[],
        }))
    }

    fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        self.encoder.get_or_insert_with(|| {
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Frame Encoder"),
                })
        })
    }

    fn poll(&self, poll: wgpu::PollType) -> Result<()> {
        self.device
            .poll(poll)
            .map(|_| ())
            .map_err(|e| RenderError::DeviceLost(e.to_string()))
    }
}

impl PresentBackend for WgpuBackend {
    type Texture = wgpu::Texture;
    type Buffer = wgpu::Texture;

    fn surface_extent(&self) -> Extent {
        self.surface.extent()
    }

    fn create_texture(&mut self, extent: Extent) -> Result<wgpu::Texture> {
        self.create(
            "Working Texture",
            extent,
            wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
        )
    }

    fn resize_buffers(&mut self, extent: Extent) -> Result<SwapChain<wgpu::Texture>> {
        self.front = None;
        let usage = wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC;
        let buffers = [
            self.create("Back Buffer 0", extent, usage)?,
            self.create("Back Buffer 1", extent, usage)?,
        ];
        Ok(SwapChain {
            buffers,
            current_index: 0,
        })
    }

    fn upload(&mut self, texture: &wgpu::Texture, pixels: &PixelGrid) -> Result<()> {
        self.queue.write_texture(
            texture.as_image_copy(),
            pixels.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(pixels.width() * BYTES_PER_PIXEL),
                rows_per_image: Some(pixels.height()),
            },
            extent3d(pixels.extent()),
        );
        Ok(())
    }

    fn transition_texture(&mut self, _texture: &wgpu::Texture, from: ResourceState, to: ResourceState) -> Result<()> {
        trace!("wgpu texture {from:?} -> {to:?} (implicit)");
        Ok(())
    }

    fn transition_buffer(&mut self, _buffer: &wgpu::Texture, from: ResourceState, to: ResourceState) -> Result<()> {
        trace!("wgpu back buffer {from:?} -> {to:?} (implicit)");
        Ok(())
    }

    fn copy(&mut self, texture: &wgpu::Texture, buffer: &wgpu::Texture) -> Result<()> {
        let size = texture.size();
        self.encoder()
            .copy_texture_to_texture(texture.as_image_copy(), buffer.as_image_copy(), size);
        Ok(())
    }

    fn submit(&mut self) -> Result<()> {
        let commands = self.encoder.take().map(wgpu::CommandEncoder::finish);
        self.queue.submit(commands);
        Ok(())
    }

    fn signal(&mut self, value: u64) -> Result<()> {
        let completed = Arc::clone(&self.completed);
        self.queue.on_submitted_work_done(move || {
            completed.fetch_max(value, Ordering::AcqRel);
        });
        Ok(())
    }

    fn completed_value(&mut self) -> Result<u64> {
        self.poll(wgpu::PollType::Poll)?;
        Ok(self.completed.load(Ordering::Acquire))
    }

    fn wait_for(&mut self, value: u64) -> Result<()> {
        if self.completed.load(Ordering::Acquire) >= value {
            return Ok(());
        }
        self.poll(wgpu::PollType::Wait)?;
        if self.completed.load(Ordering::Acquire) < value {
            return Err(RenderError::DeviceLost(format!(
                "fence {value} did not complete after a full wait"
            )));
        }
        Ok(())
    }

    fn present(&mut self, buffer: &wgpu::Texture) -> Result<()> {
        trace!("Present {:?}", buffer.size());
        self.front = Some(buffer.clone());
        Ok(())
    }

    fn read_back(&mut self, buffer: &wgpu::Texture) -> Result<PixelGrid> {
        let size = buffer.size();
        let (width, height) = (size.width, size.height);
        let unpadded_bytes_per_row = width * BYTES_PER_PIXEL;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Buffer"),
            size: u64::from(padded_bytes_per_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            buffer.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            size,
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = output_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.poll(wgpu::PollType::Wait)?;
        rx.recv()
            .map_err(|e| RenderError::DeviceLost(e.to_string()))?
            .map_err(|e| RenderError::DeviceLost(e.to_string()))?;

        let data = slice.get_mapped_range();
        let mut packed = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
        for row in data.chunks(padded_bytes_per_row as usize).take(height as usize) {
            packed.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
        }
        drop(data);
        output_buffer.unmap();

        PixelGrid::from_bytes(Extent::new(width, height), &packed).map_err(RenderError::from)
    }
}
