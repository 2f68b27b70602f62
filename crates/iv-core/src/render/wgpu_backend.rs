//! GPU display path. The frame is uploaded once as an RGBA f32 storage
//! buffer and re-rendered from there on every exposure, gamma, zoom or pan
//! change; only a new frame or a different channel packing re-uploads.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::channel::{ChannelDescriptor, ChannelSource};
use crate::consts::OUTSIDE_COLOR;
use crate::display::{sanitize, DisplaySettings};
use crate::error::{IvError, Result};
use crate::image::{DisplayFrame, FrameKey};
use crate::viewport::ViewGeometry;

use super::DisplayBackend;

const WORKGROUP_SIZE: u32 = 16;

const MODE_COLOR: u32 = 0;
const MODE_GRAY: u32 = 1;
const MODE_LUMINANCE: u32 = 2;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DisplayParams {
    center: [f32; 2],
    window: [f32; 2],
    image: [f32; 2],
    zoom: f32,
    gain: f32,
    inv_gamma: f32,
    mode: u32,
    out_width: u32,
    out_height: u32,
    outside: [f32; 4],
}

/// Lifecycle of the device objects behind the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceState {
    /// Nothing allocated.
    Uninitialized,
    /// Shader compiled and pipeline built, no image uploaded.
    Created,
    /// A frame is resident on the device.
    Bound,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct UploadKey {
    frame: FrameKey,
    source: ChannelSource,
}

struct BoundImage {
    key: UploadKey,
    buffer: wgpu::Buffer,
    width: u32,
    height: u32,
}

enum Resources {
    Uninitialized,
    Created(wgpu::ComputePipeline),
    Bound {
        pipeline: wgpu::ComputePipeline,
        image: BoundImage,
    },
}

pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    adapter_name: String,
    resources: Resources,
    uploads: usize,
}

const fn div_ceil(a: u32, b: u32) -> u32 {
    (a + b - 1) / b
}

impl WgpuBackend {
    pub fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| IvError::Gpu(format!("No suitable GPU adapter found: {e}")))?;

        let adapter_name = adapter.get_info().name.clone();
        tracing::info!("GPU adapter: {adapter_name}");

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("iv"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        }))
        .map_err(|e| IvError::Gpu(format!("Failed to create GPU device: {e}")))?;

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_name,
            resources: Resources::Uninitialized,
            uploads: 0,
        })
    }

    pub fn resource_state(&self) -> ResourceState {
        match self.resources {
            Resources::Uninitialized => ResourceState::Uninitialized,
            Resources::Created(_) => ResourceState::Created,
            Resources::Bound { .. } => ResourceState::Bound,
        }
    }

    /// Number of frame uploads since creation.
    pub fn uploads(&self) -> usize {
        self.uploads
    }

    fn build_pipeline(&self) -> wgpu::ComputePipeline {
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("display"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/display.wgsl").into()),
        });
        self.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("display"),
            layout: None,
            module: &module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        })
    }

    /// Make sure `frame` is resident with the packing `descriptor` needs.
    fn bind(&mut self, frame: &DisplayFrame, descriptor: &ChannelDescriptor) -> Result<()> {
        let key = UploadKey {
            frame: frame.key,
            source: descriptor.source,
        };
        let pipeline = match std::mem::replace(&mut self.resources, Resources::Uninitialized) {
            Resources::Bound { pipeline, image } if image.key == key => {
                self.resources = Resources::Bound { pipeline, image };
                return Ok(());
            }
            Resources::Bound { pipeline, .. } | Resources::Created(pipeline) => pipeline,
            Resources::Uninitialized => {
                tracing::debug!("compiling display pipeline");
                self.build_pipeline()
            }
        };

        let packed = match self.pack(frame, descriptor.source) {
            Ok(packed) => packed,
            Err(e) => {
                self.resources = Resources::Created(pipeline);
                return Err(e);
            }
        };
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("display source"),
            contents: bytemuck::cast_slice(&packed),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });
        self.uploads += 1;
        tracing::debug!(
            "uploaded {}x{} frame (record {}, revision {})",
            frame.pixels.width(),
            frame.pixels.height(),
            key.frame.record,
            key.frame.revision
        );

        self.resources = Resources::Bound {
            pipeline,
            image: BoundImage {
                key,
                buffer,
                width: frame.pixels.width(),
                height: frame.pixels.height(),
            },
        };
        Ok(())
    }

    /// Repack the frame as normalized RGBA f32 texels.
    fn pack(&self, frame: &DisplayFrame, source: ChannelSource) -> Result<Vec<f32>> {
        let pixels = &frame.pixels;
        let (w, h) = (pixels.width(), pixels.height());
        let bytes = w as u64 * h as u64 * 16;
        let limits = self.device.limits();
        let max_binding = limits.max_storage_buffer_binding_size as u64;
        if bytes > max_binding || bytes > limits.max_buffer_size {
            return Err(IvError::Gpu(format!(
                "{w}x{h} image needs {bytes} bytes, device allows {max_binding}"
            )));
        }

        let channels: Vec<usize> = match source {
            ChannelSource::All => vec![0, 1, 2],
            ChannelSource::Index(c) => vec![c],
        };
        let mut packed = vec![0.0f32; w as usize * h as usize * 4];
        for y in 0..h {
            for x in 0..w {
                let base = (y as usize * w as usize + x as usize) * 4;
                for (slot, &c) in channels.iter().enumerate() {
                    packed[base + slot] = sanitize(pixels.sample(x, y, c));
                }
            }
        }
        Ok(packed)
    }

    fn create_uniform<T: Pod>(&self, data: &T) -> wgpu::Buffer {
        self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: None,
            contents: bytemuck::bytes_of(data),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    fn create_storage_uninit(&self, byte_size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: None,
            size: byte_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        })
    }

    fn download_u32(&self, buffer: &wgpu::Buffer) -> Result<Vec<u32>> {
        let size = buffer.size();
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: None,
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut enc = self.device.create_command_encoder(&Default::default());
        enc.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(enc.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        slice.map_async(wgpu::MapMode::Read, move |r| {
            tx.send(r).ok();
        });
        self.device.poll(wgpu::PollType::wait_indefinitely()).ok();
        rx.recv()
            .map_err(|_| IvError::Gpu("GPU channel closed".into()))?
            .map_err(|e| IvError::Gpu(format!("Buffer mapping failed: {e}")))?;

        let data = slice.get_mapped_range();
        let result: Vec<u32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        staging.unmap();
        Ok(result)
    }

    /// Dispatch a single compute pass with one bind group at group(0).
    fn dispatch(
        &self,
        pipeline: &wgpu::ComputePipeline,
        entries: &[wgpu::BindGroupEntry],
        workgroups: (u32, u32, u32),
    ) {
        let layout = pipeline.get_bind_group_layout(0);
        let bg = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &layout,
            entries,
        });
        let mut enc = self.device.create_command_encoder(&Default::default());
        {
            let mut pass = enc.begin_compute_pass(&Default::default());
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bg, &[]);
            pass.dispatch_workgroups(workgroups.0, workgroups.1, workgroups.2);
        }
        self.queue.submit(std::iter::once(enc.finish()));
    }
}

fn shader_mode(descriptor: &ChannelDescriptor) -> u32 {
    if descriptor.luminance {
        MODE_LUMINANCE
    } else if descriptor.grayscale {
        MODE_GRAY
    } else {
        MODE_COLOR
    }
}

impl DisplayBackend for WgpuBackend {
    fn name(&self) -> &str {
        &self.adapter_name
    }

    fn is_gpu(&self) -> bool {
        true
    }

    fn render(
        &mut self,
        frame: &DisplayFrame,
        settings: &DisplaySettings,
        view: &ViewGeometry,
    ) -> Result<RgbaImage> {
        let (ww, wh) = (view.window_width, view.window_height);
        let descriptor = settings.channel.describe(frame.pixels.nchannels());
        self.bind(frame, &descriptor)?;
        if ww == 0 || wh == 0 {
            return Ok(RgbaImage::new(ww, wh));
        }

        let (pipeline, image) = match &self.resources {
            Resources::Bound { pipeline, image } => (pipeline, image),
            _ => return Err(IvError::Gpu("display resources not bound".into())),
        };

        let transform = settings.transform();
        let outside = OUTSIDE_COLOR.map(|c| c as f32 / 255.0);
        let params = DisplayParams {
            center: [view.center_x, view.center_y],
            window: [ww as f32, wh as f32],
            image: [image.width as f32, image.height as f32],
            zoom: view.zoom,
            gain: transform.gain(),
            inv_gamma: transform.inv_gamma(),
            mode: shader_mode(&descriptor),
            out_width: ww,
            out_height: wh,
            outside,
        };

        let output = self.create_storage_uninit(ww as u64 * wh as u64 * 4);
        let uniform = self.create_uniform(&params);
        self.dispatch(
            pipeline,
            &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: image.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: output.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform.as_entire_binding(),
                },
            ],
            (div_ceil(ww, WORKGROUP_SIZE), div_ceil(wh, WORKGROUP_SIZE), 1),
        );

        let packed = self.download_u32(&output)?;
        let bytes: Vec<u8> = packed.iter().flat_map(|p| p.to_le_bytes()).collect();
        RgbaImage::from_raw(ww, wh, bytes)
            .ok_or_else(|| IvError::Gpu("display output has the wrong size".into()))
    }

    fn release(&mut self) {
        if self.resource_state() != ResourceState::Uninitialized {
            tracing::debug!("releasing display resources");
        }
        self.resources = Resources::Uninitialized;
    }
}
