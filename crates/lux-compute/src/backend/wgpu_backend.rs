//! wgpu backend implementation.
//!
//! Statistics run as a 16x16 tiled compute reduction; rendering draws a
//! fullscreen triangle into an `Rgba8Unorm` target and reads it back with
//! 256-byte aligned rows. Every submission runs inside validation and
//! out-of-memory error scopes so failures surface as [`ComputeError`]
//! instead of panicking in the uncaptured-error handler.

use std::any::Any;

use wgpu::util::DeviceExt;

use tracing::{debug, info, warn};

use lux_adjust::AdjustParams;
use lux_core::{BYTES_PER_PIXEL, RasterImage, StatsAccumulator};

use super::device::{DeviceImage, PreviewDevice};
use crate::layout::{RenderUniform, TileStats, merge_tiles};
use crate::shaders::{self, STATS_TILE};
use crate::{ComputeError, ComputeResult};

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

// =============================================================================
// GpuImage Handle
// =============================================================================

/// Source image uploaded as a sampled texture.
#[derive(Debug)]
pub struct GpuImage {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl GpuImage {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes held on the device.
    pub fn size_bytes(&self) -> u64 {
        self.width as u64 * self.height as u64 * BYTES_PER_PIXEL as u64
    }
}

impl Drop for GpuImage {
    fn drop(&mut self) {
        self.texture.destroy();
    }
}

impl DeviceImage for GpuImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// Pipelines
// =============================================================================

struct RenderPipeline {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
}

struct StatsPipeline {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
}

// =============================================================================
// WgpuBackend
// =============================================================================

/// GPU tier backed by wgpu.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,
    render: RenderPipeline,
    stats: Option<StatsPipeline>,
    max_texture_dim: u32,
    max_storage_bytes: u64,
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("adapter", &self.adapter_name)
            .field("statistics", &self.stats.is_some())
            .field("max_texture_dim", &self.max_texture_dim)
            .finish()
    }
}

impl WgpuBackend {
    /// Check if a wgpu adapter is present.
    pub fn is_available() -> bool {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .is_some()
        })
    }

    /// Probe the GPU tier: device, pipelines and a 1x1 render round trip.
    ///
    /// With `statistics = false`, or on adapters without compute shaders,
    /// the statistics pipeline is skipped and the caller computes
    /// statistics on the CPU.
    pub fn new(statistics: bool) -> ComputeResult<Self> {
        pollster::block_on(Self::new_async(statistics))
    }

    /// Asynchronous form of [`WgpuBackend::new`].
    pub async fn new_async(statistics: bool) -> ComputeResult<Self> {
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
            .ok_or(ComputeError::NoAdapter)?;

        let adapter_info = adapter.get_info();
        let adapter_limits = adapter.limits();
        let compute_ok = adapter
            .get_downlevel_capabilities()
            .flags
            .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("lux_preview_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter_limits.clone(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| ComputeError::DeviceCreation(e.to_string()))?;

        device.on_uncaptured_error(Box::new(|err| {
            warn!(error = %err, "Uncaptured wgpu error");
        }));

        let render = Self::create_render_pipeline(&device).await?;
        let stats = if statistics && compute_ok {
            Some(Self::create_stats_pipeline(&device).await?)
        } else {
            debug!(requested = statistics, compute_ok, "GPU statistics pipeline skipped");
            None
        };

        let backend = Self {
            device,
            queue,
            adapter_name: adapter_info.name.clone(),
            render,
            stats,
            max_texture_dim: adapter_limits.max_texture_dimension_2d,
            max_storage_bytes: adapter_limits.max_storage_buffer_binding_size as u64,
        };
        backend.self_test()?;

        info!(
            adapter = %backend.adapter_name,
            backend = ?adapter_info.backend,
            statistics = backend.stats.is_some(),
            "GPU preview tier ready"
        );
        Ok(backend)
    }

    async fn create_render_pipeline(device: &wgpu::Device) -> ComputeResult<RenderPipeline> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("render_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::render_shader().into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("render_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("render_pipeline_layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("render_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TEXTURE_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });

        if let Some(err) = device.pop_error_scope().await {
            return Err(ComputeError::ShaderCompilation(err.to_string()));
        }
        Ok(RenderPipeline { pipeline, layout })
    }

    async fn create_stats_pipeline(device: &wgpu::Device) -> ComputeResult<StatsPipeline> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("stats_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::stats_shader().into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("stats_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("stats_pipeline_layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("stats_pipeline"),
            layout: Some(&pipeline_layout),
            module: &module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        if let Some(err) = device.pop_error_scope().await {
            return Err(ComputeError::ShaderCompilation(err.to_string()));
        }
        Ok(StatsPipeline { pipeline, layout })
    }

    /// Renders a known pixel with identity parameters and checks the
    /// readback, so a tier that cannot round-trip is rejected at probe time.
    fn self_test(&self) -> ComputeResult<()> {
        let probe = RasterImage::filled(1, 1, [200, 100, 50, 255]);
        let src = self.upload(&probe)?;
        let out = self.render(&src, &AdjustParams::identity())?;
        let px = out.pixel(0, 0);
        let ok = px
            .iter()
            .zip([200u8, 100, 50, 255])
            .all(|(a, b)| a.abs_diff(b) <= 1);
        if !ok {
            return Err(ComputeError::OperationFailed(format!("self-test readback mismatch: {px:?}")));
        }
        Ok(())
    }

    /// Adapter name reported by the driver.
    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Whether statistics can run on the GPU.
    pub fn supports_statistics(&self) -> bool {
        self.stats.is_some()
    }

    /// Largest supported texture edge.
    pub fn max_texture_dim(&self) -> u32 {
        self.max_texture_dim
    }

    /// Runs `f` inside validation and out-of-memory error scopes.
    fn scoped<T>(&self, op: &str, f: impl FnOnce() -> ComputeResult<T>) -> ComputeResult<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let result = f();
        let validation = pollster::block_on(self.device.pop_error_scope());
        let oom = pollster::block_on(self.device.pop_error_scope());
        if let Some(err) = validation.or(oom) {
            return Err(ComputeError::OperationFailed(format!("{op}: {err}")));
        }
        result
    }

    /// Maps a `MAP_READ` buffer and copies its contents out.
    fn read_buffer(&self, buffer: &wgpu::Buffer) -> ComputeResult<Vec<u8>> {
        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| ComputeError::OperationFailed("Map channel closed".into()))?
            .map_err(|e| ComputeError::OperationFailed(format!("Map failed: {e}")))?;

        let data = slice.get_mapped_range().to_vec();
        buffer.unmap();
        Ok(data)
    }

    // =========================================================================
    // Upload
    // =========================================================================

    /// Uploads an image as a sampled texture.
    pub fn upload(&self, image: &RasterImage) -> ComputeResult<GpuImage> {
        let (width, height) = image.dimensions();
        if image.is_empty() {
            return Err(lux_core::Error::invalid_dimensions(width, height, "empty image").into());
        }
        if width > self.max_texture_dim || height > self.max_texture_dim {
            return Err(ComputeError::ImageTooLarge { width, height, limit: self.max_texture_dim });
        }

        // bytes_per_row must be a multiple of the texel size
        let packed;
        let (data, bytes_per_row) = if image.stride() % BYTES_PER_PIXEL == 0 {
            (image.data(), image.stride())
        } else {
            packed = image.to_packed();
            (packed.as_slice(), width as usize * BYTES_PER_PIXEL)
        };

        self.scoped("upload", || {
            let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
            let texture = self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("preview_source"),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TEXTURE_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });

            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                data,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row as u32),
                    rows_per_image: Some(height),
                },
                size,
            );

            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            Ok(GpuImage { texture, view, width, height })
        })
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Tiled statistics reduction, merged on the host.
    pub fn compute_stats(&self, src: &GpuImage) -> ComputeResult<StatsAccumulator> {
        let stats = self
            .stats
            .as_ref()
            .ok_or_else(|| ComputeError::BackendNotAvailable("GPU statistics pipeline not built".into()))?;

        let tiles_x = src.width.div_ceil(STATS_TILE);
        let tiles_y = src.height.div_ceil(STATS_TILE);
        let tile_count = tiles_x as u64 * tiles_y as u64;
        let size = tile_count * TileStats::SIZE as u64;
        if size > self.max_storage_bytes {
            return Err(ComputeError::BufferCreation(format!(
                "{tile_count} tiles need {size} bytes, limit {}",
                self.max_storage_bytes
            )));
        }

        let bytes = self.scoped("statistics", || {
            let tiles = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("stats_tiles"),
                size,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            });
            let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("stats_staging"),
                size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            });

            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("stats_bind_group"),
                layout: &stats.layout,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&src.view) },
                    wgpu::BindGroupEntry { binding: 1, resource: tiles.as_entire_binding() },
                ],
            });

            let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("stats_encoder"),
            });
            {
                let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("stats_pass"),
                    timestamp_writes: None,
                });
                pass.set_pipeline(&stats.pipeline);
                pass.set_bind_group(0, &bind_group, &[]);
                pass.dispatch_workgroups(tiles_x, tiles_y, 1);
            }
            encoder.copy_buffer_to_buffer(&tiles, 0, &staging, 0, size);
            self.queue.submit(std::iter::once(encoder.finish()));

            self.read_buffer(&staging)
        })?;

        let tiles: Vec<TileStats> = bytes
            .chunks_exact(TileStats::SIZE)
            .map(bytemuck::pod_read_unaligned::<TileStats>)
            .collect();
        debug!(tiles = tiles.len(), width = src.width, height = src.height, "GPU statistics reduced");
        Ok(merge_tiles(&tiles))
    }

    // =========================================================================
    // Render
    // =========================================================================

    /// Renders the adjustment chain and reads back a packed image.
    pub fn render(&self, src: &GpuImage, params: &AdjustParams) -> ComputeResult<RasterImage> {
        let (width, height) = (src.width, src.height);
        let row_bytes = width * BYTES_PER_PIXEL as u32;
        let padded_row = row_bytes.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let readback_size = padded_row as u64 * height as u64;

        let padded = self.scoped("render", || {
            let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
            let target = self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("preview_target"),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TEXTURE_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            });
            let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());

            let uniform = RenderUniform::from(params);
            let uniform_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("render_params"),
                contents: bytemuck::bytes_of(&uniform),
                usage: wgpu::BufferUsages::UNIFORM,
            });

            let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("render_readback"),
                size: readback_size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            });

            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("render_bind_group"),
                layout: &self.render.layout,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&src.view) },
                    wgpu::BindGroupEntry { binding: 1, resource: uniform_buffer.as_entire_binding() },
                ],
            });

            let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });
            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("render_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &target_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                pass.set_pipeline(&self.render.pipeline);
                pass.set_bind_group(0, &bind_group, &[]);
                pass.draw(0..3, 0..1);
            }

            encoder.copy_texture_to_buffer(
                wgpu::TexelCopyTextureInfo {
                    texture: &target,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                wgpu::TexelCopyBufferInfo {
                    buffer: &readback,
                    layout: wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(padded_row),
                        rows_per_image: Some(height),
                    },
                },
                size,
            );
            self.queue.submit(std::iter::once(encoder.finish()));

            let bytes = self.read_buffer(&readback);
            target.destroy();
            bytes
        })?;

        let mut data = Vec::with_capacity(row_bytes as usize * height as usize);
        for row in padded.chunks_exact(padded_row as usize) {
            data.extend_from_slice(&row[..row_bytes as usize]);
        }
        Ok(RasterImage::from_rgba8(data, width, height)?)
    }
}

fn own_image(src: &dyn DeviceImage) -> ComputeResult<&GpuImage> {
    src.as_any()
        .downcast_ref::<GpuImage>()
        .ok_or_else(|| ComputeError::OperationFailed("image was not uploaded by wgpu".into()))
}

impl PreviewDevice for WgpuBackend {
    fn name(&self) -> &str {
        &self.adapter_name
    }

    fn supports_statistics(&self) -> bool {
        self.stats.is_some()
    }

    fn upload(&self, image: &RasterImage) -> ComputeResult<Box<dyn DeviceImage>> {
        let texture = WgpuBackend::upload(self, image)?;
        Ok(Box::new(texture))
    }

    fn compute_stats(&self, src: &dyn DeviceImage) -> ComputeResult<StatsAccumulator> {
        WgpuBackend::compute_stats(self, own_image(src)?)
    }

    fn render(&self, src: &dyn DeviceImage, params: &AdjustParams) -> ComputeResult<RasterImage> {
        WgpuBackend::render(self, own_image(src)?, params)
    }
}
