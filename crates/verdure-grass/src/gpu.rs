//! wgpu compute backend for parallel placement.
//!
//! Every dispatch allocates its own buffers, uploads, runs `place_grass`
//! once over the whole grid, blocks on the readback and frees the buffers
//! again. Nothing survives between calls except the pipeline.

use std::sync::mpsc;
use std::sync::Arc;

use verdure_core::{Result, VerdureError};
use wgpu::util::DeviceExt;

use crate::kernel::{GrassRecord, KernelInputs, PlacementKernel, WORKGROUP_SIZE};

const SHADER_SOURCE: &str = include_str!("shaders/place_grass.wgsl");
const ENTRY_POINT: &str = "place_grass";

pub struct GpuKernel {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    adapter_name: String,
}

/// Device resources owned by a single dispatch. Dropping destroys them, so an
/// early return anywhere in [`GpuKernel::dispatch`] still releases them.
struct PlacementBuffers {
    params: wgpu::Buffer,
    records: wgpu::Buffer,
    normals: wgpu::Buffer,
    vertices: wgpu::Buffer,
    mask: wgpu::Texture,
    staging: wgpu::Buffer,
}

impl Drop for PlacementBuffers {
    fn drop(&mut self) {
        self.params.destroy();
        self.records.destroy();
        self.normals.destroy();
        self.vertices.destroy();
        self.mask.destroy();
        self.staging.destroy();
    }
}

impl GpuKernel {
    /// Create a headless device and build the placement pipeline on it.
    pub fn new() -> Result<Self> {
        pollster::block_on(Self::new_async())
    }

    pub async fn new_async() -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .ok_or_else(|| VerdureError::GpuDevice("no suitable adapter found".into()))?;

        let info = adapter.get_info();
        if !adapter
            .get_downlevel_capabilities()
            .flags
            .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
        {
            return Err(VerdureError::GpuDevice(format!(
                "adapter {} does not support compute shaders",
                info.name
            )));
        }

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Verdure Placement Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(|e| VerdureError::GpuDevice(e.to_string()))?;

        device.on_uncaptured_error(Box::new(|error: wgpu::Error| {
            log::error!("Uncaptured wgpu error: {}", error);
        }));

        log::info!("Grass placement GPU: {} ({:?})", info.name, info.backend);
        Self::from_device(Arc::new(device), Arc::new(queue), info.name)
    }

    /// Build the pipeline on a device the caller already owns.
    pub fn from_device(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        adapter_name: impl Into<String>,
    ) -> Result<Self> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Grass Placement Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let storage = |read_only| wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        };
        let compute_entry = |binding, ty| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty,
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Grass Placement Bind Group Layout"),
            entries: &[
                compute_entry(
                    0,
                    wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                ),
                compute_entry(1, storage(false)),
                compute_entry(2, storage(true)),
                compute_entry(3, storage(true)),
                compute_entry(
                    4,
                    wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                ),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Grass Placement Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Grass Placement Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some(ENTRY_POINT),
            compilation_options: Default::default(),
            cache: None,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(VerdureError::Shader(error.to_string()));
        }

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            adapter_name: adapter_name.into(),
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    fn check_limits(&self, inputs: &KernelInputs<'_>, records: &[GrassRecord]) -> Result<()> {
        let limits = self.device.limits();
        let mask = inputs.mask.extent();
        let largest_side = mask.width.max(mask.height);
        if largest_side > limits.max_texture_dimension_2d {
            return Err(VerdureError::Resource(format!(
                "density mask {} exceeds max texture dimension {}",
                mask, limits.max_texture_dimension_2d
            )));
        }
        if !inputs.params.mask_lookup_fits() {
            return Err(VerdureError::Resource(format!(
                "placement size {} with density mask {} overflows the shader's pixel lookup",
                inputs.params.size, mask
            )));
        }

        let binding_limit = limits.max_storage_buffer_binding_size as u64;
        let records_size = std::mem::size_of_val(records) as u64;
        let vertices_size = std::mem::size_of_val(inputs.vertices) as u64;
        if records_size > binding_limit || vertices_size > binding_limit {
            return Err(VerdureError::Resource(format!(
                "placement buffers ({} and {} bytes) exceed storage binding limit {}",
                records_size, vertices_size, binding_limit
            )));
        }
        Ok(())
    }

    fn create_buffers(&self, inputs: &KernelInputs<'_>, records: &[GrassRecord]) -> PlacementBuffers {
        let device = &self.device;
        let params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grass Placement Params"),
            contents: bytemuck::bytes_of(&inputs.params),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let records_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grass Instance Records"),
            contents: bytemuck::cast_slice(records),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        });
        let normals = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Normals"),
            contents: bytemuck::cast_slice(inputs.normals),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Vertices"),
            contents: bytemuck::cast_slice(inputs.vertices),
            usage: wgpu::BufferUsages::STORAGE,
        });

        // Flat mask values are x-major, so texture rows are grid X and
        // texture columns are grid Z.
        let extent = inputs.mask.extent();
        let texture_size = wgpu::Extent3d {
            width: extent.height,
            height: extent.width,
            depth_or_array_layers: 1,
        };
        let mask = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Grass Density Mask"),
            size: texture_size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &mask,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(inputs.mask.values()),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * extent.height),
                rows_per_image: Some(extent.width),
            },
            texture_size,
        );

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Grass Records Staging"),
            size: std::mem::size_of_val(records) as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        PlacementBuffers {
            params,
            records: records_buffer,
            normals,
            vertices,
            mask,
            staging,
        }
    }

    /// Split `groups` workgroups over X and Y so neither exceeds the device
    /// limit. The shader flattens the two back into a cell index.
    fn workgroup_grid(&self, groups: u32) -> (u32, u32) {
        let max = self.device.limits().max_compute_workgroups_per_dimension.max(1);
        let x = groups.clamp(1, max);
        (x, groups.div_ceil(x).max(1))
    }
}

impl PlacementKernel for GpuKernel {
    fn name(&self) -> &str {
        "gpu"
    }

    fn dispatch(&self, inputs: &KernelInputs<'_>, records: &mut [GrassRecord]) -> Result<()> {
        inputs.check(records)?;
        self.check_limits(inputs, records)?;
        if records.is_empty() {
            return Ok(());
        }

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let buffers = self.create_buffers(inputs, records);
        let mask_view = buffers
            .mask
            .create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Grass Placement Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffers.params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: buffers.records.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffers.normals.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: buffers.vertices.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(&mask_view),
                },
            ],
        });

        let groups = (records.len() as u32).div_ceil(WORKGROUP_SIZE);
        let (groups_x, groups_y) = self.workgroup_grid(groups);
        let byte_size = std::mem::size_of_val(records) as u64;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Grass Placement Encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Grass Placement Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(groups_x, groups_y, 1);
        }
        encoder.copy_buffer_to_buffer(&buffers.records, 0, &buffers.staging, 0, byte_size);
        self.queue.submit(Some(encoder.finish()));

        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        if let Some(error) = validation.or(out_of_memory) {
            return Err(VerdureError::Resource(error.to_string()));
        }

        log::debug!(
            "Dispatched {}x{} placement workgroups on {}",
            groups_x,
            groups_y,
            self.adapter_name
        );

        let slice = buffers.staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);

        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(VerdureError::Resource(e.to_string())),
            Err(_) => {
                return Err(VerdureError::Resource(
                    "placement readback channel closed".into(),
                ))
            }
        }

        {
            let data = slice.get_mapped_range();
            records.copy_from_slice(bytemuck::cast_slice(&data));
        }
        buffers.staging.unmap();

        Ok(())
    }
}
