use strata_cluster::{ClusterGridConfig, GpuClusterBounds};
use wgpu::util::DeviceExt;

/// Device storage for the cluster grid: bounds, per-cluster counts and the flat index array.
pub struct ClusterResources {
    pub config: ClusterGridConfig,
    pub grid_buffer: wgpu::Buffer,
    pub bounds_buffer: wgpu::Buffer,
    pub counts_buffer: wgpu::Buffer,
    pub indices_buffer: wgpu::Buffer,

    /// Group 1 of the shading passes: grid, counts, indices (read-only).
    pub read_layout: wgpu::BindGroupLayout,
    pub read_bind_group: wgpu::BindGroup,
}

impl ClusterResources {
    pub fn new(device: &wgpu::Device, config: ClusterGridConfig) -> Self {
        let cluster_count = config.cluster_count() as u64;
        let readback = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC;

        let grid_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cluster Grid Buffer"),
            contents: bytemuck::bytes_of(&config.uniform()),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bounds_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Cluster Bounds Buffer"),
            size: cluster_count * std::mem::size_of::<GpuClusterBounds>() as u64,
            usage: readback,
            mapped_at_creation: false,
        });

        // COPY_DST so the reset stage can clear it with `clear_buffer`
        let counts_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Cluster Counts Buffer"),
            size: cluster_count * 4,
            usage: readback | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let indices_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Cluster Indices Buffer"),
            size: config.index_buffer_size(),
            usage: readback,
            mapped_at_creation: false,
        });

        let read_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Cluster Read Bind Group Layout"),
            entries: &[
                layout_entry(0, wgpu::BufferBindingType::Uniform),
                layout_entry(1, wgpu::BufferBindingType::Storage { read_only: true }),
                layout_entry(2, wgpu::BufferBindingType::Storage { read_only: true }),
            ],
        });

        let read_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Cluster Read Bind Group"),
            layout: &read_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: grid_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: counts_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: indices_buffer.as_entire_binding(),
                },
            ],
        });

        log::info!(
            "Cluster grid {}x{}x{} ({} clusters, {} lights each, {} KiB of indices)",
            config.dims().x,
            config.dims().y,
            config.dims().z,
            cluster_count,
            config.max_lights_per_cluster(),
            config.index_capacity() * 4 / 1024,
        );

        Self {
            config,
            grid_buffer,
            bounds_buffer,
            counts_buffer,
            indices_buffer,
            read_layout,
            read_bind_group,
        }
    }

    /// Reset stage: zero every count before binning.
    pub fn clear_counts(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.clear_buffer(&self.counts_buffer, 0, None);
    }
}

fn layout_entry(binding: u32, ty: wgpu::BufferBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}
