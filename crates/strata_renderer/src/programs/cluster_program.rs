use crate::{
    cluster_resources::ClusterResources,
    programs::{ComputeProgram, GpuProgramRenderContext, buffer_entry, compute_pipeline, run_compute},
    shaders::StrataShader,
};

const COMPUTE: wgpu::ShaderStages = wgpu::ShaderStages::COMPUTE;
const UNIFORM: wgpu::BufferBindingType = wgpu::BufferBindingType::Uniform;
const READ: wgpu::BufferBindingType = wgpu::BufferBindingType::Storage { read_only: true };
const WRITE: wgpu::BufferBindingType = wgpu::BufferBindingType::Storage { read_only: false };

/// Writes one view-space AABB per cluster, one invocation each.
pub struct ClusterBoundsProgram {
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
}

impl ComputeProgram for ClusterBoundsProgram {
    /// Camera buffer and the cluster buffers.
    type InitData<'i> = (&'i wgpu::Buffer, &'i ClusterResources);

    fn new(ctx: &GpuProgramRenderContext, (camera_buffer, clusters): Self::InitData<'_>) -> Self {
        let shader = StrataShader::ClusterBounds.create_module(ctx.device);

        let layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Cluster Bounds Bind Group Layout"),
                entries: &[
                    buffer_entry(0, COMPUTE, UNIFORM),
                    buffer_entry(1, COMPUTE, UNIFORM),
                    buffer_entry(2, COMPUTE, WRITE),
                ],
            });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Cluster Bounds Bind Group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: clusters.grid_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: clusters.bounds_buffer.as_entire_binding(),
                },
            ],
        });

        Self {
            pipeline: compute_pipeline(ctx.device, "Cluster Bounds Pipeline", &layout, &shader),
            bind_group,
        }
    }

    fn dispatch(&self, encoder: &mut wgpu::CommandEncoder, clusters: u32) {
        run_compute(encoder, "Cluster Bounds", &self.pipeline, &self.bind_group, clusters);
    }
}

/// Light-major binning: one invocation per light appends it to every cluster it touches.
pub struct ClusterBinProgram {
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
}

impl ComputeProgram for ClusterBinProgram {
    /// Camera buffer, light set buffer and the cluster buffers.
    type InitData<'i> = (&'i wgpu::Buffer, &'i wgpu::Buffer, &'i ClusterResources);

    fn new(
        ctx: &GpuProgramRenderContext,
        (camera_buffer, light_buffer, clusters): Self::InitData<'_>,
    ) -> Self {
        let shader = StrataShader::ClusterBin.create_module(ctx.device);

        let layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Cluster Bin Bind Group Layout"),
                entries: &[
                    buffer_entry(0, COMPUTE, UNIFORM),
                    buffer_entry(1, COMPUTE, UNIFORM),
                    buffer_entry(2, COMPUTE, READ),
                    buffer_entry(3, COMPUTE, READ),
                    buffer_entry(4, COMPUTE, WRITE),
                    buffer_entry(5, COMPUTE, WRITE),
                ],
            });

        let resources = [
            camera_buffer,
            &clusters.grid_buffer,
            light_buffer,
            &clusters.bounds_buffer,
            &clusters.counts_buffer,
            &clusters.indices_buffer,
        ];
        let entries: Vec<wgpu::BindGroupEntry> = resources
            .iter()
            .enumerate()
            .map(|(binding, buffer)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: buffer.as_entire_binding(),
            })
            .collect();

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Cluster Bin Bind Group"),
            layout: &layout,
            entries: &entries,
        });

        Self {
            pipeline: compute_pipeline(ctx.device, "Cluster Bin Pipeline", &layout, &shader),
            bind_group,
        }
    }

    fn dispatch(&self, encoder: &mut wgpu::CommandEncoder, active_lights: u32) {
        run_compute(encoder, "Cluster Bin", &self.pipeline, &self.bind_group, active_lights);
    }
}
