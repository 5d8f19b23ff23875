use strata_lights::AnimatorUniform;

use crate::{
    programs::{ComputeProgram, GpuProgramRenderContext, buffer_entry, compute_pipeline, run_compute},
    shaders::StrataShader,
};

/// Device half of the light animator: rewrites light positions in place.
pub struct MoveLightsProgram {
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    animator_buffer: wgpu::Buffer,
}

impl MoveLightsProgram {
    pub fn update(&self, queue: &wgpu::Queue, uniform: AnimatorUniform) {
        queue.write_buffer(&self.animator_buffer, 0, bytemuck::bytes_of(&uniform));
    }
}

impl ComputeProgram for MoveLightsProgram {
    /// The light set buffer.
    type InitData<'i> = &'i wgpu::Buffer;

    fn new(ctx: &GpuProgramRenderContext, light_buffer: Self::InitData<'_>) -> Self {
        let shader = StrataShader::MoveLights.create_module(ctx.device);

        let layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Move Lights Bind Group Layout"),
                entries: &[
                    buffer_entry(0, wgpu::ShaderStages::COMPUTE, wgpu::BufferBindingType::Uniform),
                    buffer_entry(
                        1,
                        wgpu::ShaderStages::COMPUTE,
                        wgpu::BufferBindingType::Storage { read_only: false },
                    ),
                ],
            });

        let animator_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Animator Buffer"),
            size: std::mem::size_of::<AnimatorUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Move Lights Bind Group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: animator_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        Self {
            pipeline: compute_pipeline(ctx.device, "Move Lights Pipeline", &layout, &shader),
            bind_group,
            animator_buffer,
        }
    }

    fn dispatch(&self, encoder: &mut wgpu::CommandEncoder, active_lights: u32) {
        run_compute(encoder, "Move Lights", &self.pipeline, &self.bind_group, active_lights);
    }
}
