use crate::{
    mesh::GpuGeometry,
    programs::{GpuProgram, GpuProgramRenderContext, scene_pipeline},
    shaders::StrataShader,
};

/// Shades the scene in its geometry pass, looping over each fragment's cluster list.
pub struct ForwardPlusProgram {
    pipeline: wgpu::RenderPipeline,
}

impl GpuProgram for ForwardPlusProgram {
    /// Global layout (camera, lights) and cluster read layout.
    type InitData<'i> = (&'i wgpu::BindGroupLayout, &'i wgpu::BindGroupLayout);
    type DrawData<'a> = (
        &'a wgpu::BindGroup, // Global - Group 0
        &'a wgpu::BindGroup, // Clusters - Group 1
        &'a GpuGeometry,
    );

    fn new(ctx: &GpuProgramRenderContext, (global_layout, cluster_layout): Self::InitData<'_>) -> Self {
        let shader = StrataShader::ForwardPlus.create_module(ctx.device);

        let pipeline = scene_pipeline(
            ctx,
            "Forward+ Pipeline",
            &[global_layout, cluster_layout],
            &shader,
            &[Some(wgpu::ColorTargetState {
                format: ctx.format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        );

        Self { pipeline }
    }

    fn record<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'_>, data: Self::DrawData<'a>) {
        let (global_bind_group, cluster_bind_group, geometry) = data;

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, global_bind_group, &[]);
        render_pass.set_bind_group(1, cluster_bind_group, &[]);
        geometry.draw(render_pass);
    }
}
