use crate::{
    mesh::GpuGeometry,
    programs::{GpuProgram, GpuProgramRenderContext, scene_pipeline},
    shaders::StrataShader,
    texture::{GBuffer, TextureHelper},
};

/// Geometry half of the deferred path: writes normal and albedo, plus depth.
pub struct GBufferProgram {
    pipeline: wgpu::RenderPipeline,
}

impl GpuProgram for GBufferProgram {
    type InitData<'i> = &'i wgpu::BindGroupLayout;
    type DrawData<'a> = (&'a wgpu::BindGroup, &'a GpuGeometry);

    fn new(ctx: &GpuProgramRenderContext, global_layout: Self::InitData<'_>) -> Self {
        let shader = StrataShader::DeferredGBuffer.create_module(ctx.device);

        let target = |format| {
            Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })
        };

        let pipeline = scene_pipeline(
            ctx,
            "GBuffer Pipeline",
            &[global_layout],
            &shader,
            &[
                target(TextureHelper::NORMAL_FORMAT),
                target(TextureHelper::ALBEDO_FORMAT),
            ],
        );

        Self { pipeline }
    }

    fn record<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'_>, data: Self::DrawData<'a>) {
        let (global_bind_group, geometry) = data;

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, global_bind_group, &[]);
        geometry.draw(render_pass);
    }
}

/// Full-screen lighting pass. Rebuilds each pixel's position from depth and runs
/// the same cluster lookup as the forward path.
pub struct DeferredResolveProgram {
    pipeline: wgpu::RenderPipeline,
    pub gbuffer_layout: wgpu::BindGroupLayout,
}

impl DeferredResolveProgram {
    /// Must be recreated whenever the G-buffer or depth texture is.
    pub fn bind_gbuffer(
        &self,
        device: &wgpu::Device,
        gbuffer: &GBuffer,
        depth: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("GBuffer Bind Group"),
            layout: &self.gbuffer_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&gbuffer.normal),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&gbuffer.albedo),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(depth),
                },
            ],
        })
    }
}

fn texture_entry(binding: u32, sample_type: wgpu::TextureSampleType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type,
        },
        count: None,
    }
}

impl GpuProgram for DeferredResolveProgram {
    /// Global layout (camera, lights) and cluster read layout.
    type InitData<'i> = (&'i wgpu::BindGroupLayout, &'i wgpu::BindGroupLayout);
    type DrawData<'a> = (
        &'a wgpu::BindGroup, // Global - Group 0
        &'a wgpu::BindGroup, // Clusters - Group 1
        &'a wgpu::BindGroup, // GBuffer - Group 2
    );

    fn new(ctx: &GpuProgramRenderContext, (global_layout, cluster_layout): Self::InitData<'_>) -> Self {
        let shader = StrataShader::DeferredResolve.create_module(ctx.device);

        // textureLoad only, so nothing needs to be filterable
        let gbuffer_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("GBuffer Bind Group Layout"),
                entries: &[
                    texture_entry(0, wgpu::TextureSampleType::Float { filterable: false }),
                    texture_entry(1, wgpu::TextureSampleType::Float { filterable: false }),
                    texture_entry(2, wgpu::TextureSampleType::Depth),
                ],
            });

        let layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Deferred Resolve Pipeline Layout"),
                bind_group_layouts: &[global_layout, cluster_layout, &gbuffer_layout],
                push_constant_ranges: &[],
            });

        let pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                cache: None,
                label: Some("Deferred Resolve Pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                depth_stencil: None,
                primitive: wgpu::PrimitiveState::default(),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });

        Self {
            pipeline,
            gbuffer_layout,
        }
    }

    fn record<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'_>, data: Self::DrawData<'a>) {
        let (global_bind_group, cluster_bind_group, gbuffer_bind_group) = data;

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, global_bind_group, &[]);
        render_pass.set_bind_group(1, cluster_bind_group, &[]);
        render_pass.set_bind_group(2, gbuffer_bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}
