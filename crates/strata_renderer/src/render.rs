use flecs_ecs::prelude::*;
use strata_cluster::{ClusterGrid, ClusterGridConfig};
use strata_core::{
    App, Viewport,
    camera::Camera,
    config::{ShadingStyle, StrataConfig},
    pipeline::{PhasePresent, PhaseRender3D},
    time::Time,
    transform::Transform,
};
use strata_lights::{LightAnimator, LightStore};
use strata_window::MainWindow;
use wgpu::{Device, Queue, Surface, SurfaceConfiguration};

use crate::{
    cluster_resources::ClusterResources,
    error::{RenderError, RenderResult},
    global_resources::GlobalResources,
    mesh::{GpuGeometry, SceneGeometry},
    programs::{
        ClusterBinProgram, ClusterBoundsProgram, ComputeProgram, DeferredResolveProgram,
        ForwardPlusProgram, GBufferProgram, GpuProgram, GpuProgramRenderContext,
        MoveLightsProgram,
    },
    readback::ClusterValidator,
    texture::{GBuffer, TextureHelper},
};

/// Matches `BACKGROUND` in `cluster_lighting.wgsl`.
pub const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

#[derive(Component)]
pub struct RenderContext {
    pub device: Device,
    pub queue: Queue,
    pub surface: Surface<'static>,
    pub config: SurfaceConfiguration,
    pub depth_texture: wgpu::TextureView,
    pub gbuffer: GBuffer,
    gbuffer_bind_group: wgpu::BindGroup,

    pub global_resources: GlobalResources,
    pub cluster_resources: ClusterResources,
    pub geometry: GpuGeometry,
    pub animator: LightAnimator,

    move_lights_program: MoveLightsProgram,
    cluster_bounds_program: ClusterBoundsProgram,
    cluster_bin_program: ClusterBinProgram,
    forward_plus_program: ForwardPlusProgram,
    gbuffer_program: GBufferProgram,
    deferred_resolve_program: DeferredResolveProgram,

    validator: ClusterValidator,
}

#[derive(Component, Default)]
pub struct RenderTarget {
    pub view: Option<wgpu::TextureView>,
    pub texture: Option<wgpu::SurfaceTexture>,
}

/// Which shading path draws the next frame. Switching takes effect immediately;
/// both paths consume the same cluster lists.
#[derive(Component, Debug, Clone, Copy)]
pub struct ShadingMode {
    pub style: ShadingStyle,
}

impl RenderContext {
    fn new(window: &MainWindow, config: &StrataConfig, lights: &LightStore) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        // The surface keeps its own handle to the window, so it can be 'static.
        let surface = instance.create_surface(window.0.clone())?;

        // We use 'pollster' to block on these async calls inside a sync system
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;
        let info = adapter.get_info();
        log::info!("GPU: {} ({:?}, {:?})", info.name, info.device_type, info.backend);

        let (device, queue) =
            pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default()))?;

        let size = window.0.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| RenderError::surface("surface reports no supported formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if config.renderer.vsync {
                wgpu::PresentMode::Fifo
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &surface_config);

        let grid_config = ClusterGridConfig::from_settings(&config.cluster)?;
        grid_config.check_binding_limit(u64::from(device.limits().max_storage_buffer_binding_size))?;
        let global_resources = GlobalResources::new(&device, lights);
        let cluster_resources = ClusterResources::new(&device, grid_config);

        let scene = SceneGeometry::demo_hall();
        log::info!("Scene: {} triangles", scene.triangle_count());
        let geometry = GpuGeometry::upload(&device, &scene);

        let ctx = GpuProgramRenderContext {
            device: &device,
            queue: &queue,
            format,
        };

        let move_lights_program = MoveLightsProgram::new(&ctx, &global_resources.light_buffer);
        let cluster_bounds_program =
            ClusterBoundsProgram::new(&ctx, (&global_resources.camera_buffer, &cluster_resources));
        let cluster_bin_program = ClusterBinProgram::new(
            &ctx,
            (
                &global_resources.camera_buffer,
                &global_resources.light_buffer,
                &cluster_resources,
            ),
        );
        let forward_plus_program = ForwardPlusProgram::new(
            &ctx,
            (&global_resources.layout, &cluster_resources.read_layout),
        );
        let gbuffer_program = GBufferProgram::new(&ctx, &global_resources.layout);
        let deferred_resolve_program = DeferredResolveProgram::new(
            &ctx,
            (&global_resources.layout, &cluster_resources.read_layout),
        );

        let depth_texture =
            TextureHelper::create_depth_texture(&device, &surface_config, "Depth Texture");
        let gbuffer = GBuffer::new(&device, &surface_config);
        let gbuffer_bind_group =
            deferred_resolve_program.bind_gbuffer(&device, &gbuffer, &depth_texture);

        let validator = ClusterValidator::new(&device, &global_resources, &cluster_resources);

        log::info!(
            "Renderer ready: {}x{} {:?}, {} light slots",
            surface_config.width,
            surface_config.height,
            format,
            global_resources.light_capacity(),
        );

        Ok(Self {
            device,
            queue,
            surface,
            config: surface_config,
            depth_texture,
            gbuffer,
            gbuffer_bind_group,
            global_resources,
            cluster_resources,
            geometry,
            animator: LightAnimator::from_settings(&config.lights),
            move_lights_program,
            cluster_bounds_program,
            cluster_bin_program,
            forward_plus_program,
            gbuffer_program,
            deferred_resolve_program,
            validator,
        })
    }

    /// Reconfigures the surface and rebuilds every surface-sized target.
    /// A zero-sized (minimized) window keeps the old targets.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture =
            TextureHelper::create_depth_texture(&self.device, &self.config, "Depth Texture");
        self.gbuffer = GBuffer::new(&self.device, &self.config);
        self.gbuffer_bind_group = self.deferred_resolve_program.bind_gbuffer(
            &self.device,
            &self.gbuffer,
            &self.depth_texture,
        );
        log::debug!("Surface resized to {width}x{height}");
    }

    fn draw_forward_plus(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Forward+ Pass"),
            color_attachments: &[color_attachment(view, BACKGROUND)],
            depth_stencil_attachment: Some(self.depth_attachment()),
            ..Default::default()
        });

        self.forward_plus_program.record(
            &mut render_pass,
            (
                &self.global_resources.bind_group,
                &self.cluster_resources.read_bind_group,
                &self.geometry,
            ),
        );
    }

    fn draw_deferred(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("GBuffer Pass"),
                color_attachments: &[
                    color_attachment(&self.gbuffer.normal, wgpu::Color::TRANSPARENT),
                    color_attachment(&self.gbuffer.albedo, wgpu::Color::TRANSPARENT),
                ],
                depth_stencil_attachment: Some(self.depth_attachment()),
                ..Default::default()
            });

            self.gbuffer_program.record(
                &mut render_pass,
                (&self.global_resources.bind_group, &self.geometry),
            );
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Deferred Resolve Pass"),
            color_attachments: &[color_attachment(view, BACKGROUND)],
            depth_stencil_attachment: None,
            ..Default::default()
        });

        self.deferred_resolve_program.record(
            &mut render_pass,
            (
                &self.global_resources.bind_group,
                &self.cluster_resources.read_bind_group,
                &self.gbuffer_bind_group,
            ),
        );
    }

    fn depth_attachment(&self) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: &self.depth_texture,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0), // Clear to "Far" (1.0)
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }
    }
}

fn color_attachment(
    view: &wgpu::TextureView,
    clear: wgpu::Color,
) -> Option<wgpu::RenderPassColorAttachment<'_>> {
    Some(wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        depth_slice: None,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Clear(clear),
            store: wgpu::StoreOp::Store,
        },
    })
}

pub fn register_renderings(app: &mut App) {
    let shading = app.config().renderer.shading;
    app.register_singleton(ShadingMode { style: shading });
    app.register_singleton_default::<RenderTarget>();
    app.world
        .component::<RenderContext>()
        .add_trait::<flecs::Singleton>();

    app.world
        .system_named::<(&MainWindow, &StrataConfig, &LightStore)>("init renderer")
        .kind(flecs::pipeline::OnStart)
        .each_entity(|entity, (window, config, lights)| {
            let world = entity.world();
            log::info!("Initializing GPU");

            match RenderContext::new(window, config, lights) {
                Ok(context) => {
                    world.set(context);
                }
                Err(err) => {
                    log::error!("Renderer initialization failed: {err}");
                    world.quit();
                }
            }
        });

    app.world
        .system_named::<(&mut RenderContext, &mut Viewport)>("resize surface")
        .kind(flecs::pipeline::PreStore)
        .each(|(context, viewport)| {
            if viewport.resized {
                context.resize(viewport.width, viewport.height);
                viewport.resized = false;
            }
        });

    app.world
        .system_named::<(&RenderContext, &mut RenderTarget)>("start frame")
        .kind(flecs::pipeline::PreStore)
        .each(|(context, target)| match context.surface.get_current_texture() {
            Ok(frame) => {
                let view = frame
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());

                // Store it so the render phase can see it
                target.texture = Some(frame);
                target.view = Some(view);
            }
            Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("Surface {err}, reconfiguring");
                context.surface.configure(&context.device, &context.config);
            }
            Err(err) => log::error!("Failed to acquire frame: {}", RenderError::from(err)),
        });

    app.world
        .system_named::<(
            &Camera,
            &Transform,
            &mut RenderContext,
            &RenderTarget,
            &mut LightStore,
            &ShadingMode,
            &Time,
            &StrataConfig,
        )>("render frame")
        .kind(PhaseRender3D)
        .each(|(camera, transform, context, target, lights, mode, time, config)| {
            let Some(view) = target.view.as_ref() else {
                return;
            };

            let (width, height) = (context.config.width, context.config.height);
            let camera = Camera {
                aspect_ratio: width as f32 / height as f32,
                ..camera.clone()
            };
            let snapshot = camera.snapshot(transform.view_matrix(), width, height);
            let grid = match ClusterGrid::new(context.cluster_resources.config, snapshot) {
                Ok(grid) => grid,
                Err(err) => {
                    log::error!("Skipping frame: {err}");
                    return;
                }
            };

            let queue = &context.queue;
            context.global_resources.update_camera(queue, &snapshot);
            if lights.take_count_changed() {
                context
                    .global_resources
                    .update_light_count(queue, lights.header());
            }
            context
                .move_lights_program
                .update(queue, context.animator.uniform(time.elapsed_seconds()));

            let mut encoder = context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Frame Encoder"),
                });

            let active = lights.active_count();
            context.move_lights_program.dispatch(&mut encoder, active);
            context
                .cluster_bounds_program
                .dispatch(&mut encoder, grid.config().cluster_count());
            context.cluster_resources.clear_counts(&mut encoder);
            context.cluster_bin_program.dispatch(&mut encoder, active);

            let interval = config.renderer.validate_interval as u64;
            let validate = interval > 0 && time.frame() % interval == 0;
            if validate {
                context.validator.schedule(
                    &mut encoder,
                    &context.global_resources,
                    &context.cluster_resources,
                );
            }

            match mode.style {
                ShadingStyle::ForwardPlus => context.draw_forward_plus(&mut encoder, view),
                ShadingStyle::ClusteredDeferred => context.draw_deferred(&mut encoder, view),
            }

            context.queue.submit(std::iter::once(encoder.finish()));

            if validate {
                if let Err(err) = context.validator.verify(&context.device, &grid, lights) {
                    log::warn!("Cluster validation failed: {err}");
                }
            }
        });

    app.world
        .system_named::<&mut RenderTarget>("end frame")
        .kind(PhasePresent)
        .each(|target| {
            if let Some(frame) = target.texture.take() {
                frame.present();
            }
            target.view = None;
        });
}
