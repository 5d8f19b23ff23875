use wgpu::{
    Device, Extent3d, SurfaceConfiguration, TextureDescriptor, TextureDimension, TextureFormat,
    TextureUsages,
};

pub struct TextureHelper;

impl TextureHelper {
    pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;
    pub const NORMAL_FORMAT: TextureFormat = TextureFormat::Rgba16Float;
    pub const ALBEDO_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

    /// Depth target, also bindable so the deferred resolve can read it.
    pub fn create_depth_texture(
        device: &Device,
        config: &SurfaceConfiguration,
        label: &str,
    ) -> wgpu::TextureView {
        Self::create_target(device, config, Self::DEPTH_FORMAT, label)
    }

    fn create_target(
        device: &Device,
        config: &SurfaceConfiguration,
        format: TextureFormat,
        label: &str,
    ) -> wgpu::TextureView {
        let size = Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format,
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }
}

/// Surface-sized attachments written by the deferred geometry pass.
pub struct GBuffer {
    pub normal: wgpu::TextureView,
    pub albedo: wgpu::TextureView,
}

impl GBuffer {
    pub fn new(device: &Device, config: &SurfaceConfiguration) -> Self {
        Self {
            normal: TextureHelper::create_target(
                device,
                config,
                TextureHelper::NORMAL_FORMAT,
                "GBuffer Normal",
            ),
            albedo: TextureHelper::create_target(
                device,
                config,
                TextureHelper::ALBEDO_FORMAT,
                "GBuffer Albedo",
            ),
        }
    }
}
