//! Shader assembly. `clustering.wgsl` holds the structs and the cluster mapping
//! shared by every stage and is prepended to each source, so all stages agree on
//! one definition.

use std::borrow::Cow;

const CLUSTERING: &str = include_str!("shaders/clustering.wgsl");
const CLUSTER_LIGHTING: &str = include_str!("shaders/cluster_lighting.wgsl");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrataShader {
    MoveLights,
    ClusterBounds,
    ClusterBin,
    ForwardPlus,
    DeferredGBuffer,
    DeferredResolve,
}

impl StrataShader {
    pub fn label(self) -> &'static str {
        match self {
            StrataShader::MoveLights => "move_lights.wgsl",
            StrataShader::ClusterBounds => "cluster_bounds.wgsl",
            StrataShader::ClusterBin => "cluster_bin.wgsl",
            StrataShader::ForwardPlus => "forward_plus.wgsl",
            StrataShader::DeferredGBuffer => "deferred_gbuffer.wgsl",
            StrataShader::DeferredResolve => "deferred_resolve.wgsl",
        }
    }

    /// Full source: shared module, the light loop for shading passes, then the stage itself.
    pub fn source(self) -> String {
        let (lighting, body) = match self {
            StrataShader::MoveLights => (false, include_str!("shaders/move_lights.wgsl")),
            StrataShader::ClusterBounds => (false, include_str!("shaders/cluster_bounds.wgsl")),
            StrataShader::ClusterBin => (false, include_str!("shaders/cluster_bin.wgsl")),
            StrataShader::ForwardPlus => (true, include_str!("shaders/forward_plus.wgsl")),
            StrataShader::DeferredGBuffer => (false, include_str!("shaders/deferred_gbuffer.wgsl")),
            StrataShader::DeferredResolve => (true, include_str!("shaders/deferred_resolve.wgsl")),
        };

        let mut source = String::with_capacity(CLUSTERING.len() + CLUSTER_LIGHTING.len() + body.len() + 2);
        source.push_str(CLUSTERING);
        source.push('\n');
        if lighting {
            source.push_str(CLUSTER_LIGHTING);
            source.push('\n');
        }
        source.push_str(body);
        source
    }

    pub fn create_module(self, device: &wgpu::Device) -> wgpu::ShaderModule {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(self.label()),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(self.source())),
        })
    }
}
