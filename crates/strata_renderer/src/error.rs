//! Error type for GPU setup and per-frame work.

use strata_cluster::ClusterError;
use strata_core::error::ConfigError;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("Adapter error: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("Device error: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Readback error: {0}")]
    Readback(String),

    #[error("Cluster grid error: {0}")]
    Cluster(#[from] ClusterError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl RenderError {
    pub fn surface<T: ToString>(msg: T) -> Self {
        RenderError::Surface(msg.to_string())
    }

    pub fn readback<T: ToString>(msg: T) -> Self {
        RenderError::Readback(msg.to_string())
    }
}

impl From<wgpu::CreateSurfaceError> for RenderError {
    fn from(err: wgpu::CreateSurfaceError) -> Self {
        RenderError::surface(err)
    }
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(err: wgpu::SurfaceError) -> Self {
        RenderError::surface(err)
    }
}

pub type RenderResult<T> = Result<T, RenderError>;
