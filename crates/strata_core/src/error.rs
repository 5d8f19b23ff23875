/// Rejections raised while loading or validating [`crate::config::StrataConfig`].
///
/// All of these are start-up failures: a config that passes validation can never
/// produce one of them mid-frame.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cluster grid dimension {axis} must be at least 1")]
    ZeroGridDimension { axis: char },

    #[error("max lights per cluster must be at least 1")]
    ZeroClusterCapacity,

    #[error("cluster grid {dims:?} with {max_lights_per_cluster} lights per cluster overflows the u32 index space")]
    ClusterGridTooLarge {
        dims: [u32; 3],
        max_lights_per_cluster: u32,
    },

    #[error("max lights must be at least 1")]
    ZeroLightCapacity,

    #[error("light radius must be a positive number, got {0}")]
    InvalidLightRadius(f32),

    #[error("light intensity must be a positive number, got {0}")]
    InvalidLightIntensity(f32),

    #[error("light bounds are empty: min {min:?}, max {max:?}")]
    InvalidLightBounds { min: [f32; 3], max: [f32; 3] },

    #[error("invalid depth range: near {near}, far {far} (need 0 < near < far)")]
    InvalidDepthRange { near: f32, far: f32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
