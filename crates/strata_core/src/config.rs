//! Frame-start constants of the renderer.
//!
//! Everything here is chosen once at start-up and threaded through construction;
//! nothing reads these values from global state.

use std::path::Path;

use flecs_ecs::macros::Component;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Environment variable consulted when no config path is given on the command line.
pub const CONFIG_ENV_VAR: &str = "STRATA_CONFIG";

#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrataConfig {
    pub cluster: ClusterSettings,
    pub lights: LightSettings,
    pub camera: CameraSettings,
    pub renderer: RendererSettings,
    pub window: WindowSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSettings {
    /// Tiles across, tiles down, depth slices.
    pub dims: [u32; 3],
    pub max_lights_per_cluster: u32,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            dims: [10, 20, 30],
            max_lights_per_cluster: 128,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSettings {
    pub max_lights: u32,
    pub initial_count: u32,
    /// Amount added or removed by one press of the light count keys.
    pub count_step: u32,
    pub intensity: f32,
    pub radius: f32,
    pub seed: u64,
    pub bounds_min: [f32; 3],
    pub bounds_max: [f32; 3],
    /// Multiplier on the animation clock.
    pub speed: f32,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            max_lights: 5000,
            initial_count: 500,
            count_step: 100,
            intensity: 0.1,
            radius: 2.0,
            seed: 0x5eed,
            bounds_min: [-14.0, 0.0, -6.0],
            bounds_max: [14.0, 20.0, 6.0],
            speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub yaw_degrees: f32,
    pub pitch_degrees: f32,
    /// World units per second.
    pub move_speed: f32,
    /// Degrees per pixel of mouse motion.
    pub sensitivity: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
            position: [-7.0, 2.0, 0.0],
            yaw_degrees: 0.0,
            pitch_degrees: 0.0,
            move_speed: 4.0,
            sensitivity: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadingStyle {
    /// Lights are accumulated inside the geometry pass.
    ForwardPlus,
    /// Geometry writes a G-buffer, a full-screen pass resolves lighting.
    #[default]
    ClusteredDeferred,
}

impl ShadingStyle {
    pub fn toggled(self) -> Self {
        match self {
            ShadingStyle::ForwardPlus => ShadingStyle::ClusteredDeferred,
            ShadingStyle::ClusteredDeferred => ShadingStyle::ForwardPlus,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    pub shading: ShadingStyle,
    /// Every N frames the GPU cluster lists are read back and checked against the
    /// host reference build. 0 disables validation.
    pub validate_interval: u32,
    pub vsync: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            shading: ShadingStyle::default(),
            validate_interval: 0,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Strata".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

impl StrataConfig {
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: StrataConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Loads from `path` when given, else from `$STRATA_CONFIG`, else falls back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = path {
            log::info!("Loading config from {}", path.display());
            return Self::load(path);
        }

        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => {
                log::info!("Loading config from ${CONFIG_ENV_VAR}");
                Self::load(Path::new(&path))
            }
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Rejects precondition violations up front so they never surface mid-frame.
    pub fn validate(&self) -> ConfigResult<()> {
        for (axis, dim) in ['x', 'y', 'z'].into_iter().zip(self.cluster.dims) {
            if dim == 0 {
                return Err(ConfigError::ZeroGridDimension { axis });
            }
        }
        if self.cluster.max_lights_per_cluster == 0 {
            return Err(ConfigError::ZeroClusterCapacity);
        }
        let [x, y, z] = self.cluster.dims;
        let slots = x
            .checked_mul(y)
            .and_then(|n| n.checked_mul(z))
            .and_then(|n| n.checked_mul(self.cluster.max_lights_per_cluster));
        if slots.is_none() {
            return Err(ConfigError::ClusterGridTooLarge {
                dims: self.cluster.dims,
                max_lights_per_cluster: self.cluster.max_lights_per_cluster,
            });
        }

        let lights = &self.lights;
        if lights.max_lights == 0 {
            return Err(ConfigError::ZeroLightCapacity);
        }
        if !(lights.radius > 0.0 && lights.radius.is_finite()) {
            return Err(ConfigError::InvalidLightRadius(lights.radius));
        }
        if !(lights.intensity > 0.0 && lights.intensity.is_finite()) {
            return Err(ConfigError::InvalidLightIntensity(lights.intensity));
        }
        if (0..3).any(|i| lights.bounds_min[i] > lights.bounds_max[i]) {
            return Err(ConfigError::InvalidLightBounds {
                min: lights.bounds_min,
                max: lights.bounds_max,
            });
        }

        let camera = &self.camera;
        if !(camera.near > 0.0 && camera.far > camera.near && camera.far.is_finite()) {
            return Err(ConfigError::InvalidDepthRange {
                near: camera.near,
                far: camera.far,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(StrataConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = StrataConfig::from_json_str(
            r#"{ "cluster": { "dims": [4, 4, 4] }, "renderer": { "shading": "forward_plus" } }"#,
        )
        .unwrap();

        assert_eq!(config.cluster.dims, [4, 4, 4]);
        assert_eq!(config.cluster.max_lights_per_cluster, 128);
        assert_eq!(config.renderer.shading, ShadingStyle::ForwardPlus);
        assert_eq!(config.lights, LightSettings::default());
    }

    #[test]
    fn zero_dimension_is_rejected_with_axis() {
        let mut config = StrataConfig::default();
        config.cluster.dims = [10, 0, 30];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroGridDimension { axis: 'y' })
        ));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut config = StrataConfig::default();
        config.cluster.max_lights_per_cluster = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroClusterCapacity)));

        let mut config = StrataConfig::default();
        config.lights.max_lights = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroLightCapacity)));
    }

    #[test]
    fn grids_beyond_u32_slots_are_rejected() {
        let mut config = StrataConfig::default();
        config.cluster.dims = [65536, 65536, 2];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ClusterGridTooLarge { .. })
        ));

        let mut config = StrataConfig::default();
        config.cluster.max_lights_per_cluster = 1_000_000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ClusterGridTooLarge {
                max_lights_per_cluster: 1_000_000,
                ..
            })
        ));
    }

    #[test]
    fn light_parameters_are_checked() {
        let mut config = StrataConfig::default();
        config.lights.radius = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLightRadius(_))));

        let mut config = StrataConfig::default();
        config.lights.intensity = f32::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLightIntensity(_))));

        let mut config = StrataConfig::default();
        config.lights.bounds_min = [0.0, 30.0, 0.0];
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLightBounds { .. })));
    }

    #[test]
    fn depth_range_must_be_ordered() {
        let mut config = StrataConfig::default();
        config.camera.near = 10.0;
        config.camera.far = 5.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDepthRange { .. })));

        config.camera.near = 0.0;
        config.camera.far = 5.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDepthRange { .. })));
    }

    #[test]
    fn invalid_json_reports_parse_error() {
        assert!(matches!(
            StrataConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn shading_style_toggles() {
        assert_eq!(ShadingStyle::ForwardPlus.toggled(), ShadingStyle::ClusteredDeferred);
        assert_eq!(ShadingStyle::ClusteredDeferred.toggled(), ShadingStyle::ForwardPlus);
    }
}
