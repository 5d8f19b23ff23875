use glam::Vec3;
use rand::{Rng, SeedableRng, rngs::StdRng};
use strata_core::config::LightSettings;

use crate::{
    animate::LightAnimator,
    light::{Light, LightStore},
};

/// Saturated hue in `[0, 1]`, pulled 80% of the way from white.
pub fn hue_to_rgb(h: f32) -> Vec3 {
    let f = |n: f32| {
        let k = (n + h * 6.0) % 6.0;
        1.0 - k.min(4.0 - k).min(1.0).max(0.0)
    };
    Vec3::ONE.lerp(Vec3::new(f(5.0), f(3.0), f(1.0)), 0.8)
}

/// Builds the full-capacity store with seeded random colors.
/// Positions start where the animator puts them at time zero.
pub fn generate_lights(settings: &LightSettings) -> LightStore {
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let animator = LightAnimator::from_settings(settings);

    let lights = (0..settings.max_lights)
        .map(|index| Light {
            position: animator.position(index, 0.0),
            color: hue_to_rgb(rng.random::<f32>()) * settings.intensity,
            radius: settings.radius,
        })
        .collect();

    log::info!(
        "Generated {} lights ({} active)",
        settings.max_lights,
        settings.initial_count.min(settings.max_lights)
    );

    LightStore::new(lights, settings.initial_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hue_endpoints_are_reddish() {
        let red = hue_to_rgb(0.0);
        assert!((red - Vec3::new(1.0, 0.2, 0.2)).length() < 1e-5);
        let green = hue_to_rgb(1.0 / 3.0);
        assert!((green - Vec3::new(0.2, 1.0, 0.2)).length() < 1e-4);
    }

    #[test]
    fn generation_is_seeded() {
        let settings = LightSettings {
            max_lights: 16,
            initial_count: 8,
            ..Default::default()
        };
        let a = generate_lights(&settings);
        let b = generate_lights(&settings);
        assert_eq!(a.all(), b.all());
        assert_eq!(a.active_count(), 8);
        assert_eq!(a.capacity(), 16);
    }

    #[test]
    fn colors_are_scaled_by_intensity() {
        let settings = LightSettings {
            max_lights: 32,
            intensity: 0.5,
            ..Default::default()
        };
        let store = generate_lights(&settings);
        for light in store.all() {
            assert!(light.color.max_element() <= 0.5 + 1e-6);
            assert!(light.color.min_element() >= 0.1 - 1e-6);
            assert_eq!(light.radius, settings.radius);
        }
    }
}
