use flecs_ecs::prelude::*;
use strata_core::{App, Input, KeyCode, Plugin, config::StrataConfig};

pub mod animate;
pub mod generate;
pub mod light;

pub use animate::{AnimatorUniform, LightAnimator};
pub use generate::{generate_lights, hue_to_rgb};
pub use light::{GpuLight, Light, LightSetHeader, LightStore};

pub struct LightsPlugin;

impl Plugin for LightsPlugin {
    fn build(&self, app: &mut App) {
        let config = app.config();
        app.register_singleton(generate_lights(&config.lights));

        register_light_count_system(app);
    }
}

/// `=` adds `count_step` lights, `-` removes them.
fn register_light_count_system(app: &App) {
    app.world
        .system_named::<(&mut LightStore, &Input, &StrataConfig)>("adjust light count")
        .kind(flecs::pipeline::OnUpdate)
        .each(|(store, input, config)| {
            let step = config.lights.count_step;
            let current = store.active_count();

            let requested = if input.just_pressed(KeyCode::Equal) {
                current.saturating_add(step)
            } else if input.just_pressed(KeyCode::Minus) {
                current.saturating_sub(step)
            } else {
                return;
            };

            let applied = store.set_active_count(requested);
            log::info!("Active lights: {applied}");
        });
}
