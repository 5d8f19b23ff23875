use std::path::PathBuf;

use flecs_ecs::prelude::*;
use glam::Vec3;
use strata_core::{
    App, Input, KeyCode, MouseButton, Viewport,
    camera::Camera,
    config::StrataConfig,
    time::Time,
    transform::Transform,
};
use strata_lights::LightsPlugin;
use strata_renderer::{RenderPlugin, ShadingMode};
use strata_window::{WindowPlugin, run_strata_app};

/// Held to move faster.
const BOOST: f32 = 3.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match StrataConfig::load_or_default(path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            log::error!("Invalid config: {err}");
            std::process::exit(1);
        }
    };

    let mut app = App::new(config);

    app.add_plugin(WindowPlugin);
    app.add_plugin(LightsPlugin);
    app.add_plugin(RenderPlugin);

    spawn_camera(&app);
    register_camera_systems(&app);
    register_shading_toggle(&app);

    log::info!("Controls: WASD/QE move, Shift boost, hold left mouse to look, Tab switch shading, =/- light count");

    if let Err(err) = run_strata_app(app) {
        log::error!("Event loop error: {err}");
        std::process::exit(1);
    }
}

fn spawn_camera(app: &App) {
    let config = app.config();
    let settings = &config.camera;
    let aspect = app.world.get::<&Viewport>(|viewport| viewport.aspect_ratio());
    let [x, y, z] = settings.position;

    app.world
        .entity_named("main camera")
        .set(Camera::from_settings(settings, aspect))
        .set(
            Transform::from_xyz(x, y, z).with_yaw_pitch(
                settings.yaw_degrees.to_radians(),
                settings.pitch_degrees.to_radians(),
            ),
        );
}

fn register_camera_systems(app: &App) {
    app.world
        .system_named::<(&mut Transform, &Input, &Time, &StrataConfig)>("fly camera movement")
        .with(Camera::id())
        .kind(flecs::pipeline::OnUpdate)
        .each(|(transform, input, time, config)| {
            let mut speed = config.camera.move_speed * time.delta_seconds();
            if input.is_pressed(KeyCode::ShiftLeft) || input.is_pressed(KeyCode::ShiftRight) {
                speed *= BOOST;
            }

            let forward = transform.forward();
            let right = transform.right();
            let up = Vec3::Y; // Global Up

            let mut direction = Vec3::ZERO;
            for (key, axis) in [
                (KeyCode::KeyW, forward),
                (KeyCode::KeyS, -forward),
                (KeyCode::KeyD, right),
                (KeyCode::KeyA, -right),
                (KeyCode::KeyE, up),
                (KeyCode::KeyQ, -up),
            ] {
                if input.is_pressed(key) {
                    direction += axis;
                }
            }

            transform.translation += direction.normalize_or_zero() * speed;
        });

    app.world
        .system_named::<(&mut Transform, &Input, &StrataConfig)>("fly camera look")
        .with(Camera::id())
        .kind(flecs::pipeline::OnUpdate)
        .each(|(transform, input, config)| {
            if !input.is_mouse_pressed(MouseButton::Left) {
                return;
            }

            let sensitivity = config.camera.sensitivity.to_radians();
            let (dx, dy) = input.mouse_delta;
            transform.rotate_y(-dx * sensitivity);
            transform.rotate_local_x(-dy * sensitivity);
        });
}

fn register_shading_toggle(app: &App) {
    app.world
        .system_named::<(&mut ShadingMode, &Input)>("toggle shading")
        .kind(flecs::pipeline::OnUpdate)
        .each(|(mode, input)| {
            if input.just_pressed(KeyCode::Tab) {
                mode.style = mode.style.toggled();
                log::info!("Shading: {:?}", mode.style);
            }
        });
}
