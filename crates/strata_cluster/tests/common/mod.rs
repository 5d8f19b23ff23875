#![allow(dead_code)]

use glam::{Mat4, Vec2, Vec3};
use strata_cluster::{ClusterGrid, ClusterGridConfig};
use strata_core::{
    camera::{Camera, CameraSnapshot},
    config::LightSettings,
};
use strata_lights::{LightAnimator, LightStore, generate_lights};

pub const WIDTH: u32 = 1280;
pub const HEIGHT: u32 = 720;

/// The start-up camera: at (-7, 2, 0) looking down +X.
pub fn hall_camera() -> CameraSnapshot {
    let eye = Vec3::new(-7.0, 2.0, 0.0);
    let view = Mat4::look_at_rh(eye, eye + Vec3::X, Vec3::Y);
    let camera = Camera {
        aspect_ratio: WIDTH as f32 / HEIGHT as f32,
        ..Default::default()
    };
    camera.snapshot(view, WIDTH, HEIGHT)
}

pub fn grid(dims: [u32; 3], capacity: u32, camera: CameraSnapshot) -> ClusterGrid {
    let config = ClusterGridConfig::new(dims, capacity).unwrap();
    ClusterGrid::new(config, camera).unwrap()
}

/// Seeded lights animated to `time`, so they are spread around the hall.
pub fn hall_lights(count: u32, time: f32) -> LightStore {
    let settings = LightSettings {
        max_lights: count,
        initial_count: count,
        ..Default::default()
    };
    let mut store = generate_lights(&settings);
    LightAnimator::from_settings(&settings).animate(&mut store, time);
    store
}

/// View-space point at normalized screen position `uv` and positive depth `depth`.
pub fn view_point(camera: &CameraSnapshot, uv: Vec2, depth: f32) -> Vec3 {
    let ndc = (uv * 2.0 - 1.0).extend(0.0);
    let on_near = camera.inv_proj.project_point3(ndc);
    on_near * (depth / -on_near.z)
}
