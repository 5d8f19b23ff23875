use flecs_ecs::macros::Component;
use glam::{Mat4, Vec3, Vec4Swizzles};

use crate::config::CameraSettings;

#[derive(Component, Clone, Debug)]
pub struct Camera {
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov: 45.0f32.to_radians(),
            aspect_ratio: 16.0 / 9.0, // Standard monitor
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn from_settings(settings: &CameraSettings, aspect_ratio: f32) -> Self {
        Self {
            fov: settings.fov_y_degrees.to_radians(),
            aspect_ratio,
            near: settings.near,
            far: settings.far,
        }
    }

    /// Computes the "Projection Matrix" (View -> Clip)
    pub fn compute_projection_matrix(&self) -> Mat4 {
        // Perspective projection (things get smaller as they move away)
        Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
    }

    /// Freezes this camera into the per-frame snapshot consumed by clustering and shading.
    pub fn snapshot(&self, view: Mat4, width: u32, height: u32) -> CameraSnapshot {
        CameraSnapshot::new(
            view,
            self.compute_projection_matrix(),
            self.near,
            self.far,
            width,
            height,
        )
    }
}

/// Read-only camera state for one frame.
///
/// View space is right-handed and looks down -Z, so a point in front of the camera
/// has a negative `z`; "view depth" in this workspace always means `-z`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraSnapshot {
    pub view: Mat4,
    pub proj: Mat4,
    pub inv_proj: Mat4,
    pub inv_view: Mat4,
    pub near: f32,
    pub far: f32,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl CameraSnapshot {
    pub fn new(view: Mat4, proj: Mat4, near: f32, far: f32, width: u32, height: u32) -> Self {
        Self {
            view,
            proj,
            inv_proj: proj.inverse(),
            inv_view: view.inverse(),
            near,
            far,
            viewport_width: width.max(1),
            viewport_height: height.max(1),
        }
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj * self.view
    }

    pub fn eye(&self) -> Vec3 {
        self.inv_view.w_axis.xyz()
    }

    pub fn world_to_view(&self, world: Vec3) -> Vec3 {
        self.view.transform_point3(world)
    }

    /// Projects a view-space point to normalized device coordinates.
    pub fn view_to_ndc(&self, view: Vec3) -> Vec3 {
        self.proj.project_point3(view)
    }
}
