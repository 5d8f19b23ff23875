//! What a shading pass does with the cluster lists, on the host.
//!
//! `forward_plus.wgsl` and `deferred_resolve.wgsl` implement the same lookup and
//! accumulation; these functions let tests check the rules without a GPU.

use glam::{Mat4, Vec2, Vec3};
use strata_lights::Light;

use crate::{builder::ClusterLightLists, geometry::ClusterGrid};

/// Smooth window reaching zero at `radius`, times inverse-square falloff.
pub fn range_attenuation(distance: f32, radius: f32) -> f32 {
    let ratio = distance / radius;
    let window = (1.0 - ratio.powi(4)).clamp(0.0, 1.0);
    window / (distance * distance).max(1e-4)
}

pub fn point_light_contribution(light: &Light, position: Vec3, normal: Vec3) -> Vec3 {
    let to_light = light.position - position;
    let distance = to_light.length();
    let lambert = normal.dot(to_light.normalize_or_zero()).max(0.0);
    light.color * lambert * range_attenuation(distance, light.radius)
}

/// View-space position of a G-buffer sample from its screen position and stored NDC depth.
pub fn reconstruct_view_position(uv: Vec2, ndc_depth: f32, inv_proj: &Mat4) -> Vec3 {
    let ndc = (uv * 2.0 - 1.0).extend(ndc_depth);
    inv_proj.project_point3(ndc)
}

/// Fragment-side view of one frame's clustering result.
pub struct ShadingContract<'a> {
    grid: &'a ClusterGrid,
    lists: &'a ClusterLightLists,
    lights: &'a [Light],
}

impl<'a> ShadingContract<'a> {
    pub fn new(grid: &'a ClusterGrid, lists: &'a ClusterLightLists, lights: &'a [Light]) -> Self {
        Self { grid, lists, lights }
    }

    /// Linear cluster index for a fragment at `pixel` with positive view depth `depth`.
    pub fn cluster_for_fragment(&self, pixel: Vec2, depth: f32) -> u32 {
        let coords = self.grid.cluster_for_pixel(pixel, depth);
        self.grid.config().linear_index(coords)
    }

    /// Sums the cluster's lights at a world-space surface point.
    pub fn shade_fragment(&self, cluster: u32, position: Vec3, normal: Vec3, albedo: Vec3) -> Vec3 {
        let total = self
            .lists
            .list(cluster)
            .filter_map(|index| self.lights.get(index as usize))
            .map(|light| point_light_contribution(light, position, normal))
            .sum::<Vec3>();
        albedo * total
    }

    /// Forward path: the geometry pass knows the world position directly.
    pub fn shade_forward(&self, pixel: Vec2, position: Vec3, normal: Vec3, albedo: Vec3) -> (u32, Vec3) {
        let depth = -self.grid.camera().world_to_view(position).z;
        let cluster = self.cluster_for_fragment(pixel, depth);
        (cluster, self.shade_fragment(cluster, position, normal, albedo))
    }

    /// Deferred path: position comes back from the depth buffer.
    pub fn shade_deferred(&self, pixel: Vec2, ndc_depth: f32, normal: Vec3, albedo: Vec3) -> (u32, Vec3) {
        let camera = self.grid.camera();
        let uv = self.grid.pixel_to_uv(pixel);
        let view = reconstruct_view_position(uv, ndc_depth, &camera.inv_proj);
        let position = camera.inv_view.transform_point3(view);

        let cluster = self.cluster_for_fragment(pixel, -view.z);
        (cluster, self.shade_fragment(cluster, position, normal, albedo))
    }
}
