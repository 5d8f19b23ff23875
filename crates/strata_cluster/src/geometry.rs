//! View-space geometry of the cluster grid.
//!
//! Binning and shading both go through [`ClusterGrid`]: the forward mapping sends a
//! fragment to a cluster, [`ClusterGrid::cluster_aabb`] sends a cluster back to the
//! region of view space it covers. `clustering.wgsl` and `cluster_bounds.wgsl`
//! mirror these functions on the device.

use bytemuck::{Pod, Zeroable};
use glam::{UVec3, Vec2, Vec3, Vec3Swizzles};
use rayon::prelude::*;
use strata_core::camera::CameraSnapshot;

use crate::{
    ClusterResult,
    grid::{ClusterGridConfig, DepthSlicing},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |aabb, p| Aabb {
            min: aabb.min.min(p),
            max: aabb.max.max(p),
        })
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Squared distance from `point` to the closest point of the box (0 inside).
    pub fn distance_squared(&self, point: Vec3) -> f32 {
        // max-then-min rather than clamp: EMPTY has min > max
        let closest = point.max(self.min).min(self.max);
        closest.distance_squared(point)
    }

    /// Touching counts as intersecting.
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.distance_squared(center) <= radius * radius
    }

    pub fn to_gpu(&self) -> GpuClusterBounds {
        GpuClusterBounds {
            min: self.min.to_array(),
            _padding0: 0.0,
            max: self.max.to_array(),
            _padding1: 0.0,
        }
    }
}

/// One record of the cluster bounds storage buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuClusterBounds {
    pub min: [f32; 3],
    pub _padding0: f32,
    pub max: [f32; 3],
    pub _padding1: f32,
}

impl From<GpuClusterBounds> for Aabb {
    fn from(bounds: GpuClusterBounds) -> Self {
        Aabb {
            min: Vec3::from_array(bounds.min),
            max: Vec3::from_array(bounds.max),
        }
    }
}

/// Grid config plus the camera snapshot of one frame.
#[derive(Clone, Copy, Debug)]
pub struct ClusterGrid {
    config: ClusterGridConfig,
    slicing: DepthSlicing,
    camera: CameraSnapshot,
}

impl ClusterGrid {
    pub fn new(config: ClusterGridConfig, camera: CameraSnapshot) -> ClusterResult<Self> {
        let slicing = DepthSlicing::new(camera.near, camera.far, config.dims().z)?;
        Ok(Self {
            config,
            slicing,
            camera,
        })
    }

    pub fn config(&self) -> &ClusterGridConfig {
        &self.config
    }

    pub fn slicing(&self) -> &DepthSlicing {
        &self.slicing
    }

    pub fn camera(&self) -> &CameraSnapshot {
        &self.camera
    }

    /// Forward mapping: normalized screen position plus positive view depth to cluster coordinates.
    pub fn cluster_for_uv_depth(&self, uv: Vec2, depth: f32) -> UVec3 {
        let (cx, cy) = self.config.tile_for_uv(uv);
        UVec3::new(cx, cy, self.slicing.slice_for_depth(depth))
    }

    /// Same mapping from a pixel position (origin top-left) as a fragment shader sees it.
    pub fn cluster_for_pixel(&self, pixel: Vec2, depth: f32) -> UVec3 {
        self.cluster_for_uv_depth(self.pixel_to_uv(pixel), depth)
    }

    pub fn cluster_for_view_point(&self, view: Vec3) -> UVec3 {
        let ndc = self.camera.view_to_ndc(view);
        self.cluster_for_uv_depth(ndc.xy() * 0.5 + 0.5, -view.z)
    }

    pub fn pixel_to_uv(&self, pixel: Vec2) -> Vec2 {
        Vec2::new(
            pixel.x / self.camera.viewport_width as f32,
            1.0 - pixel.y / self.camera.viewport_height as f32,
        )
    }

    /// Tile center and geometric middle depth of a cluster.
    pub fn cluster_center_uv_depth(&self, coords: UVec3) -> (Vec2, f32) {
        let dims = self.config.dims().as_vec3();
        let uv = Vec2::new(
            (coords.x as f32 + 0.5) / dims.x,
            (coords.y as f32 + 0.5) / dims.y,
        );
        (uv, self.slicing.slice_center(coords.z))
    }

    /// View-space box enclosing the tile's four corner rays cut at both slice depths.
    pub fn cluster_aabb(&self, coords: UVec3) -> Aabb {
        let dims = self.config.dims().as_vec3();
        let (near, far) = self.slicing.slice_range(coords.z);

        let u = [coords.x as f32 / dims.x, (coords.x + 1) as f32 / dims.x];
        let v = [coords.y as f32 / dims.y, (coords.y + 1) as f32 / dims.y];

        let mut points = [Vec3::ZERO; 8];
        let mut i = 0;
        for u in u {
            for v in v {
                let ray = self.corner_ray(Vec2::new(u, v));
                points[i] = ray * near;
                points[i + 1] = ray * far;
                i += 2;
            }
        }
        Aabb::from_points(points)
    }

    // View-space direction through a screen point, scaled so its depth is 1.
    fn corner_ray(&self, uv: Vec2) -> Vec3 {
        let ndc = (uv * 2.0 - 1.0).extend(0.0);
        let on_near = self.camera.inv_proj.project_point3(ndc);
        on_near / -on_near.z
    }

    /// Every cluster's AABB plus the union boxes used to prune light-major binning.
    pub fn bounds(&self) -> ClusterBounds {
        let count = self.config.cluster_count();
        let aabbs: Vec<Aabb> = (0..count)
            .into_par_iter()
            .map(|index| self.cluster_aabb(self.config.coords_of(index)))
            .collect();
        ClusterBounds::from_aabbs(self.config.dims(), aabbs)
    }
}

/// Per-frame table of cluster AABBs.
///
/// The slice, column and row boxes are unions of cluster AABBs, so a sphere that
/// misses one of them misses every cluster inside it.
#[derive(Clone, Debug)]
pub struct ClusterBounds {
    dims: UVec3,
    aabbs: Vec<Aabb>,
    slices: Vec<Aabb>,
    columns: Vec<Aabb>,
    rows: Vec<Aabb>,
}

impl ClusterBounds {
    pub fn from_aabbs(dims: UVec3, aabbs: Vec<Aabb>) -> Self {
        let mut slices = vec![Aabb::EMPTY; dims.z as usize];
        let mut columns = vec![Aabb::EMPTY; (dims.z * dims.x) as usize];
        let mut rows = vec![Aabb::EMPTY; (dims.z * dims.y) as usize];

        for (index, aabb) in aabbs.iter().enumerate() {
            let index = index as u32;
            let cx = index % dims.x;
            let cy = (index / dims.x) % dims.y;
            let cz = index / (dims.x * dims.y);

            let slice = &mut slices[cz as usize];
            *slice = slice.union(aabb);
            let column = &mut columns[(cz * dims.x + cx) as usize];
            *column = column.union(aabb);
            let row = &mut rows[(cz * dims.y + cy) as usize];
            *row = row.union(aabb);
        }

        Self {
            dims,
            aabbs,
            slices,
            columns,
            rows,
        }
    }

    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    pub fn aabb(&self, index: u32) -> &Aabb {
        &self.aabbs[index as usize]
    }

    pub fn aabbs(&self) -> &[Aabb] {
        &self.aabbs
    }

    pub fn slice(&self, cz: u32) -> &Aabb {
        &self.slices[cz as usize]
    }

    pub fn column(&self, cz: u32, cx: u32) -> &Aabb {
        &self.columns[(cz * self.dims.x + cx) as usize]
    }

    pub fn row(&self, cz: u32, cy: u32) -> &Aabb {
        &self.rows[(cz * self.dims.y + cy) as usize]
    }

    pub fn to_gpu(&self) -> Vec<GpuClusterBounds> {
        self.aabbs.iter().map(Aabb::to_gpu).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;
    use strata_core::camera::Camera;

    fn grid(dims: [u32; 3]) -> ClusterGrid {
        let camera = Camera {
            fov: 60f32.to_radians(),
            aspect_ratio: 1.5,
            near: 0.5,
            far: 200.0,
        };
        let config = ClusterGridConfig::new(dims, 16).unwrap();
        ClusterGrid::new(config, camera.snapshot(Mat4::IDENTITY, 300, 200)).unwrap()
    }

    #[test]
    fn sphere_test_counts_touching() {
        let aabb = Aabb {
            min: Vec3::ZERO,
            max: Vec3::ONE,
        };
        assert!(aabb.intersects_sphere(Vec3::new(0.5, 0.5, 0.5), 0.1));
        assert!(aabb.intersects_sphere(Vec3::new(2.0, 0.5, 0.5), 1.0));
        assert!(!aabb.intersects_sphere(Vec3::new(2.0, 2.0, 0.5), 1.0));
        assert!(!Aabb::EMPTY.intersects_sphere(Vec3::ZERO, 100.0));
    }

    #[test]
    fn cluster_aabb_spans_slice_depths() {
        let grid = grid([3, 2, 5]);
        let aabb = grid.cluster_aabb(UVec3::new(1, 0, 2));
        let (near, far) = grid.slicing().slice_range(2);

        assert!((aabb.max.z + near).abs() < 1e-3 * near);
        assert!((aabb.min.z + far).abs() < 1e-3 * far);
        // middle column straddles the view axis, bottom row sits below it
        assert!(aabb.min.x < 0.0 && aabb.max.x > 0.0);
        assert!(aabb.max.y <= 1e-4);
    }

    #[test]
    fn view_points_at_cluster_centers_map_back() {
        let grid = grid([3, 2, 5]);
        let config = grid.config();

        for index in 0..config.cluster_count() {
            let coords = config.coords_of(index);
            let (uv, depth) = grid.cluster_center_uv_depth(coords);
            let view = grid.corner_ray(uv) * depth;
            assert_eq!(grid.cluster_for_view_point(view), coords);
        }
    }

    #[test]
    fn union_boxes_enclose_their_clusters() {
        let grid = grid([3, 2, 4]);
        let bounds = grid.bounds();
        let config = grid.config();

        for index in 0..config.cluster_count() {
            let c = config.coords_of(index);
            let aabb = bounds.aabb(index);
            for union in [bounds.slice(c.z), bounds.column(c.z, c.x), bounds.row(c.z, c.y)] {
                assert!(union.contains(aabb.min) && union.contains(aabb.max));
            }
        }
    }

    #[test]
    fn gpu_bounds_record_is_32_bytes() {
        assert_eq!(std::mem::size_of::<GpuClusterBounds>(), 32);
    }
}
