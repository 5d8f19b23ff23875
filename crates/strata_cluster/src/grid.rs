use bytemuck::{Pod, Zeroable};
use glam::{UVec3, Vec2};
use strata_core::config::ClusterSettings;

use crate::{ClusterError, ClusterResult};

/// Grid dimensions and per-cluster list capacity. Immutable once built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterGridConfig {
    dims: UVec3,
    max_lights_per_cluster: u32,
}

impl ClusterGridConfig {
    pub fn new(dims: [u32; 3], max_lights_per_cluster: u32) -> ClusterResult<Self> {
        for (axis, dim) in ['x', 'y', 'z'].into_iter().zip(dims) {
            if dim == 0 {
                return Err(ClusterError::ZeroDimension { axis });
            }
        }
        if max_lights_per_cluster == 0 {
            return Err(ClusterError::ZeroCapacity);
        }
        // device kernels address slots as `cluster * capacity + slot` in u32
        let [x, y, z] = dims;
        let index_capacity = x
            .checked_mul(y)
            .and_then(|n| n.checked_mul(z))
            .and_then(|n| n.checked_mul(max_lights_per_cluster));
        if index_capacity.is_none() {
            return Err(ClusterError::IndexSpaceOverflow {
                dims,
                max_lights_per_cluster,
            });
        }

        Ok(Self {
            dims: UVec3::from_array(dims),
            max_lights_per_cluster,
        })
    }

    pub fn from_settings(settings: &ClusterSettings) -> ClusterResult<Self> {
        Self::new(settings.dims, settings.max_lights_per_cluster)
    }

    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    pub fn max_lights_per_cluster(&self) -> u32 {
        self.max_lights_per_cluster
    }

    pub fn cluster_count(&self) -> u32 {
        self.dims.x * self.dims.y * self.dims.z
    }

    /// Length of the flat index array backing every cluster's list.
    pub fn index_capacity(&self) -> usize {
        self.cluster_count() as usize * self.max_lights_per_cluster as usize
    }

    /// Size in bytes of the device index buffer.
    pub fn index_buffer_size(&self) -> u64 {
        self.index_capacity() as u64 * std::mem::size_of::<u32>() as u64
    }

    /// Fails when the index buffer would not fit in one storage binding of size `limit`.
    pub fn check_binding_limit(&self, limit: u64) -> ClusterResult<()> {
        let size = self.index_buffer_size();
        if size > limit {
            return Err(ClusterError::ExceedsBindingLimit { size, limit });
        }
        Ok(())
    }

    pub fn linear_index(&self, coords: UVec3) -> u32 {
        coords.x + coords.y * self.dims.x + coords.z * self.dims.x * self.dims.y
    }

    pub fn coords_of(&self, index: u32) -> UVec3 {
        let per_slice = self.dims.x * self.dims.y;
        UVec3::new(
            index % self.dims.x,
            (index % per_slice) / self.dims.x,
            index / per_slice,
        )
    }

    /// Screen tile for normalized coordinates (`v` grows upward), clamped to the grid.
    pub fn tile_for_uv(&self, uv: Vec2) -> (u32, u32) {
        (
            clamp_cell(uv.x * self.dims.x as f32, self.dims.x),
            clamp_cell(uv.y * self.dims.y as f32, self.dims.y),
        )
    }

    pub fn uniform(&self) -> GridUniform {
        GridUniform {
            dims: self.dims.to_array(),
            max_lights_per_cluster: self.max_lights_per_cluster,
        }
    }
}

// Negative and NaN inputs land in cell 0; `as u32` saturates large ones.
fn clamp_cell(scaled: f32, cells: u32) -> u32 {
    if scaled > 0.0 {
        (scaled.floor() as u32).min(cells - 1)
    } else {
        0
    }
}

/// Matches `struct ClusterGrid` in `clustering.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct GridUniform {
    pub dims: [u32; 3],
    pub max_lights_per_cluster: u32,
}

/// Logarithmic partition of view depth `[near, far]` into `slices` slabs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthSlicing {
    near: f32,
    far: f32,
    slices: u32,
    log_ratio: f32,
}

impl DepthSlicing {
    pub fn new(near: f32, far: f32, slices: u32) -> ClusterResult<Self> {
        if !(near > 0.0 && far > near && far.is_finite()) {
            return Err(ClusterError::InvalidDepthRange { near, far });
        }
        if slices == 0 {
            return Err(ClusterError::ZeroDimension { axis: 'z' });
        }

        Ok(Self {
            near,
            far,
            slices,
            log_ratio: (far / near).ln(),
        })
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn slices(&self) -> u32 {
        self.slices
    }

    /// Depth of boundary `k`, for `k` in `0..=slices`.
    pub fn slice_depth(&self, k: u32) -> f32 {
        if k == 0 {
            return self.near;
        }
        if k >= self.slices {
            return self.far;
        }
        self.near * (self.far / self.near).powf(k as f32 / self.slices as f32)
    }

    /// Near and far depth of slice `k`.
    pub fn slice_range(&self, k: u32) -> (f32, f32) {
        (self.slice_depth(k), self.slice_depth(k + 1))
    }

    /// Geometric middle of slice `k`; always maps back to `k`.
    pub fn slice_center(&self, k: u32) -> f32 {
        self.near * (self.far / self.near).powf((k as f32 + 0.5) / self.slices as f32)
    }

    /// Slice holding positive view depth `depth`, clamped to `[0, slices - 1]`.
    pub fn slice_for_depth(&self, depth: f32) -> u32 {
        if !(depth > self.near) {
            return 0;
        }
        let scaled = self.slices as f32 * (depth / self.near).ln() / self.log_ratio;
        clamp_cell(scaled, self.slices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_index_round_trips() {
        let config = ClusterGridConfig::new([10, 20, 30], 128).unwrap();
        assert_eq!(config.cluster_count(), 6000);

        for index in [0, 1, 9, 10, 199, 200, 5999] {
            assert_eq!(config.linear_index(config.coords_of(index)), index);
        }
        assert_eq!(config.linear_index(UVec3::new(3, 2, 1)), 3 + 2 * 10 + 200);
    }

    #[test]
    fn invalid_grids_are_rejected() {
        assert_eq!(
            ClusterGridConfig::new([4, 4, 0], 8),
            Err(ClusterError::ZeroDimension { axis: 'z' })
        );
        assert_eq!(ClusterGridConfig::new([4, 4, 4], 0), Err(ClusterError::ZeroCapacity));
    }

    #[test]
    fn oversized_grids_are_rejected() {
        assert_eq!(
            ClusterGridConfig::new([65536, 65536, 2], 1),
            Err(ClusterError::IndexSpaceOverflow {
                dims: [65536, 65536, 2],
                max_lights_per_cluster: 1,
            })
        );
        // 6000 clusters fit, but 6e9 slots do not
        assert!(matches!(
            ClusterGridConfig::new([10, 20, 30], 1_000_000),
            Err(ClusterError::IndexSpaceOverflow { .. })
        ));
        let largest = ClusterGridConfig::new([65536, 65535, 1], 1).unwrap();
        assert_eq!(largest.index_capacity(), 65536 * 65535);
    }

    #[test]
    fn index_buffer_must_fit_one_binding() {
        let config = ClusterGridConfig::new([10, 20, 30], 128).unwrap();
        assert_eq!(config.index_buffer_size(), 6000 * 128 * 4);
        assert!(config.check_binding_limit(128 << 20).is_ok());
        assert_eq!(
            config.check_binding_limit(1 << 20),
            Err(ClusterError::ExceedsBindingLimit {
                size: 3_072_000,
                limit: 1 << 20,
            })
        );
    }

    #[test]
    fn tiles_clamp_to_grid() {
        let config = ClusterGridConfig::new([4, 2, 1], 1).unwrap();
        assert_eq!(config.tile_for_uv(Vec2::new(0.0, 0.0)), (0, 0));
        assert_eq!(config.tile_for_uv(Vec2::new(1.0, 1.0)), (3, 1));
        assert_eq!(config.tile_for_uv(Vec2::new(-0.3, 7.0)), (0, 1));
        assert_eq!(config.tile_for_uv(Vec2::new(0.26, 0.49)), (1, 0));
        assert_eq!(config.tile_for_uv(Vec2::new(f32::NAN, 0.5)), (0, 1));
    }

    #[test]
    fn slice_boundaries_are_logarithmic() {
        let slicing = DepthSlicing::new(1.0, 1000.0, 3).unwrap();
        assert_eq!(slicing.slice_depth(0), 1.0);
        assert!((slicing.slice_depth(1) - 10.0).abs() < 1e-3);
        assert!((slicing.slice_depth(2) - 100.0).abs() < 1e-2);
        assert_eq!(slicing.slice_depth(3), 1000.0);
    }

    #[test]
    fn depth_outside_range_is_clamped() {
        let slicing = DepthSlicing::new(0.1, 1000.0, 30).unwrap();
        assert_eq!(slicing.slice_for_depth(0.01), 0);
        assert_eq!(slicing.slice_for_depth(-5.0), 0);
        assert_eq!(slicing.slice_for_depth(5000.0), 29);
        assert_eq!(slicing.slice_for_depth(f32::INFINITY), 29);
    }

    #[test]
    fn slice_centers_map_back() {
        let slicing = DepthSlicing::new(0.1, 1000.0, 30).unwrap();
        for k in 0..30 {
            let (near, far) = slicing.slice_range(k);
            let center = slicing.slice_center(k);
            assert!(near < center && center < far);
            assert_eq!(slicing.slice_for_depth(center), k);
        }
    }

    #[test]
    fn bad_depth_range_is_rejected() {
        assert!(DepthSlicing::new(0.0, 10.0, 4).is_err());
        assert!(DepthSlicing::new(5.0, 5.0, 4).is_err());
        assert!(DepthSlicing::new(1.0, f32::INFINITY, 4).is_err());
    }

    #[test]
    fn grid_uniform_is_16_bytes() {
        assert_eq!(std::mem::size_of::<GridUniform>(), 16);
    }
}
