//! Host reference for the device binning kernels.
//!
//! Runs the same reset and bin stages as `cluster_bin.wgsl` on the rayon pool, with
//! the same atomics-only write pattern. The renderer never feeds these lists to
//! shading; they exist to check the device output and to test the clustering rules.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use glam::Vec3;
use rayon::prelude::*;
use strata_lights::Light;

use crate::{
    geometry::{ClusterBounds, ClusterGrid},
    grid::ClusterGridConfig,
};

/// Capacity-bounded slot claim on a shared counter.
///
/// Unlike a plain `fetch_add`, the counter never moves past `capacity`.
pub trait BoundedAppend {
    fn claim_slot(&self, capacity: u32) -> Option<u32>;
}

impl BoundedAppend for AtomicU32 {
    fn claim_slot(&self, capacity: u32) -> Option<u32> {
        self.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |count| {
            (count < capacity).then_some(count + 1)
        })
        .ok()
    }
}

/// Which side of the light/cluster pairing drives the parallel loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BinningOrder {
    /// One task per light, scattering into clusters. This is what the GPU kernel does.
    #[default]
    LightMajor,
    /// One task per cluster, gathering overlapping lights.
    ClusterMajor,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClusterStats {
    pub cluster_count: u32,
    pub occupied_clusters: u32,
    pub assignments: u64,
    pub dropped_assignments: u64,
    pub max_count: u32,
}

/// Flat storage of every cluster's light list: `counts[N]` and `indices[N * capacity]`.
#[derive(Debug)]
pub struct ClusterLightLists {
    capacity: u32,
    counts: Vec<AtomicU32>,
    indices: Vec<AtomicU32>,
    dropped: AtomicU64,
}

impl ClusterLightLists {
    pub fn new(config: &ClusterGridConfig) -> Self {
        Self {
            capacity: config.max_lights_per_cluster(),
            counts: (0..config.cluster_count()).map(|_| AtomicU32::new(0)).collect(),
            indices: (0..config.index_capacity()).map(|_| AtomicU32::new(0)).collect(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Wraps counts and indices read back from the device.
    ///
    /// Device counts are raw `atomicAdd` results and may exceed the capacity; the
    /// excess is recorded as dropped.
    pub fn from_device(config: &ClusterGridConfig, counts: &[u32], indices: &[u32]) -> Self {
        let capacity = config.max_lights_per_cluster();
        let dropped = counts
            .iter()
            .map(|&count| count.saturating_sub(capacity) as u64)
            .sum();

        Self {
            capacity,
            counts: counts
                .iter()
                .map(|&count| AtomicU32::new(count.min(capacity)))
                .collect(),
            indices: indices.iter().map(|&index| AtomicU32::new(index)).collect(),
            dropped: AtomicU64::new(dropped),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn cluster_count(&self) -> u32 {
        self.counts.len() as u32
    }

    /// Reset stage.
    pub fn reset(&self) {
        self.counts
            .par_iter()
            .for_each(|count| count.store(0, Ordering::Relaxed));
        self.dropped.store(0, Ordering::Relaxed);
    }

    /// Appends `light` to `cluster`'s list. Returns false when the list is full.
    pub fn append(&self, cluster: u32, light: u32) -> bool {
        match self.counts[cluster as usize].claim_slot(self.capacity) {
            Some(slot) => {
                let offset = cluster as usize * self.capacity as usize + slot as usize;
                self.indices[offset].store(light, Ordering::Relaxed);
                true
            }
            None => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    pub fn count(&self, cluster: u32) -> u32 {
        self.counts[cluster as usize].load(Ordering::Relaxed)
    }

    /// Light indices of `cluster` in insertion order.
    pub fn list(&self, cluster: u32) -> impl Iterator<Item = u32> + '_ {
        let start = cluster as usize * self.capacity as usize;
        self.indices[start..start + self.count(cluster) as usize]
            .iter()
            .map(|index| index.load(Ordering::Relaxed))
    }

    /// Light indices of `cluster` in ascending order, for comparisons.
    pub fn sorted_indices(&self, cluster: u32) -> Vec<u32> {
        let mut indices: Vec<u32> = self.list(cluster).collect();
        indices.sort_unstable();
        indices
    }

    pub fn stats(&self) -> ClusterStats {
        let counts = self.counts.iter().map(|count| count.load(Ordering::Relaxed));
        let mut stats = ClusterStats {
            cluster_count: self.cluster_count(),
            dropped_assignments: self.dropped.load(Ordering::Relaxed),
            ..Default::default()
        };
        for count in counts {
            if count > 0 {
                stats.occupied_clusters += 1;
            }
            stats.assignments += count as u64;
            stats.max_count = stats.max_count.max(count);
        }
        stats
    }
}

pub struct ClusterBuilder {
    order: BinningOrder,
    lists: ClusterLightLists,
}

impl ClusterBuilder {
    pub fn new(config: &ClusterGridConfig, order: BinningOrder) -> Self {
        Self {
            order,
            lists: ClusterLightLists::new(config),
        }
    }

    pub fn lists(&self) -> &ClusterLightLists {
        &self.lists
    }

    /// Rebuilds every list from scratch for `lights` (the active slice of the store).
    pub fn build(&mut self, lights: &[Light], grid: &ClusterGrid) -> ClusterStats {
        let bounds = grid.bounds();
        self.build_with_bounds(lights, grid, &bounds)
    }

    pub fn build_with_bounds(
        &mut self,
        lights: &[Light],
        grid: &ClusterGrid,
        bounds: &ClusterBounds,
    ) -> ClusterStats {
        let config = grid.config();
        assert_eq!(bounds.dims(), config.dims(), "bounds built for another grid");
        assert!(
            self.lists.cluster_count() == config.cluster_count()
                && self.lists.capacity() == config.max_lights_per_cluster(),
            "builder lists sized for another grid"
        );

        let camera = grid.camera();
        let spheres: Vec<(Vec3, f32)> = lights
            .par_iter()
            .map(|light| (camera.world_to_view(light.position), light.radius))
            .collect();

        self.lists.reset();
        match self.order {
            BinningOrder::LightMajor => self.bin_light_major(&spheres, bounds),
            BinningOrder::ClusterMajor => self.bin_cluster_major(&spheres, bounds),
        }

        let stats = self.lists.stats();
        log::debug!(
            "Binned {} lights: {} assignments across {}/{} clusters (max {}, dropped {})",
            lights.len(),
            stats.assignments,
            stats.occupied_clusters,
            stats.cluster_count,
            stats.max_count,
            stats.dropped_assignments,
        );
        stats
    }

    fn bin_light_major(&self, spheres: &[(Vec3, f32)], bounds: &ClusterBounds) {
        let dims = bounds.dims();
        let lists = &self.lists;

        spheres
            .par_iter()
            .enumerate()
            .for_each(|(light, &(center, radius))| {
                for cz in 0..dims.z {
                    if !bounds.slice(cz).intersects_sphere(center, radius) {
                        continue;
                    }
                    for cy in 0..dims.y {
                        if !bounds.row(cz, cy).intersects_sphere(center, radius) {
                            continue;
                        }
                        for cx in 0..dims.x {
                            if !bounds.column(cz, cx).intersects_sphere(center, radius) {
                                continue;
                            }
                            let cluster = cx + cy * dims.x + cz * dims.x * dims.y;
                            if bounds.aabb(cluster).intersects_sphere(center, radius) {
                                lists.append(cluster, light as u32);
                            }
                        }
                    }
                }
            });
    }

    fn bin_cluster_major(&self, spheres: &[(Vec3, f32)], bounds: &ClusterBounds) {
        let lists = &self.lists;

        (0..lists.cluster_count())
            .into_par_iter()
            .for_each(|cluster| {
                let aabb = bounds.aabb(cluster);
                for (light, &(center, radius)) in spheres.iter().enumerate() {
                    if aabb.intersects_sphere(center, radius) && !lists.append(cluster, light as u32) {
                        // full; the remaining lights for this cluster would be dropped too
                        let remaining = spheres[light + 1..]
                            .iter()
                            .filter(|(c, r)| aabb.intersects_sphere(*c, *r))
                            .count();
                        lists.dropped.fetch_add(remaining as u64, Ordering::Relaxed);
                        break;
                    }
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_slot_saturates() {
        let counter = AtomicU32::new(0);
        assert_eq!(counter.claim_slot(2), Some(0));
        assert_eq!(counter.claim_slot(2), Some(1));
        assert_eq!(counter.claim_slot(2), None);
        assert_eq!(counter.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn concurrent_appends_never_exceed_capacity() {
        let config = ClusterGridConfig::new([1, 1, 1], 50).unwrap();
        let lists = ClusterLightLists::new(&config);

        let accepted = (0..1000u32)
            .into_par_iter()
            .filter(|&light| lists.append(0, light))
            .count();

        assert_eq!(accepted, 50);
        assert_eq!(lists.count(0), 50);
        let stats = lists.stats();
        assert_eq!(stats.dropped_assignments, 950);
        assert_eq!(stats.assignments, 50);

        let mut stored = lists.sorted_indices(0);
        stored.dedup();
        assert_eq!(stored.len(), 50);
    }

    #[test]
    fn reset_clears_counts() {
        let config = ClusterGridConfig::new([2, 1, 1], 4).unwrap();
        let lists = ClusterLightLists::new(&config);
        lists.append(1, 7);
        lists.append(1, 3);
        assert_eq!(lists.sorted_indices(1), vec![3, 7]);

        lists.reset();
        assert_eq!(lists.count(1), 0);
        assert_eq!(lists.stats(), ClusterStats {
            cluster_count: 2,
            ..Default::default()
        });
    }

    fn grid(dims: [u32; 3], capacity: u32) -> ClusterGrid {
        let config = ClusterGridConfig::new(dims, capacity).unwrap();
        let camera = strata_core::camera::Camera::default();
        ClusterGrid::new(config, camera.snapshot(glam::Mat4::IDENTITY, 64, 64)).unwrap()
    }

    #[test]
    #[should_panic(expected = "builder lists sized for another grid")]
    fn builder_rejects_a_grid_of_different_shape() {
        let small = grid([2, 2, 2], 8);
        let large = grid([4, 4, 4], 8);
        let mut builder = ClusterBuilder::new(small.config(), BinningOrder::LightMajor);
        builder.build(&[], &large);
    }

    #[test]
    #[should_panic(expected = "bounds built for another grid")]
    fn builder_rejects_foreign_bounds() {
        let small = grid([2, 2, 2], 8);
        let large = grid([4, 4, 4], 8);
        let mut builder = ClusterBuilder::new(small.config(), BinningOrder::ClusterMajor);
        builder.build_with_bounds(&[], &small, &large.bounds());
    }

    #[test]
    fn device_counts_are_capped() {
        let config = ClusterGridConfig::new([2, 1, 1], 2).unwrap();
        let lists = ClusterLightLists::from_device(&config, &[5, 1], &[4, 2, 9, 0]);

        assert_eq!(lists.count(0), 2);
        assert_eq!(lists.sorted_indices(0), vec![2, 4]);
        assert_eq!(lists.sorted_indices(1), vec![9]);
        assert_eq!(lists.stats().dropped_assignments, 3);
        assert_eq!(lists.stats().max_count, 2);
    }
}
