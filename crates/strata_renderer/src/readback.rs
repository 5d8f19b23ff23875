//! Debug check of the device cluster build against the host reference.
//!
//! A validation frame copies the light set, cluster bounds, counts and indices
//! into mappable staging buffers. After submission the host rebuilds the lists
//! from the same bounds and positions the device used and compares them cluster
//! by cluster. Clusters the device filled to capacity are skipped: which lights
//! won the slots depends on scheduling.

use std::sync::mpsc;

use bytemuck::Pod;
use strata_cluster::{
    Aabb, BinningOrder, ClusterBounds, ClusterBuilder, ClusterGrid, ClusterLightLists,
    ClusterStats, GpuClusterBounds,
};
use strata_lights::{GpuLight, LightSetHeader, LightStore};

use crate::{
    cluster_resources::ClusterResources,
    error::{RenderError, RenderResult},
    global_resources::GlobalResources,
};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ValidationReport {
    pub clusters: u32,
    pub mismatches: u32,
    pub skipped_full: u32,
    /// Largest per-component difference between device and host cluster AABBs.
    pub max_bounds_error: f32,
    pub device_stats: ClusterStats,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.mismatches == 0
    }
}

/// Per-cluster comparison of two builds over the same grid.
///
/// Returns `(mismatches, skipped_full)`.
pub fn compare_lists(reference: &ClusterLightLists, device: &ClusterLightLists) -> (u32, u32) {
    let capacity = device.capacity();
    let mut mismatches = 0;
    let mut skipped = 0;

    for cluster in 0..reference.cluster_count().min(device.cluster_count()) {
        if device.count(cluster) >= capacity || reference.count(cluster) >= capacity {
            skipped += 1;
            continue;
        }
        if reference.sorted_indices(cluster) != device.sorted_indices(cluster) {
            mismatches += 1;
        }
    }
    (mismatches, skipped)
}

fn max_bounds_error(host: &ClusterBounds, device: &ClusterBounds) -> f32 {
    host.aabbs()
        .iter()
        .zip(device.aabbs())
        .map(|(a, b)| {
            (a.min - b.min)
                .abs()
                .max_element()
                .max((a.max - b.max).abs().max_element())
        })
        .fold(0.0, f32::max)
}

pub struct ClusterValidator {
    lights_staging: wgpu::Buffer,
    bounds_staging: wgpu::Buffer,
    counts_staging: wgpu::Buffer,
    indices_staging: wgpu::Buffer,
    pending: bool,
}

fn staging_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    })
}

impl ClusterValidator {
    pub fn new(device: &wgpu::Device, global: &GlobalResources, clusters: &ClusterResources) -> Self {
        Self {
            lights_staging: staging_buffer(device, "Validation Lights", global.light_records_size()),
            bounds_staging: staging_buffer(device, "Validation Bounds", clusters.bounds_buffer.size()),
            counts_staging: staging_buffer(device, "Validation Counts", clusters.counts_buffer.size()),
            indices_staging: staging_buffer(
                device,
                "Validation Indices",
                clusters.indices_buffer.size(),
            ),
            pending: false,
        }
    }

    /// Records the copies. Must go after the bin stage in the same encoder.
    pub fn schedule(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        global: &GlobalResources,
        clusters: &ClusterResources,
    ) {
        encoder.copy_buffer_to_buffer(
            &global.light_buffer,
            LightSetHeader::SIZE,
            &self.lights_staging,
            0,
            global.light_records_size(),
        );
        for (source, staging) in [
            (&clusters.bounds_buffer, &self.bounds_staging),
            (&clusters.counts_buffer, &self.counts_staging),
            (&clusters.indices_buffer, &self.indices_staging),
        ] {
            encoder.copy_buffer_to_buffer(source, 0, staging, 0, source.size());
        }
        self.pending = true;
    }

    /// Blocks until the scheduled copies land, then compares. Call after submit.
    ///
    /// Returns `None` when nothing was scheduled.
    pub fn verify(
        &mut self,
        device: &wgpu::Device,
        grid: &ClusterGrid,
        store: &LightStore,
    ) -> RenderResult<Option<ValidationReport>> {
        if !std::mem::take(&mut self.pending) {
            return Ok(None);
        }

        let gpu_lights: Vec<GpuLight> = read_buffer(device, &self.lights_staging)?;
        let gpu_bounds: Vec<GpuClusterBounds> = read_buffer(device, &self.bounds_staging)?;
        let counts: Vec<u32> = read_buffer(device, &self.counts_staging)?;
        let indices: Vec<u32> = read_buffer(device, &self.indices_staging)?;

        let config = grid.config();
        let device_bounds = ClusterBounds::from_aabbs(
            config.dims(),
            gpu_bounds.into_iter().map(Aabb::from).collect(),
        );

        let mut moved = store.clone();
        moved.copy_positions_from(&gpu_lights);

        let mut builder = ClusterBuilder::new(config, BinningOrder::LightMajor);
        builder.build_with_bounds(moved.active(), grid, &device_bounds);

        let device_lists = ClusterLightLists::from_device(config, &counts, &indices);
        let (mismatches, skipped_full) = compare_lists(builder.lists(), &device_lists);

        let report = ValidationReport {
            clusters: config.cluster_count(),
            mismatches,
            skipped_full,
            max_bounds_error: max_bounds_error(&grid.bounds(), &device_bounds),
            device_stats: device_lists.stats(),
        };

        if report.passed() {
            log::info!(
                "Cluster validation passed: {} clusters, {} full and skipped, bounds error {:.2e}",
                report.clusters,
                report.skipped_full,
                report.max_bounds_error,
            );
        } else {
            log::warn!(
                "Cluster validation: {} of {} clusters differ from the host build ({} skipped, bounds error {:.2e})",
                report.mismatches,
                report.clusters,
                report.skipped_full,
                report.max_bounds_error,
            );
        }
        if report.device_stats.dropped_assignments > 0 {
            log::warn!(
                "{} light assignments exceeded the per-cluster capacity",
                report.device_stats.dropped_assignments
            );
        }

        Ok(Some(report))
    }
}

fn read_buffer<T: Pod>(device: &wgpu::Device, buffer: &wgpu::Buffer) -> RenderResult<Vec<T>> {
    let slice = buffer.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(RenderError::readback)?;
    rx.recv()
        .map_err(|_| RenderError::readback("map_async channel closed"))?
        .map_err(RenderError::readback)?;

    let data = {
        let view = slice.get_mapped_range();
        bytemuck::pod_collect_to_vec::<u8, T>(&view)
    };
    buffer.unmap();
    Ok(data)
}
