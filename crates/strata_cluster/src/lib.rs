//! Clustered light assignment.
//!
//! The view volume is cut into `dims.x * dims.y` screen tiles and `dims.z`
//! logarithmic depth slices. Every light is binned into the clusters its sphere
//! touches, and a fragment finds its cluster with the same mapping.

pub mod builder;
pub mod geometry;
pub mod grid;
pub mod shading;

pub use builder::{BinningOrder, BoundedAppend, ClusterBuilder, ClusterLightLists, ClusterStats};
pub use geometry::{Aabb, ClusterBounds, ClusterGrid, GpuClusterBounds};
pub use grid::{ClusterGridConfig, DepthSlicing, GridUniform};
pub use shading::ShadingContract;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ClusterError {
    #[error("cluster grid dimension {axis} must be at least 1")]
    ZeroDimension { axis: char },

    #[error("max lights per cluster must be at least 1")]
    ZeroCapacity,

    #[error("cluster grid {dims:?} with {max_lights_per_cluster} lights per cluster overflows the u32 index space")]
    IndexSpaceOverflow {
        dims: [u32; 3],
        max_lights_per_cluster: u32,
    },

    #[error("cluster index buffer of {size} bytes exceeds the device binding limit of {limit} bytes")]
    ExceedsBindingLimit { size: u64, limit: u64 },

    #[error("invalid depth range: near {near}, far {far}")]
    InvalidDepthRange { near: f32, far: f32 },
}

pub type ClusterResult<T> = Result<T, ClusterError>;
