//! GPU side of the clustered renderer.
//!
//! Each frame animates the lights, rebuilds the cluster bounds and light lists in
//! compute passes, then shades the scene with either the forward+ or the deferred
//! path. Both paths read the same lists.

use strata_core::{App, Plugin};

pub mod cluster_resources;
pub mod error;
pub mod global_resources;
pub mod mesh;
pub mod programs;
pub mod readback;
pub mod render;
pub mod shaders;
pub mod texture;

pub use error::{RenderError, RenderResult};
pub use readback::{ClusterValidator, ValidationReport};
pub use render::{RenderContext, RenderTarget, ShadingMode};

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        render::register_renderings(app);
    }
}
