use bytemuck::{Pod, Zeroable};
use flecs_ecs::macros::Component;
use glam::Vec3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub position: Vec3,
    /// Linear color, already scaled by the configured intensity.
    pub color: Vec3,
    /// Distance beyond which the light contributes nothing.
    pub radius: f32,
}

// Matches `struct Light` in the WGSL sources.
// vec3<f32> aligns to 16 bytes, so radius and the padding slot in right behind each vec3.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    pub position: [f32; 3],
    pub radius: f32,
    pub color: [f32; 3],
    pub _padding: f32,
}

impl From<&Light> for GpuLight {
    fn from(light: &Light) -> Self {
        Self {
            position: light.position.to_array(),
            radius: light.radius,
            color: light.color.to_array(),
            _padding: 0.0,
        }
    }
}

/// First 16 bytes of the light set storage buffer; the light array follows it.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct LightSetHeader {
    pub num_lights: u32,
    pub _padding: [u32; 3],
}

impl LightSetHeader {
    pub const SIZE: u64 = std::mem::size_of::<LightSetHeader>() as u64;
}

/// The authoritative, fixed-capacity array of lights.
///
/// Lights are never removed individually; only the first `active_count` are live.
#[derive(Component, Debug, Clone)]
pub struct LightStore {
    lights: Vec<Light>,
    active_count: u32,
    count_changed: bool,
}

impl LightStore {
    /// `lights.len()` becomes the capacity; `active_count` is clamped to it.
    pub fn new(lights: Vec<Light>, active_count: u32) -> Self {
        let mut store = Self {
            lights,
            active_count: 0,
            count_changed: true,
        };
        store.set_active_count(active_count);
        store
    }

    pub fn capacity(&self) -> u32 {
        self.lights.len() as u32
    }

    pub fn active_count(&self) -> u32 {
        self.active_count
    }

    /// Returns the count actually applied. Requests above capacity are truncated.
    pub fn set_active_count(&mut self, requested: u32) -> u32 {
        let capacity = self.capacity();
        let applied = if requested > capacity {
            log::warn!("Requested {requested} active lights, clamping to capacity {capacity}");
            capacity
        } else {
            requested
        };

        if applied != self.active_count {
            self.active_count = applied;
            self.count_changed = true;
        }
        applied
    }

    /// Reports (and clears) whether the active count changed since the last call.
    pub fn take_count_changed(&mut self) -> bool {
        std::mem::take(&mut self.count_changed)
    }

    pub fn active(&self) -> &[Light] {
        &self.lights[..self.active_count as usize]
    }

    pub fn active_mut(&mut self) -> &mut [Light] {
        &mut self.lights[..self.active_count as usize]
    }

    pub fn all(&self) -> &[Light] {
        &self.lights
    }

    pub fn header(&self) -> LightSetHeader {
        LightSetHeader {
            num_lights: self.active_count,
            _padding: [0; 3],
        }
    }

    /// GPU records for the whole capacity, so later count increases need no re-upload.
    pub fn to_gpu(&self) -> Vec<GpuLight> {
        self.lights.iter().map(GpuLight::from).collect()
    }

    /// Overwrites positions with values produced on the device (e.g. read back for validation).
    pub fn copy_positions_from(&mut self, gpu_lights: &[GpuLight]) {
        for (light, gpu) in self.lights.iter_mut().zip(gpu_lights) {
            light.position = Vec3::from_array(gpu.position);
        }
    }
}
