use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rayon::prelude::*;
use strata_core::config::LightSettings;

use crate::light::LightStore;

/// PCG-style integer hash. `move_lights.wgsl` carries the same function, so host and
/// device agree on every light's frequency and phase.
pub fn pcg_hash(input: u32) -> u32 {
    let state = input.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277_803_737);
    (word >> 22) ^ word
}

// 24 bits so the value is exact in f32 and strictly below 1.
fn unit_float(hash: u32) -> f32 {
    (hash >> 8) as f32 / 16_777_216.0
}

/// Moves every light on a closed path inside an axis-aligned box.
///
/// Each axis is an independent sine with a per-light frequency and phase, so
/// positions are a pure function of `(index, time)` and never leave the box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightAnimator {
    pub bounds_min: Vec3,
    pub bounds_max: Vec3,
    pub speed: f32,
}

impl LightAnimator {
    pub fn from_settings(settings: &LightSettings) -> Self {
        Self {
            bounds_min: Vec3::from_array(settings.bounds_min),
            bounds_max: Vec3::from_array(settings.bounds_max),
            speed: settings.speed,
        }
    }

    pub fn position(&self, index: u32, time: f32) -> Vec3 {
        let center = (self.bounds_min + self.bounds_max) * 0.5;
        let half = (self.bounds_max - self.bounds_min) * 0.5;

        let axis = |a: u32| {
            let h = pcg_hash(index.wrapping_mul(3).wrapping_add(a));
            let phase = unit_float(h) * TAU;
            let frequency = 0.2 + 0.8 * unit_float(pcg_hash(h));
            (time * self.speed * frequency + phase).sin()
        };

        center + half * Vec3::new(axis(0), axis(1), axis(2))
    }

    /// Host-side step. Only active lights move; the rest keep their last position.
    pub fn animate(&self, store: &mut LightStore, time: f32) {
        store
            .active_mut()
            .par_iter_mut()
            .enumerate()
            .for_each(|(index, light)| {
                light.position = self.position(index as u32, time);
            });
    }

    pub fn uniform(&self, time: f32) -> AnimatorUniform {
        AnimatorUniform {
            bounds_min: self.bounds_min.to_array(),
            time,
            bounds_max: self.bounds_max.to_array(),
            speed: self.speed,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct AnimatorUniform {
    pub bounds_min: [f32; 3],
    pub time: f32,
    pub bounds_max: [f32; 3],
    pub speed: f32,
}
