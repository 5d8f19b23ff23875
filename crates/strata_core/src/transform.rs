use flecs_ecs::macros::Component;
use glam::{Mat4, Quat, Vec3};

#[derive(Component, Debug, Clone, Copy)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Transform {
    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            translation: Vec3::new(x, y, z),
            ..Default::default()
        }
    }

    /// Builds a camera-style orientation: yaw around global up, then pitch around local right.
    /// Yaw 0 looks down +X, matching the fly camera's starting heading.
    pub fn with_yaw_pitch(mut self, yaw_radians: f32, pitch_radians: f32) -> Self {
        // -Z is forward at identity, a -90 degree yaw turns it to +X
        let yaw = Quat::from_rotation_y(-yaw_radians - std::f32::consts::FRAC_PI_2);
        let pitch = Quat::from_rotation_x(pitch_radians);
        self.rotation = yaw * pitch;
        self
    }

    /// Rotates the object around the Y axis (Global Up)
    pub fn rotate_y(&mut self, angle_radians: f32) {
        self.rotation = Quat::from_rotation_y(angle_radians) * self.rotation;
    }

    /// Rotates around the X axis (Local Right)
    pub fn rotate_local_x(&mut self, angle_radians: f32) {
        self.rotation = self.rotation * Quat::from_rotation_x(angle_radians);
    }

    /// The view matrix of a camera placed at this transform (World -> View)
    pub fn view_matrix(&self) -> Mat4 {
        let eye = self.translation;
        Mat4::look_at_rh(eye, eye + self.forward(), self.up())
    }

    // --- Directions (Useful for Movement) ---

    /// Returns the "Forward" direction (-Z) relative to current rotation
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// Returns the "Right" direction (+X) relative to current rotation
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Returns the "Up" direction (+Y) relative to current rotation
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}
