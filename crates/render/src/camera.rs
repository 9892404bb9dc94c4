//! First-person camera with view and projection matrices.

use crate::frustum::ViewFrustum;
use glam::{Mat4, Vec3};

/// First-person camera looking into the voxel level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Eye position in world space
    pub position: Vec3,
    /// Heading in radians; 0 looks along +X, positive turns toward +Z
    pub yaw: f32,
    /// Elevation in radians, clamped just short of straight up/down
    pub pitch: f32,
    /// Vertical field of view in radians
    pub fov: f32,
    /// Aspect ratio (width/height)
    pub aspect: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}

impl Camera {
    /// Camera at the origin with a 70 degree view, matching the classic client.
    pub fn new(aspect: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            fov: 70f32.to_radians(),
            aspect,
            near: 0.05,
            far: 256.0,
        }
    }

    /// Camera at `position` turned toward `target`.
    pub fn looking_at(position: Vec3, target: Vec3, aspect: f32) -> Self {
        let dir = (target - position).normalize_or_zero();
        let mut camera = Self::new(aspect);
        camera.position = position;
        camera.yaw = dir.z.atan2(dir.x);
        camera.pitch = dir.y.clamp(-1.0, 1.0).asin();
        camera.clamp_pitch();
        camera
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        let (yaw_sin, yaw_cos) = self.yaw.sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.sin_cos();
        Vec3::new(yaw_cos * pitch_cos, pitch_sin, yaw_sin * pitch_cos).normalize()
    }

    /// Unit right vector.
    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    /// View matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward(), Vec3::Y)
    }

    /// Right-handed perspective projection with 0..1 depth.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    /// Combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Frustum for the current transform.
    pub fn frustum(&self) -> ViewFrustum {
        ViewFrustum::from_matrices(self.projection_matrix(), self.view_matrix())
    }

    /// Move by a world-space offset.
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Rotate by yaw/pitch deltas.
    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw += yaw_delta;
        self.pitch += pitch_delta;
        self.clamp_pitch();
    }

    fn clamp_pitch(&mut self) {
        self.pitch = self.pitch.clamp(
            -std::f32::consts::FRAC_PI_2 + 0.001,
            std::f32::consts::FRAC_PI_2 - 0.001,
        );
    }
}
